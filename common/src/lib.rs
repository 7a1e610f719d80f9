//! Data model shared by the certificate service and its clients.

pub mod jobs;
pub mod model;
pub mod requests;
