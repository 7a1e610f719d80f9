pub mod certificate;
pub mod event;
pub mod generation;
pub mod participant;
pub mod template;
