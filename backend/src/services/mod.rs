pub mod auth;
pub mod certificates;
pub mod events;
pub mod multipart;
pub mod participants;
pub mod templates;

#[cfg(test)]
pub mod testing;
