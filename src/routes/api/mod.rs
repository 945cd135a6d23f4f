pub mod admin;
pub mod auth;
mod router;
pub mod sessions;

pub use router::router;
