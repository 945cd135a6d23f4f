pub mod context;
pub mod user_service;

pub use context::ServiceContext;
