pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod session_dao;
pub mod user_dao;

pub use base::{DaoBase, PaginatedResponse};
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use session_dao::{DeviceMeta, SessionDao};
pub use user_dao::UserDao;
