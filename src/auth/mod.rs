pub mod bootstrap;
pub mod device;
mod error;
pub mod gateway;
pub mod jwt;
pub mod password;
pub mod session_manager;
pub mod sweeper;
mod types;

pub use error::AuthError;
pub use gateway::AuthGateway;
pub use jwt::TokenSigner;
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use session_manager::{SessionManager, SessionView};
pub use types::{AdminRole, Claims, Principal, RequiredRole, Role, TokenBundle};
