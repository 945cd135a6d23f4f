use sea_orm::DbErr;
use std::fmt;
use uuid::Uuid;

#[derive(Debug)]
pub enum DaoLayerError {
    Db(DbErr),
    NotFound { entity: &'static str, id: Uuid },
    InvalidPagination { page: u64, page_size: u64 },
    /// A conditional revoke matched no live row: someone else got there first.
    AlreadyRevoked { id: Uuid },
}

pub type DaoResult<T> = Result<T, DaoLayerError>;

impl fmt::Display for DaoLayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaoLayerError::Db(err) => write!(f, "Database error: {err}"),
            DaoLayerError::NotFound { entity, id } => {
                write!(f, "{entity} not found (id={id})")
            }
            DaoLayerError::InvalidPagination { page, page_size } => {
                write!(f, "Invalid pagination: page={page} page_size={page_size}")
            }
            DaoLayerError::AlreadyRevoked { id } => {
                write!(f, "session already revoked (id={id})")
            }
        }
    }
}

impl std::error::Error for DaoLayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaoLayerError::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbErr> for DaoLayerError {
    fn from(err: DbErr) -> Self {
        DaoLayerError::Db(err)
    }
}
