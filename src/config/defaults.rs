pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_MIN_IDLE: u32 = 2;
pub const DEFAULT_JWT_ISSUER: &str = "wms-lite";
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;
pub const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 60 * 60;
