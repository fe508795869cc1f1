pub mod protocol {
    pub const API_VERSION: &str = "3.0";
    pub const DEFAULT_SERVER: &str = "peakinvestigator.veritomyx.com";
    pub const API_PATH: &str = "/api/";
    pub const DEFAULT_SANDBOX: i32 = 0;
    pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

pub mod network {
    pub const SFTP_DEFAULT_PORT: u16 = 22;
    pub const TIMEOUT_API_REQUEST_MS: u64 = 60_000;
    pub const TIMEOUT_SFTP_MS: u64 = 60_000;
    pub const USER_AGENT: &str = concat!("peakinvestigator-sdk/", env!("CARGO_PKG_VERSION"));
}

pub mod transfer {
    pub const BUFFER_SIZE: usize = 64 * 1024;
    pub const PARTIAL_SUFFIX: &str = "partial";
}

pub mod polling {
    pub const DEFAULT_INTERVAL_MS: u64 = 5_000;
    pub const DEFAULT_MAX_ATTEMPTS: usize = 120;
}

pub mod protocols {
    pub const ALLOWED_HTTP: &[&str] = &["http", "https"];
}
