pub mod catalog;
pub mod engine;
pub mod error;
pub mod http;
pub mod platform;
pub mod project;
pub mod version;

pub use error::Error;

/// User-Agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("godotkit v", env!("CARGO_PKG_VERSION"));

/// Default timeout for release-listing requests, in seconds.
pub const RELEASE_FETCHER_TIMEOUT_SECS: u64 = 10;

/// Default timeout for engine archive downloads, in seconds.
pub const RELEASE_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
