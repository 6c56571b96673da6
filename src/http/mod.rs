//! HTTP plumbing shared by the release catalog and the engine installer.

mod client;

pub use client::{HttpClient, ProgressFn};
