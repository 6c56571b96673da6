//! Blocking façade over the release fetcher.
//!
//! Wraps the async fetcher with a private current-thread tokio runtime so
//! synchronous callers get the same semantics, cache included, without
//! touching async themselves.

use std::time::Duration;

use crate::Error;
use crate::catalog::{FetchOptions, GodotRelease};
use crate::platform::{Arch, KeywordTable, Os};

/// Blocking counterpart of [`super::ReleaseFetcher`].
pub struct ReleaseFetcher {
    inner: super::ReleaseFetcher,
    runtime: tokio::runtime::Runtime,
}

impl ReleaseFetcher {
    /// Creates a fetcher against the official listing endpoints with the
    /// default timeout.
    pub fn new() -> Result<Self, Error> {
        Self::wrap(super::ReleaseFetcher::new()?)
    }

    /// Creates a fetcher with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        Self::wrap(super::ReleaseFetcher::with_timeout(timeout)?)
    }

    /// Creates a fetcher against custom listing endpoints.
    /// Used primarily for testing.
    pub fn with_urls(timeout: Duration, stable_url: &str, all_url: &str) -> Result<Self, Error> {
        Self::wrap(super::ReleaseFetcher::with_urls(timeout, stable_url, all_url)?)
    }

    fn wrap(inner: super::ReleaseFetcher) -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { inner, runtime })
    }

    pub fn keyword_table(&self) -> &KeywordTable {
        self.inner.keyword_table()
    }

    pub fn keyword_table_mut(&mut self) -> &mut KeywordTable {
        self.inner.keyword_table_mut()
    }

    /// See [`super::ReleaseFetcher::fetch_releases`]. Blocks until every
    /// page has been retrieved.
    pub fn fetch_releases(&mut self, options: &FetchOptions) -> Result<&[GodotRelease], Error> {
        let Self { inner, runtime } = self;
        runtime.block_on(inner.fetch_releases(options))
    }

    /// See [`super::ReleaseFetcher::get_download_url`].
    pub fn get_download_url(
        &self,
        version: &str,
        os: Option<Os>,
        arch: Option<Arch>,
        csharp: bool,
    ) -> Result<String, Error> {
        self.inner.get_download_url(version, os, arch, csharp)
    }
}
