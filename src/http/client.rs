//! Thin wrapper over `reqwest` with a fixed timeout and crate User-Agent.
//!
//! There is deliberately no retry or backoff here: transport failures are
//! surfaced to the caller, and any retry policy is the caller's business.

use std::io::Write;
use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::Error;

/// Download progress callback: `(bytes_downloaded, total_bytes)`. The total
/// is absent when the server sends no Content-Length. Carries a lifetime so
/// callers can report into locals, e.g. a progress bar on the stack.
pub type ProgressFn<'a> = dyn Fn(u64, Option<u64>) + Send + Sync + 'a;

/// HTTP client with a per-construction timeout.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        debug!("GET JSON from {}...", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    /// Performs a GET request with query parameters and deserializes the
    /// JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    /// Streams a URL into the given writer, reporting progress along the way.
    /// Returns the number of bytes written.
    #[tracing::instrument(skip(self, writer, progress))]
    pub async fn download_file<W: Write>(
        &self,
        url: &str,
        writer: &mut W,
        progress: Option<&ProgressFn<'_>>,
    ) -> Result<u64, Error> {
        debug!("Downloading file from {}...", url);

        let mut response = self.client.get(url).send().await?.error_for_status()?;
        let total_bytes = response.content_length();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            if let Some(report) = progress {
                report(downloaded, total_bytes);
            }
        }

        debug!(
            "Downloaded {:.2} MB",
            downloaded as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded)
    }
}
