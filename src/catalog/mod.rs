//! Fetching, caching, and querying the remote release listing.
//!
//! [`ReleaseFetcher`] pages through a GitHub-style releases endpoint, builds
//! [`GodotRelease`] records, and keeps the most recent result as its cache.
//! The cache has two observable states: empty, or populated for one
//! `stable_only` mode. A fetch for the cached mode without `refresh_cache`
//! is answered from memory with zero network calls; anything else rebuilds
//! the cache wholesale. There are no partial or incremental states.

pub mod blocking;
mod release;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDateTime;
use log::{debug, info, warn};

pub use release::{GodotAsset, GodotRelease};

use crate::Error;
use crate::http::HttpClient;
use crate::platform::{Arch, KeywordTable, Os};
use crate::version::GodotVersion;

/// Listing endpoint carrying stable releases only.
pub const STABLE_RELEASES_URL: &str =
    "https://api.github.com/repos/godotengine/godot/releases";

/// Listing endpoint carrying every build, prereleases included.
pub const ALL_RELEASES_URL: &str =
    "https://api.github.com/repos/godotengine/godot-builds/releases";

const PER_PAGE: usize = 30;
const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Wire types for the paginated listing endpoint (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        #[serde(default)]
        pub tag_name: Option<String>,
        #[serde(default)]
        pub published_at: Option<String>,
        #[serde(default)]
        pub assets: Vec<Asset>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub name: String,
        pub size: u64,
        pub browser_download_url: String,
    }
}

/// Sort key for a fetched listing. Always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Version,
    Date,
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Version => write!(f, "version"),
            SortBy::Date => write!(f, "date"),
        }
    }
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "version" => Ok(SortBy::Version),
            "date" => Ok(SortBy::Date),
            other => Err(Error::InvalidFormat(format!("sort key: {other}"))),
        }
    }
}

/// Options for one [`ReleaseFetcher::fetch_releases`] call.
///
/// Note that memoization is keyed on `stable_only` alone: a cached listing is
/// reused for a matching `stable_only` regardless of how `sort_by`,
/// `max_releases`, or `platform_only` differed when it was built. Pass
/// `refresh_cache` to force a rebuild.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Fetch from the stable listing instead of the all-builds listing.
    pub stable_only: bool,
    pub sort_by: SortBy,
    /// Stop paging as soon as this many releases have been retained.
    /// `Some(0)` yields an empty listing without issuing any requests.
    pub max_releases: Option<usize>,
    /// Keep only releases with at least one asset for the host platform.
    pub platform_only: bool,
    pub refresh_cache: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            stable_only: true,
            sort_by: SortBy::default(),
            max_releases: None,
            platform_only: false,
            refresh_cache: false,
        }
    }
}

struct CatalogCache {
    releases: Vec<GodotRelease>,
    stable_only: bool,
}

/// Retrieves and caches the engine release listing.
///
/// Not designed for concurrent mutation: a host embedding this in a
/// concurrent setting serializes `fetch_releases` calls itself.
pub struct ReleaseFetcher {
    http: HttpClient,
    keywords: KeywordTable,
    stable_url: String,
    all_url: String,
    cache: Option<CatalogCache>,
}

impl ReleaseFetcher {
    /// Creates a fetcher against the official listing endpoints with the
    /// default timeout.
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(Duration::from_secs(crate::RELEASE_FETCHER_TIMEOUT_SECS))
    }

    /// Creates a fetcher with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        Self::with_urls(timeout, STABLE_RELEASES_URL, ALL_RELEASES_URL)
    }

    /// Creates a fetcher against custom listing endpoints.
    /// Used primarily for testing.
    pub fn with_urls(timeout: Duration, stable_url: &str, all_url: &str) -> Result<Self, Error> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            keywords: KeywordTable::default(),
            stable_url: stable_url.to_string(),
            all_url: all_url.to_string(),
            cache: None,
        })
    }

    /// The asset keyword table used for platform filtering and lookups.
    pub fn keyword_table(&self) -> &KeywordTable {
        &self.keywords
    }

    pub fn keyword_table_mut(&mut self) -> &mut KeywordTable {
        &mut self.keywords
    }

    /// Converts a raw release tag like `"4.5.1-stable"` into a version for
    /// sorting. Malformed tags degrade to [`GodotVersion::lowest`] so a
    /// single bad tag never aborts a sort.
    pub fn version_sort_key(tag: &str, csharp: bool) -> GodotVersion {
        let base = tag.replace("-stable", "");
        let candidate = if csharp {
            if base.starts_with("4.") {
                format!("{base} (.NET)")
            } else {
                format!("{base} (Mono)")
            }
        } else {
            base
        };

        candidate.parse().unwrap_or_else(|_| {
            warn!("Malformed version tag '{}' encountered. Sorting to bottom.", tag);
            GodotVersion::lowest()
        })
    }

    /// Fetches the release listing, or returns the cache when it was built
    /// for the same `stable_only` mode and no refresh is forced.
    ///
    /// Pages are requested strictly sequentially. Entries missing a tag or
    /// publish time are skipped; a transport failure on any page aborts the
    /// whole call and leaves the previous cache untouched.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_releases(
        &mut self,
        options: &FetchOptions,
    ) -> Result<&[GodotRelease], Error> {
        let reusable = !options.refresh_cache
            && self
                .cache
                .as_ref()
                .is_some_and(|cache| cache.stable_only == options.stable_only);

        if reusable {
            info!("Returning cached releases.");
        } else {
            let releases = self.fetch_pages(options).await?;
            info!("Successfully fetched and cached {} releases.", releases.len());
            self.cache = Some(CatalogCache {
                releases,
                stable_only: options.stable_only,
            });
        }

        let cache = self.cache.as_ref().expect("cache populated above");
        Ok(&cache.releases)
    }

    async fn fetch_pages(&self, options: &FetchOptions) -> Result<Vec<GodotRelease>, Error> {
        if options.max_releases == Some(0) {
            debug!("max_releases is 0; skipping the fetch entirely.");
            return Ok(Vec::new());
        }

        let source_url = if options.stable_only {
            &self.stable_url
        } else {
            &self.all_url
        };
        info!(
            "Fetching {} releases from {}.",
            if options.stable_only { "stable" } else { "all" },
            source_url
        );

        let (user_os, user_arch) = if options.platform_only {
            let os = Os::detect()?;
            let arch = Arch::detect()?;
            info!("Filtering for platform: {}/{}", os, arch);
            (Some(os), Some(arch))
        } else {
            (None, None)
        };

        let mut releases: Vec<GodotRelease> = Vec::new();
        let mut page = 1usize;

        'paging: loop {
            debug!("Requesting page {} of {}", page, source_url);
            let entries: Vec<api::Release> = self
                .http
                .get_json_with_query(
                    source_url,
                    &[
                        ("page", &page.to_string()),
                        ("per_page", &PER_PAGE.to_string()),
                    ],
                )
                .await?;

            if entries.is_empty() {
                info!("No more data received after page {}.", page);
                break;
            }

            let page_len = entries.len();
            debug!("Processing {} releases from page {}.", page_len, page);

            for entry in entries {
                let (Some(tag), Some(raw_published)) = (entry.tag_name, entry.published_at)
                else {
                    warn!("Skipping malformed release entry: missing tag or publish time");
                    continue;
                };

                let published_at =
                    match NaiveDateTime::parse_from_str(&raw_published, PUBLISHED_AT_FORMAT) {
                        Ok(timestamp) => timestamp,
                        Err(err) => {
                            warn!(
                                "Skipping release {}: bad publish time '{}': {}",
                                tag, raw_published, err
                            );
                            continue;
                        }
                    };

                let assets = entry
                    .assets
                    .into_iter()
                    .map(|asset| GodotAsset::new(asset.name, asset.browser_download_url, asset.size))
                    .collect();

                let release = GodotRelease {
                    version: tag,
                    published_at,
                    assets,
                };

                // Dropped releases do not count toward max_releases.
                if let Some(os) = user_os {
                    let matched = release
                        .matching_asset(&self.keywords, os, user_arch, false)
                        .is_some()
                        || release
                            .matching_asset(&self.keywords, os, user_arch, true)
                            .is_some();
                    if !matched {
                        debug!(
                            "Skipping {}: no asset found for the host platform",
                            release.version
                        );
                        continue;
                    }
                }

                releases.push(release);
                if let Some(max) = options.max_releases
                    && releases.len() >= max
                {
                    info!("Reached max_releases limit of {}.", max);
                    break 'paging;
                }
            }

            if page_len < PER_PAGE {
                info!("Finished fetching all available releases.");
                break;
            }
            page += 1;
        }

        match options.sort_by {
            SortBy::Version => releases.sort_by(|a, b| {
                Self::version_sort_key(&b.version, false)
                    .cmp_precedence(&Self::version_sort_key(&a.version, false))
            }),
            SortBy::Date => releases.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        }

        Ok(releases)
    }

    /// The direct download URL for a version tag on a platform.
    ///
    /// `os` and `arch` default to the detected host platform; detection
    /// failure is a hard error. The tag must match the cached raw tag
    /// exactly.
    pub fn get_download_url(
        &self,
        version: &str,
        os: Option<Os>,
        arch: Option<Arch>,
        csharp: bool,
    ) -> Result<String, Error> {
        let os = match os {
            Some(os) => os,
            None => Os::detect()?,
        };
        let arch = match arch {
            Some(arch) => arch,
            None => Arch::detect()?,
        };

        info!(
            "Attempting to find download URL for version {} on {}/{}, csharp={}",
            version, os, arch, csharp
        );

        let cache = self.cache.as_ref().ok_or_else(|| {
            Error::NotFound(format!(
                "version {version} not found: no releases have been fetched yet"
            ))
        })?;

        let release = cache
            .releases
            .iter()
            .find(|release| release.version == version)
            .ok_or_else(|| {
                let mode = if cache.stable_only { "stable" } else { "all" };
                Error::NotFound(format!(
                    "version {version} not found in current {mode} cache; \
                     fetch with stable_only=false to update the cache"
                ))
            })?;

        let asset = release
            .matching_asset(&self.keywords, os, Some(arch), csharp)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no download found for {os} {arch} csharp={csharp} in version {version}"
                ))
            })?;

        info!("Found asset URL for {}: {}", version, asset.url);
        Ok(asset.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::release::tests::release_4_1_1;
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn page_query(page: usize) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), page.to_string()),
            Matcher::UrlEncoded("per_page".into(), PER_PAGE.to_string()),
        ])
    }

    fn sample_listing() -> serde_json::Value {
        json!([
            {
                "tag_name": "4.1.1-stable",
                "published_at": "2023-09-15T12:00:00Z",
                "assets": [
                    {
                        "name": "Godot_v4.1.1-stable_win64.exe",
                        "browser_download_url": "http://example.com/win64.exe",
                        "size": 100_000_000u64
                    },
                    {
                        "name": "Godot_v4.1.1-stable_linux.x86_64.zip",
                        "browser_download_url": "http://example.com/linux.zip",
                        "size": 150_000_000u64
                    },
                    {
                        "name": "Godot_v4.1.1-stable_linux.arm64.zip",
                        "browser_download_url": "http://example.com/linux_arm64.zip",
                        "size": 140_000_000u64
                    },
                    {
                        "name": "Godot_v4.1.1-stable_macos.universal.zip",
                        "browser_download_url": "http://example.com/macos.zip",
                        "size": 160_000_000u64
                    }
                ]
            },
            {
                "tag_name": "4.0.0-rc1",
                "published_at": "2023-01-01T10:00:00Z",
                "assets": []
            }
        ])
    }

    async fn fetcher_for(server: &mockito::ServerGuard) -> ReleaseFetcher {
        let url = server.url();
        ReleaseFetcher::with_urls(TIMEOUT, &format!("{url}/stable"), &format!("{url}/all"))
            .unwrap()
    }

    #[test]
    fn test_version_sort_key_strips_stable_suffix() {
        let key = ReleaseFetcher::version_sort_key("4.1.2-stable", false);
        assert_eq!((key.major, key.minor, key.patch), (4, 1, 2));
        assert!(key.is_stable());
    }

    #[test]
    fn test_version_sort_key_tags_csharp_by_major() {
        assert!(ReleaseFetcher::version_sort_key("4.1.1-stable", true).is_dotnet());
        assert!(ReleaseFetcher::version_sort_key("3.5-stable", true).is_mono());
    }

    #[test]
    fn test_version_sort_key_malformed_tag_degrades() {
        let key = ReleaseFetcher::version_sort_key("junk-tag", false);
        assert_eq!(key, GodotVersion::lowest());
    }

    #[tokio::test]
    async fn test_fetch_stable_uses_stable_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(sample_listing().to_string())
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let releases = fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap();

        mock.assert_async().await;
        let tags: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        // Version sort, descending.
        assert_eq!(tags, vec!["4.1.1-stable", "4.0.0-rc1"]);
        assert_eq!(releases[0].assets.len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_all_uses_all_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/all")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(sample_listing().to_string())
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let options = FetchOptions {
            stable_only: false,
            ..Default::default()
        };
        let releases = fetcher.fetch_releases(&options).await.unwrap();

        mock.assert_async().await;
        assert_eq!(releases.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_skips_malformed_entries() {
        let body = json!([
            { "tag_name": "4.1.1-stable", "assets": [] },
            { "published_at": "2023-09-15T12:00:00Z", "assets": [] },
            { "tag_name": "4.0.0-stable", "published_at": "yesterday", "assets": [] },
            { "tag_name": "3.6-stable", "published_at": "2023-09-16T12:00:00Z", "assets": [] }
        ]);

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let releases = fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].version, "3.6-stable");
    }

    #[tokio::test]
    async fn test_fetch_reuses_cache_for_same_mode() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(sample_listing().to_string())
            .expect(1)
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let first = fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap()
            .len();
        let second = fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap()
            .len();

        // Exactly one network round trip for the two calls.
        mock.assert_async().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fetch_refresh_cache_refetches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(sample_listing().to_string())
            .expect(2)
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap();
        fetcher
            .fetch_releases(&FetchOptions {
                refresh_cache: true,
                ..Default::default()
            })
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_mode_switch_rebuilds_cache() {
        let mut server = mockito::Server::new_async().await;
        let stable_mock = server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(sample_listing().to_string())
            .expect(1)
            .create_async()
            .await;
        let all_mock = server
            .mock("GET", "/all")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(sample_listing().to_string())
            .expect(1)
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap();
        fetcher
            .fetch_releases(&FetchOptions {
                stable_only: false,
                ..Default::default()
            })
            .await
            .unwrap();

        stable_mock.assert_async().await;
        all_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_max_releases_stops_paging() {
        // A full first page would normally trigger a second request.
        let full_page: Vec<_> = (0..PER_PAGE)
            .map(|i| {
                json!({
                    "tag_name": format!("4.{i}-stable"),
                    "published_at": "2023-09-15T12:00:00Z",
                    "assets": []
                })
            })
            .collect();

        let mut server = mockito::Server::new_async().await;
        let page_one = server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(json!(full_page).to_string())
            .expect(1)
            .create_async()
            .await;
        let page_two = server
            .mock("GET", "/stable")
            .match_query(page_query(2))
            .with_status(200)
            .with_body("[]")
            .expect(0)
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let releases = fetcher
            .fetch_releases(&FetchOptions {
                max_releases: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(releases.len(), 1);
        page_one.assert_async().await;
        page_two.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_max_releases_zero_yields_empty_without_requests() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stable")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let releases = fetcher
            .fetch_releases(&FetchOptions {
                max_releases: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(releases.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_paginates_until_short_page() {
        let full_page: Vec<_> = (0..PER_PAGE)
            .map(|i| {
                json!({
                    "tag_name": format!("4.{i}-stable"),
                    "published_at": "2023-09-15T12:00:00Z",
                    "assets": []
                })
            })
            .collect();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(json!(full_page).to_string())
            .create_async()
            .await;
        let page_two = server
            .mock("GET", "/stable")
            .match_query(page_query(2))
            .with_status(200)
            .with_body(sample_listing().to_string())
            .expect(1)
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let releases = fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap();

        page_two.assert_async().await;
        assert_eq!(releases.len(), PER_PAGE + 2);
    }

    #[tokio::test]
    async fn test_fetch_transport_failure_preserves_previous_cache() {
        let mut server = mockito::Server::new_async().await;
        let good = server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(sample_listing().to_string())
            .expect(1)
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap();
        good.assert_async().await;

        server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(500)
            .create_async()
            .await;

        let result = fetcher
            .fetch_releases(&FetchOptions {
                refresh_cache: true,
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));

        // The failed refresh did not clobber the earlier cache.
        assert!(
            fetcher
                .get_download_url("4.1.1-stable", Some(Os::Windows), Some(Arch::X86_64), false)
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_fetch_platform_filter_drops_releases_without_assets() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(sample_listing().to_string())
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let releases = fetcher
            .fetch_releases(&FetchOptions {
                platform_only: true,
                ..Default::default()
            })
            .await
            .unwrap();

        // 4.0.0-rc1 carries no assets at all and is dropped.
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].version, "4.1.1-stable");
    }

    #[tokio::test]
    async fn test_cache_ignores_platform_filter() {
        // Known quirk, preserved deliberately: the cache key is stable_only
        // alone, so a platform-filtered cache is reused for an unfiltered
        // call of the same mode.
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(sample_listing().to_string())
            .expect(1)
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let filtered = fetcher
            .fetch_releases(&FetchOptions {
                platform_only: true,
                ..Default::default()
            })
            .await
            .unwrap()
            .len();
        let reused = fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap()
            .len();

        mock.assert_async().await;
        assert_eq!(filtered, 1);
        assert_eq!(reused, 1);
    }

    #[tokio::test]
    async fn test_fetch_sort_by_date() {
        let body = json!([
            { "tag_name": "3.6-stable", "published_at": "2024-01-01T00:00:00Z", "assets": [] },
            { "tag_name": "4.1.1-stable", "published_at": "2023-09-15T12:00:00Z", "assets": [] }
        ]);

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let releases = fetcher
            .fetch_releases(&FetchOptions {
                sort_by: SortBy::Date,
                ..Default::default()
            })
            .await
            .unwrap();

        let tags: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        // 3.6 is older by version but newer by publish date.
        assert_eq!(tags, vec!["3.6-stable", "4.1.1-stable"]);
    }

    #[tokio::test]
    async fn test_fetch_sort_with_malformed_tag_puts_it_last() {
        let body = json!([
            { "tag_name": "junk-tag", "published_at": "2024-01-01T00:00:00Z", "assets": [] },
            { "tag_name": "4.1.1-stable", "published_at": "2023-09-15T12:00:00Z", "assets": [] }
        ]);

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stable")
            .match_query(page_query(1))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let mut fetcher = fetcher_for(&server).await;
        let releases = fetcher
            .fetch_releases(&FetchOptions::default())
            .await
            .unwrap();

        let tags: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(tags, vec!["4.1.1-stable", "junk-tag"]);
    }

    #[test]
    fn test_get_download_url_with_matching_asset() {
        let mut fetcher = ReleaseFetcher::new().unwrap();
        fetcher.cache = Some(CatalogCache {
            releases: vec![release_4_1_1()],
            stable_only: true,
        });

        let url = fetcher
            .get_download_url("4.1.1-stable", Some(Os::Windows), Some(Arch::X86_64), false)
            .unwrap();
        assert_eq!(url, "http://win64");
    }

    #[test]
    fn test_get_download_url_missing_version() {
        let mut fetcher = ReleaseFetcher::new().unwrap();
        fetcher.cache = Some(CatalogCache {
            releases: vec![],
            stable_only: true,
        });

        let err = fetcher
            .get_download_url("9.9.9-stable", Some(Os::Windows), Some(Arch::X86_64), false)
            .unwrap_err();
        match err {
            Error::NotFound(msg) => {
                assert!(msg.contains("9.9.9-stable"));
                assert!(msg.contains("stable"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_get_download_url_empty_catalog() {
        let fetcher = ReleaseFetcher::new().unwrap();
        let err = fetcher
            .get_download_url("4.1.1-stable", Some(Os::Windows), Some(Arch::X86_64), false)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_get_download_url_no_matching_asset() {
        let mut fetcher = ReleaseFetcher::new().unwrap();
        fetcher.cache = Some(CatalogCache {
            releases: vec![release_4_1_1()],
            stable_only: true,
        });

        let err = fetcher
            .get_download_url("4.1.1-stable", Some(Os::Linux), Some(Arch::Arm64), false)
            .unwrap_err();
        match err {
            Error::NotFound(msg) => assert!(msg.contains("linux arm64")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
