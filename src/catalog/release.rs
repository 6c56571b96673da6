//! Release records and keyword-based asset matching.

use chrono::NaiveDateTime;
use log::{debug, warn};

use crate::platform::{Arch, KeywordTable, Os};
use crate::version::CSHARP_FILENAME_MARKERS;

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq)]
pub struct GodotAsset {
    pub name: String,
    pub url: String,
    pub size: u64,
    /// Whether the filename carries a C#-runtime marker.
    pub csharp_enabled: bool,
}

impl GodotAsset {
    /// Builds an asset, deriving the C# flag from the filename.
    pub fn new(name: impl Into<String>, url: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let lower = name.to_lowercase();
        let csharp_enabled = CSHARP_FILENAME_MARKERS
            .iter()
            .any(|marker| lower.contains(marker));
        Self {
            name,
            url: url.into(),
            size,
            csharp_enabled,
        }
    }
}

/// A single engine release: the raw tag (parsing is deferred), publish time,
/// and assets in the order the remote listing returned them.
///
/// Asset order matters: lookup is first-match-wins, so the listing order
/// disambiguates when several assets share a keyword.
#[derive(Debug, Clone)]
pub struct GodotRelease {
    pub version: String,
    pub published_at: NaiveDateTime,
    pub assets: Vec<GodotAsset>,
}

impl GodotRelease {
    /// The first asset matching the platform keywords and the requested C#
    /// flag.
    ///
    /// `arch` must be provided explicitly; `None` is a caller-contract miss,
    /// not a default. A platform/arch pair absent from the table is likewise
    /// a soft `None` rather than an error.
    pub fn matching_asset(
        &self,
        table: &KeywordTable,
        os: Os,
        arch: Option<Arch>,
        csharp: bool,
    ) -> Option<&GodotAsset> {
        let Some(arch) = arch else {
            debug!("Cannot find asset: architecture not provided.");
            return None;
        };

        let Some(keywords) = table.keywords(os, arch) else {
            warn!(
                "Platform/architecture combination not supported: {}/{}",
                os, arch
            );
            return None;
        };

        debug!(
            "Searching for asset for version {} on {}/{} (csharp={}) with keywords: {:?}",
            self.version, os, arch, csharp, keywords
        );

        let found = self.assets.iter().find(|asset| {
            if asset.csharp_enabled != csharp {
                return false;
            }
            let name = asset.name.to_lowercase();
            keywords.iter().any(|keyword| name.contains(keyword.as_str()))
        });

        if found.is_none() {
            debug!(
                "No matching asset found for {} on {}/{} (csharp={})",
                self.version, os, arch, csharp
            );
        }

        found
    }
}
