//! Godot version parsing, precedence, and rendering.
//!
//! A [`GodotVersion`] is an immutable value parsed from a version string such
//! as `"4.6-dev2 (.NET)"` or from a release download URL. Precedence ignores
//! the scripting-runtime variant; strict equality includes it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::Error;

/// Filename substrings that identify a C#-enabled build.
/// Only `_mono` is officially used currently; the rest are future-proofing.
pub(crate) const CSHARP_FILENAME_MARKERS: [&str; 3] = ["_mono", "_dotnet", ".net"];

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^v?(\d+)\.(\d+)(?:\.(\d+))?(?:-([a-z]+)(\d+)?)?(?:\s*\((mono|\.net|dotnet)\))?$")
        .expect("version grammar regex")
});

static URL_CORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^v?(\d+)\.(\d+)(?:\.(\d+))?(?:-([a-z]+)(\d+)?)?$").expect("URL grammar regex")
});

static URL_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/download/([^/]+)/").expect("URL segment regex"));

/// Release maturity channel, ordered dev < alpha < beta < rc < stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Dev,
    Alpha,
    Beta,
    Rc,
    Stable,
    /// Any other channel token. Sorts below all known channels.
    Unknown(String),
}

impl Channel {
    /// Maturity rank used for ordering and equality.
    pub fn rank(&self) -> i8 {
        match self {
            Channel::Unknown(_) => -1,
            Channel::Dev => 0,
            Channel::Alpha => 1,
            Channel::Beta => 2,
            Channel::Rc => 3,
            Channel::Stable => 4,
        }
    }

    fn from_token(token: &str) -> Self {
        match token.to_lowercase().as_str() {
            "dev" => Channel::Dev,
            "alpha" => Channel::Alpha,
            "beta" => Channel::Beta,
            "rc" => Channel::Rc,
            "stable" => Channel::Stable,
            other => Channel::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Dev => write!(f, "dev"),
            Channel::Alpha => write!(f, "alpha"),
            Channel::Beta => write!(f, "beta"),
            Channel::Rc => write!(f, "rc"),
            Channel::Stable => write!(f, "stable"),
            Channel::Unknown(token) => write!(f, "{}", token),
        }
    }
}

/// Scripting-runtime flavor of a build.
///
/// Godot 3.x names its C# builds Mono; Godot 4+ names them .NET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Standard,
    Mono,
    DotNet,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Standard => write!(f, "Standard"),
            Variant::Mono => write!(f, "Mono"),
            Variant::DotNet => write!(f, ".NET"),
        }
    }
}

/// A Godot Engine version: major/minor/patch, release channel, and C#
/// support. Parses from strings and download URLs; immutable once built.
#[derive(Debug, Clone)]
pub struct GodotVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub channel: Channel,
    pub channel_num: u32,
    pub csharp_enabled: bool,
}

impl GodotVersion {
    pub fn new(
        major: u32,
        minor: u32,
        patch: u32,
        channel: Channel,
        channel_num: u32,
        csharp_enabled: bool,
    ) -> Self {
        Self {
            major,
            minor,
            patch,
            channel,
            channel_num,
            csharp_enabled,
        }
    }

    /// The sentinel that sorts below every real version (0.0.0-dev).
    /// Used when callers tolerate a malformed tag instead of failing.
    pub fn lowest() -> Self {
        Self::new(0, 0, 0, Channel::Dev, 0, false)
    }

    /// Parses a version from a release download URL.
    ///
    /// The version is the path segment following the `/download/` marker;
    /// C# support is detected independently from the final path component,
    /// since URLs encode the variant via filename keywords.
    pub fn from_url(url: &str) -> Result<Self, Error> {
        let segment = URL_SEGMENT_RE
            .captures(url)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| Error::InvalidFormat(format!("no version segment in URL: {url}")))?
            .as_str();

        let caps = URL_CORE_RE
            .captures(segment)
            .ok_or_else(|| Error::InvalidFormat(format!("version segment in URL: {segment}")))?;
        let mut version = Self::from_core_captures(&caps, segment)?;

        let filename = url.rsplit('/').next().unwrap_or("").to_lowercase();
        version.csharp_enabled = CSHARP_FILENAME_MARKERS
            .iter()
            .any(|marker| filename.contains(marker));

        Ok(version)
    }

    fn from_core_captures(caps: &regex::Captures<'_>, input: &str) -> Result<Self, Error> {
        let number = |idx: usize| -> Result<u32, Error> {
            caps.get(idx).map_or(Ok(0), |m| {
                m.as_str()
                    .parse()
                    .map_err(|_| Error::InvalidFormat(input.to_string()))
            })
        };

        let channel = caps
            .get(4)
            .map_or(Channel::Stable, |m| Channel::from_token(m.as_str()));

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            channel,
            channel_num: number(5)?,
            csharp_enabled: false,
        })
    }

    /// The variant name derived from C# support and the major version.
    pub fn variant(&self) -> Variant {
        if !self.csharp_enabled {
            Variant::Standard
        } else if self.major >= 4 {
            Variant::DotNet
        } else {
            Variant::Mono
        }
    }

    pub fn is_stable(&self) -> bool {
        self.channel == Channel::Stable
    }

    pub fn is_standard(&self) -> bool {
        !self.csharp_enabled
    }

    pub fn is_mono(&self) -> bool {
        self.csharp_enabled && self.major < 4
    }

    pub fn is_dotnet(&self) -> bool {
        self.csharp_enabled && self.major >= 4
    }

    /// The `major.minor` feature tag, e.g. `"4.1"`, as written into project
    /// descriptors.
    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// Compares by (major, minor, patch, channel rank, channel number),
    /// ignoring the variant.
    ///
    /// This is the catalog's sort order. It is a separate method rather than
    /// an `Ord` impl because versions that differ only in variant tie here
    /// while being unequal under `Eq`, and an `Ord` inconsistent with `Eq`
    /// breaks `sort`/`BTreeMap` contracts.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.ordering_key().cmp(&other.ordering_key())
    }

    fn ordering_key(&self) -> (u32, u32, u32, i8, u32) {
        (
            self.major,
            self.minor,
            self.patch,
            self.channel.rank(),
            self.channel_num,
        )
    }
}

impl FromStr for GodotVersion {
    type Err = Error;

    /// Parses strings like `"4.5"`, `"3.6.2"`, `"4.5.1-rc1"`, or
    /// `"4.6-dev2 (.NET)"`. The whole input must match the grammar.
    fn from_str(s: &str) -> Result<Self, Error> {
        let trimmed = s.trim();
        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| Error::InvalidFormat(trimmed.to_string()))?;

        let mut version = Self::from_core_captures(&caps, trimmed)?;
        version.csharp_enabled = caps.get(6).is_some();
        Ok(version)
    }
}

impl fmt::Display for GodotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch > 0 {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        } else {
            write!(f, "{}.{}", self.major, self.minor)?;
        }

        if !self.is_stable() {
            write!(f, "-{}", self.channel)?;
            if self.channel_num > 0 {
                write!(f, "{}", self.channel_num)?;
            }
        }

        if self.csharp_enabled {
            write!(f, " ({})", self.variant())?;
        }

        Ok(())
    }
}

impl PartialEq for GodotVersion {
    fn eq(&self, other: &Self) -> bool {
        self.ordering_key() == other.ordering_key() && self.variant() == other.variant()
    }
}

impl Eq for GodotVersion {}

impl Hash for GodotVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordering_key().hash(state);
        self.variant().hash(state);
    }
}
