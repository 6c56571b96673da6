//! Host platform resolution and the asset keyword table.
//!
//! Release assets are matched against download filenames by substring, so the
//! (OS, architecture) pair maps to a list of filename keywords. The table is
//! plain configuration data: the matching code never hard-codes a platform.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Operating-system family of a release asset or of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Windows,
    Linux,
    MacOs,
}

impl Os {
    /// Resolves the host OS. Unrecognized hosts are a hard error, never a
    /// silent default.
    pub fn detect() -> Result<Self, Error> {
        std::env::consts::OS.parse()
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Windows => write!(f, "windows"),
            Os::Linux => write!(f, "linux"),
            Os::MacOs => write!(f, "macos"),
        }
    }
}

impl FromStr for Os {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(Os::Windows),
            "linux" => Ok(Os::Linux),
            "macos" | "darwin" => Ok(Os::MacOs),
            other => Err(Error::UnsupportedPlatform(format!("OS: {other}"))),
        }
    }
}

/// CPU architecture of a release asset or of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X86_64,
    Arm32,
    Arm64,
}

impl Arch {
    /// Resolves the host CPU architecture. Unrecognized machines are a hard
    /// error, never a silent default.
    pub fn detect() -> Result<Self, Error> {
        std::env::consts::ARCH.parse()
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X86 => write!(f, "x86"),
            Arch::X86_64 => write!(f, "x86_64"),
            Arch::Arm32 => write!(f, "arm32"),
            Arch::Arm64 => write!(f, "arm64"),
        }
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "x86" | "i386" | "i686" => Ok(Arch::X86),
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "arm" | "arm32" | "armv7l" | "armv6l" => Ok(Arch::Arm32),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            other => Err(Error::UnsupportedPlatform(format!("architecture: {other}"))),
        }
    }
}

/// Lookup table from (OS, architecture) to the filename keywords that
/// identify a matching asset.
///
/// The default table carries the engine's published naming conventions; the
/// table is data so callers can extend it without touching the matcher.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: HashMap<(Os, Arch), Vec<String>>,
}

impl KeywordTable {
    /// An empty table. Mostly useful in tests.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Replaces the keyword list for one (OS, architecture) pair.
    pub fn insert<I, S>(&mut self, os: Os, arch: Arch, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert((os, arch), keywords.into_iter().map(Into::into).collect());
    }

    /// The keywords for a pair, or `None` when the pair is unsupported.
    pub fn keywords(&self, os: Os, arch: Arch) -> Option<&[String]> {
        self.entries.get(&(os, arch)).map(Vec::as_slice)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        let mut table = Self::empty();

        table.insert(Os::Windows, Arch::X86, ["win32"]);
        table.insert(Os::Windows, Arch::X86_64, ["win64"]);
        table.insert(Os::Windows, Arch::Arm64, ["windows_arm64"]);

        table.insert(
            Os::Linux,
            Arch::X86,
            ["x11.32", "x11_32", "linux.x86_32", "linux_x86_32"],
        );
        table.insert(
            Os::Linux,
            Arch::X86_64,
            ["x11.64", "x11_64", "linux.x86_64", "linux_x86_64"],
        );
        table.insert(Os::Linux, Arch::Arm32, ["linux.arm32", "linux_arm32"]);
        table.insert(Os::Linux, Arch::Arm64, ["linux.arm64", "linux_arm64"]);

        table.insert(Os::MacOs, Arch::X86, ["osx32", "osx.fat"]);
        table.insert(
            Os::MacOs,
            Arch::X86_64,
            ["osx.64", "osx64", "osx.fat", "macos.universal", "osx.universal"],
        );
        table.insert(Os::MacOs, Arch::Arm64, ["macos.universal", "osx.universal"]);

        table
    }
}
