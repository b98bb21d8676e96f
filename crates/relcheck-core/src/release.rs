use std::cmp::Ordering;
use std::fmt;

/// A release version tag.
///
/// Ordering is total: `Unknown` sorts below everything, tags that normalize
/// to semver sort above opaque tags, and opaque tags compare lexically.
/// Build metadata is dropped on parse, so `1.0.0+build.2` equals `1.0.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Version {
    #[default]
    Unknown,
    Opaque(String),
    Semver(semver::Version),
}

impl Version {
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let trimmed = tag.trim();
        let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Self::Unknown;
        }

        match parse_semver(trimmed) {
            Some(mut version) => {
                version.build = semver::BuildMetadata::EMPTY;
                Self::Semver(version)
            }
            None => Self::Opaque(trimmed.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Opaque(_) => 1,
            Self::Semver(_) => 2,
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Semver(a), Self::Semver(b)) => a.cmp(b),
            (Self::Opaque(a), Self::Opaque(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Opaque(tag) => write!(f, "{tag}"),
            Self::Semver(version) => write!(f, "{version}"),
        }
    }
}

/// Release metadata as published by the upstream release API.
///
/// `Release::default()` means "no release known" and is older than any
/// release carrying a version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    pub version: Version,
    pub name: String,
    pub changelog: String,
    pub download_url: Option<String>,
    pub download_size: Option<u64>,
    pub download_sha256: Option<String>,
}

impl Release {
    /// Baseline release for the currently installed version.
    #[must_use]
    pub fn installed(version: &str) -> Self {
        Self {
            version: Version::parse(version),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_newer_than(&self, other: &Release) -> bool {
        self.version > other.version
    }
}

fn parse_semver(version: &str) -> Option<semver::Version> {
    if let Ok(parsed) = semver::Version::parse(version) {
        return Some(parsed);
    }

    let (core, suffix) = split_semver_core_and_suffix(version);
    let mut parts = core.split('.');
    let major = parts.next()?.parse::<u64>().ok()?;
    let minor = parts.next().map(str::parse::<u64>).transpose().ok()?;
    let patch = parts.next().map(str::parse::<u64>).transpose().ok()?;

    if parts.next().is_some() {
        return None;
    }

    let normalized = match (minor, patch) {
        (None, None) => format!("{major}.0.0{suffix}"),
        (Some(minor), None) => format!("{major}.{minor}.0{suffix}"),
        (Some(minor), Some(patch)) => format!("{major}.{minor}.{patch}{suffix}"),
        (None, Some(_)) => return None,
    };

    semver::Version::parse(&normalized).ok()
}

fn split_semver_core_and_suffix(version: &str) -> (&str, &str) {
    let suffix_idx = version.find(['-', '+']).unwrap_or(version.len());
    (&version[..suffix_idx], &version[suffix_idx..])
}
