//! Known OpenRGB builds and where to download them.

use anyhow::{bail, Result};
use std::{fmt, str::FromStr};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Release {
    Master,
    V0_9,
    V0_8,
    V0_7,
    V0_6,
}

impl Release {
    /// In the order the version selector offers them; the first is the default.
    pub const ALL: [Release; 5] = [
        Release::Master,
        Release::V0_9,
        Release::V0_8,
        Release::V0_7,
        Release::V0_6,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Release::Master => "Master",
            Release::V0_9 => "0.9",
            Release::V0_8 => "0.8",
            Release::V0_7 => "0.7",
            Release::V0_6 => "0.6",
        }
    }

    pub fn url(self) -> &'static str {
        match self {
            Release::Master => {
                "https://gitlab.com/CalcProgrammer1/OpenRGB/-/jobs/artifacts/master/download?job=Windows%2064"
            }
            Release::V0_9 => {
                "https://openrgb.org/releases/release_0.9/OpenRGB_0.9_Windows_64_b5f46e3.zip"
            }
            Release::V0_8 => {
                "https://openrgb.org/releases/release_0.8/OpenRGB_0.8_Windows_64_fb88964.zip"
            }
            Release::V0_7 => {
                "https://openrgb.org/releases/release_0.7/OpenRGB_0.7_Windows_64_6128731.zip"
            }
            Release::V0_6 => {
                "https://openrgb.org/releases/release_0.6/OpenRGB_0.6_Windows_64_405ff7f.zip"
            }
        }
    }

    pub fn from_label(label: &str) -> Option<Release> {
        let label = label.trim();
        Release::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Release {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Release::from_label(s).ok_or_else(|| {
            let known: Vec<&str> = Release::ALL.iter().map(|r| r.label()).collect();
            format!("unknown release '{s}' (known: {})", known.join(", "))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub release: Release,
    pub url: String,
    pub sha256: Option<String>,
}

/// The effective release table: built-in URLs with any config overrides applied.
///
/// Entries are stored in [`Release::ALL`] order, so a release's discriminant
/// is its index.
#[derive(Debug, Clone)]
pub struct ReleaseTable {
    entries: Vec<ReleaseEntry>,
    default: Release,
}

impl ReleaseTable {
    pub fn builtin() -> Self {
        let entries = Release::ALL
            .into_iter()
            .map(|release| ReleaseEntry {
                release,
                url: release.url().to_string(),
                sha256: None,
            })
            .collect();
        Self {
            entries,
            default: Release::ALL[0],
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut table = Self::builtin();
        if let Some(label) = config.default_release.as_deref() {
            table.default = parse_label(label, "default_release")?;
        }
        for ov in &config.releases {
            let release = parse_label(&ov.label, "releases.label")?;
            let entry = &mut table.entries[release as usize];
            if let Some(url) = ov.url.as_deref() {
                let url = url.trim();
                if url.is_empty() {
                    bail!("releases.url for {} is empty", release.label());
                }
                entry.url = url.to_string();
            }
            if let Some(sha) = ov.sha256.as_deref() {
                if !sha.trim().is_empty() {
                    entry.sha256 = Some(sha.trim().to_string());
                }
            }
        }
        Ok(table)
    }

    pub fn get(&self, release: Release) -> &ReleaseEntry {
        &self.entries[release as usize]
    }

    pub fn default_release(&self) -> Release {
        self.default
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReleaseEntry> {
        self.entries.iter()
    }
}

fn parse_label(label: &str, key: &str) -> Result<Release> {
    match Release::from_label(label) {
        Some(r) => Ok(r),
        None => bail!("{key}: unknown release '{label}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReleaseOverride;
    use std::collections::HashSet;

    #[test]
    fn every_release_has_a_distinct_well_formed_url() {
        let mut seen = HashSet::new();
        for release in Release::ALL {
            let url = reqwest::Url::parse(release.url()).unwrap();
            assert_eq!(url.scheme(), "https", "{release}");
            assert!(url.host_str().is_some(), "{release}");
            assert!(seen.insert(release.url()), "duplicate url for {release}");
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn labels_round_trip_through_from_label() {
        for release in Release::ALL {
            assert_eq!(Release::from_label(release.label()), Some(release));
        }
        assert_eq!(Release::from_label("master"), Some(Release::Master));
        assert_eq!(Release::from_label("1.0"), None);
    }

    #[test]
    fn release_0_8_points_at_the_fb88964_build() {
        assert_eq!(
            Release::V0_8.url(),
            "https://openrgb.org/releases/release_0.8/OpenRGB_0.8_Windows_64_fb88964.zip"
        );
    }

    #[test]
    fn from_str_lists_known_labels_on_error() {
        let err = "0.5".parse::<Release>().unwrap_err();
        assert!(err.contains("Master, 0.9, 0.8, 0.7, 0.6"));
    }

    #[test]
    fn config_overrides_url_checksum_and_default() {
        let config = Config {
            default_release: Some("0.9".to_string()),
            releases: vec![ReleaseOverride {
                label: "0.9".to_string(),
                url: Some("https://mirror.example/OpenRGB_0.9.zip".to_string()),
                sha256: Some("ABCDEF".to_string()),
            }],
            ..Config::default()
        };
        let table = ReleaseTable::from_config(&config).unwrap();
        assert_eq!(table.default_release(), Release::V0_9);
        let entry = table.get(Release::V0_9);
        assert_eq!(entry.url, "https://mirror.example/OpenRGB_0.9.zip");
        assert_eq!(entry.sha256.as_deref(), Some("ABCDEF"));
        assert_eq!(table.get(Release::V0_8).url, Release::V0_8.url());
    }

    #[test]
    fn config_with_unknown_label_is_rejected() {
        let config = Config {
            default_release: Some("0.1".to_string()),
            ..Config::default()
        };
        let err = ReleaseTable::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("unknown release '0.1'"));
    }
}
