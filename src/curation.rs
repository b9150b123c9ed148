//! Curated identity knowledge.
//!
//! Two hand-maintained tables live in a TOML file next to the main config:
//!
//! ```toml
//! # Accounts that are not people, or that will never be resolvable.
//! exclude = ["github-actions[bot]", "dependabot[bot]"]
//!
//! # Logins already matched to a Wikidata item by hand.
//! [overrides]
//! some-login = "Q123"
//! ```
//!
//! Every override key is also treated as excluded, so discovery never asks
//! about a contributor that has already been triaged.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Default)]
struct CurationFile {
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Curation {
    exclusions: BTreeSet<String>,
    overrides: BTreeMap<String, String>,
}

impl Curation {
    /// Build from an exclusion list and an override table. Override keys are
    /// merged into the exclusion set.
    pub fn new(
        exclude: impl IntoIterator<Item = String>,
        overrides: BTreeMap<String, String>,
    ) -> Self {
        let mut exclusions: BTreeSet<String> = exclude.into_iter().collect();
        exclusions.extend(overrides.keys().cloned());
        Self {
            exclusions,
            overrides,
        }
    }

    /// Load the curation file. No configured path means no curation.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when a configured file is missing or is not
    /// valid TOML of the expected shape.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "cannot read curation file {}: {}",
                path.display(),
                e
            ))
        })?;
        let file: CurationFile = toml::from_str(&text).map_err(|e| {
            Error::Configuration(format!("invalid curation file {}: {}", path.display(), e))
        })?;
        Ok(Self::new(file.exclude, file.overrides))
    }

    /// Whether `login` is excluded, matching either exactly or lower-cased.
    pub fn is_excluded(&self, login: &str) -> bool {
        self.exclusions.contains(login) || self.exclusions.contains(&login.to_lowercase())
    }

    /// Hand-curated Wikidata QID for `login`.
    pub fn override_for(&self, login: &str) -> Option<&str> {
        self.overrides.get(login).map(String::as_str)
    }

    pub fn overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }

    pub fn exclusion_count(&self) -> usize {
        self.exclusions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn overrides_are_excluded() {
        let curation = Curation::new(
            vec!["uberon".to_string()],
            BTreeMap::from([("seljaseppala".to_string(), "Q1".to_string())]),
        );
        assert!(curation.is_excluded("seljaseppala"));
        assert!(curation.is_excluded("uberon"));
        assert!(!curation.is_excluded("someone-else"));
        assert_eq!(curation.override_for("seljaseppala"), Some("Q1"));
    }

    #[test]
    fn exclusion_matches_exact_and_lowercase() {
        let curation = Curation::new(
            vec!["wmbio".to_string(), "GoogleCodeExporter".to_string()],
            BTreeMap::new(),
        );
        assert!(curation.is_excluded("WMBio"));
        assert!(curation.is_excluded("GoogleCodeExporter"));
        assert!(!curation.is_excluded("googlecodeexporter-bot"));
    }

    #[test]
    fn load_reads_toml_and_tolerates_absent_path() {
        assert_eq!(Curation::load(None).unwrap(), Curation::default());

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("curation.toml");
        std::fs::write(
            &path,
            "exclude = [\"dependabot[bot]\"]\n\n[overrides]\nsjbost = \"Q2\"\n",
        )
        .unwrap();
        let curation = Curation::load(Some(&path)).unwrap();
        assert_eq!(curation.exclusion_count(), 2);
        assert!(curation.is_excluded("sjbost"));
    }

    #[test]
    fn shipped_curation_file_covers_triaged_people() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/curation.toml");
        let curation = Curation::load(Some(&path)).unwrap();
        for login in [
            "dependabot[bot]",
            "WMBio",
            "Antonarctica",
            "CMCosta",
            "seljaseppala",
            "sjbost",
            "adbartni",
        ] {
            assert!(curation.is_excluded(login), "{} not excluded", login);
        }
        assert!(curation.exclusion_count() >= 40);
    }

    #[test]
    fn missing_configured_file_is_configuration_error() {
        let err = Curation::load(Some(Path::new("/nonexistent/curation.toml"))).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
