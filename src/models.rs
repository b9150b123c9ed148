//! Core data models used throughout the toolkit.
//!
//! These types represent registry records read from the metadata store,
//! contributor snapshots fetched from GitHub, and the rows produced by
//! identity resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One ontology entry from the metadata store.
#[derive(Debug, Clone)]
pub struct RegistryRecord {
    /// Registry identifier (lowercase prefix, e.g. `"go"`).
    pub id: String,
    /// File the record was read from.
    pub path: PathBuf,
    /// Raw front-matter text between the two `---` markers.
    pub block: String,
    /// Parsed front matter, in document order.
    pub metadata: serde_yaml::Mapping,
    /// Typed view over the fields the pipelines and checks use.
    pub fields: RecordFields,
    /// Text after the closing marker, lines concatenated without separators.
    pub long_description: String,
    /// Why the front matter did not fit [`RecordFields`]. When set, `fields`
    /// holds only the id and the record is reported by the `field_shape`
    /// check instead of failing the whole store.
    pub shape_error: Option<String>,
}

impl RegistryRecord {
    pub fn is_active(&self) -> bool {
        self.fields.activity_status == Some(ActivityStatus::Active)
    }

    pub fn is_obsolete(&self) -> bool {
        self.fields.is_obsolete || self.fields.activity_status == Some(ActivityStatus::Obsolete)
    }

    /// ORCID of the record's contact person, if declared.
    pub fn contact_orcid(&self) -> Option<&str> {
        self.fields.contact.as_ref()?.orcid.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFields {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "preferredPrefix", default)]
    pub preferred_prefix: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub publications: Vec<Publication>,
    #[serde(default)]
    pub usages: Vec<Usage>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub activity_status: Option<ActivityStatus>,
    #[serde(default)]
    pub is_obsolete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Active,
    Inactive,
    Orphaned,
    Obsolete,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct License {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Publication {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub preferred: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub publications: Vec<Publication>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dependency {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl Dependency {
    pub fn is_bridge(&self) -> bool {
        self.kind.as_deref() == Some("BridgeOntology")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Product {
    pub id: String,
}

/// Contributor entry as returned by `GET /repos/{owner}/{name}/contributors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoContributor {
    pub login: String,
    #[serde(default)]
    pub contributions: u64,
}

/// Per-record view of one contributor, as persisted in the snapshot cache.
///
/// Every field is defaulted so snapshots written by older runs still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorSnapshot {
    #[serde(default)]
    pub contributions: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub twitter_username: Option<String>,
}

impl ContributorSnapshot {
    /// Combine a contributor-list entry with the user's public profile.
    pub fn from_profile(contributions: u64, profile: &serde_json::Value) -> Self {
        let field = |key: &str| {
            profile
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };
        Self {
            contributions,
            name: field("name"),
            email: field("email"),
            bio: field("bio"),
            blog: field("blog"),
            company: field("company"),
            twitter_username: field("twitter_username"),
        }
    }
}

/// Snapshot of all contributors to one record's repository, keyed by login.
pub type RecordContributors = BTreeMap<String, ContributorSnapshot>;

/// A contributor merged across every record they contributed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub blog: Option<String>,
    pub company: Option<String>,
    pub twitter_username: Option<String>,
    /// Contribution count per registry identifier.
    pub contributions: BTreeMap<String, u64>,
    /// Registry identifiers contributed to.
    pub records: std::collections::BTreeSet<String>,
}

/// A contributor with no matching Wikidata item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedCandidate {
    pub login: String,
    pub name: Option<String>,
    /// Comma-joined, sorted registry identifiers.
    pub records: String,
}
