//! Offline checks: everything that can be decided from the store alone.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::checks::Failure;
use crate::config::GrandfatheredPublication;
use crate::error::Result;
use crate::models::{Publication, RegistryRecord};
use crate::store;

pub const PUBMED_PREFIX: &str = "https://www.ncbi.nlm.nih.gov/pubmed/";
pub const ZENODO_PREFIX: &str = "https://zenodo.org/record/";
pub const DOI_PREFIX: &str = "https://doi.org/";
pub const ARXIV_PREFIX: &str = "https://arxiv.org/abs/";
pub const BIORXIV_PREFIX: &str = "https://www.biorxiv.org/content/";
pub const MEDRXIV_PREFIX: &str = "https://www.medrxiv.org/content/";
pub const CHEMRXIV_DOI_PREFIX: &str = "https://doi.org/10.26434/chemrxiv";

/// Schema keys whose required status legitimately differs from their level.
const SCHEMA_SKIP_KEYS: [&str; 3] = ["in_foundry", "products", "usages"];

/// Records whose front matter parsed but did not have the expected field
/// types.
pub fn field_shape(records: &BTreeMap<String, RegistryRecord>) -> Vec<Failure> {
    records
        .values()
        .filter_map(|record| {
            let error = record.shape_error.as_deref()?;
            Some(Failure::new(&record.id, "front matter", "unexpected field shape").actual(error))
        })
        .collect()
}

/// Dependency ids are sorted, unique, and name records in the store. Bridge
/// ontologies are namespaced under their parent record instead.
pub fn dependencies(records: &BTreeMap<String, RegistryRecord>) -> Vec<Failure> {
    let mut failures = Vec::new();
    for (id, record) in records {
        let deps = &record.fields.dependencies;
        if deps.is_empty() {
            continue;
        }
        let ids: Vec<&str> = deps.iter().map(|d| d.id.as_str()).collect();

        let mut sorted = ids.clone();
        sorted.sort_unstable();
        if sorted != ids {
            failures.push(
                Failure::new(id, "dependencies", "dependencies should be sorted by id")
                    .expected(sorted.join(", "))
                    .actual(ids.join(", ")),
            );
        }

        let mut seen = BTreeSet::new();
        let duplicates: BTreeSet<&str> = ids.iter().copied().filter(|d| !seen.insert(*d)).collect();
        for dup in duplicates {
            failures.push(
                Failure::new(id, "dependencies", "dependencies should be unique").actual(dup),
            );
        }

        for (i, dep) in deps.iter().enumerate() {
            if dep.is_bridge() {
                let prefix = format!("{}/", id);
                if !dep.id.starts_with(&prefix) {
                    failures.push(
                        Failure::new(
                            id,
                            format!("dependencies[{}]", i),
                            "bridge ontology must be namespaced under its record",
                        )
                        .expected(format!("{}...", prefix))
                        .actual(&dep.id),
                    );
                }
            } else if !records.contains_key(&dep.id) {
                failures.push(
                    Failure::new(
                        id,
                        format!("dependencies[{}]", i),
                        "unknown dependency",
                    )
                    .actual(&dep.id),
                );
            }
        }
    }
    failures
}

/// Validate a publication identifier.
///
/// Accepts PubMed and Zenodo URLs with numeric ids, DOIs, and arXiv,
/// bioRxiv and medRxiv URLs. Preprint identifiers must be unversioned.
pub fn validate_publication_id(id: &str) -> std::result::Result<(), String> {
    if id.ends_with('/') {
        return Err("publication id must not end with '/'".to_string());
    }

    let numeric_after = |prefix: &str| {
        id.strip_prefix(prefix)
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    };
    let is_preprint = [ARXIV_PREFIX, BIORXIV_PREFIX, MEDRXIV_PREFIX]
        .iter()
        .any(|p| id.starts_with(p));
    let recognised = is_preprint
        || numeric_after(PUBMED_PREFIX)
        || numeric_after(ZENODO_PREFIX)
        || id.starts_with(DOI_PREFIX);

    if !recognised {
        return Err(format!("unrecognised publication identifier: {}", id));
    }
    if (is_preprint || id.starts_with(CHEMRXIV_DOI_PREFIX)) && has_version_suffix(id) {
        return Err(format!("use the unversioned preprint identifier: {}", id));
    }
    Ok(())
}

/// Trailing `v<digits>`, directly after a digit or a `.`.
fn has_version_suffix(id: &str) -> bool {
    let without_digits = id.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() == id.len() {
        return false;
    }
    let Some(before_v) = without_digits.strip_suffix('v') else {
        return false;
    };
    before_v.ends_with('.') || before_v.ends_with(|c: char| c.is_ascii_digit())
}

fn check_publication(
    record: &str,
    field: &str,
    publication: &Publication,
    failures: &mut Vec<Failure>,
) {
    if publication.title.is_none() {
        failures.push(Failure::new(record, field, "publication has no title"));
    }
    match publication.id.as_deref() {
        None => failures.push(Failure::new(record, field, "publication has no id")),
        Some(id) => {
            if let Err(message) = validate_publication_id(id) {
                failures.push(Failure::new(record, field, message).actual(id));
            }
        }
    }
}

/// At most one preferred publication; every publication and usage
/// publication carries a title and a recognised identifier.
pub fn publications(
    records: &BTreeMap<String, RegistryRecord>,
    grandfathered: &[GrandfatheredPublication],
) -> Vec<Failure> {
    let mut failures = Vec::new();
    for (id, record) in records {
        let pubs = &record.fields.publications;

        let preferred = pubs.iter().filter(|p| p.preferred).count();
        if preferred > 1 {
            failures.push(
                Failure::new(id, "publications", "only one publication can be preferred")
                    .expected("at most 1")
                    .actual(preferred.to_string()),
            );
        }

        for (i, publication) in pubs.iter().enumerate() {
            let exempt = publication.id.as_deref().is_some_and(|pid| {
                grandfathered
                    .iter()
                    .any(|g| g.record == *id && pid.starts_with(&g.prefix))
            });
            if !exempt {
                check_publication(id, &format!("publications[{}]", i), publication, &mut failures);
            }
        }

        for (i, usage) in record.fields.usages.iter().enumerate() {
            if usage.publications.is_empty() {
                continue;
            }
            if usage.user.is_none() {
                failures.push(Failure::new(
                    id,
                    format!("usages[{}]", i),
                    "usage with publications has no user",
                ));
            }
            for (j, publication) in usage.publications.iter().enumerate() {
                check_publication(
                    id,
                    &format!("usages[{}].publications[{}]", i, j),
                    publication,
                    &mut failures,
                );
            }
        }
    }
    failures
}

/// Active records declare a usable `preferredPrefix` that matches their id
/// case-insensitively.
pub fn preferred_prefix(
    records: &BTreeMap<String, RegistryRecord>,
    exempt: &[String],
) -> Vec<Failure> {
    let mut failures = Vec::new();
    for (id, record) in records.iter().filter(|(_, r)| r.is_active()) {
        let Some(prefix) = record.fields.preferred_prefix.as_deref() else {
            failures.push(Failure::new(id, "preferredPrefix", "missing preferredPrefix"));
            continue;
        };
        if prefix.chars().count() < 2 {
            failures.push(
                Failure::new(id, "preferredPrefix", "preferredPrefix is too short")
                    .expected("at least 2 characters")
                    .actual(prefix),
            );
        }
        if prefix.chars().any(char::is_whitespace) {
            failures.push(
                Failure::new(id, "preferredPrefix", "preferredPrefix contains whitespace")
                    .actual(prefix),
            );
        }
        if !exempt.iter().any(|e| e == id) && prefix.to_lowercase() != id.to_lowercase() {
            failures.push(
                Failure::new(id, "preferredPrefix", "preferredPrefix does not match id")
                    .expected(id.to_uppercase())
                    .actual(prefix),
            );
        }
    }
    failures
}

fn normalize_description(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\n' | ' ' | '.' | '-'))
        .collect()
}

/// The short `description` of an active record must not just repeat the
/// long description.
pub fn redundant_descriptions(records: &BTreeMap<String, RegistryRecord>) -> Vec<Failure> {
    records
        .iter()
        .filter(|(_, r)| r.is_active())
        .filter_map(|(id, record)| {
            let description = record.fields.description.as_deref()?;
            (normalize_description(description)
                == normalize_description(&record.long_description))
            .then(|| {
                Failure::new(
                    id,
                    "description",
                    "description is redundant with the long description",
                )
            })
        })
        .collect()
}

/// Every front-matter block is already in canonical form.
pub fn standardized(records: &BTreeMap<String, RegistryRecord>) -> Result<Vec<Failure>> {
    let mut failures = Vec::new();
    for (id, record) in records {
        if !store::is_standardized(record)? {
            failures.push(Failure::new(
                id,
                "front matter",
                "front matter is not in canonical form (run `obo standardize`)",
            ));
        }
    }
    Ok(failures)
}

pub fn load_schema(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Schema `required` keys agree with properties whose `level` is warning or
/// error.
pub fn schema_required(schema: &serde_json::Value) -> Vec<Failure> {
    let skip: BTreeSet<&str> = SCHEMA_SKIP_KEYS.into_iter().collect();

    let required: BTreeSet<&str> = schema
        .get("required")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str())
        .filter(|k| !skip.contains(k))
        .collect();
    let high_level: BTreeSet<&str> = schema
        .get("properties")
        .and_then(|v| v.as_object())
        .into_iter()
        .flatten()
        .filter(|(_, conf)| {
            matches!(
                conf.get("level").and_then(|l| l.as_str()),
                Some("warning") | Some("error")
            )
        })
        .map(|(k, _)| k.as_str())
        .filter(|k| !skip.contains(k))
        .collect();

    let mut failures = Vec::new();
    for key in required.difference(&high_level) {
        failures.push(
            Failure::new("schema", *key, "required key is not at warning or error level")
                .expected("warning|error"),
        );
    }
    for key in high_level.difference(&required) {
        failures.push(
            Failure::new("schema", *key, "warning/error level key is not required")
                .expected("required"),
        );
    }
    failures
}
