//! QuickStatements rows for bulk Wikidata edits.
//!
//! Rows use the pipe-separated QuickStatements v1 syntax and are only ever
//! printed; a curator pastes them into the QuickStatements tool.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::RegistryRecord;

/// Contributor to the creative work.
pub const P_CONTRIBUTOR: &str = "P767";
/// Maintained by.
pub const P_MAINTAINED_BY: &str = "P126";
/// Reference URL.
pub const S_REFERENCE_URL: &str = "S854";

pub const REGISTRY_JSONLD: &str = "https://obofoundry.org/registry/ontologies.jsonld";

/// `ontology|P767|person` for every contributor whose login and record both
/// resolved, ordered by record then login.
pub fn contributor_statements(
    ontology_qids: &BTreeMap<String, String>,
    record_logins: &BTreeMap<String, BTreeSet<String>>,
    login_qids: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut rows = Vec::new();
    for (record, logins) in record_logins {
        let Some(ontology) = ontology_qids.get(record) else {
            continue;
        };
        for login in logins {
            if let Some(person) = login_qids.get(login) {
                rows.push(format!("{}|{}|{}", ontology, P_CONTRIBUTOR, person));
            }
        }
    }
    rows
}

/// `ontology|P126|person|S854|"…ontologies.jsonld"` for every record whose
/// contact ORCID resolved, ordered by record id.
pub fn maintainer_statements(
    records: &[RegistryRecord],
    ontology_qids: &BTreeMap<String, String>,
    orcid_qids: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut sorted: Vec<&RegistryRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));
    sorted
        .into_iter()
        .filter_map(|record| {
            let ontology = ontology_qids.get(&record.id)?;
            let person = orcid_qids.get(record.contact_orcid()?)?;
            Some(format!(
                "{}|{}|{}|{}|\"{}\"",
                ontology, P_MAINTAINED_BY, person, S_REFERENCE_URL, REGISTRY_JSONLD
            ))
        })
        .collect()
}

pub fn render(rows: &[String]) -> String {
    rows.join("\n")
}
