//! SHACL prefix declarations for every non-obsolete record.
//!
//! Output is a Turtle document with one blank node carrying an
//! `sh:declare` entry per prefix, for tools that resolve OBO CURIEs through
//! SHACL.

use std::collections::BTreeMap;

use crate::models::RegistryRecord;

/// Prefix used for OBO PURL namespaces.
pub const OBO_NAMESPACE: &str = "http://purl.obolibrary.org/obo/";

/// `preferredPrefix`, or the upper-cased id, of each non-obsolete record.
pub fn preferred_prefixes(records: &BTreeMap<String, RegistryRecord>) -> Vec<String> {
    let mut prefixes: Vec<String> = records
        .values()
        .filter(|r| !r.is_obsolete())
        .map(|r| {
            r.fields
                .preferred_prefix
                .clone()
                .unwrap_or_else(|| r.id.to_uppercase())
        })
        .collect();
    prefixes.sort();
    prefixes.dedup();
    prefixes
}

pub fn render_shacl(prefixes: &[String]) -> String {
    let entries = prefixes
        .iter()
        .map(|p| {
            format!(
                "    [ sh:prefix \"{p}\" ; sh:namespace \"{ns}{p}_\" ]",
                p = p,
                ns = OBO_NAMESPACE
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "@prefix sh:\t<http://www.w3.org/ns/shacl#> .\n[\n  sh:declare\n{}\n]\n",
        entries
    )
}
