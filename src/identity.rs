//! Identity resolution against Wikidata.
//!
//! Two query shapes:
//!
//! - **Forward resolution** maps local identifiers (ORCIDs, GitHub logins)
//!   to Wikidata QIDs with one query whose `VALUES` block enumerates every
//!   identifier.
//! - **Discovery** lists contributors for whom Wikidata has no item yet.
//!   Contributors in the curated exclusion set or override table are left
//!   out of the query entirely, so the result only ever contains people
//!   nobody has triaged.
//!
//! Nothing here writes anywhere. Results are printed for a curator, who
//! folds them back into the curation file or submits edits by hand.

use std::collections::BTreeMap;

use crate::contributors::ContributorIndex;
use crate::curation::Curation;
use crate::error::Result;
use crate::models::UnresolvedCandidate;
use crate::sparql::{entity_id, quote, string_literals, value, GraphQuery};

/// ORCID iD.
pub const P_ORCID: &str = "P496";
/// GitHub username.
pub const P_GITHUB: &str = "P2037";
/// Part of.
pub const P_PART_OF: &str = "P361";
/// Short name.
pub const P_SHORT_NAME: &str = "P1813";
/// The OBO Foundry.
pub const Q_OBO_FOUNDRY: &str = "Q4117183";

const LABEL_SERVICE: &str =
    r#"SERVICE wikibase:label { bd:serviceParam wikibase:language "[AUTO_LANGUAGE],en". }"#;

/// Query mapping each value of `?{var}` to the item carrying it under
/// `predicate`.
pub fn forward_query<'a>(
    var: &str,
    predicate: &str,
    values: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut values: Vec<&str> = values.into_iter().collect();
    values.sort_unstable();
    values.dedup();
    format!(
        "SELECT DISTINCT ?{var} ?person\nWHERE\n{{\n    VALUES ?{var} {{ {values} }}\n    ?person wdt:{predicate} ?{var} .\n}}\n",
        var = var,
        predicate = predicate,
        values = string_literals(values),
    )
}

async fn resolve_forward(
    graph: &dyn GraphQuery,
    var: &str,
    predicate: &str,
    values: &[&str],
) -> Result<BTreeMap<String, String>> {
    if values.is_empty() {
        return Ok(BTreeMap::new());
    }
    let rows = graph
        .query(&forward_query(var, predicate, values.iter().copied()))
        .await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let local = value(row, var)?;
            let person = value(row, "person")?;
            Some((local.to_string(), entity_id(person).to_string()))
        })
        .collect())
}

/// ORCID → QID for every ORCID Wikidata knows about.
pub async fn resolve_orcids(
    graph: &dyn GraphQuery,
    orcids: &[&str],
) -> Result<BTreeMap<String, String>> {
    resolve_forward(graph, "orcid", P_ORCID, orcids).await
}

/// GitHub login → QID. Curated overrides replace whatever Wikidata returns
/// and are the only source for logins Wikidata does not know.
pub async fn resolve_logins(
    graph: &dyn GraphQuery,
    logins: &[&str],
    curation: &Curation,
) -> Result<BTreeMap<String, String>> {
    let mut resolved = resolve_forward(graph, "github", P_GITHUB, logins).await?;
    for login in logins {
        if let Some(qid) = curation.override_for(login) {
            resolved.insert(login.to_string(), qid.to_string());
        }
    }
    Ok(resolved)
}

/// Query listing every OBO Foundry ontology item with its short name.
pub fn ontology_query() -> String {
    format!(
        "SELECT ?item ?prefix\nWHERE\n{{\n    ?item wdt:{part_of} wd:{foundry} .\n    ?item wdt:{short} ?prefix .\n}}\n",
        part_of = P_PART_OF,
        foundry = Q_OBO_FOUNDRY,
        short = P_SHORT_NAME,
    )
}

/// Registry id (lower-cased short name) → ontology QID.
pub async fn ontology_qids(graph: &dyn GraphQuery) -> Result<BTreeMap<String, String>> {
    let rows = graph.query(&ontology_query()).await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let prefix = value(row, "prefix")?;
            let item = value(row, "item")?;
            Some((prefix.to_lowercase(), entity_id(item).to_string()))
        })
        .collect())
}

/// Contributors that discovery should ask about, sorted by login. Names lose
/// any `"`; records are sorted and comma-joined.
pub fn discovery_candidates(
    index: &ContributorIndex,
    curation: &Curation,
) -> Vec<UnresolvedCandidate> {
    let mut candidates: Vec<UnresolvedCandidate> = index
        .iter()
        .filter(|c| !curation.is_excluded(&c.login))
        .map(|c| UnresolvedCandidate {
            login: c.login.clone(),
            name: c.name.as_ref().map(|n| n.replace('"', "")),
            records: c.records.iter().cloned().collect::<Vec<_>>().join(", "),
        })
        .collect();
    candidates.sort_by(|a, b| {
        (&a.login, &a.name, &a.records).cmp(&(&b.login, &b.name, &b.records))
    });
    candidates
}

/// Query returning the candidates with no Wikidata item bound to their
/// GitHub login.
pub fn discovery_query(candidates: &[UnresolvedCandidate]) -> String {
    let rows = candidates
        .iter()
        .map(|c| {
            let name = c
                .name
                .as_deref()
                .map(quote)
                .unwrap_or_else(|| "UNDEF".to_string());
            format!("({} {} {})", quote(&c.login), name, quote(&c.records))
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "SELECT DISTINCT ?github ?name ?ontologies ?person ?personLabel\n\
         WHERE\n\
         {{\n\
         \x20   VALUES (?github ?name ?ontologies) {{\n\
         \x20       {rows}\n\
         \x20   }}\n\
         \x20   OPTIONAL {{\n\
         \x20       ?person wdt:{github} ?github .\n\
         \x20       OPTIONAL {{ ?person wdt:{orcid} ?orcid }}\n\
         \x20   }}\n\
         \x20   FILTER(!BOUND(?person))\n\
         \x20   {service}\n\
         }}\n\
         ORDER BY DESC(?person) ?name\n",
        rows = rows,
        github = P_GITHUB,
        orcid = P_ORCID,
        service = LABEL_SERVICE,
    )
}

/// Run discovery and return the unresolved rows in service order.
pub async fn discover_unresolved(
    graph: &dyn GraphQuery,
    index: &ContributorIndex,
    curation: &Curation,
) -> Result<Vec<UnresolvedCandidate>> {
    let candidates = discovery_candidates(index, curation);
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let rows = graph.query(&discovery_query(&candidates)).await?;
    Ok(rows
        .iter()
        .filter(|row| !row.contains_key("person"))
        .filter_map(|row| {
            Some(UnresolvedCandidate {
                login: value(row, "github")?.to_string(),
                name: value(row, "name").map(str::to_string),
                records: value(row, "ontologies").unwrap_or_default().to_string(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContributorSnapshot, RecordContributors};

    fn index() -> ContributorIndex {
        let mut index = ContributorIndex::new();
        let person = |name: Option<&str>| ContributorSnapshot {
            contributions: 1,
            name: name.map(str::to_string),
            ..ContributorSnapshot::default()
        };
        index.absorb(
            "go",
            &RecordContributors::from([
                ("zed".to_string(), person(Some("Zed \"Z\" Smith"))),
                ("amy".to_string(), person(None)),
                ("dependabot[bot]".to_string(), person(None)),
            ]),
        );
        index.absorb(
            "cl",
            &RecordContributors::from([("zed".to_string(), person(Some("Zed Smith")))]),
        );
        index
    }

    #[test]
    fn forward_query_enumerates_sorted_unique_values() {
        let q = forward_query("orcid", P_ORCID, ["0000-2", "0000-1", "0000-2"]);
        assert!(q.contains(r#"VALUES ?orcid { "0000-1" "0000-2" }"#));
        assert!(q.contains("?person wdt:P496 ?orcid"));
    }

    #[test]
    fn candidates_skip_excluded_and_join_records() {
        let curation = Curation::new(vec!["dependabot[bot]".to_string()], BTreeMap::new());
        let candidates = discovery_candidates(&index(), &curation);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].login, "amy");
        assert_eq!(candidates[0].name, None);
        assert_eq!(candidates[1].login, "zed");
        assert_eq!(candidates[1].name.as_deref(), Some("Zed Smith"));
        assert_eq!(candidates[1].records, "cl, go");
    }

    #[test]
    fn discovery_query_renders_undef_and_filter() {
        let curation = Curation::default();
        let q = discovery_query(&discovery_candidates(&index(), &curation));
        assert!(q.contains(r#"("amy" UNDEF "go")"#));
        assert!(q.contains(r#"("zed" "Zed Smith" "cl, go")"#));
        assert!(q.contains("FILTER(!BOUND(?person))"));
        assert!(q.contains("ORDER BY DESC(?person) ?name"));
    }

    #[test]
    fn discovery_query_escapes_line_breaks_in_names() {
        let candidates = vec![UnresolvedCandidate {
            login: "amy".to_string(),
            name: Some("Amy\nA.\r".to_string()),
            records: "go".to_string(),
        }];
        let q = discovery_query(&candidates);
        assert!(q.contains(r#"("amy" "Amy\nA.\r" "go")"#), "{}", q);
    }

    #[test]
    fn ontology_query_targets_foundry_members() {
        let q = ontology_query();
        assert!(q.contains("wdt:P361 wd:Q4117183"));
        assert!(q.contains("wdt:P1813 ?prefix"));
    }
}
