//! Library-level tests for the aggregation and identity pipelines.
//!
//! GitHub and Wikidata are replaced by in-memory implementations of the
//! `CodeHost` and `GraphQuery` traits, so these tests exercise the real
//! cache layout and query construction without touching the network.

use async_trait::async_trait;
use obo_curation::config::CacheConfig;
use obo_curation::contributors::Aggregator;
use obo_curation::curation::Curation;
use obo_curation::error::{Error, Result};
use obo_curation::github::CodeHost;
use obo_curation::identity;
use obo_curation::models::RepoContributor;
use obo_curation::progress::{NoProgress, ProgressEvent, ProgressReporter};
use obo_curation::sparql::{parse_bindings, Binding, GraphQuery};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

// ─── Fake GitHub ────────────────────────────────────────────────────

struct FakeHost {
    repos: BTreeMap<String, Vec<(String, u64)>>,
    calls: AtomicUsize,
}

impl FakeHost {
    fn new(repos: &[(&str, Vec<(&str, u64)>)]) -> Self {
        Self {
            repos: repos
                .iter()
                .map(|(repo, people)| {
                    (
                        repo.to_string(),
                        people.iter().map(|(l, n)| (l.to_string(), *n)).collect(),
                    )
                })
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeHost for FakeHost {
    async fn contributors(&self, owner: &str, name: &str) -> Result<Vec<RepoContributor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = format!("{}/{}", owner, name);
        let people = self
            .repos
            .get(&key)
            .ok_or_else(|| Error::Transport {
                url: key.clone(),
                message: "404".to_string(),
            })?;
        Ok(people
            .iter()
            .map(|(login, contributions)| RepoContributor {
                login: login.clone(),
                contributions: *contributions,
            })
            .collect())
    }

    async fn user(&self, login: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "login": login,
            "name": format!("Name of {}", login),
            "email": null,
            "bio": null,
            "blog": "",
            "company": null,
            "twitter_username": null,
            "followers": 3
        }))
    }

    async fn repository(&self, _owner: &str, _name: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"default_branch": "main"}))
    }
}

// ─── Fake Wikidata ──────────────────────────────────────────────────

struct FakeGraph {
    response: String,
    queries: Mutex<Vec<String>>,
}

impl FakeGraph {
    fn new(response: Value) -> Self {
        Self {
            response: response.to_string(),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphQuery for FakeGraph {
    async fn query(&self, sparql: &str) -> Result<Vec<Binding>> {
        self.queries.lock().unwrap().push(sparql.to_string());
        parse_bindings(&self.response).map_err(|e| Error::Transport {
            url: "fake".to_string(),
            message: e,
        })
    }
}

fn literal(value: &str) -> Value {
    json!({"type": "literal", "value": value})
}

// ─── Progress capture ───────────────────────────────────────────────

#[derive(Default)]
struct Recorder(Mutex<Vec<ProgressEvent>>);

impl ProgressReporter for Recorder {
    fn report(&self, event: ProgressEvent) {
        self.0.lock().unwrap().push(event);
    }
}

fn repositories(pairs: &[(&str, &str, &str)]) -> BTreeMap<String, (String, String)> {
    pairs
        .iter()
        .map(|(id, owner, name)| (id.to_string(), (owner.to_string(), name.to_string())))
        .collect()
}

// ─── Aggregation ────────────────────────────────────────────────────

#[tokio::test]
async fn test_cold_run_writes_deterministic_snapshots() {
    let tmp = TempDir::new().unwrap();
    let cache = CacheConfig {
        root: tmp.path().to_path_buf(),
    };
    let host = FakeHost::new(&[("org/abc", vec![("Alice", 5)])]);
    let recorder = Recorder::default();

    let aggregator = Aggregator::new(&host, &cache, &recorder);
    let (index, stats) = aggregator
        .run(&repositories(&[("abc", "org", "abc")]))
        .await
        .unwrap();

    assert_eq!(stats.fetched, 1);
    assert_eq!(host.calls(), 2); // contributors + one profile
    assert_eq!(index.get("Alice").unwrap().records.len(), 1);

    let snapshot = std::fs::read_to_string(cache.contributors_dir().join("abc_contributors.json"))
        .unwrap();
    assert_eq!(
        snapshot,
        "{\n  \"Alice\": {\n    \"bio\": null,\n    \"blog\": \"\",\n    \"company\": null,\n    \
         \"contributions\": 5,\n    \"email\": null,\n    \"name\": \"Name of Alice\",\n    \
         \"twitter_username\": null\n  }\n}"
    );
    assert!(cache.users_dir().join("alice.json").is_file());

    let events = recorder.0.lock().unwrap();
    assert_eq!(
        events[0],
        ProgressEvent::Record {
            record: "abc".to_string(),
            n: 1,
            total: 1,
            cached: false
        }
    );
}

#[tokio::test]
async fn test_cache_hit_makes_no_calls_and_keeps_bytes() {
    let tmp = TempDir::new().unwrap();
    let cache = CacheConfig {
        root: tmp.path().to_path_buf(),
    };
    let repos = repositories(&[("abc", "org", "abc"), ("xyz", "org", "xyz")]);
    let first = FakeHost::new(&[
        ("org/abc", vec![("alice", 5), ("bob", 2)]),
        ("org/xyz", vec![("alice", 1)]),
    ]);
    let (first_index, _) = Aggregator::new(&first, &cache, &NoProgress)
        .run(&repos)
        .await
        .unwrap();
    let path = cache.contributors_dir().join("abc_contributors.json");
    let before = std::fs::read(&path).unwrap();

    let second = FakeHost::new(&[]);
    let (second_index, stats) = Aggregator::new(&second, &cache, &NoProgress)
        .run(&repos)
        .await
        .unwrap();

    assert_eq!(second.calls(), 0);
    assert_eq!(stats.cached, 2);
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(first_index, second_index);
}

#[tokio::test]
async fn test_interrupted_run_resumes_remaining_records() {
    let tmp = TempDir::new().unwrap();
    let cache = CacheConfig {
        root: tmp.path().to_path_buf(),
    };
    std::fs::create_dir_all(cache.contributors_dir()).unwrap();
    std::fs::write(
        cache.contributors_dir().join("abc_contributors.json"),
        r#"{"carol": {"contributions": 9, "name": "Carol"}}"#,
    )
    .unwrap();

    // Only xyz is reachable; abc must come from the existing snapshot.
    let host = FakeHost::new(&[("org/xyz", vec![("carol", 1)])]);
    let (index, stats) = Aggregator::new(&host, &cache, &NoProgress)
        .run(&repositories(&[("abc", "org", "abc"), ("xyz", "org", "xyz")]))
        .await
        .unwrap();

    assert_eq!((stats.cached, stats.fetched), (1, 1));
    let carol = index.get("carol").unwrap();
    assert_eq!(carol.contributions["abc"], 9);
    assert_eq!(carol.contributions["xyz"], 1);
    assert_eq!(
        carol.records.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["abc", "xyz"]
    );
}

#[tokio::test]
async fn test_profile_cache_is_shared_across_records() {
    let tmp = TempDir::new().unwrap();
    let cache = CacheConfig {
        root: tmp.path().to_path_buf(),
    };
    let host = FakeHost::new(&[("org/abc", vec![("Dave", 1)]), ("org/xyz", vec![("dave", 2)])]);

    Aggregator::new(&host, &cache, &NoProgress)
        .run(&repositories(&[("abc", "org", "abc"), ("xyz", "org", "xyz")]))
        .await
        .unwrap();

    // Two contributor listings, one profile fetch (keys are lower-cased).
    assert_eq!(host.calls(), 3);
}

// ─── Identity ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_discovery_never_queries_overridden_logins() {
    let tmp = TempDir::new().unwrap();
    let cache = CacheConfig {
        root: tmp.path().to_path_buf(),
    };
    let host = FakeHost::new(&[(
        "org/abc",
        vec![("seljaseppala", 4), ("newperson", 1), ("Dependabot[bot]", 7)],
    )]);
    let (index, _) = Aggregator::new(&host, &cache, &NoProgress)
        .run(&repositories(&[("abc", "org", "abc")]))
        .await
        .unwrap();

    let curation = Curation::new(
        vec!["dependabot[bot]".to_string()],
        BTreeMap::from([("seljaseppala".to_string(), "Q1".to_string())]),
    );
    let graph = FakeGraph::new(json!({"results": {"bindings": [
        {"github": literal("newperson"), "name": literal("Name of newperson"), "ontologies": literal("abc")}
    ]}}));

    let unresolved = identity::discover_unresolved(&graph, &index, &curation)
        .await
        .unwrap();

    let queries = graph.queries();
    assert_eq!(queries.len(), 1);
    assert!(!queries[0].contains("seljaseppala"));
    assert!(!queries[0].contains("Dependabot"));
    assert!(queries[0].contains(r#"("newperson" "Name of newperson" "abc")"#));

    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].login, "newperson");
    assert!(unresolved.iter().all(|u| u.login != "seljaseppala"));
}

#[tokio::test]
async fn test_discovery_with_nothing_to_ask_skips_the_query() {
    let index = obo_curation::contributors::ContributorIndex::new();
    let graph = FakeGraph::new(json!({"results": {"bindings": []}}));
    let rows = identity::discover_unresolved(&graph, &index, &Curation::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert!(graph.queries().is_empty());
}

#[tokio::test]
async fn test_login_resolution_prefers_overrides() {
    let graph = FakeGraph::new(json!({"results": {"bindings": [
        {"github": literal("alice"), "person": {"type": "uri", "value": "http://www.wikidata.org/entity/Q100"}},
        {"github": literal("seljaseppala"), "person": {"type": "uri", "value": "http://www.wikidata.org/entity/Q200"}}
    ]}}));
    let curation = Curation::new(
        Vec::new(),
        BTreeMap::from([
            ("seljaseppala".to_string(), "Q1".to_string()),
            ("offline".to_string(), "Q2".to_string()),
        ]),
    );

    let resolved = identity::resolve_logins(
        &graph,
        &["alice", "seljaseppala", "offline", "unknown"],
        &curation,
    )
    .await
    .unwrap();

    assert_eq!(resolved["alice"], "Q100");
    assert_eq!(resolved["seljaseppala"], "Q1");
    assert_eq!(resolved["offline"], "Q2");
    assert!(!resolved.contains_key("unknown"));
    assert!(graph.queries()[0].contains("wdt:P2037"));
}

#[tokio::test]
async fn test_orcid_resolution_uses_single_values_query() {
    let graph = FakeGraph::new(json!({"results": {"bindings": [
        {"orcid": literal("0000-0001-0000-0001"), "person": {"type": "uri", "value": "http://www.wikidata.org/entity/Q7"}}
    ]}}));

    let resolved = identity::resolve_orcids(&graph, &["0000-0001-0000-0001", "0000-0002-0000-0002"])
        .await
        .unwrap();

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved["0000-0001-0000-0001"], "Q7");
    let queries = graph.queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains(r#"VALUES ?orcid { "0000-0001-0000-0001" "0000-0002-0000-0002" }"#));

    assert!(identity::resolve_orcids(&graph, &[]).await.unwrap().is_empty());
    assert_eq!(graph.queries().len(), 1);
}
