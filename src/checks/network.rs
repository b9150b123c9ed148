//! Network checks: PURL configuration, OBO Graph content, and GitHub
//! repository hygiene.
//!
//! These are slow and depend on services outside the registry's control, so
//! the CLI only runs them with `--network`. A request that fails outright is
//! reported as a failure for that record; the remaining records are still
//! checked.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::checks::{CheckReport, Failure};
use crate::error::{Error, Result};
use crate::github::CodeHost;
use crate::models::RegistryRecord;
use crate::store::github_repository;

pub const PURL_BASE: &str = "http://purl.obolibrary.org/obo/";
pub const ROOT_TERM_PROPERTY: &str = "http://purl.obolibrary.org/obo/IAO_0000700";
pub const VERSION_INFO_PROPERTY: &str = "http://www.w3.org/2002/07/owl#versionInfo";

/// Repository licenses accepted for registry ontologies.
pub const ALLOWED_SPDX: [&str; 3] = ["CC0-1.0", "CC-BY-3.0", "CC-BY-4.0"];

/// SPDX identifier for a registry license label.
pub fn spdx_for_label(label: &str) -> Option<&'static str> {
    match label {
        "CC BY 4.0" => Some("CC-BY-4.0"),
        "CC BY 3.0" => Some("CC-BY-3.0"),
        "CC0" => Some("CC0-1.0"),
        _ => None,
    }
}

/// Plain HTTP access for checks that look at arbitrary URLs.
#[async_trait]
pub trait WebProbe: Send + Sync {
    /// HTTP status of a GET on `url`.
    async fn status(&self, url: &str) -> Result<u16>;

    /// Body of `url` decoded as JSON. Non-success statuses are errors.
    async fn json(&self, url: &str) -> Result<serde_json::Value>;
}

pub struct HttpProbe {
    http: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("obo-curation/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl WebProbe for HttpProbe {
    async fn status(&self, url: &str) -> Result<u16> {
        let response = self.http.get(url).send().await?;
        Ok(response.status().as_u16())
    }

    async fn json(&self, url: &str) -> Result<serde_json::Value> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(url, format!("HTTP {}", status)));
        }
        Ok(response.json().await?)
    }
}

/// Check an OBO Graph JSON document for record `id`.
pub fn check_obograph(id: &str, document: &serde_json::Value) -> Vec<Failure> {
    let fail = |message: &str| Failure::new(id, "obograph", message);

    let Some(graphs) = document.get("graphs").and_then(|g| g.as_array()) else {
        return vec![fail("OBO Graph JSON does not have graphs")];
    };
    let json_purl = format!("{}{}.json", PURL_BASE, id);
    let owl_purl = format!("{}{}.owl", PURL_BASE, id);
    let graph_id = |g: &&serde_json::Value| g.get("id").and_then(|v| v.as_str()).map(str::to_string);

    let found = graphs
        .iter()
        .find(|g| graph_id(g).as_deref() == Some(json_purl.as_str()))
        .map(|g| (g, "json"))
        .or_else(|| {
            graphs
                .iter()
                .find(|g| graph_id(g).as_deref() == Some(owl_purl.as_str()))
                .map(|g| (g, "owl"))
        });
    let Some((graph, extension)) = found else {
        return vec![fail("graphs don't have the correct ids").expected(json_purl)];
    };

    let mut failures = Vec::new();
    let meta = graph.get("meta");

    let version_start = format!("{}{}", PURL_BASE, id);
    let version_end = format!("/{}.{}", id, extension);
    match meta.and_then(|m| m.get("version")).and_then(|v| v.as_str()) {
        None => failures.push(fail("graph has no version IRI")),
        Some(version) if !version.starts_with(&version_start) || !version.ends_with(&version_end) => {
            failures.push(
                fail("version IRI is not annotated properly")
                    .expected(format!("{}/.../{}.{}", version_start, id, extension))
                    .actual(version),
            );
        }
        Some(_) => {}
    }

    let mut properties: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for prop in meta
        .and_then(|m| m.get("basicPropertyValues"))
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
    {
        if let (Some(pred), Some(val)) = (
            prop.get("pred").and_then(|v| v.as_str()),
            prop.get("val").and_then(|v| v.as_str()),
        ) {
            properties.entry(pred).or_default().insert(val);
        }
    }

    if !properties.contains_key(ROOT_TERM_PROPERTY) {
        failures.push(fail("root terms are not annotated with IAO:0000700"));
    }
    match properties.get(VERSION_INFO_PROPERTY) {
        None => failures.push(fail("graph is missing owl:versionInfo")),
        Some(values) if values.len() != 1 => failures.push(
            fail("graph has more than one owl:versionInfo")
                .expected("1")
                .actual(values.len().to_string()),
        ),
        Some(values) => {
            if let Some(v) = values.iter().find(|v| v.chars().any(char::is_whitespace)) {
                failures.push(fail("owl:versionInfo contains whitespace").actual(*v));
            }
        }
    }
    failures
}

/// Check the GitHub-detected license of record's repository.
pub fn check_license(record: &RegistryRecord, repository: &serde_json::Value) -> Vec<Failure> {
    let id = record.id.as_str();
    let spdx = repository
        .get("license")
        .and_then(|l| l.get("spdx_id"))
        .and_then(|s| s.as_str());

    let Some(spdx) = spdx else {
        return vec![Failure::new(id, "license", "no LICENSE file found in the repository")];
    };
    if spdx == "NOASSERTION" {
        return vec![Failure::new(
            id,
            "license",
            "GitHub could not recognise the repository LICENSE file",
        )
        .actual(spdx)];
    }
    if !ALLOWED_SPDX.contains(&spdx) {
        return vec![Failure::new(id, "license", "repository license is not allowed")
            .expected(ALLOWED_SPDX.join("|"))
            .actual(spdx)];
    }

    let label = record
        .fields
        .license
        .as_ref()
        .and_then(|l| l.label.as_deref());
    match label.map(|l| (l, spdx_for_label(l))) {
        Some((_, Some(declared))) if declared == spdx => Vec::new(),
        Some((_, Some(declared))) => vec![Failure::new(
            id,
            "license",
            "declared license does not match the repository license",
        )
        .expected(declared)
        .actual(spdx)],
        Some((label, None)) => vec![Failure::new(
            id,
            "license",
            "declared license label has no SPDX mapping",
        )
        .actual(label)],
        None => vec![Failure::new(id, "license", "record declares no license label")],
    }
}

/// Locations GitHub recognises for contribution guidelines.
pub fn contributing_urls(owner: &str, name: &str, branch: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for ext in ["md", "rst"] {
        for dir in ["", "docs/", ".github/"] {
            urls.push(format!(
                "https://github.com/{}/{}/blob/{}/{}CONTRIBUTING.{}",
                owner, name, branch, dir, ext
            ));
        }
    }
    urls
}

/// Network checks bound to their HTTP clients.
pub struct NetworkChecks<'a> {
    host: &'a dyn CodeHost,
    web: &'a dyn WebProbe,
    purl_config_url: String,
    obograph_skip: Vec<String>,
}

impl<'a> NetworkChecks<'a> {
    pub fn new(
        host: &'a dyn CodeHost,
        web: &'a dyn WebProbe,
        purl_config_url: &str,
        obograph_skip: &[String],
    ) -> Self {
        Self {
            host,
            web,
            purl_config_url: purl_config_url.trim_end_matches('/').to_string(),
            obograph_skip: obograph_skip.to_vec(),
        }
    }

    /// Active records have a PURL configuration file.
    pub async fn purl_config(&self, records: &BTreeMap<String, RegistryRecord>) -> Vec<Failure> {
        let mut failures = Vec::new();
        for (id, _) in records.iter().filter(|(_, r)| r.is_active()) {
            let url = format!("{}/{}.yml", self.purl_config_url, id);
            match self.web.status(&url).await {
                Ok(200) => {}
                Ok(status) => failures.push(
                    Failure::new(id, "purl", "PURL configuration is missing")
                        .expected("200")
                        .actual(status.to_string()),
                ),
                Err(e) => failures.push(Failure::new(id, "purl", e.to_string())),
            }
        }
        failures
    }

    /// Active records publishing `{id}.json` serve a well-formed OBO Graph.
    pub async fn obograph(&self, records: &BTreeMap<String, RegistryRecord>) -> Vec<Failure> {
        let mut failures = Vec::new();
        for (id, record) in records {
            if !record.is_active() || self.obograph_skip.contains(id) {
                continue;
            }
            let product = format!("{}.json", id);
            if !record.fields.products.iter().any(|p| p.id == product) {
                continue;
            }
            let url = format!("{}{}", PURL_BASE, product);
            match self.web.json(&url).await {
                Ok(document) => failures.extend(check_obograph(id, &document)),
                Err(e) => failures.push(Failure::new(id, "obograph", e.to_string())),
            }
        }
        failures
    }

    /// License and contribution-guideline checks, sharing one repository
    /// lookup per record.
    pub async fn repository(
        &self,
        records: &BTreeMap<String, RegistryRecord>,
    ) -> (Vec<Failure>, Vec<Failure>) {
        let mut license = Vec::new();
        let mut guidelines = Vec::new();
        for (id, record) in records {
            let Some((owner, name)) = record
                .fields
                .repository
                .as_deref()
                .and_then(github_repository)
            else {
                continue;
            };
            let repo = match self.host.repository(&owner, &name).await {
                Ok(repo) => repo,
                Err(e) => {
                    license.push(Failure::new(id, "license", e.to_string()));
                    guidelines.push(Failure::new(id, "contributing", e.to_string()));
                    continue;
                }
            };

            license.extend(check_license(record, &repo));

            let branch = repo
                .get("default_branch")
                .and_then(|b| b.as_str())
                .unwrap_or("main");
            let mut found = false;
            for url in contributing_urls(&owner, &name, branch) {
                if matches!(self.web.status(&url).await, Ok(200)) {
                    found = true;
                    break;
                }
            }
            if !found {
                guidelines.push(Failure::new(
                    id,
                    "contributing",
                    "no CONTRIBUTING.md or CONTRIBUTING.rst in the repository root, docs/ or .github/",
                ));
            }
        }
        (license, guidelines)
    }

    pub async fn run(&self, records: &BTreeMap<String, RegistryRecord>) -> Vec<CheckReport> {
        let purl = self.purl_config(records).await;
        let obograph = self.obograph(records).await;
        let (license, guidelines) = self.repository(records).await;
        vec![
            CheckReport::new("purl_config", purl),
            CheckReport::new("obograph", obograph),
            CheckReport::new("repository_license", license),
            CheckReport::new("contribution_guidelines", guidelines),
        ]
    }
}
