//! Command runners behind the `obo` CLI.
//!
//! Each runner loads what it needs from [`Config`], does its work through
//! the library, and prints results on stdout. Progress and summaries go to
//! stderr so stdout can be piped.

use anyhow::{Context, Result};

use crate::checks::{self, network::HttpProbe, network::NetworkChecks, CheckReport};
use crate::config::Config;
use crate::contributors::{Aggregator, ContributorIndex};
use crate::curation::Curation;
use crate::github::{GithubClient, LazyGithub};
use crate::identity;
use crate::models::RegistryRecord;
use crate::prefixes;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::quickstatements;
use crate::sparql::WikidataClient;
use crate::store;

use std::collections::BTreeMap;

fn load_records(config: &Config) -> Result<BTreeMap<String, RegistryRecord>> {
    store::load_store(&config.store).with_context(|| {
        format!(
            "Failed to load metadata store: {}",
            config.store.root.display()
        )
    })
}

fn load_curation(config: &Config) -> Result<Curation> {
    Ok(Curation::load(config.curation.path.as_deref())?)
}

/// Aggregate contributors for every record with a GitHub repository.
pub async fn aggregate(
    config: &Config,
    progress: &dyn ProgressReporter,
) -> Result<ContributorIndex> {
    let records = load_records(config)?;
    let repositories = store::repositories(&records);
    for (id, record) in &records {
        if let Some(url) = record.fields.repository.as_deref() {
            if !repositories.contains_key(id) {
                progress.report(ProgressEvent::Warning {
                    record: id.clone(),
                    message: format!("repository is not a GitHub repository, skipped: {}", url),
                });
            }
        }
    }
    let github = LazyGithub::new(&config.github);

    let aggregator = Aggregator::new(&github, &config.cache, progress);
    let (index, stats) = aggregator.run(&repositories).await?;
    eprintln!(
        "{} records ({} cached, {} fetched), {} contributors",
        stats.records,
        stats.cached,
        stats.fetched,
        index.len()
    );
    Ok(index)
}

pub fn run_records(config: &Config) -> Result<()> {
    let records = load_records(config)?;
    println!("{:<16} {:<10} REPOSITORY", "ID", "STATUS");
    for (id, record) in &records {
        let status = if record.is_obsolete() {
            "obsolete"
        } else if record.is_active() {
            "active"
        } else {
            "inactive"
        };
        println!(
            "{:<16} {:<10} {}",
            id,
            status,
            record.fields.repository.as_deref().unwrap_or("-")
        );
    }
    eprintln!("{} records", records.len());
    Ok(())
}

pub async fn run_contributors(config: &Config, progress: &dyn ProgressReporter) -> Result<()> {
    let index = aggregate(config, progress).await?;
    println!("{}", serde_json::to_string_pretty(index.as_map())?);
    Ok(())
}

pub async fn run_resolve_maintainers(config: &Config) -> Result<()> {
    let records = load_records(config)?;
    let wikidata = WikidataClient::from_config(&config.wikidata)?;

    let orcids: Vec<&str> = records.values().filter_map(|r| r.contact_orcid()).collect();
    let orcid_qids = identity::resolve_orcids(&wikidata, &orcids).await?;
    let ontology_qids = identity::ontology_qids(&wikidata).await?;
    eprintln!(
        "{} of {} maintainer ORCIDs resolved, {} ontologies in Wikidata",
        orcid_qids.len(),
        orcids.len(),
        ontology_qids.len()
    );

    let records: Vec<RegistryRecord> = records.into_values().collect();
    let rows = quickstatements::maintainer_statements(&records, &ontology_qids, &orcid_qids);
    println!("{}", quickstatements::render(&rows));
    Ok(())
}

pub async fn run_resolve_contributors(
    config: &Config,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let curation = load_curation(config)?;
    let index = aggregate(config, progress).await?;
    let wikidata = WikidataClient::from_config(&config.wikidata)?;

    let logins: Vec<&str> = index.iter().map(|c| c.login.as_str()).collect();
    let login_qids = identity::resolve_logins(&wikidata, &logins, &curation).await?;
    let ontology_qids = identity::ontology_qids(&wikidata).await?;
    eprintln!("{} of {} contributors resolved", login_qids.len(), logins.len());

    let rows = quickstatements::contributor_statements(
        &ontology_qids,
        &index.record_to_logins(),
        &login_qids,
    );
    println!("{}", quickstatements::render(&rows));
    Ok(())
}

pub async fn run_discover(
    config: &Config,
    progress: &dyn ProgressReporter,
    query_only: bool,
) -> Result<()> {
    let curation = load_curation(config)?;
    let index = aggregate(config, progress).await?;

    if query_only {
        let candidates = identity::discovery_candidates(&index, &curation);
        print!("{}", identity::discovery_query(&candidates));
        return Ok(());
    }

    let wikidata = WikidataClient::from_config(&config.wikidata)?;
    let unresolved = identity::discover_unresolved(&wikidata, &index, &curation).await?;
    for row in &unresolved {
        println!(
            "{}\t{}\t{}",
            row.login,
            row.name.as_deref().unwrap_or(""),
            row.records
        );
    }
    eprintln!(
        "{} unresolved contributors ({} excluded by curation)",
        unresolved.len(),
        curation.exclusion_count()
    );
    Ok(())
}

fn print_reports(reports: &[CheckReport]) {
    for report in reports {
        if report.passed() {
            println!("PASS  {}", report.name);
        } else {
            println!("FAIL  {} ({})", report.name, report.failures.len());
            for failure in &report.failures {
                println!("      {}", failure);
            }
        }
    }
}

/// Run the integrity checks and return the number of failures.
pub async fn run_check(config: &Config, network: bool) -> Result<usize> {
    let records = load_records(config)?;
    let mut reports = checks::run_offline(&records, &config.checks)?;

    if network {
        let github = GithubClient::from_config(&config.github)?;
        let web = HttpProbe::new(config.github.timeout_secs)?;
        let network_checks = NetworkChecks::new(
            &github,
            &web,
            &config.checks.purl_config_url,
            &config.checks.obograph_skip,
        );
        reports.extend(network_checks.run(&records).await);
    }

    print_reports(&reports);
    Ok(checks::failure_count(&reports))
}

/// Rewrite non-canonical front matter. With `check_only`, report without
/// writing. Returns the number of non-canonical records.
pub fn run_standardize(config: &Config, check_only: bool) -> Result<usize> {
    let records = load_records(config)?;
    let changed = store::standardize_store(&records, check_only)?;
    for id in &changed {
        if check_only {
            println!("not canonical: {}", id);
        } else {
            println!("rewrote: {}", id);
        }
    }
    eprintln!("{} of {} records non-canonical", changed.len(), records.len());
    Ok(changed.len())
}

pub fn run_prefixes(config: &Config) -> Result<()> {
    let records = load_records(config)?;
    print!(
        "{}",
        prefixes::render_shacl(&prefixes::preferred_prefixes(&records))
    );
    Ok(())
}
