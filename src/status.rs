use anyhow::Result;

use crate::config::Config;

/// One line of `obo status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub component: &'static str,
    pub status: String,
    pub healthy: bool,
}

fn row(component: &'static str, status: impl Into<String>, healthy: bool) -> StatusRow {
    StatusRow {
        component,
        status: status.into(),
        healthy,
    }
}

fn count_files(dir: &std::path::Path, extension: &str) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|x| x == extension))
                .count()
        })
        .unwrap_or(0)
}

pub fn status_rows(config: &Config) -> Vec<StatusRow> {
    let mut rows = Vec::new();

    rows.push(if config.store.root.is_dir() {
        row(
            "store",
            format!("OK ({} documents)", count_files(&config.store.root, "md")),
            true,
        )
    } else {
        row("store", "MISSING (root does not exist)", false)
    });

    let snapshots = config.cache.contributors_dir();
    rows.push(if snapshots.is_dir() {
        row(
            "cache",
            format!("OK ({} snapshots)", count_files(&snapshots, "json")),
            true,
        )
    } else {
        row("cache", "EMPTY (created on first run)", true)
    });

    rows.push(match config.github.resolve_token() {
        Some(_) => row("github", "OK (token set)", true),
        None => row(
            "github",
            format!("NO TOKEN (set github.token or {})", config.github.token_env),
            false,
        ),
    });

    rows.push(row("wikidata", config.wikidata.endpoint.clone(), true));

    rows.push(match &config.curation.path {
        Some(path) if path.is_file() => row("curation", "OK", true),
        Some(_) => row("curation", "MISSING (configured file does not exist)", false),
        None => row("curation", "NOT CONFIGURED", true),
    });

    rows.push(match &config.checks.schema_path {
        Some(path) if path.is_file() => row("schema", "OK", true),
        Some(_) => row("schema", "MISSING (configured file does not exist)", false),
        None => row("schema", "NOT CONFIGURED (schema_required skipped)", true),
    });

    rows
}

pub fn print_status(config: &Config) -> Result<()> {
    println!("{:<12} {:<48} HEALTHY", "COMPONENT", "STATUS");
    for r in status_rows(config) {
        println!("{:<12} {:<48} {}", r.component, r.status, r.healthy);
    }
    Ok(())
}
