//! # OBO curation CLI (`obo`)
//!
//! The `obo` binary reads the ontology registry's metadata store, checks
//! it, and cross-references its people with GitHub and Wikidata.
//!
//! ## Usage
//!
//! ```bash
//! obo --config ./config/obo.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `obo records` | List records with status and repository |
//! | `obo status` | Show configuration health |
//! | `obo contributors` | Aggregate GitHub contributors into JSON |
//! | `obo resolve maintainers` | QuickStatements linking ontologies to maintainers |
//! | `obo resolve contributors` | QuickStatements linking ontologies to contributors |
//! | `obo discover` | Contributors with no Wikidata item yet |
//! | `obo check` | Integrity checks (`--network` for the slow tier) |
//! | `obo standardize` | Rewrite front matter in canonical form |
//! | `obo prefixes` | SHACL prefix declarations |
//!
//! ## Examples
//!
//! ```bash
//! # Offline checks, as run on every pull request
//! obo check --config ./config/obo.toml
//!
//! # Fail if any document needs standardizing
//! obo standardize --check
//!
//! # Print the discovery query instead of running it
//! obo discover --query-only
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use obo_curation::commands;
use obo_curation::config;
use obo_curation::error::Error;
use obo_curation::progress::ProgressMode;
use obo_curation::status;

/// OBO curation CLI: metadata checks and identity resolution for the
/// ontology registry.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/obo.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "obo",
    about = "Metadata checks and identity resolution for the OBO ontology registry",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/obo.toml")]
    config: PathBuf,

    /// Progress output on stderr. Defaults to `human` on a terminal,
    /// `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every record in the metadata store.
    Records,

    /// Show whether the store, cache, token and curation file are usable.
    Status,

    /// Aggregate GitHub contributors across all records.
    ///
    /// Snapshots are cached per record, so an interrupted run resumes
    /// where it stopped. Prints the merged contributor index as JSON.
    Contributors,

    /// Resolve people to Wikidata and print QuickStatements.
    Resolve {
        #[command(subcommand)]
        target: ResolveTarget,
    },

    /// List contributors that have no Wikidata item.
    ///
    /// Logins in the curation file's exclusion list or override table are
    /// never queried.
    Discover {
        /// Print the SPARQL query instead of running it.
        #[arg(long)]
        query_only: bool,
    },

    /// Run integrity checks. Exits non-zero on any failure.
    Check {
        /// Also run checks that need the network (PURLs, OBO Graphs, GitHub).
        #[arg(long)]
        network: bool,
    },

    /// Rewrite front matter in canonical form.
    Standardize {
        /// Report non-canonical documents without writing; exit non-zero if any.
        #[arg(long)]
        check: bool,
    },

    /// Print SHACL prefix declarations for every non-obsolete record.
    Prefixes,
}

#[derive(Subcommand)]
enum ResolveTarget {
    /// Link ontologies to the Wikidata items of their contact's ORCID.
    Maintainers,
    /// Link ontologies to the Wikidata items of their GitHub contributors.
    Contributors,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let progress = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Records => {
            commands::run_records(&cfg)?;
        }
        Commands::Status => {
            status::print_status(&cfg)?;
        }
        Commands::Contributors => {
            commands::run_contributors(&cfg, progress.as_ref()).await?;
        }
        Commands::Resolve { target } => match target {
            ResolveTarget::Maintainers => {
                commands::run_resolve_maintainers(&cfg).await?;
            }
            ResolveTarget::Contributors => {
                commands::run_resolve_contributors(&cfg, progress.as_ref()).await?;
            }
        },
        Commands::Discover { query_only } => {
            commands::run_discover(&cfg, progress.as_ref(), query_only).await?;
        }
        Commands::Check { network } => {
            let count = commands::run_check(&cfg, network).await?;
            if count > 0 {
                return Err(Error::Assertion { count }.into());
            }
        }
        Commands::Standardize { check } => {
            let count = commands::run_standardize(&cfg, check)?;
            if check && count > 0 {
                return Err(Error::Assertion { count }.into());
            }
        }
        Commands::Prefixes => {
            commands::run_prefixes(&cfg)?;
        }
    }

    Ok(())
}
