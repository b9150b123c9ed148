//! Metadata store reader.
//!
//! The store is a flat directory of Markdown documents, one per registry
//! record. Each document opens with a `---` line, carries a YAML front-matter
//! block, closes with another `---` line, and continues with free-text
//! long-form description.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::models::{RecordFields, RegistryRecord};

const MARKER: &str = "---";
const GITHUB_PREFIX: &str = "https://github.com/";

/// A document split into its front matter and trailing text.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub block: String,
    pub metadata: serde_yaml::Mapping,
    pub long_description: String,
}

/// Split a document at its `---` markers and parse the front matter.
pub fn parse_document(path: &Path, text: &str) -> Result<ParsedDocument> {
    let lines: Vec<&str> = text.lines().collect();

    if lines.first().copied() != Some(MARKER) {
        return Err(Error::format(path, "first line must be '---'"));
    }
    let close = lines
        .iter()
        .skip(1)
        .position(|line| *line == MARKER)
        .map(|i| i + 1)
        .ok_or_else(|| Error::format(path, "no closing '---' marker"))?;

    let block = lines[1..close].join("\n");
    let metadata = parse_block(path, &block)?;

    Ok(ParsedDocument {
        block,
        metadata,
        long_description: lines[close + 1..].concat(),
    })
}

/// Parse a front-matter block. The line break before the closing marker
/// belongs to the block, so a trailing block scalar keeps its final newline.
fn parse_block(path: &Path, block: &str) -> Result<serde_yaml::Mapping> {
    let value: serde_yaml::Value = serde_yaml::from_str(&format!("{}\n", block))
        .map_err(|e| Error::format(path, format!("invalid front matter: {}", e)))?;
    match value {
        serde_yaml::Value::Mapping(m) => Ok(m),
        _ => Err(Error::format(path, "front matter is not a mapping")),
    }
}

/// Read one document into a [`RegistryRecord`].
pub fn read_record(path: &Path) -> Result<RegistryRecord> {
    let text = std::fs::read_to_string(path)?;
    parse_record(path, &text)
}

/// Parse document text read from `path` into a [`RegistryRecord`].
pub fn parse_record(path: &Path, text: &str) -> Result<RegistryRecord> {
    let doc = parse_document(path, text)?;

    let id = match doc.metadata.get("id").and_then(serde_yaml::Value::as_str) {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => return Err(Error::format(path, "missing 'id'")),
    };
    let (fields, shape_error) =
        match serde_yaml::from_value(serde_yaml::Value::Mapping(doc.metadata.clone())) {
            Ok(fields) => (fields, None),
            Err(e) => (
                RecordFields {
                    id: id.clone(),
                    ..RecordFields::default()
                },
                Some(e.to_string()),
            ),
        };

    Ok(RegistryRecord {
        id,
        path: path.to_path_buf(),
        block: doc.block,
        metadata: doc.metadata,
        fields,
        long_description: doc.long_description,
        shape_error,
    })
}

/// Load every matching document under the store root, keyed by record id.
pub fn load_store(store: &StoreConfig) -> Result<BTreeMap<String, RegistryRecord>> {
    let root = &store.root;
    if !root.is_dir() {
        return Err(Error::Configuration(format!(
            "metadata store does not exist: {}",
            root.display()
        )));
    }

    let include_set = build_globset(&store.include_globs)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).max_depth(1) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if include_set.is_match(relative.to_string_lossy().as_ref()) {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();

    let mut records: BTreeMap<String, RegistryRecord> = BTreeMap::new();
    for path in paths {
        let record = read_record(&path)?;
        if let Some(existing) = records.get(&record.id) {
            return Err(Error::format(
                &path,
                format!(
                    "duplicate id '{}' (already defined in {})",
                    record.id,
                    existing.path.display()
                ),
            ));
        }
        records.insert(record.id.clone(), record);
    }

    Ok(records)
}

/// Parse a GitHub repository URL into `(owner, name)`.
pub fn github_repository(url: &str) -> Option<(String, String)> {
    let rest = url.strip_prefix(GITHUB_PREFIX)?.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let mut parts = rest.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Some((owner.to_string(), name.to_string()))
        }
        _ => None,
    }
}

/// Records with a recognised GitHub repository, mapped to `(owner, name)`.
///
/// Records without one are skipped.
pub fn repositories(
    records: &BTreeMap<String, RegistryRecord>,
) -> BTreeMap<String, (String, String)> {
    records
        .iter()
        .filter_map(|(id, record)| {
            let repo = record.fields.repository.as_deref()?;
            github_repository(repo).map(|pair| (id.clone(), pair))
        })
        .collect()
}

/// Canonical YAML rendering of a front-matter block, without the
/// document-terminating newline.
pub fn canonical_block(metadata: &serde_yaml::Mapping) -> Result<String> {
    let text = serde_yaml::to_string(&serde_yaml::Value::Mapping(metadata.clone()))?;
    Ok(text.strip_suffix('\n').unwrap_or(&text).to_string())
}

/// Whether the record's front matter is already in canonical form.
pub fn is_standardized(record: &RegistryRecord) -> Result<bool> {
    Ok(canonical_block(&record.metadata)? == record.block)
}

/// Replace the front-matter block of `text` with `block`, keeping the
/// trailing text byte-for-byte.
fn replace_block(path: &Path, text: &str, block: &str) -> Result<String> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let is_marker = |line: &str| line.trim_end_matches(['\r', '\n']) == MARKER;

    if !lines.first().is_some_and(|l| is_marker(*l)) {
        return Err(Error::format(path, "first line must be '---'"));
    }
    let close = lines
        .iter()
        .skip(1)
        .position(|line| is_marker(*line))
        .map(|i| i + 1)
        .ok_or_else(|| Error::format(path, "no closing '---' marker"))?;

    let mut out = String::with_capacity(text.len());
    out.push_str(MARKER);
    out.push('\n');
    out.push_str(block);
    out.push('\n');
    out.push_str(&lines[close..].concat());
    Ok(out)
}

/// Rewrite every non-canonical document in place.
///
/// Returns the ids of the records that changed (or would change, when
/// `dry_run` is set).
pub fn standardize_store(
    records: &BTreeMap<String, RegistryRecord>,
    dry_run: bool,
) -> Result<Vec<String>> {
    let mut changed = Vec::new();
    for (id, record) in records {
        let canonical = canonical_block(&record.metadata)?;
        if canonical == record.block {
            continue;
        }
        if parse_block(&record.path, &canonical)? != record.metadata {
            return Err(Error::format(
                &record.path,
                "canonical front matter would change field values",
            ));
        }
        if !dry_run {
            let text = std::fs::read_to_string(&record.path)?;
            let rewritten = replace_block(&record.path, &text, &canonical)?;
            std::fs::write(&record.path, rewritten)?;
        }
        changed.push(id.clone());
    }
    Ok(changed)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::Configuration(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Configuration(format!("invalid glob set: {}", e)))
}
