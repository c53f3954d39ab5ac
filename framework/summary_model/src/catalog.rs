use crate::{WorkloadCatalog, WorkloadScale};
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Catalogs read from a TOML file, keyed by benchmark name.
///
/// Each top level array of tables replaces the built-in catalog of the benchmark with that name:
///
/// ```toml
/// [[load]]
/// label = "load"
/// workload = "analysis/btree_node_size_test_load.dsl"
/// iterations = 4
/// ```
pub type CatalogOverrides = BTreeMap<String, WorkloadCatalog>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScaleEntry {
    label: String,
    workload: PathBuf,
    iterations: usize,
}

pub fn parse_catalog_overrides(content: &str) -> anyhow::Result<CatalogOverrides> {
    let raw: BTreeMap<String, Vec<ScaleEntry>> =
        toml::from_str(content).context("Failed to parse workload catalog")?;

    raw.into_iter()
        .map(|(benchmark, entries)| -> anyhow::Result<(String, WorkloadCatalog)> {
            let scales = entries
                .into_iter()
                .map(|entry| WorkloadScale::new(entry.label, entry.workload, entry.iterations))
                .collect::<anyhow::Result<Vec<_>>>()
                .with_context(|| format!("Invalid catalog for benchmark '{benchmark}'"))?;
            Ok((benchmark, WorkloadCatalog::new(scales)))
        })
        .collect()
}

pub fn load_catalog_overrides(path: &Path) -> anyhow::Result<CatalogOverrides> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workload catalog '{}'", path.display()))?;
    parse_catalog_overrides(&content)
}
