use std::collections::HashSet;

use anyhow::bail;
use scale_tunnel_summary_model::{load_catalog_overrides, WorkloadCatalog};

use crate::cli::ScaleTunnelCli;
use crate::types::HarnessResult;

/// How the server is treated between the iterations of a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkMode {
    /// Measures loading: every scale starts from deleted state and the server is restarted
    /// between iterations, so each iteration also pays the server's startup cost.
    Load,
    /// Measures queries against a single server that stays up for the whole benchmark.
    Query,
}

/// What to do with an iteration whose client did not exit successfully.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientFailurePolicy {
    /// Keep the timing as a normal sample and log a warning.
    #[default]
    Record,
    /// Drop the timing from the mean. A scale left with no samples is reported as failed.
    Exclude,
    /// Stop the scale, report it as failed and move on to the next scale.
    AbortScale,
}

#[derive(Debug, Clone)]
pub struct Benchmark {
    pub name: String,
    pub mode: BenchmarkMode,
    pub catalog: WorkloadCatalog,
}

/// The builder for a benchmark definition.
///
/// This must be used in a benchmark's `main` to define the benchmarks that you want to run. They
/// are run in the order they are added, against the same engine.
pub struct BenchmarkDefinitionBuilder {
    /// The name of the benchmark suite.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    /// This value is initialised for you and you cannot change it.
    cli: ScaleTunnelCli,
    benchmarks: Vec<Benchmark>,
}

pub struct BenchmarkDefinition {
    pub name: String,
    pub cli: ScaleTunnelCli,
    pub benchmarks: Vec<Benchmark>,
}

impl BenchmarkDefinitionBuilder {
    /// Initialise logging and parse the command line, then create the builder.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, crate::init::init())
    }

    pub fn new(name: &str, cli: ScaleTunnelCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            benchmarks: Vec::new(),
        }
    }

    /// Add a benchmark that measures loading, see [BenchmarkMode::Load].
    pub fn add_load_benchmark(self, name: &str, catalog: WorkloadCatalog) -> Self {
        self.add_benchmark(name, BenchmarkMode::Load, catalog)
    }

    /// Add a benchmark that measures queries against a running server, see [BenchmarkMode::Query].
    pub fn add_query_benchmark(self, name: &str, catalog: WorkloadCatalog) -> Self {
        self.add_benchmark(name, BenchmarkMode::Query, catalog)
    }

    fn add_benchmark(mut self, name: &str, mode: BenchmarkMode, catalog: WorkloadCatalog) -> Self {
        if self.benchmarks.iter().any(|b| b.name == name) {
            panic!("Benchmark [{}] is already defined", name);
        }

        self.benchmarks.push(Benchmark {
            name: name.to_string(),
            mode,
            catalog,
        });
        self
    }

    /// Apply any catalog file given on the command line and check the definition.
    pub(crate) fn build(self) -> HarnessResult<BenchmarkDefinition> {
        let mut benchmarks = self.benchmarks;

        if let Some(path) = &self.cli.catalog {
            let overrides = load_catalog_overrides(path)?;
            let known = benchmarks
                .iter()
                .map(|b| b.name.as_str())
                .collect::<HashSet<_>>();
            if let Some(unknown) = overrides.keys().find(|name| !known.contains(name.as_str())) {
                bail!(
                    "Catalog '{}' names benchmark '{unknown}' which is not part of '{}'",
                    path.display(),
                    self.name
                );
            }

            for benchmark in &mut benchmarks {
                if let Some(catalog) = overrides.get(&benchmark.name) {
                    log::info!("Using catalog from file for benchmark '{}'", benchmark.name);
                    benchmark.catalog = catalog.clone();
                }
            }
        }

        if benchmarks.is_empty() {
            bail!("No benchmarks defined for '{}'", self.name);
        }
        if let Some(empty) = benchmarks.iter().find(|b| b.catalog.is_empty()) {
            bail!("Benchmark '{}' has no workload scales", empty.name);
        }

        Ok(BenchmarkDefinition {
            name: self.name,
            cli: self.cli,
            benchmarks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn cli(args: &[&str]) -> ScaleTunnelCli {
        ScaleTunnelCli::try_parse_from(std::iter::once("bench").chain(args.iter().copied()))
            .unwrap()
    }

    fn catalog(entries: &[(&str, usize)]) -> WorkloadCatalog {
        WorkloadCatalog::from_entries(
            entries
                .iter()
                .map(|(label, iterations)| (*label, format!("t{label}.dsl"), *iterations)),
        )
        .unwrap()
    }

    #[test]
    fn keeps_benchmarks_in_order() {
        let definition = BenchmarkDefinitionBuilder::new("btree", cli(&[]))
            .add_load_benchmark("load", catalog(&[("load", 4)]))
            .add_query_benchmark("execute", catalog(&[("execute", 100)]))
            .build()
            .unwrap();

        let names = definition
            .benchmarks
            .iter()
            .map(|b| (b.name.as_str(), b.mode))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![("load", BenchmarkMode::Load), ("execute", BenchmarkMode::Query)]
        );
    }

    #[test]
    #[should_panic(expected = "Benchmark [load] is already defined")]
    fn rejects_duplicate_names() {
        let _ = BenchmarkDefinitionBuilder::new("btree", cli(&[]))
            .add_load_benchmark("load", catalog(&[("load", 4)]))
            .add_load_benchmark("load", catalog(&[("load", 4)]));
    }

    #[test]
    fn requires_a_benchmark() {
        let result = BenchmarkDefinitionBuilder::new("empty", cli(&[])).build();
        assert_eq!(
            result.err().unwrap().to_string(),
            "No benchmarks defined for 'empty'"
        );
    }

    #[test]
    fn catalog_file_replaces_named_catalogs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            "[[execute]]\nlabel = \"small\"\nworkload = \"small.dsl\"\niterations = 2\n",
        )
        .unwrap();

        let definition =
            BenchmarkDefinitionBuilder::new("btree", cli(&["--catalog", path.to_str().unwrap()]))
                .add_load_benchmark("load", catalog(&[("load", 4)]))
                .add_query_benchmark("execute", catalog(&[("execute", 100)]))
                .build()
                .unwrap();

        assert_eq!(definition.benchmarks[0].catalog, catalog(&[("load", 4)]));
        assert_eq!(
            definition.benchmarks[1].catalog,
            WorkloadCatalog::from_entries([("small", "small.dsl", 2)]).unwrap()
        );
    }

    #[test]
    fn catalog_file_cannot_name_unknown_benchmarks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            "[[scan]]\nlabel = \"10\"\nworkload = \"t10.dsl\"\niterations = 2\n",
        )
        .unwrap();

        let result =
            BenchmarkDefinitionBuilder::new("btree", cli(&["--catalog", path.to_str().unwrap()]))
                .add_load_benchmark("load", catalog(&[("load", 4)]))
                .build();

        let message = result.err().unwrap().to_string();
        assert!(message.contains("names benchmark 'scan'"), "{message}");
    }
}
