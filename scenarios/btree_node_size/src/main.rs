use scale_tunnel_runner::prelude::*;

/// Every load starts from an empty store and restarts the server in between, so the later
/// iterations also measure reading the persisted tree back in.
const LOAD_ITERATIONS: usize = 4;

const EXECUTE_ITERATIONS: usize = 100;

fn load_catalog() -> HarnessResult<WorkloadCatalog> {
    WorkloadCatalog::from_entries([(
        "load",
        "analysis/btree_node_size_test_load.dsl",
        LOAD_ITERATIONS,
    )])
}

fn execute_catalog() -> HarnessResult<WorkloadCatalog> {
    WorkloadCatalog::from_entries([(
        "execute",
        "analysis/btree_node_size_test_execute.dsl",
        EXECUTE_ITERATIONS,
    )])
}

fn main() -> HarnessResult<()> {
    // The queries run against the server left running by the last load.
    let builder = BenchmarkDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME"))
        .add_load_benchmark("load", load_catalog()?)
        .add_query_benchmark("execute", execute_catalog()?);

    if let Err(e) = run(builder) {
        log::error!("Benchmark run aborted: {e:?}");
    }

    Ok(())
}
