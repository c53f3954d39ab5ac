use scale_tunnel_runner::prelude::*;

/// Number of rows in each generated table, which is also the scale label.
const TABLE_SIZES: [usize; 4] = [10, 100, 1_000, 10_000];

const ITERATIONS: usize = 3;

fn catalog() -> HarnessResult<WorkloadCatalog> {
    WorkloadCatalog::from_entries(TABLE_SIZES.map(|size| {
        (
            size.to_string(),
            format!("analysis/bitvector_test{size}.dsl"),
            ITERATIONS,
        )
    }))
}

fn main() -> HarnessResult<()> {
    let builder = BenchmarkDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME"))
        .add_query_benchmark("range scan", catalog()?);

    // A failed run is logged rather than returned so the process still exits successfully.
    if let Err(e) = run(builder) {
        log::error!("Benchmark run aborted: {e:?}");
    }

    Ok(())
}
