/// Recommended error type for a benchmark `main` function and for custom orchestrators or
/// invokers, so that `?` can be used to propagate errors.
pub type HarnessResult<T> = anyhow::Result<T>;
