use indicatif::{ProgressBar, ProgressStyle};
use scale_tunnel_summary_model::WorkloadScale;

/// A progress bar over the iterations of one scale, or a hidden one if progress is disabled.
pub(crate) fn scale_progress(benchmark: &str, scale: &WorkloadScale, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(scale.iterations() as u64);
    match ProgressStyle::with_template(
        "{spinner:.green} {prefix} [{wide_bar:.cyan/blue}] {pos}/{len} [{elapsed_precise}]",
    ) {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => log::debug!("Using the default progress style: {e}"),
    }
    pb.set_prefix(format!("{benchmark} [{}]", scale.label()));
    pb
}
