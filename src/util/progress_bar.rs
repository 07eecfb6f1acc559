
use indicatif::{ProgressBar, ProgressState, ProgressStyle};

/// Shared function to pull our progress spinner styling; the total record count is unknown while streaming
pub fn get_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {spinner:.cyan} {pos} records; Speed: {per_sec} {msg}")
        .unwrap()
        .with_key("per_sec", |state: &ProgressState, w: &mut dyn std::fmt::Write| write!(w, "{:.0}/s", state.per_sec()).unwrap())
}

/// Builds a spinner for streaming through records, hidden when `enabled` is false
/// # Arguments
/// * `enabled` - if false, the returned bar draws nothing
pub fn get_record_spinner(enabled: bool) -> ProgressBar {
    if enabled {
        let spinner = ProgressBar::new_spinner().with_style(get_progress_style());
        spinner.enable_steady_tick(std::time::Duration::from_millis(250));
        spinner
    } else {
        ProgressBar::hidden()
    }
}
