// One module per lab workflow; each is a linear pipeline over the eis core.
pub mod bode;
pub mod nyquist;
pub mod plate;
pub mod plate_eval;
pub mod sweep;
use std::path::PathBuf;
use crate::eis::{load_sweep_set, EisError, FieldFormat, MissingFilePolicy, Sweep};
use crate::session::SessionConfig;
/// Loads the numbered sweep files of one channel under one label, skipping
/// files that are absent from disk.
pub(crate) fn channel_sweeps(
    session: &SessionConfig,
    label: &str,
    channel: usize,
    count: usize,
) -> Result<Vec<Sweep>, EisError> {
    let paths: Vec<PathBuf> = (1..=count)
        .map(|sweep| session.sweep_csv_for(label, channel, sweep))
        .collect();
    load_sweep_set(&paths, FieldFormat::Auto, MissingFilePolicy::Skip)
}
