use std::path::Path;
use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::Serialize;
use crate::eis::{
    aggregate_sweeps, combine_channels, load_sweep_set, render_bode_png, write_aggregate_csv,
    write_png, write_sweep_csv, BodeAxes, BodeSeries, ChannelAggregate, FieldFormat,
    MissingFilePolicy, PlotStyle, Sweep,
};
use crate::session::{to_hardware_channel, SessionConfig};
use crate::source::ImpedanceSource;
/// Frequency grid with an exclusive upper bound, like the scripts' 50..1150
/// step 100 sweep.
pub fn frequency_grid(start_hz: f64, stop_hz: f64, step_hz: f64) -> Vec<f64> {
    let mut grid = Vec::new();
    let mut frequency = start_hz;
    while frequency < stop_hz {
        grid.push(frequency);
        frequency += step_hz;
    }
    grid
}
#[derive(Clone, Debug, Serialize)]
pub struct SweepConfig {
    pub channels: Vec<usize>,
    pub sweeps_per_channel: usize,
    pub frequencies_hz: Vec<f64>,
    pub note: Option<String>,
}
/// Acquires the configured sweeps channel by channel, saves the raw CSVs,
/// and renders per-channel plus combined Bode charts. A failing channel is
/// skipped with a diagnostic; only the final combine can abort the run.
pub fn run(
    session: &SessionConfig,
    config: &SweepConfig,
    source: &mut dyn ImpedanceSource,
) -> Result<()> {
    session.write_provenance(config, config.note.as_deref())?;
    let figures = session.figures_dir(&session.label);
    let mut aggregates: Vec<ChannelAggregate> = Vec::new();
    for &channel in &config.channels {
        match sweep_channel(session, config, source, channel, &figures) {
            Ok(aggregate) => aggregates.push(aggregate),
            Err(err) => warn!("channel {channel}: {err:#}, skipping"),
        }
    }
    if aggregates.is_empty() {
        bail!("no channel produced usable data");
    }
    let combined = combine_channels(&aggregates, "all channels")?;
    write_aggregate_csv(&session.mean_csv(None), &combined)?;
    let style = annotated_style(aggregates.len(), config.sweeps_per_channel);
    let series = [BodeSeries {
        label: "all channels".into(),
        aggregate: &combined,
    }];
    let png = render_bode_png(
        &series,
        &BodeAxes::default(),
        "Bode Plot for All Channels",
        &style,
    )?;
    let path = figures.join(format!("{}_all_channels.png", session.base_name()));
    write_png(&path, &png)?;
    info!("combined chart saved to {}", path.display());
    Ok(())
}
fn sweep_channel(
    session: &SessionConfig,
    config: &SweepConfig,
    source: &mut dyn ImpedanceSource,
    channel: usize,
    figures: &Path,
) -> Result<ChannelAggregate> {
    let hardware = to_hardware_channel(channel)?;
    for sweep_no in 1..=config.sweeps_per_channel {
        let mut magnitudes = Vec::with_capacity(config.frequencies_hz.len());
        let mut phases = Vec::with_capacity(config.frequencies_hz.len());
        for &frequency in &config.frequencies_hz {
            info!("channel {channel}: checking impedance at {frequency} Hz, sweep {sweep_no}");
            let reading = source
                .measure_impedance(frequency, &[hardware])
                .with_context(|| format!("measuring channel {channel} at {frequency} Hz"))?;
            reading.validate(1)?;
            magnitudes.push(reading.magnitudes_ohm[0]);
            phases.push(reading.phases_deg[0]);
        }
        let sweep = Sweep::from_columns(&config.frequencies_hz, &magnitudes, &phases);
        let path = session.sweep_csv(channel, sweep_no);
        write_sweep_csv(&path, &sweep)?;
        info!("data saved to {}", path.display());
    }
    // Charts come from the files just written, so they show what is on disk.
    let paths: Vec<_> = (1..=config.sweeps_per_channel)
        .map(|sweep| session.sweep_csv(channel, sweep))
        .collect();
    let sweeps = load_sweep_set(&paths, FieldFormat::Auto, MissingFilePolicy::Fail)?;
    let aggregate = aggregate_sweeps(&sweeps, &format!("channel {channel}"))?;
    write_aggregate_csv(&session.mean_csv(Some(channel)), &aggregate)?;
    let style = annotated_style(1, config.sweeps_per_channel);
    let series = [BodeSeries {
        label: format!("channel {channel}"),
        aggregate: &aggregate,
    }];
    let png = render_bode_png(
        &series,
        &BodeAxes::default(),
        &format!("Bode Plot for Channel {channel}"),
        &style,
    )?;
    write_png(
        &figures.join(format!("{}_{channel}.png", session.base_name())),
        &png,
    )?;
    Ok(aggregate)
}
fn annotated_style(num_channels: usize, sweeps: usize) -> PlotStyle {
    let mut style = PlotStyle::default();
    style.annotation = vec![
        "SEM error bars".into(),
        format!("N = {num_channels} channels, {sweeps} sweeps each"),
    ];
    style
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::eis::{load_sweep, FieldFormat};
    use crate::source::SyntheticSource;
    fn session(root: &Path) -> SessionConfig {
        SessionConfig {
            data_root: root.to_path_buf(),
            folder: "01may24_1".into(),
            label: "preplate".into(),
        }
    }
    #[test]
    fn frequency_grid_matches_the_script_range() {
        let grid = frequency_grid(50.0, 1150.0, 100.0);
        assert_eq!(grid.len(), 11);
        assert_eq!(grid[0], 50.0);
        assert_eq!(grid[10], 1050.0);
    }
    #[test]
    fn simulated_sweep_produces_csvs_and_charts() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let config = SweepConfig {
            channels: vec![0, 1],
            sweeps_per_channel: 2,
            frequencies_hz: frequency_grid(50.0, 450.0, 100.0),
            note: Some("synthetic smoke run".into()),
        };
        let mut source = SyntheticSource::new(7);
        run(&session, &config, &mut source).unwrap();
        let sweep = load_sweep(&session.sweep_csv(0, 1), FieldFormat::Bracketed).unwrap();
        assert_eq!(sweep.len(), 4);
        assert!(session.mean_csv(Some(0)).exists());
        assert!(session.mean_csv(None).exists());
        assert!(session
            .figures_dir("preplate")
            .join("01may24_1_preplate_0.png")
            .exists());
        assert!(session
            .figures_dir("preplate")
            .join("01may24_1_preplate_all_channels.png")
            .exists());
        assert!(session.run_dir().join("preplate_session.json").exists());
        assert!(session.run_dir().join("preplate_README.txt").exists());
    }
}
