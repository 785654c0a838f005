use std::path::Path;
use anyhow::{bail, Result};
use log::{info, warn};
use serde::Serialize;
use crate::eis::{
    aggregate_sweeps, combine_channels, render_bode_png, render_overlay_png, write_png, BodeAxes,
    BodeSeries, ChannelAggregate, OverlayKind, PlotStyle,
};
use crate::flows::channel_sweeps;
use crate::session::SessionConfig;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BodeMode {
    /// One dual-axis chart per channel plus a combined all-channels chart.
    PerChannel,
    /// All channels overlaid on one dual-axis chart.
    Overlay,
    /// Separate magnitude and phase overlay charts.
    Split,
}
#[derive(Clone, Debug, Serialize)]
pub struct BodeConfig {
    pub channels: Vec<usize>,
    pub sweeps_per_channel: usize,
    pub mode: BodeMode,
    /// Second sweep label to draw against the session label, e.g. comparing
    /// preplate and postplate sweeps of the same device.
    pub compare_label: Option<String>,
    pub title: Option<String>,
}
pub fn run(session: &SessionConfig, config: &BodeConfig) -> Result<()> {
    if config.compare_label.is_some() && config.mode != BodeMode::PerChannel {
        bail!("label comparison is only supported in per-channel mode");
    }
    match config.mode {
        BodeMode::PerChannel => per_channel(session, config),
        BodeMode::Overlay => overlay(session, config),
        BodeMode::Split => split(session, config),
    }
}
fn labels(session: &SessionConfig, config: &BodeConfig) -> Vec<String> {
    let mut labels = vec![session.label.clone()];
    labels.extend(config.compare_label.iter().cloned());
    labels
}
fn per_channel(session: &SessionConfig, config: &BodeConfig) -> Result<()> {
    let labels = labels(session, config);
    let comparing = labels.len() > 1;
    let figures = if comparing {
        session.figures_dir("bode_combined")
    } else {
        session.figures_dir("bode")
    };
    let mut per_label: Vec<Vec<ChannelAggregate>> = vec![Vec::new(); labels.len()];
    let mut usable_channels = 0usize;
    for &channel in &config.channels {
        match channel_chart(session, config, &labels, channel, &figures) {
            Ok(aggregates) => {
                usable_channels += 1;
                for (slot, aggregate) in per_label.iter_mut().zip(aggregates) {
                    slot.push(aggregate);
                }
            }
            Err(err) => warn!("channel {channel}: {err:#}, skipping"),
        }
    }
    let mut combined = Vec::with_capacity(labels.len());
    for (label, aggregates) in labels.iter().zip(&per_label) {
        if aggregates.is_empty() {
            bail!("no usable data for label {label}");
        }
        combined.push(combine_channels(aggregates, "all channels")?);
    }
    let series: Vec<BodeSeries<'_>> = labels
        .iter()
        .zip(&combined)
        .map(|(label, aggregate)| BodeSeries {
            label: label.clone(),
            aggregate,
        })
        .collect();
    let style = annotated_style(config, usable_channels);
    let png = render_bode_png(
        &series,
        &BodeAxes::default(),
        &caption(config, "Bode Plot for All Channels"),
        &style,
    )?;
    let name = if comparing {
        "bode_combined_all_channels.png".to_string()
    } else {
        format!("{}_all_channels.png", session.base_name())
    };
    let path = figures.join(name);
    write_png(&path, &png)?;
    info!("combined chart saved to {}", path.display());
    Ok(())
}
fn channel_chart(
    session: &SessionConfig,
    config: &BodeConfig,
    labels: &[String],
    channel: usize,
    figures: &Path,
) -> Result<Vec<ChannelAggregate>> {
    let mut aggregates = Vec::with_capacity(labels.len());
    for label in labels {
        let sweeps = channel_sweeps(session, label, channel, config.sweeps_per_channel)?;
        aggregates.push(aggregate_sweeps(
            &sweeps,
            &format!("channel {channel} ({label})"),
        )?);
    }
    let series: Vec<BodeSeries<'_>> = labels
        .iter()
        .zip(&aggregates)
        .map(|(label, aggregate)| BodeSeries {
            label: label.clone(),
            aggregate,
        })
        .collect();
    let style = annotated_style(config, 1);
    let png = render_bode_png(
        &series,
        &BodeAxes::default(),
        &caption(config, &format!("Bode Plot for Channel {channel}")),
        &style,
    )?;
    let name = if labels.len() > 1 {
        format!("bode_combined_{channel}.png")
    } else {
        format!("{}_{channel}.png", session.base_name())
    };
    write_png(&figures.join(name), &png)?;
    Ok(aggregates)
}
fn overlay(session: &SessionConfig, config: &BodeConfig) -> Result<()> {
    let entries = collect_aggregates(session, config)?;
    let series: Vec<BodeSeries<'_>> = entries
        .iter()
        .map(|(label, aggregate)| BodeSeries {
            label: label.clone(),
            aggregate,
        })
        .collect();
    let style = annotated_style(config, entries.len());
    let png = render_bode_png(
        &series,
        &BodeAxes::default(),
        &caption(config, "Mean Impedance and Phase vs. Frequency"),
        &style,
    )?;
    let path = session
        .figures_dir("overlay")
        .join(format!("{}_within_combined.png", session.base_name()));
    write_png(&path, &png)?;
    info!("overlay chart saved to {}", path.display());
    Ok(())
}
fn split(session: &SessionConfig, config: &BodeConfig) -> Result<()> {
    let entries = collect_aggregates(session, config)?;
    let series: Vec<BodeSeries<'_>> = entries
        .iter()
        .map(|(label, aggregate)| BodeSeries {
            label: label.clone(),
            aggregate,
        })
        .collect();
    // The split charts keep the linear frequency axis the lab used for them.
    let axes = BodeAxes {
        frequency_hz: (0.0, 1100.0),
        magnitude_ohm: (1e5, 1e8),
        phase_deg: (-60.0, 30.0),
    };
    let style = annotated_style(config, entries.len());
    let figures = session.figures_dir("overlay");
    let magnitude = render_overlay_png(
        &series,
        &axes,
        OverlayKind::Magnitude,
        &caption(config, "Mean Impedance vs. Frequency"),
        &style,
    )?;
    write_png(
        &figures.join(format!("{}_magnitude.png", session.base_name())),
        &magnitude,
    )?;
    let phase = render_overlay_png(
        &series,
        &axes,
        OverlayKind::Phase,
        &caption(config, "Mean Phase vs. Frequency"),
        &style,
    )?;
    write_png(
        &figures.join(format!("{}_phase.png", session.base_name())),
        &phase,
    )?;
    info!("overlay charts saved under {}", figures.display());
    Ok(())
}
fn collect_aggregates(
    session: &SessionConfig,
    config: &BodeConfig,
) -> Result<Vec<(String, ChannelAggregate)>> {
    let mut entries = Vec::new();
    for &channel in &config.channels {
        let sweeps =
            match channel_sweeps(session, &session.label, channel, config.sweeps_per_channel) {
                Ok(sweeps) => sweeps,
                Err(err) => {
                    warn!("channel {channel}: {err}, skipping");
                    continue;
                }
            };
        match aggregate_sweeps(&sweeps, &format!("channel {channel}")) {
            Ok(aggregate) => entries.push((format!("channel {channel}"), aggregate)),
            Err(err) => warn!("channel {channel}: {err}, skipping"),
        }
    }
    if entries.is_empty() {
        bail!("no usable data for any requested channel");
    }
    Ok(entries)
}
fn caption(config: &BodeConfig, default: &str) -> String {
    match &config.title {
        Some(title) => format!("{default} ({title})"),
        None => default.to_string(),
    }
}
fn annotated_style(config: &BodeConfig, num_channels: usize) -> PlotStyle {
    let mut style = PlotStyle::default();
    style.annotation = vec![
        "SEM error bars".into(),
        format!(
            "N = {num_channels} channels, {} sweeps each",
            config.sweeps_per_channel
        ),
    ];
    style
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::eis::{write_sweep_csv, Sweep};
    use crate::session::SessionConfig;
    use std::path::Path;
    fn session(root: &Path) -> SessionConfig {
        SessionConfig {
            data_root: root.to_path_buf(),
            folder: "01may24_1".into(),
            label: "preplate".into(),
        }
    }
    fn write_channel(session: &SessionConfig, channel: usize, frequencies: &[f64]) {
        for sweep_no in 1..=2 {
            let magnitudes: Vec<f64> = frequencies
                .iter()
                .map(|f| 1e6 / f * (channel + sweep_no) as f64)
                .collect();
            let phases = vec![-80.0; frequencies.len()];
            let sweep = Sweep::from_columns(frequencies, &magnitudes, &phases);
            write_sweep_csv(&session.sweep_csv(channel, sweep_no), &sweep).unwrap();
        }
    }
    #[test]
    fn missing_channel_is_skipped_but_batch_completes() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let frequencies = [50.0, 150.0, 250.0];
        write_channel(&session, 0, &frequencies);
        write_channel(&session, 2, &frequencies);
        // channel 1 has no files at all
        let config = BodeConfig {
            channels: vec![0, 1, 2],
            sweeps_per_channel: 2,
            mode: BodeMode::PerChannel,
            compare_label: None,
            title: None,
        };
        run(&session, &config).unwrap();
        let figures = session.figures_dir("bode");
        assert!(figures.join("01may24_1_preplate_0.png").exists());
        assert!(!figures.join("01may24_1_preplate_1.png").exists());
        assert!(figures.join("01may24_1_preplate_2.png").exists());
        assert!(figures.join("01may24_1_preplate_all_channels.png").exists());
    }
    #[test]
    fn combined_step_fails_on_axis_mismatch_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        write_channel(&session, 0, &[50.0, 150.0]);
        write_channel(&session, 1, &[50.0, 160.0]);
        let config = BodeConfig {
            channels: vec![0, 1],
            sweeps_per_channel: 2,
            mode: BodeMode::PerChannel,
            compare_label: None,
            title: None,
        };
        let err = run(&session, &config).unwrap_err();
        assert!(err.to_string().contains("frequency axes"));
        assert!(!session
            .figures_dir("bode")
            .join("01may24_1_preplate_all_channels.png")
            .exists());
    }
    #[test]
    fn split_mode_writes_magnitude_and_phase_charts() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        write_channel(&session, 0, &[50.0, 150.0, 250.0]);
        let config = BodeConfig {
            channels: vec![0],
            sweeps_per_channel: 2,
            mode: BodeMode::Split,
            compare_label: None,
            title: Some("gold".into()),
        };
        run(&session, &config).unwrap();
        let figures = session.figures_dir("overlay");
        assert!(figures.join("01may24_1_preplate_magnitude.png").exists());
        assert!(figures.join("01may24_1_preplate_phase.png").exists());
    }
}
