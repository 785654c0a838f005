use std::path::Path;
use anyhow::{bail, Result};
use log::{info, warn};
use serde::Serialize;
use crate::eis::{
    aggregate_complex, combine_complex, render_nyquist_png, write_png, NyquistAggregate,
    NyquistSeries, PlotStyle,
};
use crate::flows::channel_sweeps;
use crate::session::SessionConfig;
#[derive(Clone, Debug, Serialize)]
pub struct NyquistConfig {
    pub channels: Vec<usize>,
    pub sweeps_per_channel: usize,
    /// Second sweep label drawn against the session label on every chart.
    pub compare_label: Option<String>,
    pub title: Option<String>,
}
/// Renders one Nyquist chart per channel and a combined all-channels chart.
/// Channels without usable data are skipped with a diagnostic.
pub fn run(session: &SessionConfig, config: &NyquistConfig) -> Result<()> {
    let mut labels = vec![session.label.clone()];
    labels.extend(config.compare_label.iter().cloned());
    let figures = session.figures_dir("nyquist");
    let mut per_label: Vec<Vec<NyquistAggregate>> = vec![Vec::new(); labels.len()];
    for &channel in &config.channels {
        match channel_chart(session, config, &labels, channel, &figures) {
            Ok(aggregates) => {
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
        combined.push(combine_complex(aggregates, "all channels")?);
    }
    let series: Vec<NyquistSeries<'_>> = labels
        .iter()
        .zip(&combined)
        .map(|(label, aggregate)| NyquistSeries {
            label: label.clone(),
            aggregate,
        })
        .collect();
    let png = render_nyquist_png(
        &series,
        &caption(config, "Combined Nyquist Plot (All Channels)"),
        &PlotStyle::default(),
    )?;
    let path = figures.join("combined_nyquist_all_channels.png");
    write_png(&path, &png)?;
    info!("combined chart saved to {}", path.display());
    Ok(())
}
fn channel_chart(
    session: &SessionConfig,
    config: &NyquistConfig,
    labels: &[String],
    channel: usize,
    figures: &Path,
) -> Result<Vec<NyquistAggregate>> {
    let mut aggregates = Vec::with_capacity(labels.len());
    for label in labels {
        let sweeps = channel_sweeps(session, label, channel, config.sweeps_per_channel)?;
        aggregates.push(aggregate_complex(
            &sweeps,
            &format!("channel {channel} ({label})"),
        )?);
    }
    let series: Vec<NyquistSeries<'_>> = labels
        .iter()
        .zip(&aggregates)
        .map(|(label, aggregate)| NyquistSeries {
            label: label.clone(),
            aggregate,
        })
        .collect();
    let png = render_nyquist_png(
        &series,
        &caption(config, &format!("Nyquist Plot for Channel {channel}")),
        &PlotStyle::default(),
    )?;
    let name = if labels.len() > 1 {
        format!("combined_nyquist_{channel}.png")
    } else {
        format!("{}_nyquist_{channel}.png", session.base_name())
    };
    write_png(&figures.join(name), &png)?;
    Ok(aggregates)
}
fn caption(config: &NyquistConfig, default: &str) -> String {
    match &config.title {
        Some(title) => format!("{default} ({title})"),
        None => default.to_string(),
    }
}
