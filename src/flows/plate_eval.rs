use anyhow::Result;
use log::{info, warn};
use crate::eis::{load_plating_table, render_plating_png, write_png, Marker, PlotStyle};
use crate::session::SessionConfig;
/// Renders one impedance-vs-stimulated-channel chart per measured channel
/// from the wide plating CSV.
pub fn run(session: &SessionConfig) -> Result<()> {
    let table = load_plating_table(&session.plating_csv())?;
    let figures = session.figures_dir("plating_plots");
    let style = PlotStyle::default();
    for channel in 0..table.num_channels() {
        let values = table.channel_column(channel);
        if values.iter().all(|v| !v.is_finite()) {
            warn!("channel {channel}: no numeric plating data, skipping");
            continue;
        }
        // Square markers distinguish the back half of the array at a glance.
        let marker = if channel < 10 {
            Marker::Circle
        } else {
            Marker::Square
        };
        let result = render_plating_png(
            &table.stimulated,
            &values,
            marker,
            &format!("Impedance for Channel {channel}"),
            &style,
        )
        .and_then(|png| {
            write_png(
                &figures.join(format!("{}_{channel}.png", session.folder)),
                &png,
            )
        });
        if let Err(err) = result {
            warn!("channel {channel}: {err}, skipping");
        }
    }
    info!("plating charts saved under {}", figures.display());
    Ok(())
}
