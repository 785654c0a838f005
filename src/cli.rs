//! Command-line surface. Every lab workflow is a subcommand with explicit
//! flags; nothing prompts on stdin.
use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};
use crate::flows::bode::BodeMode;
use crate::session::SessionConfig;
#[derive(Parser, Debug)]
#[command(
    name = "zsweep",
    version,
    about = "EIS sweep, plating and plotting toolkit for neural electrode arrays"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive repeated impedance sweeps per channel and render Bode charts.
    Sweep(SweepArgs),
    /// Run stimulation pulse trains with impedance spot checks per channel.
    Plate(PlateArgs),
    /// Render Bode charts from saved sweep CSVs.
    Bode(BodeArgs),
    /// Render Nyquist charts from saved sweep CSVs.
    Nyquist(NyquistArgs),
    /// Render per-channel charts from the wide plating CSV.
    PlateEval(PlateEvalArgs),
}
#[derive(Args, Debug, Clone)]
pub struct SessionOpts {
    /// Root of the data tree; runs live in <DATA_ROOT>/<FOLDER>.
    #[arg(long, default_value = "data", value_name = "DIR")]
    pub data_root: PathBuf,
    /// Run folder, conventionally <date>_<device>, e.g. 01may24_1.
    #[arg(long, value_name = "NAME")]
    pub folder: String,
    /// Sweep description used in file names, e.g. preplate or postplate.
    #[arg(long, default_value = "preplate", value_name = "LABEL")]
    pub label: String,
}
impl SessionOpts {
    pub fn to_config(&self) -> SessionConfig {
        SessionConfig {
            data_root: self.data_root.clone(),
            folder: self.folder.clone(),
            label: self.label.clone(),
        }
    }
}
#[derive(Args, Debug, Clone)]
pub struct HardwareOpts {
    /// Index of the acquisition unit to open.
    #[arg(long, default_value_t = 0)]
    pub device_index: i32,
    /// Use the synthetic offline source instead of real hardware.
    #[arg(long)]
    pub simulate: bool,
    /// Seed for the synthetic source's measurement jitter.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}
#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub session: SessionOpts,
    #[command(flatten)]
    pub hardware: HardwareOpts,
    /// Channels to sweep, comma separated; all sixteen when omitted.
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<usize>>,
    /// Sweeps per channel.
    #[arg(long, default_value_t = 3)]
    pub sweeps: usize,
    /// First frequency of the grid (Hz).
    #[arg(long, default_value_t = 50.0)]
    pub freq_start: f64,
    /// Exclusive upper bound of the grid (Hz).
    #[arg(long, default_value_t = 1150.0)]
    pub freq_stop: f64,
    /// Grid step (Hz).
    #[arg(long, default_value_t = 100.0)]
    pub freq_step: f64,
    /// Free-text description stored next to the data.
    #[arg(long)]
    pub note: Option<String>,
}
#[derive(Args, Debug)]
pub struct PlateArgs {
    #[command(flatten)]
    pub session: SessionOpts,
    #[command(flatten)]
    pub hardware: HardwareOpts,
    /// Schedule entries; the standard ladder over channels 1-15 when omitted.
    #[arg(long = "step", value_name = "CH:ITERS:MA")]
    pub steps: Vec<String>,
    /// Headstage stream carrying the target channels.
    #[arg(long, default_value_t = 0)]
    pub stream: i32,
    /// Pulse train frequency (Hz).
    #[arg(long, default_value_t = 50.0)]
    pub pulse_freq: f64,
    /// Stimulation time per iteration (ms).
    #[arg(long, default_value_t = 150_000.0)]
    pub duration_ms: f64,
    /// Measure all channels once before the first stimulation.
    #[arg(long)]
    pub baseline: bool,
    /// Spot-check frequency (Hz).
    #[arg(long, default_value_t = 1000.0)]
    pub check_freq: f64,
}
#[derive(Args, Debug)]
pub struct BodeArgs {
    #[command(flatten)]
    pub session: SessionOpts,
    /// Channels to chart, comma separated; all sixteen when omitted.
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<usize>>,
    /// Sweeps per channel to look for on disk.
    #[arg(long, default_value_t = 3)]
    pub sweeps: usize,
    /// Chart layout.
    #[arg(long, value_enum, default_value = "per-channel")]
    pub mode: BodeMode,
    /// Second sweep label to compare against (per-channel mode only).
    #[arg(long, value_name = "LABEL")]
    pub compare: Option<String>,
    /// Extra text appended to chart captions.
    #[arg(long)]
    pub title: Option<String>,
}
#[derive(Args, Debug)]
pub struct NyquistArgs {
    #[command(flatten)]
    pub session: SessionOpts,
    /// Channels to chart, comma separated; all sixteen when omitted.
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<usize>>,
    /// Sweeps per channel to look for on disk.
    #[arg(long, default_value_t = 3)]
    pub sweeps: usize,
    /// Second sweep label drawn on every chart.
    #[arg(long, value_name = "LABEL")]
    pub compare: Option<String>,
    /// Extra text appended to chart captions.
    #[arg(long)]
    pub title: Option<String>,
}
#[derive(Args, Debug)]
pub struct PlateEvalArgs {
    #[command(flatten)]
    pub session: SessionOpts,
}
