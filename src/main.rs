// src/main.rs
mod cli;
mod eis;
mod flows;
mod session;
mod source;
mod stim;
mod xdaq;
use anyhow::Result;
use clap::Parser;
use log::error;
use cli::{Cli, Command};
use flows::plate::{PlateConfig, PlateStep};
use flows::sweep::{frequency_grid, SweepConfig};
use session::all_channels;
use source::SyntheticSource;
use xdaq::XdaqSession;
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}
fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sweep(args) => {
            let session = args.session.to_config();
            let config = SweepConfig {
                channels: args.channels.clone().unwrap_or_else(all_channels),
                sweeps_per_channel: args.sweeps,
                frequencies_hz: frequency_grid(args.freq_start, args.freq_stop, args.freq_step),
                note: args.note.clone(),
            };
            if args.hardware.simulate {
                let mut source = SyntheticSource::new(args.hardware.seed);
                flows::sweep::run(&session, &config, &mut source)
            } else {
                let mut source = XdaqSession::open(args.hardware.device_index)?;
                flows::sweep::run(&session, &config, &mut source)
            }
        }
        Command::Plate(args) => {
            let session = args.session.to_config();
            let schedule = if args.steps.is_empty() {
                PlateStep::default_schedule()
            } else {
                args.steps
                    .iter()
                    .map(|raw| raw.parse())
                    .collect::<Result<Vec<PlateStep>>>()?
            };
            let config = PlateConfig {
                schedule,
                stream: args.stream,
                pulse_frequency_hz: args.pulse_freq,
                iteration_ms: args.duration_ms,
                baseline_check: args.baseline,
                check_frequency_hz: args.check_freq,
            };
            if args.hardware.simulate {
                let mut device = SyntheticSource::new(args.hardware.seed);
                flows::plate::run(&session, &config, &mut device)
            } else {
                let mut device = XdaqSession::open(args.hardware.device_index)?;
                flows::plate::run(&session, &config, &mut device)
            }
        }
        Command::Bode(args) => {
            let session = args.session.to_config();
            let config = flows::bode::BodeConfig {
                channels: args.channels.clone().unwrap_or_else(all_channels),
                sweeps_per_channel: args.sweeps,
                mode: args.mode,
                compare_label: args.compare.clone(),
                title: args.title.clone(),
            };
            flows::bode::run(&session, &config)
        }
        Command::Nyquist(args) => {
            let session = args.session.to_config();
            let config = flows::nyquist::NyquistConfig {
                channels: args.channels.clone().unwrap_or_else(all_channels),
                sweeps_per_channel: args.sweeps,
                compare_label: args.compare.clone(),
                title: args.title.clone(),
            };
            flows::nyquist::run(&session, &config)
        }
        Command::PlateEval(args) => flows::plate_eval::run(&args.session.to_config()),
    }
}
