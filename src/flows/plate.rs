use std::str::FromStr;
use anyhow::{anyhow, Context, Result};
use log::info;
use serde::Serialize;
use crate::eis::PlatingLog;
use crate::session::{all_channels, to_hardware_channel, SessionConfig, NUM_CHANNELS};
use crate::source::ImpedanceSource;
use crate::stim::{align_run_steps, PulseParams, StimController, SOFTWARE_TRIGGER_BASE};
const SOFTWARE_TRIGGER_ID: i32 = 0;
/// One entry of the plating schedule.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PlateStep {
    pub channel: usize,
    pub iterations: u32,
    pub current_ma: f64,
}
impl FromStr for PlateStep {
    type Err = anyhow::Error;
    /// Parses `channel:iterations:current_ma`, e.g. `3:4:0.00002`.
    fn from_str(raw: &str) -> Result<Self> {
        let mut parts = raw.split(':');
        let (Some(channel), Some(iterations), Some(current_ma), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(anyhow!(
                "expected channel:iterations:current_ma, got {raw:?}"
            ));
        };
        Ok(Self {
            channel: channel.trim().parse().context("channel")?,
            iterations: iterations.trim().parse().context("iterations")?,
            current_ma: current_ma.trim().parse().context("current_ma")?,
        })
    }
}
impl PlateStep {
    /// The ladder the lab ran most often: three current levels across
    /// channels 1-15 with increasing dwell per level.
    pub fn default_schedule() -> Vec<PlateStep> {
        let iterations = [1, 2, 2, 4, 8];
        let currents_ma = [1e-5, 2e-5, 4e-5];
        let mut schedule = Vec::new();
        let mut channel = 1;
        for current_ma in currents_ma {
            for iterations in iterations {
                schedule.push(PlateStep {
                    channel,
                    iterations,
                    current_ma,
                });
                channel += 1;
            }
        }
        schedule
    }
}
#[derive(Clone, Debug, Serialize)]
pub struct PlateConfig {
    pub schedule: Vec<PlateStep>,
    pub stream: i32,
    pub pulse_frequency_hz: f64,
    pub iteration_ms: f64,
    pub baseline_check: bool,
    pub check_frequency_hz: f64,
}
/// Runs the plating schedule: per channel, repeat the pulse train, then
/// spot-check all channel impedances and append a row to the wide CSV.
pub fn run<D>(session: &SessionConfig, config: &PlateConfig, device: &mut D) -> Result<()>
where
    D: ImpedanceSource + StimController,
{
    session.write_provenance(config, None)?;
    let path = session.plating_csv();
    let mut log = PlatingLog::create(&path, NUM_CHANNELS)?;
    if config.baseline_check {
        info!(
            "checking starting impedance at {} Hz",
            config.check_frequency_hz
        );
        spot_check(device, &mut log, "None", config.check_frequency_hz)?;
    }
    for step in &config.schedule {
        let hardware = to_hardware_channel(step.channel)?;
        for iteration in 1..=step.iterations {
            info!(
                "run {iteration}, channel {}: sending {} Hz {} mA pulses for {} ms",
                step.channel, config.pulse_frequency_hz, step.current_ma, config.iteration_ms
            );
            let params = PulseParams::biphasic(step.current_ma, config.pulse_frequency_hz);
            device.enable_stim(
                config.stream,
                hardware,
                SOFTWARE_TRIGGER_BASE + SOFTWARE_TRIGGER_ID,
                &params,
            )?;
            device.manual_trigger(SOFTWARE_TRIGGER_ID, true)?;
            let steps = align_run_steps(config.iteration_ms, device.sample_rate_hz());
            device.set_stim_cmd_mode(true)?;
            device.run_and_discard(steps)?;
            device.set_stim_cmd_mode(false)?;
            device.manual_trigger(SOFTWARE_TRIGGER_ID, false)?;
            device.disable_stim(config.stream, hardware)?;
        }
        info!(
            "channel {} complete, checking impedance at {} Hz",
            step.channel, config.check_frequency_hz
        );
        spot_check(
            device,
            &mut log,
            &step.channel.to_string(),
            config.check_frequency_hz,
        )?;
    }
    info!("plating data saved to {}", path.display());
    Ok(())
}
fn spot_check<D: ImpedanceSource>(
    device: &mut D,
    log: &mut PlatingLog,
    stimulated: &str,
    frequency_hz: f64,
) -> Result<()> {
    let hardware: Vec<usize> = all_channels()
        .into_iter()
        .map(to_hardware_channel)
        .collect::<Result<_>>()?;
    let reading = device.measure_impedance(frequency_hz, &hardware)?;
    reading.validate(NUM_CHANNELS)?;
    for (channel, magnitude) in reading.magnitudes_ohm.iter().enumerate() {
        info!("impedance at channel {channel}, {frequency_hz} Hz: {magnitude:.2} Ohm");
    }
    log.append(stimulated, &reading.magnitudes_ohm)?;
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::eis::load_plating_table;
    use crate::source::SyntheticSource;
    use std::path::Path;
    fn session(root: &Path) -> SessionConfig {
        SessionConfig {
            data_root: root.to_path_buf(),
            folder: "01may24_1".into(),
            label: "plating".into(),
        }
    }
    #[test]
    fn plate_step_parses_and_rejects() {
        let step = PlateStep::from_str("3:4:0.00002").unwrap();
        assert_eq!(step.channel, 3);
        assert_eq!(step.iterations, 4);
        assert_eq!(step.current_ma, 2e-5);
        assert!(PlateStep::from_str("3:4").is_err());
        assert!(PlateStep::from_str("3:4:x").is_err());
        assert!(PlateStep::from_str("3:4:1:9").is_err());
    }
    #[test]
    fn default_schedule_covers_channels_1_to_15() {
        let schedule = PlateStep::default_schedule();
        assert_eq!(schedule.len(), 15);
        assert_eq!(schedule[0].channel, 1);
        assert_eq!(schedule[14].channel, 15);
        assert_eq!(schedule[4].iterations, 8);
        assert_eq!(schedule[5].current_ma, 2e-5);
    }
    #[test]
    fn simulated_plating_writes_one_row_per_step() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path());
        let config = PlateConfig {
            schedule: vec![
                PlateStep {
                    channel: 1,
                    iterations: 1,
                    current_ma: 1e-5,
                },
                PlateStep {
                    channel: 2,
                    iterations: 2,
                    current_ma: 2e-5,
                },
            ],
            stream: 0,
            pulse_frequency_hz: 50.0,
            iteration_ms: 10.0,
            baseline_check: true,
            check_frequency_hz: 1000.0,
        };
        let mut device = SyntheticSource::new(7);
        run(&session, &config, &mut device).unwrap();
        let table = load_plating_table(&session.plating_csv()).unwrap();
        assert_eq!(table.stimulated, vec!["None", "1", "2"]);
        assert_eq!(table.num_channels(), NUM_CHANNELS);
        assert!(table.impedances_ohm[0].iter().all(|v| v.is_finite()));
    }
}
