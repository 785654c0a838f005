use std::collections::VecDeque;
use anyhow::{anyhow, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::eis::EisError;
use crate::stim::{PulseParams, StimController};
/// One impedance reading: parallel magnitude / phase values for the channel
/// set passed to the measurement call.
#[derive(Clone, Debug)]
pub struct ImpedanceReading {
    pub magnitudes_ohm: Vec<f64>,
    pub phases_deg: Vec<f64>,
}
impl ImpedanceReading {
    pub fn validate(&self, expected: usize) -> Result<(), EisError> {
        let actual = self.magnitudes_ohm.len().min(self.phases_deg.len());
        if self.magnitudes_ohm.len() != expected || self.phases_deg.len() != expected {
            return Err(EisError::ChannelMismatch { expected, actual });
        }
        Ok(())
    }
}
/// Trait representing anything that can measure impedance at one frequency
/// over a set of hardware channels.
pub trait ImpedanceSource {
    fn measure_impedance(
        &mut self,
        frequency_hz: f64,
        channels: &[usize],
    ) -> Result<ImpedanceReading>;
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<ImpedanceReading>,
}
impl ManualSource {
    pub fn new(readings: impl IntoIterator<Item = ImpedanceReading>) -> Self {
        Self {
            queue: readings.into_iter().collect(),
        }
    }
}
impl ImpedanceSource for ManualSource {
    fn measure_impedance(
        &mut self,
        _frequency_hz: f64,
        channels: &[usize],
    ) -> Result<ImpedanceReading> {
        let reading = self
            .queue
            .pop_front()
            .ok_or_else(|| anyhow!("manual source exhausted"))?;
        reading.validate(channels.len())?;
        Ok(reading)
    }
}
/// Offline stand-in for the acquisition unit: a series resistance in front of
/// an electrode double-layer capacitance, plus a little measurement jitter.
pub struct SyntheticSource {
    rng: StdRng,
    series_ohm: f64,
    capacitance_f: f64,
}
impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            series_ohm: 15_000.0,
            capacitance_f: 3.0e-9,
        }
    }
}
impl ImpedanceSource for SyntheticSource {
    fn measure_impedance(
        &mut self,
        frequency_hz: f64,
        channels: &[usize],
    ) -> Result<ImpedanceReading> {
        let mut magnitudes_ohm = Vec::with_capacity(channels.len());
        let mut phases_deg = Vec::with_capacity(channels.len());
        for &channel in channels {
            // Z = R + 1/(jwC), with a per-channel spread so electrodes differ.
            let spread = 1.0 + channel as f64 * 0.015;
            let reactance =
                1.0 / (std::f64::consts::TAU * frequency_hz * self.capacitance_f * spread);
            let resistance = self.series_ohm * spread;
            let jitter: f64 = self.rng.gen_range(0.98..1.02);
            magnitudes_ohm.push(resistance.hypot(reactance) * jitter);
            phases_deg.push((-reactance).atan2(resistance).to_degrees());
        }
        Ok(ImpedanceReading {
            magnitudes_ohm,
            phases_deg,
        })
    }
}
impl StimController for SyntheticSource {
    fn enable_stim(
        &mut self,
        stream: i32,
        channel: usize,
        _trigger_source: i32,
        params: &PulseParams,
    ) -> Result<()> {
        debug!(
            "simulate: stim on stream {stream} channel {channel}, {} mA",
            params.amp_pos_ma.max(params.amp_neg_ma)
        );
        Ok(())
    }
    fn disable_stim(&mut self, _stream: i32, _channel: usize) -> Result<()> {
        Ok(())
    }
    fn manual_trigger(&mut self, trigger_id: i32, on: bool) -> Result<()> {
        debug!("simulate: trigger {trigger_id} -> {on}");
        Ok(())
    }
    fn set_stim_cmd_mode(&mut self, _on: bool) -> Result<()> {
        Ok(())
    }
    fn run_and_discard(&mut self, steps: u64) -> Result<()> {
        debug!("simulate: running {steps} steps");
        Ok(())
    }
    fn sample_rate_hz(&self) -> f64 {
        30_000.0
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn manual_source_plays_back_in_order() {
        let mut source = ManualSource::new(vec![
            ImpedanceReading {
                magnitudes_ohm: vec![1.0],
                phases_deg: vec![-10.0],
            },
            ImpedanceReading {
                magnitudes_ohm: vec![2.0],
                phases_deg: vec![-20.0],
            },
        ]);
        let first = source.measure_impedance(50.0, &[0]).unwrap();
        assert_eq!(first.magnitudes_ohm, vec![1.0]);
        let second = source.measure_impedance(150.0, &[0]).unwrap();
        assert_eq!(second.phases_deg, vec![-20.0]);
        assert!(source.measure_impedance(250.0, &[0]).is_err());
    }
    #[test]
    fn manual_source_checks_channel_count() {
        let mut source = ManualSource::new(vec![ImpedanceReading {
            magnitudes_ohm: vec![1.0],
            phases_deg: vec![-10.0],
        }]);
        assert!(source.measure_impedance(50.0, &[0, 1]).is_err());
    }
    #[test]
    fn synthetic_magnitude_falls_with_frequency() {
        let mut source = SyntheticSource::new(7);
        let low = source.measure_impedance(50.0, &[0]).unwrap();
        let high = source.measure_impedance(1050.0, &[0]).unwrap();
        assert!(low.magnitudes_ohm[0] > high.magnitudes_ohm[0]);
        assert!(low.phases_deg[0] > -90.0 && low.phases_deg[0] < 0.0);
    }
    #[test]
    fn synthetic_is_deterministic_per_seed() {
        let mut a = SyntheticSource::new(42);
        let mut b = SyntheticSource::new(42);
        let ra = a.measure_impedance(250.0, &[3]).unwrap();
        let rb = b.measure_impedance(250.0, &[3]).unwrap();
        assert_eq!(ra.magnitudes_ohm, rb.magnitudes_ohm);
    }
}
