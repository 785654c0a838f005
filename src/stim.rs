use anyhow::Result;
use serde::Serialize;
/// Software trigger ids map to trigger sources 24..=31 on the unit.
pub const SOFTWARE_TRIGGER_BASE: i32 = 24;
/// Maximum step count the current driver accepts.
pub const MAX_CURRENT_STEPS: u32 = 255;
/// Current-driver step granularities supported by the stimulation front end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StimStepSize {
    Na10,
    Na20,
    Na50,
    Na100,
    Na200,
    Na500,
    Ua1,
    Ua2,
    Ua5,
    Ua10,
}
impl StimStepSize {
    pub const ALL: [StimStepSize; 10] = [
        StimStepSize::Na10,
        StimStepSize::Na20,
        StimStepSize::Na50,
        StimStepSize::Na100,
        StimStepSize::Na200,
        StimStepSize::Na500,
        StimStepSize::Ua1,
        StimStepSize::Ua2,
        StimStepSize::Ua5,
        StimStepSize::Ua10,
    ];
    pub fn nanoamps(self) -> f64 {
        match self {
            StimStepSize::Na10 => 10.0,
            StimStepSize::Na20 => 20.0,
            StimStepSize::Na50 => 50.0,
            StimStepSize::Na100 => 100.0,
            StimStepSize::Na200 => 200.0,
            StimStepSize::Na500 => 500.0,
            StimStepSize::Ua1 => 1_000.0,
            StimStepSize::Ua2 => 2_000.0,
            StimStepSize::Ua5 => 5_000.0,
            StimStepSize::Ua10 => 10_000.0,
        }
    }
}
/// Picks the step size that best reaches `target_na` within the 255-step
/// limit of the driver.
pub fn best_step_size(target_na: f64) -> StimStepSize {
    let mut best = StimStepSize::Na10;
    let mut best_error = f64::INFINITY;
    for step_size in StimStepSize::ALL {
        let steps = (target_na / step_size.nanoamps())
            .round()
            .min(MAX_CURRENT_STEPS as f64);
        let error = (target_na - step_size.nanoamps() * steps).abs();
        if error < best_error {
            best_error = error;
            best = step_size;
        }
    }
    best
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StimShape {
    Monophasic,
    Biphasic,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolarity {
    Cathodic,
    Anodic,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    Level,
    Edge,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolarity {
    High,
    Low,
}
/// Full parameter block for one stimulation waveform, marshalled to the
/// vendor library as JSON.
#[derive(Clone, Debug, Serialize)]
pub struct PulseParams {
    pub polarity: StartPolarity,
    pub shape: StimShape,
    pub delay_ms: f64,
    pub phase1_ms: f64,
    pub phase2_ms: f64,
    pub phase3_ms: f64,
    pub step_size: StimStepSize,
    pub amp_neg_ma: f64,
    pub amp_pos_ma: f64,
    pub pre_ampsettle_ms: f64,
    pub post_ampsettle_ms: f64,
    pub post_charge_recovery_ms: f64,
    pub post_pulse_ms: f64,
    pub trigger: TriggerEvent,
    pub trigger_pol: TriggerPolarity,
    pub pulses: u32,
}
impl PulseParams {
    /// 50% duty-cycle single-phase pulse train at `frequency_hz`; the sign of
    /// `ma` selects the leading polarity.
    pub fn monophasic(ma: f64, frequency_hz: f64) -> Self {
        let half_period_ms = 1e3 / frequency_hz / 2.0;
        Self {
            polarity: if ma < 0.0 {
                StartPolarity::Cathodic
            } else {
                StartPolarity::Anodic
            },
            shape: StimShape::Monophasic,
            delay_ms: 0.0,
            phase1_ms: half_period_ms,
            phase2_ms: 0.0,
            phase3_ms: 0.0,
            step_size: best_step_size(ma.abs() * 1e6),
            amp_neg_ma: if ma > 0.0 { 0.0 } else { -ma },
            amp_pos_ma: if ma > 0.0 { ma } else { 0.0 },
            pre_ampsettle_ms: 0.0,
            post_ampsettle_ms: half_period_ms,
            post_charge_recovery_ms: 0.0,
            post_pulse_ms: half_period_ms,
            trigger: TriggerEvent::Level,
            trigger_pol: TriggerPolarity::High,
            pulses: 1,
        }
    }
    /// Charge-balanced two-phase pulse train; each phase and the settle/rest
    /// windows take a third of the period.
    pub fn biphasic(ma: f64, frequency_hz: f64) -> Self {
        let period_ms = 1e3 / frequency_hz;
        Self {
            polarity: if ma < 0.0 {
                StartPolarity::Cathodic
            } else {
                StartPolarity::Anodic
            },
            shape: StimShape::Biphasic,
            delay_ms: 0.0,
            phase1_ms: period_ms / 3.0,
            phase2_ms: period_ms / 3.0,
            phase3_ms: 0.0,
            step_size: best_step_size(ma.abs() * 1e6),
            amp_neg_ma: ma.abs(),
            amp_pos_ma: ma.abs(),
            pre_ampsettle_ms: 0.0,
            post_ampsettle_ms: period_ms / 3.0,
            post_charge_recovery_ms: 0.0,
            post_pulse_ms: period_ms / 3.0,
            trigger: TriggerEvent::Level,
            trigger_pol: TriggerPolarity::High,
            pulses: 1,
        }
    }
}
/// Number of sample steps covering `duration_ms`, rounded up to a multiple of
/// 128 to avoid block-alignment errors in the acquisition engine.
pub fn align_run_steps(duration_ms: f64, sample_rate_hz: f64) -> u64 {
    let steps = (duration_ms / 1e3 * sample_rate_hz) as u64;
    steps.div_ceil(128) * 128
}
/// Stimulation-side control surface of the acquisition unit.
pub trait StimController {
    fn enable_stim(
        &mut self,
        stream: i32,
        channel: usize,
        trigger_source: i32,
        params: &PulseParams,
    ) -> Result<()>;
    fn disable_stim(&mut self, stream: i32, channel: usize) -> Result<()>;
    fn manual_trigger(&mut self, trigger_id: i32, on: bool) -> Result<()>;
    fn set_stim_cmd_mode(&mut self, on: bool) -> Result<()>;
    fn run_and_discard(&mut self, steps: u64) -> Result<()>;
    fn sample_rate_hz(&self) -> f64;
}
