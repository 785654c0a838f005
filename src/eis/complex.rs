use std::collections::BTreeMap;
use crate::eis::aggregate::{check_frequency_axes, combine_rows, mean_sem, BinStats, FreqKey};
use crate::eis::error::EisError;
use crate::eis::record::Sweep;
/// Cartesian impedance components, `Z = magnitude * exp(i * phase)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComplexPoint {
    pub real: f64,
    pub imag: f64,
}
pub fn to_cartesian(magnitude_ohm: f64, phase_deg: f64) -> ComplexPoint {
    let phase_rad = phase_deg.to_radians();
    ComplexPoint {
        real: magnitude_ohm * phase_rad.cos(),
        imag: magnitude_ohm * phase_rad.sin(),
    }
}
/// Inverse of `to_cartesian`, used to check round trips.
pub fn to_polar(point: ComplexPoint) -> (f64, f64) {
    let magnitude = point.real.hypot(point.imag);
    let phase_deg = point.imag.atan2(point.real).to_degrees();
    (magnitude, phase_deg)
}
/// Per-frequency mean / SEM of the real and imaginary components across
/// sweeps. This is a distinct reduction from the polar aggregate: statistics
/// are taken on the transformed components directly.
#[derive(Clone, Debug)]
pub struct NyquistAggregate {
    pub frequencies_hz: Vec<f64>,
    pub real: Vec<BinStats>,
    pub imag: Vec<BinStats>,
}
impl NyquistAggregate {
    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }
    pub fn real_means(&self) -> Vec<f64> {
        self.real.iter().map(|b| b.mean).collect()
    }
    pub fn imag_means(&self) -> Vec<f64> {
        self.imag.iter().map(|b| b.mean).collect()
    }
}
/// Transforms every record to cartesian form, then groups by exact frequency
/// with the same discipline as the polar aggregation: a sweep whose distinct
/// frequency set differs aborts the unit.
pub fn aggregate_complex(sweeps: &[Sweep], context: &str) -> Result<NyquistAggregate, EisError> {
    let usable: Vec<&Sweep> = sweeps.iter().filter(|s| !s.is_empty()).collect();
    if usable.is_empty() {
        return Err(EisError::EmptyAggregate {
            context: context.to_string(),
        });
    }
    check_frequency_axes(&usable, context)?;
    let mut bins: BTreeMap<FreqKey, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for sweep in &usable {
        for record in &sweep.records {
            let point = to_cartesian(record.magnitude_ohm, record.phase_deg);
            let bin = bins.entry(FreqKey(record.frequency_hz)).or_default();
            bin.0.push(point.real);
            bin.1.push(point.imag);
        }
    }
    let mut frequencies_hz = Vec::with_capacity(bins.len());
    let mut real = Vec::with_capacity(bins.len());
    let mut imag = Vec::with_capacity(bins.len());
    for (key, (reals, imags)) in bins {
        frequencies_hz.push(key.0);
        real.push(mean_sem(&reals));
        imag.push(mean_sem(&imags));
    }
    Ok(NyquistAggregate {
        frequencies_hz,
        real,
        imag,
    })
}
/// Combined Nyquist curve over channels, mean of per-channel means, same
/// reduction law and axis requirement as the Bode combine.
pub fn combine_complex(
    per_channel: &[NyquistAggregate],
    context: &str,
) -> Result<NyquistAggregate, EisError> {
    if per_channel.is_empty() {
        return Err(EisError::EmptyAggregate {
            context: context.to_string(),
        });
    }
    let frequencies_hz = per_channel[0].frequencies_hz.clone();
    for aggregate in &per_channel[1..] {
        if aggregate.frequencies_hz != frequencies_hz {
            return Err(EisError::FrequencyMismatch {
                context: context.to_string(),
            });
        }
    }
    let real_rows: Vec<Vec<f64>> = per_channel.iter().map(|a| a.real_means()).collect();
    let imag_rows: Vec<Vec<f64>> = per_channel.iter().map(|a| a.imag_means()).collect();
    Ok(NyquistAggregate {
        real: combine_rows(&real_rows),
        imag: combine_rows(&imag_rows),
        frequencies_hz,
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::eis::record::Sweep;
    #[test]
    fn polar_cartesian_round_trip() {
        for &(magnitude, phase) in &[(120_000.0, -80.0), (5_500.0, -12.5), (1.0, 179.0)] {
            let point = to_cartesian(magnitude, phase);
            let (mag_back, phase_back) = to_polar(point);
            assert!((mag_back - magnitude).abs() < 1e-6 * magnitude.max(1.0));
            assert!((phase_back - phase).abs() < 1e-9);
        }
    }
    #[test]
    fn known_angles() {
        let point = to_cartesian(100.0, -90.0);
        assert!(point.real.abs() < 1e-9);
        assert!((point.imag + 100.0).abs() < 1e-9);
    }
    #[test]
    fn component_statistics_are_computed_on_cartesian_values() {
        let frequencies = [50.0, 150.0];
        // Equal magnitude, opposite phase: polar means would keep the full
        // magnitude, the cartesian imaginary mean cancels to zero.
        let up = Sweep::from_columns(&frequencies, &[100.0, 100.0], &[90.0, 90.0]);
        let down = Sweep::from_columns(&frequencies, &[100.0, 100.0], &[-90.0, -90.0]);
        let aggregate = aggregate_complex(&[up, down], "x").unwrap();
        for bin in &aggregate.imag {
            assert!(bin.mean.abs() < 1e-9);
            assert_eq!(bin.count, 2);
        }
    }
    #[test]
    fn mismatched_sweep_axes_abort_the_unit() {
        let a = Sweep::from_columns(&[50.0, 150.0], &[1.0, 1.0], &[0.0, 0.0]);
        let b = Sweep::from_columns(&[50.0, 160.0], &[1.0, 1.0], &[0.0, 0.0]);
        let err = aggregate_complex(&[a, b], "channel 3").unwrap_err();
        assert!(matches!(err, EisError::FrequencyMismatch { context } if context == "channel 3"));
    }
    #[test]
    fn combine_requires_matching_axes() {
        let a = aggregate_complex(
            &[Sweep::from_columns(&[50.0, 150.0], &[1.0, 1.0], &[0.0, 0.0])],
            "a",
        )
        .unwrap();
        let b = aggregate_complex(
            &[Sweep::from_columns(&[50.0, 160.0], &[1.0, 1.0], &[0.0, 0.0])],
            "b",
        )
        .unwrap();
        let err = combine_complex(&[a, b], "all channels").unwrap_err();
        assert!(matches!(err, EisError::FrequencyMismatch { .. }));
    }
}
