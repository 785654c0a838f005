use std::collections::{BTreeMap, BTreeSet};
use ndarray::{Array2, Axis};
use crate::eis::error::EisError;
use crate::eis::record::Sweep;
/// f64 key with a total order so frequencies can be grouped and sorted
/// without tolerance or binning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FreqKey(pub f64);
impl Eq for FreqKey {}
impl PartialOrd for FreqKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for FreqKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}
/// Mean / standard error / sample count for one frequency bin.
#[derive(Clone, Copy, Debug)]
pub struct BinStats {
    pub mean: f64,
    pub sem: f64,
    pub count: usize,
}
/// Aggregated magnitude and phase statistics for one unit (usually one
/// channel), ordered by ascending frequency.
#[derive(Clone, Debug)]
pub struct ChannelAggregate {
    pub frequencies_hz: Vec<f64>,
    pub magnitude: Vec<BinStats>,
    pub phase: Vec<BinStats>,
}
impl ChannelAggregate {
    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }
    pub fn magnitude_means(&self) -> Vec<f64> {
        self.magnitude.iter().map(|b| b.mean).collect()
    }
    pub fn phase_means(&self) -> Vec<f64> {
        self.phase.iter().map(|b| b.mean).collect()
    }
}
/// Groups all records of `sweeps` by exact frequency and computes mean / SEM
/// per bin for magnitude and phase independently.
///
/// All sweeps must carry the same set of distinct frequencies; a differing
/// axis aborts this unit with `FrequencyMismatch`.
pub fn aggregate_sweeps(sweeps: &[Sweep], context: &str) -> Result<ChannelAggregate, EisError> {
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
            let bin = bins.entry(FreqKey(record.frequency_hz)).or_default();
            bin.0.push(record.magnitude_ohm);
            bin.1.push(record.phase_deg);
        }
    }
    let mut frequencies_hz = Vec::with_capacity(bins.len());
    let mut magnitude = Vec::with_capacity(bins.len());
    let mut phase = Vec::with_capacity(bins.len());
    for (key, (mags, phases)) in bins {
        frequencies_hz.push(key.0);
        magnitude.push(mean_sem(&mags));
        phase.push(mean_sem(&phases));
    }
    Ok(ChannelAggregate {
        frequencies_hz,
        magnitude,
        phase,
    })
}
/// Reduces the per-channel aggregates to one combined curve: mean and SEM are
/// taken over the per-channel means, giving each channel equal weight.
///
/// Requires an identical frequency axis on every input; a mismatch here is
/// fatal for the whole run, since there is no meaningful partial combination.
pub fn combine_channels(
    per_channel: &[ChannelAggregate],
    context: &str,
) -> Result<ChannelAggregate, EisError> {
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
    let magnitude_rows: Vec<Vec<f64>> = per_channel.iter().map(|a| a.magnitude_means()).collect();
    let phase_rows: Vec<Vec<f64>> = per_channel.iter().map(|a| a.phase_means()).collect();
    Ok(ChannelAggregate {
        magnitude: combine_rows(&magnitude_rows),
        phase: combine_rows(&phase_rows),
        frequencies_hz,
    })
}
/// Checks that every sweep of one unit carries the same set of distinct
/// frequency values; both the polar and the cartesian aggregation abort the
/// unit on a differing axis instead of silently mixing bins.
pub(crate) fn check_frequency_axes(sweeps: &[&Sweep], context: &str) -> Result<(), EisError> {
    let Some((first, rest)) = sweeps.split_first() else {
        return Ok(());
    };
    let reference: BTreeSet<FreqKey> = first.frequencies().map(FreqKey).collect();
    for sweep in rest {
        let axis: BTreeSet<FreqKey> = sweep.frequencies().map(FreqKey).collect();
        if axis != reference {
            return Err(EisError::FrequencyMismatch {
                context: context.to_string(),
            });
        }
    }
    Ok(())
}
/// Column-wise mean / SEM over a stack of equal-length rows.
pub(crate) fn combine_rows(rows: &[Vec<f64>]) -> Vec<BinStats> {
    let n = rows.len();
    let m = rows.first().map(Vec::len).unwrap_or(0);
    let mut matrix = Array2::<f64>::zeros((n, m));
    for (i, row) in rows.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            matrix[[i, j]] = *value;
        }
    }
    let mean = match matrix.mean_axis(Axis(0)) {
        Some(mean) => mean,
        None => return Vec::new(),
    };
    // std_axis with ddof=1 yields NaN for a single row, matching the SEM law.
    let std = matrix.std_axis(Axis(0), 1.0);
    mean.iter()
        .zip(std.iter())
        .map(|(&mean, &std)| BinStats {
            mean,
            sem: std / (n as f64).sqrt(),
            count: n,
        })
        .collect()
}
pub(crate) fn mean_sem(values: &[f64]) -> BinStats {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let sem = if n < 2 {
        f64::NAN
    } else {
        let variance = values
            .iter()
            .map(|v| {
                let delta = v - mean;
                delta * delta
            })
            .sum::<f64>()
            / (n as f64 - 1.0);
        (variance / n as f64).sqrt()
    };
    BinStats {
        mean,
        sem,
        count: n,
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::eis::record::Sweep;
    fn flat_sweep(frequencies: &[f64], magnitude: f64) -> Sweep {
        let magnitudes = vec![magnitude; frequencies.len()];
        let phases = vec![-80.0; frequencies.len()];
        Sweep::from_columns(frequencies, &magnitudes, &phases)
    }
    #[test]
    fn three_sweeps_mean_and_sem() {
        let frequencies = [50.0, 150.0, 250.0, 350.0, 450.0];
        let sweeps = vec![
            flat_sweep(&frequencies, 100.0),
            flat_sweep(&frequencies, 200.0),
            flat_sweep(&frequencies, 300.0),
        ];
        let aggregate = aggregate_sweeps(&sweeps, "channel 0").unwrap();
        assert_eq!(aggregate.frequencies_hz, frequencies);
        let expected_sem = 100.0 / 3.0f64.sqrt();
        for bin in &aggregate.magnitude {
            assert!((bin.mean - 200.0).abs() < 1e-12);
            assert!((bin.sem - expected_sem).abs() < 1e-9);
            assert_eq!(bin.count, 3);
        }
    }
    #[test]
    fn aggregation_is_idempotent() {
        let frequencies = [50.0, 150.0, 250.0];
        let sweeps = vec![flat_sweep(&frequencies, 123.5), flat_sweep(&frequencies, 321.5)];
        let first = aggregate_sweeps(&sweeps, "x").unwrap();
        let second = aggregate_sweeps(&sweeps, "x").unwrap();
        for (a, b) in first.magnitude.iter().zip(&second.magnitude) {
            assert_eq!(a.mean.to_bits(), b.mean.to_bits());
            assert_eq!(a.sem.to_bits(), b.sem.to_bits());
        }
    }
    #[test]
    fn single_sweep_sem_is_nan() {
        let aggregate = aggregate_sweeps(&[flat_sweep(&[50.0, 150.0], 100.0)], "x").unwrap();
        assert!(aggregate.magnitude.iter().all(|b| b.sem.is_nan()));
        assert!(aggregate.magnitude.iter().all(|b| b.count == 1));
    }
    #[test]
    fn identical_values_sem_is_zero() {
        let frequencies = [50.0, 150.0];
        let sweeps = vec![
            flat_sweep(&frequencies, 100.0),
            flat_sweep(&frequencies, 100.0),
            flat_sweep(&frequencies, 100.0),
        ];
        let aggregate = aggregate_sweeps(&sweeps, "x").unwrap();
        assert!(aggregate.magnitude.iter().all(|b| b.sem == 0.0));
    }
    #[test]
    fn mismatched_axes_abort_the_unit() {
        let sweeps = vec![flat_sweep(&[50.0, 150.0], 1.0), flat_sweep(&[50.0, 160.0], 1.0)];
        let err = aggregate_sweeps(&sweeps, "channel 3").unwrap_err();
        assert!(matches!(err, EisError::FrequencyMismatch { context } if context == "channel 3"));
    }
    #[test]
    fn empty_input_is_reported_not_crashed() {
        let err = aggregate_sweeps(&[Sweep::default()], "channel 7").unwrap_err();
        assert!(matches!(err, EisError::EmptyAggregate { .. }));
    }
    #[test]
    fn combine_uses_mean_of_per_channel_means() {
        let a = aggregate_sweeps(&[flat_sweep(&[50.0, 150.0], 100.0)], "a").unwrap();
        let b = aggregate_sweeps(
            &[flat_sweep(&[50.0, 150.0], 200.0), flat_sweep(&[50.0, 150.0], 400.0)],
            "b",
        )
        .unwrap();
        let combined = combine_channels(&[a, b], "all channels").unwrap();
        // channel means are 100 and 300, so the combined mean is 200 whatever
        // the per-channel sweep counts were.
        for bin in &combined.magnitude {
            assert!((bin.mean - 200.0).abs() < 1e-12);
            assert_eq!(bin.count, 2);
        }
    }
    #[test]
    fn combine_rejects_mismatched_axes() {
        let a = aggregate_sweeps(&[flat_sweep(&[50.0, 150.0], 100.0)], "a").unwrap();
        let b = aggregate_sweeps(&[flat_sweep(&[50.0, 160.0], 100.0)], "b").unwrap();
        let err = combine_channels(&[a, b], "all channels").unwrap_err();
        assert!(matches!(err, EisError::FrequencyMismatch { .. }));
    }
}
