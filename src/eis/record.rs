/// Single row of an impedance sweep: one frequency point of one measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpedanceRecord {
    pub frequency_hz: f64,
    pub magnitude_ohm: f64,
    pub phase_deg: f64,
}
/// Ordered records of one sweep of one channel, as read from a single file.
#[derive(Clone, Debug, Default)]
pub struct Sweep {
    pub records: Vec<ImpedanceRecord>,
}
impl Sweep {
    pub fn new(records: Vec<ImpedanceRecord>) -> Self {
        Self { records }
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    /// Frequency values in file order (duplicates preserved).
    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.frequency_hz)
    }
    /// Builds a sweep from parallel value slices, used by the acquisition loop.
    pub fn from_columns(frequencies: &[f64], magnitudes: &[f64], phases: &[f64]) -> Self {
        let records = frequencies
            .iter()
            .zip(magnitudes)
            .zip(phases)
            .map(|((&frequency_hz, &magnitude_ohm), &phase_deg)| ImpedanceRecord {
                frequency_hz,
                magnitude_ohm,
                phase_deg,
            })
            .collect();
        Self { records }
    }
}
