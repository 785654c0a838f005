use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::eis::aggregate::ChannelAggregate;
use crate::eis::error::EisError;
use crate::eis::loader::{FREQUENCY_COLUMN, MAGNITUDE_COLUMN, PHASE_COLUMN};
use crate::eis::record::Sweep;
/// Writes one raw sweep the way the acquisition produces it: magnitude and
/// phase cells as single-element list literals.
pub fn write_sweep_csv(path: &Path, sweep: &Sweep) -> Result<(), EisError> {
    ensure_parent(path)?;
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{FREQUENCY_COLUMN},{MAGNITUDE_COLUMN},{PHASE_COLUMN}")?;
    for record in &sweep.records {
        writeln!(
            w,
            "{},[{}],[{}]",
            record.frequency_hz, record.magnitude_ohm, record.phase_deg
        )?;
    }
    w.flush()?;
    Ok(())
}
/// Writes the per-frequency means of an aggregate using the same three-column
/// schema, bare numbers, so the loader reads it straight back.
pub fn write_aggregate_csv(path: &Path, aggregate: &ChannelAggregate) -> Result<(), EisError> {
    ensure_parent(path)?;
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{FREQUENCY_COLUMN},{MAGNITUDE_COLUMN},{PHASE_COLUMN}")?;
    for ((frequency, magnitude), phase) in aggregate
        .frequencies_hz
        .iter()
        .zip(&aggregate.magnitude)
        .zip(&aggregate.phase)
    {
        writeln!(w, "{},{},{}", frequency, magnitude.mean, phase.mean)?;
    }
    w.flush()?;
    Ok(())
}
/// Appends plating spot-check rows to the wide CSV: one stimulated-channel
/// label plus one `"<ohm:.2f> Ohm"` cell per measured channel.
pub struct PlatingLog {
    writer: csv::Writer<File>,
}
impl PlatingLog {
    pub fn create(path: &Path, num_channels: usize) -> Result<Self, EisError> {
        ensure_parent(path)?;
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["Stimulated Channel".to_string()];
        header.extend((0..num_channels).map(|i| format!("Channel {i}")));
        writer.write_record(&header)?;
        writer.flush()?;
        Ok(Self { writer })
    }
    pub fn append(&mut self, stimulated: &str, magnitudes_ohm: &[f64]) -> Result<(), EisError> {
        let mut row = vec![stimulated.to_string()];
        row.extend(magnitudes_ohm.iter().map(|m| format!("{m:.2} Ohm")));
        self.writer.write_record(&row)?;
        self.writer.flush()?;
        Ok(())
    }
}
fn ensure_parent(path: &Path) -> Result<(), EisError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::eis::aggregate::aggregate_sweeps;
    use crate::eis::loader::{load_plating_table, load_sweep, FieldFormat};
    #[test]
    fn sweep_round_trip_through_bracketed_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        let sweep = Sweep::from_columns(
            &[50.0, 150.0, 250.0],
            &[1.25e6, 8.75e5, 5.5e5],
            &[-85.5, -80.25, -75.0],
        );
        write_sweep_csv(&path, &sweep).unwrap();
        let loaded = load_sweep(&path, FieldFormat::Bracketed).unwrap();
        assert_eq!(loaded.records, sweep.records);
    }
    #[test]
    fn aggregate_round_trip_preserves_frequency_and_mean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aggregate.csv");
        let sweeps = vec![
            Sweep::from_columns(&[50.0, 150.0], &[100.0, 200.0], &[-80.0, -70.0]),
            Sweep::from_columns(&[50.0, 150.0], &[110.0, 210.0], &[-81.0, -71.0]),
        ];
        let aggregate = aggregate_sweeps(&sweeps, "x").unwrap();
        write_aggregate_csv(&path, &aggregate).unwrap();
        let loaded = load_sweep(&path, FieldFormat::Auto).unwrap();
        assert_eq!(loaded.len(), aggregate.len());
        for (record, (frequency, magnitude)) in loaded
            .records
            .iter()
            .zip(aggregate.frequencies_hz.iter().zip(&aggregate.magnitude))
        {
            assert_eq!(record.frequency_hz, *frequency);
            assert!((record.magnitude_ohm - magnitude.mean).abs() < 1e-12);
        }
    }
    #[test]
    fn plating_log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platingdata.csv");
        {
            let mut log = PlatingLog::create(&path, 3).unwrap();
            log.append("None", &[1234.561, 2000.0, 3000.004]).unwrap();
            log.append("5", &[999.99, 888.88, 777.77]).unwrap();
        }
        let table = load_plating_table(&path).unwrap();
        assert_eq!(table.stimulated, vec!["None", "5"]);
        assert_eq!(table.impedances_ohm[0], vec![1234.56, 2000.00, 3000.00]);
    }
}
