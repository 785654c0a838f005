use std::fs::File;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use crate::eis::error::EisError;
use crate::eis::record::{ImpedanceRecord, Sweep};
pub const FREQUENCY_COLUMN: &str = "Frequency (Hz)";
pub const MAGNITUDE_COLUMN: &str = "Magnitude (Ohm)";
pub const PHASE_COLUMN: &str = "Phase (Degrees)";
/// How magnitude/phase cells are stored in a sweep CSV.
///
/// The acquisition writes single-element list literals (`"[1234.5]"`), while
/// aggregate files hold bare numbers. `Auto` accepts either form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldFormat {
    #[default]
    Auto,
    Bare,
    Bracketed,
}
/// What to do when a sweep file is absent from disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingFilePolicy {
    /// Warn and move on; the caller sees fewer sweeps.
    Skip,
    /// Treat the absence as an error.
    Fail,
}
/// Reads one sweep file. Rows whose cells fail numeric coercion are dropped,
/// so the result may be shorter than the file (or empty).
pub fn load_sweep(path: &Path, format: FieldFormat) -> Result<Sweep, EisError> {
    if !path.exists() {
        return Err(EisError::MissingFile(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers()?.clone();
    let freq_idx = column_index(&headers, FREQUENCY_COLUMN, path)?;
    let mag_idx = column_index(&headers, MAGNITUDE_COLUMN, path)?;
    let phase_idx = column_index(&headers, PHASE_COLUMN, path)?;
    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        let frequency_hz = row.get(freq_idx).and_then(|raw| parse_cell(raw, FieldFormat::Bare));
        let magnitude_ohm = row.get(mag_idx).and_then(|raw| parse_cell(raw, format));
        let phase_deg = row.get(phase_idx).and_then(|raw| parse_cell(raw, format));
        match (frequency_hz, magnitude_ohm, phase_deg) {
            (Some(frequency_hz), Some(magnitude_ohm), Some(phase_deg)) => {
                records.push(ImpedanceRecord {
                    frequency_hz,
                    magnitude_ohm,
                    phase_deg,
                });
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!("{}: dropped {dropped} malformed rows", path.display());
    }
    Ok(Sweep::new(records))
}
/// Loads a set of sweep files for one aggregation unit. Empty sweeps are
/// discarded with a warning; missing files follow `policy`.
pub fn load_sweep_set(
    paths: &[PathBuf],
    format: FieldFormat,
    policy: MissingFilePolicy,
) -> Result<Vec<Sweep>, EisError> {
    let mut sweeps = Vec::with_capacity(paths.len());
    for path in paths {
        match load_sweep(path, format) {
            Ok(sweep) if sweep.is_empty() => {
                warn!("{}: no usable rows, skipping", path.display());
            }
            Ok(sweep) => sweeps.push(sweep),
            Err(EisError::MissingFile(path)) if policy == MissingFilePolicy::Skip => {
                warn!("{}: file not found, skipping", path.display());
            }
            Err(err) => return Err(err),
        }
    }
    Ok(sweeps)
}
fn column_index(
    headers: &csv::StringRecord,
    column: &'static str,
    path: &Path,
) -> Result<usize, EisError> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| EisError::MissingColumn {
            column,
            path: path.to_path_buf(),
        })
}
fn parse_cell(raw: &str, format: FieldFormat) -> Option<f64> {
    let trimmed = raw.trim();
    let unwrapped = match format {
        FieldFormat::Bare => trimmed,
        FieldFormat::Bracketed => strip_brackets(trimmed)?,
        FieldFormat::Auto => strip_brackets(trimmed).unwrap_or(trimmed),
    };
    unwrapped.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
fn strip_brackets(value: &str) -> Option<&str> {
    value.strip_prefix('[')?.strip_suffix(']')
}
/// Wide plating table: one row per stimulated channel, sixteen measured
/// impedances formatted as `"<ohm:.2f> Ohm"` strings.
#[derive(Clone, Debug)]
pub struct PlatingTable {
    pub stimulated: Vec<String>,
    pub impedances_ohm: Vec<Vec<f64>>, // row -> per-channel magnitudes
}
impl PlatingTable {
    pub fn num_channels(&self) -> usize {
        self.impedances_ohm.first().map(Vec::len).unwrap_or(0)
    }
    /// Impedance of one measured channel across all stimulation rows.
    pub fn channel_column(&self, channel: usize) -> Vec<f64> {
        self.impedances_ohm
            .iter()
            .map(|row| row.get(channel).copied().unwrap_or(f64::NAN))
            .collect()
    }
}
pub fn load_plating_table(path: &Path) -> Result<PlatingTable, EisError> {
    if !path.exists() {
        return Err(EisError::MissingFile(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut stimulated = Vec::new();
    let mut impedances_ohm = Vec::new();
    for row in reader.records() {
        let row = row?;
        let Some(label) = row.get(0) else { continue };
        let values: Vec<f64> = row
            .iter()
            .skip(1)
            .map(|cell| {
                cell.trim()
                    .trim_end_matches(" Ohm")
                    .parse::<f64>()
                    .unwrap_or(f64::NAN)
            })
            .collect();
        stimulated.push(label.to_string());
        impedances_ohm.push(values);
    }
    Ok(PlatingTable {
        stimulated,
        impedances_ohm,
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }
    #[test]
    fn loads_bracketed_and_bare_cells() {
        let file = write_temp(
            "Frequency (Hz),Magnitude (Ohm),Phase (Degrees)\n\
             50,[120000.5],[-80.25]\n\
             150,98000.0,-75.0\n",
        );
        let sweep = load_sweep(file.path(), FieldFormat::Auto).unwrap();
        assert_eq!(sweep.len(), 2);
        assert_eq!(sweep.records[0].magnitude_ohm, 120000.5);
        assert_eq!(sweep.records[0].phase_deg, -80.25);
        assert_eq!(sweep.records[1].magnitude_ohm, 98000.0);
    }
    #[test]
    fn drops_malformed_rows_without_failing() {
        let file = write_temp(
            "Frequency (Hz),Magnitude (Ohm),Phase (Degrees)\n\
             50,[120000.5],[-80.25]\n\
             oops,[1.0],[2.0]\n\
             150,not-a-number,-75.0\n\
             250,[88000.0],[-70.0]\n",
        );
        let sweep = load_sweep(file.path(), FieldFormat::Auto).unwrap();
        assert_eq!(sweep.len(), 2);
        assert!(sweep.len() <= 4);
        for record in &sweep.records {
            assert!(record.frequency_hz.is_finite());
            assert!(record.magnitude_ohm >= 0.0);
            assert!((-180.0..=180.0).contains(&record.phase_deg));
        }
    }
    #[test]
    fn bare_format_rejects_bracketed_cells() {
        let file = write_temp(
            "Frequency (Hz),Magnitude (Ohm),Phase (Degrees)\n\
             50,[120000.5],[-80.25]\n\
             150,98000.0,-75.0\n",
        );
        let sweep = load_sweep(file.path(), FieldFormat::Bare).unwrap();
        assert_eq!(sweep.len(), 1);
        assert_eq!(sweep.records[0].frequency_hz, 150.0);
    }
    #[test]
    fn missing_column_is_an_error() {
        let file = write_temp("Frequency (Hz),Magnitude (Ohm)\n50,1.0\n");
        let err = load_sweep(file.path(), FieldFormat::Auto).unwrap_err();
        assert!(matches!(err, EisError::MissingColumn { column, .. } if column == PHASE_COLUMN));
    }
    #[test]
    fn missing_file_skips_or_fails_by_policy() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.csv");
        std::fs::write(
            &present,
            "Frequency (Hz),Magnitude (Ohm),Phase (Degrees)\n50,[1.0],[2.0]\n",
        )
        .unwrap();
        let paths = vec![present.clone(), dir.path().join("absent.csv")];
        let sweeps = load_sweep_set(&paths, FieldFormat::Auto, MissingFilePolicy::Skip).unwrap();
        assert_eq!(sweeps.len(), 1);
        let err = load_sweep_set(&paths, FieldFormat::Auto, MissingFilePolicy::Fail).unwrap_err();
        assert!(matches!(err, EisError::MissingFile(_)));
    }
    #[test]
    fn plating_table_strips_ohm_suffix() {
        let file = write_temp(
            "Stimulated Channel,Channel 0,Channel 1\n\
             None,1234.56 Ohm,7890.12 Ohm\n\
             3,1111.00 Ohm,2222.00 Ohm\n",
        );
        let table = load_plating_table(file.path()).unwrap();
        assert_eq!(table.stimulated, vec!["None", "3"]);
        assert_eq!(table.num_channels(), 2);
        assert_eq!(table.channel_column(1), vec![7890.12, 2222.00]);
    }
}
