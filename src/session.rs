use std::fs;
use std::path::PathBuf;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
pub const NUM_CHANNELS: usize = 16;
/// Electrode order on the current PCB revision: logical channel `i` sits on
/// hardware channel `CHANNEL_ORDER[i]`.
pub const CHANNEL_ORDER: [usize; NUM_CHANNELS] =
    [14, 12, 4, 5, 10, 11, 2, 3, 8, 9, 0, 1, 13, 6, 7, 15];
pub fn to_hardware_channel(logical: usize) -> Result<usize> {
    CHANNEL_ORDER
        .get(logical)
        .copied()
        .ok_or_else(|| anyhow!("channel {logical} out of range (0..{NUM_CHANNELS})"))
}
pub fn all_channels() -> Vec<usize> {
    (0..NUM_CHANNELS).collect()
}
/// Explicit run configuration replacing the interactive prompts the lab
/// scripts used for file naming.
#[derive(Clone, Debug, Serialize)]
pub struct SessionConfig {
    /// Root of the data tree; runs live in `<data_root>/<folder>`.
    pub data_root: PathBuf,
    /// Run folder, conventionally `<date>_<device>`, e.g. `01may24_1`.
    pub folder: String,
    /// Sweep description used in file names, e.g. `preplate`.
    pub label: String,
}
impl SessionConfig {
    pub fn run_dir(&self) -> PathBuf {
        self.data_root.join(&self.folder)
    }
    pub fn rawdata_dir(&self) -> PathBuf {
        self.run_dir().join("rawdata")
    }
    pub fn figures_dir(&self, sub: &str) -> PathBuf {
        self.run_dir().join("figures").join(sub)
    }
    /// `<folder>_<label>`, the stem every per-run file name starts with.
    pub fn base_name(&self) -> String {
        format!("{}_{}", self.folder, self.label)
    }
    pub fn base_name_for(&self, label: &str) -> String {
        format!("{}_{}", self.folder, label)
    }
    /// Raw CSV for one (channel, sweep) pair; sweeps are numbered from 1.
    pub fn sweep_csv(&self, channel: usize, sweep: usize) -> PathBuf {
        self.sweep_csv_for(&self.label, channel, sweep)
    }
    pub fn sweep_csv_for(&self, label: &str, channel: usize, sweep: usize) -> PathBuf {
        self.rawdata_dir()
            .join(format!("{}_{channel}_{sweep}.csv", self.base_name_for(label)))
    }
    /// Aggregate CSV for one channel, or the combined one when `channel` is None.
    pub fn mean_csv(&self, channel: Option<usize>) -> PathBuf {
        let name = match channel {
            Some(channel) => format!("{}_{channel}_mean.csv", self.base_name()),
            None => format!("{}_all_channels_mean.csv", self.base_name()),
        };
        self.rawdata_dir().join(name)
    }
    pub fn plating_csv(&self) -> PathBuf {
        self.rawdata_dir()
            .join(format!("{}_platingdata.csv", self.folder))
    }
    /// Writes the effective configuration next to the data for provenance,
    /// plus an optional free-text description, taking the place of the
    /// prompted README of the old scripts.
    pub fn write_provenance<T: Serialize>(&self, config: &T, note: Option<&str>) -> Result<()> {
        let dir = self.run_dir();
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(config)?;
        let json_path = dir.join(format!("{}_session.json", self.label));
        fs::write(&json_path, json)
            .with_context(|| format!("writing {}", json_path.display()))?;
        if let Some(note) = note {
            let note_path = dir.join(format!("{}_README.txt", self.label));
            fs::write(&note_path, note)
                .with_context(|| format!("writing {}", note_path.display()))?;
        }
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn session() -> SessionConfig {
        SessionConfig {
            data_root: PathBuf::from("/data"),
            folder: "01may24_1".into(),
            label: "preplate".into(),
        }
    }
    #[test]
    fn paths_follow_the_lab_naming_convention() {
        let session = session();
        assert_eq!(
            session.sweep_csv(3, 2),
            PathBuf::from("/data/01may24_1/rawdata/01may24_1_preplate_3_2.csv")
        );
        assert_eq!(
            session.plating_csv(),
            PathBuf::from("/data/01may24_1/rawdata/01may24_1_platingdata.csv")
        );
        assert_eq!(
            session.figures_dir("nyquist"),
            PathBuf::from("/data/01may24_1/figures/nyquist")
        );
        assert_eq!(
            session.mean_csv(None),
            PathBuf::from("/data/01may24_1/rawdata/01may24_1_preplate_all_channels_mean.csv")
        );
    }
    #[test]
    fn channel_map_translates_and_bounds_checks() {
        assert_eq!(to_hardware_channel(0).unwrap(), 14);
        assert_eq!(to_hardware_channel(15).unwrap(), 15);
        assert!(to_hardware_channel(16).is_err());
        // The PCB map is a permutation of the full channel set.
        let mut sorted = CHANNEL_ORDER;
        sorted.sort_unstable();
        assert_eq!(sorted.to_vec(), all_channels());
    }
}
