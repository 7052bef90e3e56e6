//! Row tables written as CSV

use anyhow::{bail, Context, Result};
use rusle_algorithms::sampling::SampleSet;
use std::fs::File;
use std::path::Path;

/// Header plus rows of already formatted cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// One row per sample: band values, then `longitude`, `latitude`.
    pub fn from_samples(samples: &SampleSet) -> Self {
        let mut table = Self::new(
            samples
                .bands
                .iter()
                .map(String::as_str)
                .chain(["longitude", "latitude"]),
        );
        table.rows = samples
            .samples
            .iter()
            .map(|s| {
                s.values
                    .iter()
                    .chain([&s.x, &s.y])
                    .map(|v| v.to_string())
                    .collect()
            })
            .collect();
        table
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.header.len() {
            bail!(
                "Row has {} cells, header has {} columns",
                row.len(),
                self.header.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusle_algorithms::sampling::Sample;

    #[test]
    fn sample_columns_come_before_coordinates() {
        let set = SampleSet {
            bands: vec!["C_Factor".into()],
            samples: vec![Sample {
                source: 3,
                x: -5.8,
                y: 35.75,
                values: vec![0.25],
            }],
        };
        let table = Table::from_samples(&set);
        assert_eq!(table.header, ["C_Factor", "longitude", "latitude"]);
        assert_eq!(table.rows, vec![vec!["0.25", "-5.8", "35.75"]]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut table = Table::new(["a", "b"]);
        assert!(table.push_row(vec!["1".into()]).is_err());
        table.push_row(vec!["1".into(), "2".into()]).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn csv_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut table = Table::new(["R_Factor", "longitude", "latitude"]);
        table
            .push_row(vec!["812.5".into(), "-5.9".into(), "35.7".into()])
            .unwrap();
        table.write_csv(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "R_Factor,longitude,latitude\n812.5,-5.9,35.7\n");
    }
}
