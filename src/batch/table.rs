use super::metadata::ImageMetadata;
use crate::color::{BandCounts, HueBand};
use crate::error::Result;
use std::io::Write;
use std::path::Path;

const METADATA_COLUMNS: [&str; 4] = ["Image", "Date", "Treatment", "Name"];

/// Feature row for one analyzed image
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRow {
    /// File name of the analyzed image
    pub image: String,
    pub metadata: ImageMetadata,
    pub counts: BandCounts,
}

impl ColorRow {
    fn record(&self) -> Vec<String> {
        let missing = String::new;
        let mut record = vec![
            self.image.clone(),
            self.metadata.date.clone().unwrap_or_else(missing),
            self.metadata.treatment.clone().unwrap_or_else(missing),
            self.metadata.name.clone().unwrap_or_else(missing),
        ];
        record.extend(self.counts.iter().map(|(_, count)| count.to_string()));
        record
    }
}

/// Rows in insertion order, one column per hue band after the metadata columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTable {
    rows: Vec<ColorRow>,
}

impl ColorTable {
    pub fn push(&mut self, row: ColorRow) {
        self.rows.push(row);
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[ColorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header() -> Vec<&'static str> {
        METADATA_COLUMNS
            .iter()
            .copied()
            .chain(HueBand::ALL.iter().map(|b| b.as_str()))
            .collect()
    }

    /// Write header and rows as CSV; missing metadata becomes an empty field
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(Self::header())?;
        for row in &self.rows {
            csv.write_record(row.record())?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)?;
        tracing::info!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }
}

impl FromIterator<ColorRow> for ColorTable {
    fn from_iter<I: IntoIterator<Item = ColorRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
