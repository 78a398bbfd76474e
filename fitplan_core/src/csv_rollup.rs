//! CSV rollup for archiving WAL consultations.
//!
//! The CSV archive uses the category codes from `labels` so the file can be
//! read by spreadsheet users without the JSON schema.

use crate::{
    BmiCategory, BodyFatCategory, Condition, ConsultationInput, ConsultationRecord, Error,
    ProgramId, Result, Sex,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    id: String,
    user_id: Option<u32>,
    consulted_at: String,
    sex: String,
    weight_kg: f64,
    height_cm: f64,
    body_fat_percent: Option<f64>,
    bmi: f64,
    bmi_category: String,
    body_fat_category: Option<String>,
    program: String,
    fallback: bool,
}

impl From<&ConsultationRecord> for CsvRow {
    fn from(record: &ConsultationRecord) -> Self {
        CsvRow {
            id: record.id.to_string(),
            user_id: record.user_id,
            consulted_at: record.consulted_at.to_rfc3339(),
            sex: record.input.sex.label().to_string(),
            weight_kg: record.input.weight_kg,
            height_cm: record.input.height_cm,
            body_fat_percent: record.input.body_fat_percent,
            bmi: record.bmi,
            bmi_category: record.condition.bmi().code().to_string(),
            body_fat_category: record.condition.body_fat().map(|c| c.code().to_string()),
            program: record.program.to_string(),
            fallback: record.fallback,
        }
    }
}

impl TryFrom<CsvRow> for ConsultationRecord {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;

        let consulted_at = DateTime::parse_from_rfc3339(&row.consulted_at)
            .map_err(|e| Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let bmi = row.bmi_category.parse::<BmiCategory>()?;
        let condition = match row.body_fat_category {
            Some(code) => Condition::Full {
                bmi,
                body_fat: code.parse::<BodyFatCategory>()?,
            },
            None => Condition::BmiOnly { bmi },
        };

        Ok(ConsultationRecord {
            id,
            user_id: row.user_id,
            consulted_at,
            input: ConsultationInput {
                weight_kg: row.weight_kg,
                height_cm: row.height_cm,
                sex: row.sex.parse::<Sex>()?,
                body_fat_percent: row.body_fat_percent,
            },
            bmi: row.bmi,
            condition,
            program: row.program.parse::<ProgramId>()?,
            fallback: row.fallback,
        })
    }
}

/// Roll up WAL consultations into CSV and archive the WAL
///
/// 1. Reads all records from the WAL
/// 2. Appends them to the CSV file (writing headers if it is new)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to `.wal.processed`
///
/// The WAL is renamed rather than deleted so it can be recovered by hand.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::wal::read_records(wal_path)?;

    if records.is_empty() {
        tracing::info!("No consultations in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in &records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} consultations to CSV", records.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(records.len())
}

/// Remove all `.processed` WAL files in `dir`
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}
