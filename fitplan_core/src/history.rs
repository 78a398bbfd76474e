//! Consultation history loading.
//!
//! Merges the live WAL and the CSV archive into one newest-first list.

use crate::csv_rollup::CsvRow;
use crate::{ConsultationRecord, ProgramId, Result};
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Start of a window reaching `days` days back from now
///
/// Windows longer than chrono can represent start at the earliest
/// representable instant.
fn cutoff_for(days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|span| Utc::now().checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Load consultations from the last `days` days from both WAL and CSV
///
/// Returns records sorted newest first. Records present in both files
/// (a rollup interrupted after the CSV write) appear once.
pub fn load_recent(wal_path: &Path, csv_path: &Path, days: u32) -> Result<Vec<ConsultationRecord>> {
    let cutoff = cutoff_for(days);
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    if wal_path.exists() {
        for record in crate::wal::read_records(wal_path)? {
            if record.consulted_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
            }
        }
        tracing::debug!("Loaded {} consultations from WAL", records.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for record in load_records_from_csv(csv_path)? {
            if record.consulted_at >= cutoff && seen_ids.insert(record.id) {
                records.push(record);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} consultations from CSV", csv_count);
    }

    records.sort_by(|a, b| b.consulted_at.cmp(&a.consulted_at));

    tracing::info!(
        "Loaded {} total consultations from last {} days",
        records.len(),
        days
    );

    Ok(records)
}

fn load_records_from_csv(path: &Path) -> Result<Vec<ConsultationRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match ConsultationRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Failed to parse CSV row: {}", e),
            },
            Err(e) => tracing::warn!("Failed to deserialize CSV row: {}", e),
        }
    }

    Ok(records)
}

/// Consultations belonging to one user, keeping order
pub fn for_user(records: &[ConsultationRecord], user_id: u32) -> Vec<&ConsultationRecord> {
    records
        .iter()
        .filter(|r| r.user_id == Some(user_id))
        .collect()
}

/// How often each program was recommended
pub fn program_counts(records: &[ConsultationRecord]) -> BTreeMap<ProgramId, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.program).or_insert(0) += 1;
    }
    counts
}
