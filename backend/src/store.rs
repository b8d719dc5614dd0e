use std::{
    collections::BTreeMap,
    future::Future,
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::DatabaseError;
use crate::models::{quality_score, WayQuality};

/// One PUT batch: every entry shares the submitter and the timestamp.
#[derive(Debug, Clone)]
pub struct Submission {
    pub entries: Vec<WayQuality>,
    pub ip: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A stored rating row, history included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WayQualityRecord {
    pub id: i32,
    pub way_id: i64,
    pub quality: Option<i16>,
    pub timestamp: DateTime<Utc>,
    pub ip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl WayQualityRecord {
    pub fn to_way_quality(&self) -> Result<WayQuality, DatabaseError> {
        let quality = quality_score::from_score(self.quality).map_err(|score| {
            DatabaseError::InvalidData(format!(
                "row {} has unknown quality score {score}",
                self.id
            ))
        })?;

        Ok(WayQuality {
            way_id: self.way_id,
            quality,
            timestamp: Some(self.timestamp),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

/// Append-only rating storage (PostgreSQL in production, in-memory for tests
/// and local runs).
///
/// # Contract
/// - `store_qualities` appends one row per entry, all or nothing.
/// - `latest_qualities` returns, for each requested way id that has rows, the
///   row with the latest timestamp (latest insert on equal timestamps),
///   ordered by way id.
pub trait QualityStore: Send + Sync + 'static {
    fn store_qualities(
        &self,
        submission: Submission,
    ) -> impl Future<Output = Result<(), DatabaseError>> + Send;

    fn latest_qualities(
        &self,
        way_ids: &[i64],
    ) -> impl Future<Output = Result<Vec<WayQuality>, DatabaseError>> + Send;

    fn all_records(
        &self,
    ) -> impl Future<Output = Result<Vec<WayQualityRecord>, DatabaseError>> + Send;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<WayQualityRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, Vec<WayQualityRecord>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl QualityStore for MemoryStore {
    async fn store_qualities(&self, submission: Submission) -> Result<(), DatabaseError> {
        let mut rows = self.rows();
        let first_id = rows.len() as i32 + 1;

        let new_rows: Vec<WayQualityRecord> = submission
            .entries
            .iter()
            .enumerate()
            .map(|(offset, entry)| WayQualityRecord {
                id: first_id + offset as i32,
                way_id: entry.way_id,
                quality: quality_score::to_score(entry.quality),
                timestamp: submission.timestamp,
                ip: submission.ip.clone(),
                latitude: entry.latitude,
                longitude: entry.longitude,
            })
            .collect();

        tracing::debug!("stored {} way qualities in memory", new_rows.len());
        rows.extend(new_rows);
        Ok(())
    }

    async fn latest_qualities(&self, way_ids: &[i64]) -> Result<Vec<WayQuality>, DatabaseError> {
        let rows = self.rows();
        let mut latest: BTreeMap<i64, &WayQualityRecord> = BTreeMap::new();

        for row in rows.iter().filter(|row| way_ids.contains(&row.way_id)) {
            match latest.get(&row.way_id) {
                Some(current) if current.timestamp > row.timestamp => {}
                _ => {
                    latest.insert(row.way_id, row);
                }
            }
        }

        latest.values().map(|row| row.to_way_quality()).collect()
    }

    async fn all_records(&self) -> Result<Vec<WayQualityRecord>, DatabaseError> {
        Ok(self.rows().clone())
    }
}
