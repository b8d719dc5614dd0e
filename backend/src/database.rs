// PostgreSQL storage for way quality ratings.

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;

use crate::models::{quality_score, WayQuality};
use crate::store::{QualityStore, Submission, WayQualityRecord};

/// Ordered schema migrations, applied on every start.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250502153508_create_way_qualities",
        include_str!("../migrations/20250502153508_create_way_qualities.sql"),
    ),
    (
        "20250502154418_add_latitude_longitude",
        include_str!("../migrations/20250502154418_add_latitude_longitude.sql"),
    ),
];

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Invalid way quality data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect using the `DATABASE_URL` environment variable.
    ///
    /// # Errors
    /// Returns DatabaseError if connection fails or DATABASE_URL is not set
    pub async fn new() -> Result<Self, DatabaseError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            DatabaseError::ConfigError("DATABASE_URL environment variable not set".to_string())
        })?;
        Self::connect(&database_url).await
    }

    pub async fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool created");

        Ok(Self { pool })
    }

    /// Run database migrations
    ///
    /// Every script is idempotent, so re-running on an up-to-date schema is a no-op.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        let mut conn = self.pool.acquire().await?;

        for (name, sql) in MIGRATIONS {
            // raw_sql accepts several statements per script
            sqlx::raw_sql(sql).execute(&mut *conn).await?;
            tracing::debug!("applied migration {name}");
        }

        tracing::info!("Database migrations completed");
        Ok(())
    }
}

impl QualityStore for Database {
    async fn store_qualities(&self, submission: Submission) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for entry in &submission.entries {
            sqlx::query(
                r#"
                INSERT INTO way_qualities (way_id, quality, timestamp, ip, latitude, longitude)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(entry.way_id)
            .bind(quality_score::to_score(entry.quality))
            .bind(submission.timestamp)
            .bind(&submission.ip)
            .bind(entry.latitude)
            .bind(entry.longitude)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!("Stored {} way qualities", submission.entries.len());
        Ok(())
    }

    async fn latest_qualities(&self, way_ids: &[i64]) -> Result<Vec<WayQuality>, DatabaseError> {
        let rows = sqlx::query_as::<_, WayQualityRecord>(
            r#"
            SELECT DISTINCT ON (way_id)
                id, way_id, quality, timestamp, ip, latitude, longitude
            FROM way_qualities
            WHERE way_id = ANY($1)
            ORDER BY way_id, timestamp DESC, id DESC
            "#,
        )
        .bind(way_ids)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            "Found qualities for {} of {} requested ways",
            rows.len(),
            way_ids.len()
        );
        rows.iter().map(WayQualityRecord::to_way_quality).collect()
    }

    async fn all_records(&self) -> Result<Vec<WayQualityRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, WayQualityRecord>(
            "SELECT id, way_id, quality, timestamp, ip, latitude, longitude FROM way_qualities ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
