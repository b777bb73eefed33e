//! Database operations and SQLite management for variations and baselines.
//!
//! This module provides low-level database operations for the change-control
//! engine. It handles SQLite connections, schema management, and provides
//! specialized query interfaces for variations, milestone impacts, and
//! baseline versions.
//!
//! All multi-step mutations run inside a single `rusqlite` transaction, so
//! every operation either lands completely or not at all.

use std::path::Path;

use jiff::{civil::Date, Timestamp};
use rusqlite::{types::Type, Connection, Row};

use crate::{
    error::{DatabaseResultExt, EngineError, Result},
    models::{
        BaselineVersion, Milestone, MilestoneImpact, Rejection, SignatureStamp, Variation,
        VariationStatus, VariationSummary, VariationType,
    },
};

pub mod apply;
pub mod impact_queries;
pub mod migrations;
pub mod milestone_queries;
pub mod variation_queries;

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

/// Reads a required RFC 3339 timestamp column.
pub(crate) fn timestamp_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Timestamp> {
    let raw: String = row.get(index)?;
    raw.parse::<Timestamp>()
        .map_err(|e| conversion_error(index, format!("Invalid timestamp: {e}")))
}

/// Reads an optional RFC 3339 timestamp column.
pub(crate) fn optional_timestamp_column(
    row: &Row<'_>,
    index: usize,
) -> rusqlite::Result<Option<Timestamp>> {
    let raw: Option<String> = row.get(index)?;
    raw.map(|s| {
        s.parse::<Timestamp>()
            .map_err(|e| conversion_error(index, format!("Invalid timestamp: {e}")))
    })
    .transpose()
}

/// Reads an optional `YYYY-MM-DD` date column.
pub(crate) fn optional_date_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<Date>> {
    let raw: Option<String> = row.get(index)?;
    raw.map(|s| {
        s.parse::<Date>()
            .map_err(|e| conversion_error(index, format!("Invalid date: {e}")))
    })
    .transpose()
}

/// Reads a pair of signer/signed-at columns as an optional signature.
///
/// Either both are present (a recorded signature) or both are null.
pub(crate) fn signature_columns(
    row: &Row<'_>,
    signer_index: usize,
    timestamp_index: usize,
) -> rusqlite::Result<Option<SignatureStamp>> {
    let signer: Option<String> = row.get(signer_index)?;
    match signer {
        Some(signer_id) => {
            let signed_at = optional_timestamp_column(row, timestamp_index)?.ok_or_else(|| {
                conversion_error(timestamp_index, "Signature missing timestamp".to_string())
            })?;
            Ok(Some(SignatureStamp { signer_id, signed_at }))
        }
        None => Ok(None),
    }
}

/// Reads an optional JSON text column.
pub(crate) fn json_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    let raw: Option<String> = row.get(index)?;
    raw.map(|s| {
        serde_json::from_str(&s).map_err(|e| conversion_error(index, format!("Invalid JSON: {e}")))
    })
    .transpose()
}

/// Parses an optional `YYYY-MM-DD` string from user input.
pub(crate) fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<Date>> {
    value
        .map(|s| {
            s.parse::<Date>().map_err(|_| EngineError::InvalidInput {
                field: field.to_string(),
                reason: format!("Expected a date in YYYY-MM-DD format, got '{s}'"),
            })
        })
        .transpose()
}

// Column order shared by SELECT_VARIATION_SQL and the apply path.
pub(crate) const VARIATION_COLUMNS: &str = "id, project_id, reference, variation_type, title, \
     description, reason, status, form_step, form_data, impact_summary, total_cost_impact, \
     total_days_impact, supplier_signed_by, supplier_signed_at, customer_signed_by, \
     customer_signed_at, rejected_by, rejected_at, rejection_reason, certificate_number, \
     certificate_data, applied_at, created_by, created_at, updated_at";

/// Maps a full variation row in [`VARIATION_COLUMNS`] order. Impacts are
/// loaded separately.
pub(crate) fn variation_from_row(row: &Row<'_>) -> rusqlite::Result<Variation> {
    let variation_type_str: String = row.get(3)?;
    let variation_type = variation_type_str
        .parse::<VariationType>()
        .map_err(|e| conversion_error(3, e))?;

    let status_str: String = row.get(7)?;
    let status = status_str
        .parse::<VariationStatus>()
        .map_err(|e| conversion_error(7, e))?;

    let rejected_by: Option<String> = row.get(17)?;
    let rejection = match rejected_by {
        Some(rejected_by) => {
            let rejected_at = optional_timestamp_column(row, 18)?
                .ok_or_else(|| conversion_error(18, "Rejection missing timestamp".to_string()))?;
            let reason: Option<String> = row.get(19)?;
            Some(Rejection {
                rejected_by,
                rejected_at,
                reason: reason.unwrap_or_default(),
            })
        }
        None => None,
    };

    Ok(Variation {
        id: row.get::<_, i64>(0)? as u64,
        project_id: row.get::<_, i64>(1)? as u64,
        reference: row.get(2)?,
        variation_type,
        title: row.get(4)?,
        description: row.get(5)?,
        reason: row.get(6)?,
        status,
        form_step: row.get::<_, i64>(8)? as u32,
        form_data: json_column(row, 9)?,
        impact_summary: row.get(10)?,
        total_cost_impact: row.get(11)?,
        total_days_impact: row.get(12)?,
        supplier_signature: signature_columns(row, 13, 14)?,
        customer_signature: signature_columns(row, 15, 16)?,
        rejection,
        certificate_number: row.get(20)?,
        certificate_data: json_column(row, 21)?,
        applied_at: optional_timestamp_column(row, 22)?,
        created_by: row.get(23)?,
        created_at: timestamp_column(row, 24)?,
        updated_at: timestamp_column(row, 25)?,
        impacts: Vec::new(),
    })
}

pub(crate) const IMPACT_COLUMNS: &str = "id, variation_id, milestone_id, original_cost, \
     original_start, original_end, new_cost, new_start, new_end, version_before, version_after, \
     rationale, created_at, updated_at";

pub(crate) fn impact_from_row(row: &Row<'_>) -> rusqlite::Result<MilestoneImpact> {
    Ok(MilestoneImpact {
        id: row.get::<_, i64>(0)? as u64,
        variation_id: row.get::<_, i64>(1)? as u64,
        milestone_id: row.get::<_, i64>(2)? as u64,
        original_cost: row.get(3)?,
        original_start: optional_date_column(row, 4)?,
        original_end: optional_date_column(row, 5)?,
        new_cost: row.get(6)?,
        new_start: optional_date_column(row, 7)?,
        new_end: optional_date_column(row, 8)?,
        version_before: row.get::<_, Option<i64>>(9)?.map(|v| v as u32),
        version_after: row.get::<_, Option<i64>>(10)?.map(|v| v as u32),
        rationale: row.get(11)?,
        created_at: timestamp_column(row, 12)?,
        updated_at: timestamp_column(row, 13)?,
    })
}

pub(crate) const MILESTONE_COLUMNS: &str = "id, project_id, name, baseline_cost, baseline_start, \
     baseline_end, forecast_cost, forecast_end, billable_amount, created_at, updated_at";

pub(crate) fn milestone_from_row(row: &Row<'_>) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get::<_, i64>(0)? as u64,
        project_id: row.get::<_, i64>(1)? as u64,
        name: row.get(2)?,
        baseline_cost: row.get(3)?,
        baseline_start: optional_date_column(row, 4)?,
        baseline_end: optional_date_column(row, 5)?,
        forecast_cost: row.get(6)?,
        forecast_end: optional_date_column(row, 7)?,
        billable_amount: row.get(8)?,
        created_at: timestamp_column(row, 9)?,
        updated_at: timestamp_column(row, 10)?,
    })
}

pub(crate) const VERSION_COLUMNS: &str = "id, milestone_id, version, baseline_cost, \
     baseline_start, baseline_end, variation_id, supplier_signed_by, supplier_signed_at, \
     customer_signed_by, customer_signed_at, created_at";

pub(crate) fn version_from_row(row: &Row<'_>) -> rusqlite::Result<BaselineVersion> {
    Ok(BaselineVersion {
        id: row.get::<_, i64>(0)? as u64,
        milestone_id: row.get::<_, i64>(1)? as u64,
        version: row.get::<_, i64>(2)? as u32,
        baseline_cost: row.get(3)?,
        baseline_start: optional_date_column(row, 4)?,
        baseline_end: optional_date_column(row, 5)?,
        variation_id: row.get::<_, i64>(6)? as u64,
        supplier_signature: signature_columns(row, 7, 8)?,
        customer_signature: signature_columns(row, 9, 10)?,
        created_at: timestamp_column(row, 11)?,
    })
}

/// Maps a `variation_stats` view row.
pub(crate) fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<VariationSummary> {
    let variation_type_str: String = row.get(4)?;
    let variation_type = variation_type_str
        .parse::<VariationType>()
        .map_err(|e| conversion_error(4, e))?;
    let status_str: String = row.get(5)?;
    let status = status_str
        .parse::<VariationStatus>()
        .map_err(|e| conversion_error(5, e))?;

    Ok(VariationSummary {
        id: row.get::<_, i64>(0)? as u64,
        project_id: row.get::<_, i64>(1)? as u64,
        reference: row.get(2)?,
        title: row.get(3)?,
        variation_type,
        status,
        total_cost_impact: row.get(6)?,
        total_days_impact: row.get(7)?,
        milestone_count: row.get::<_, i64>(8)? as u32,
        created_at: timestamp_column(row, 9)?,
        updated_at: timestamp_column(row, 10)?,
    })
}
