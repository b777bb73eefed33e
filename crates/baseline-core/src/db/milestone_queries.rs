//! Milestone queries and baseline version history.
//!
//! Milestone authoring belongs to a separate subsystem in production; the
//! create operation here exists to seed databases for end-to-end use. The
//! version history query reads the append-only `baseline_versions` table.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension};

use crate::{
    error::{DatabaseResultExt, EngineError, Result},
    models::{BaselineVersion, Milestone},
    params::CreateMilestone,
};

const INSERT_MILESTONE_SQL: &str = "INSERT INTO milestones (project_id, name, baseline_cost, \
     baseline_start, baseline_end, forecast_cost, forecast_end, billable_amount, created_at, \
     updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?3, ?5, ?3, ?6, ?6)";

impl super::Database {
    /// Creates a milestone with forecast and billable seeded from the
    /// baseline.
    pub fn create_milestone(&mut self, params: &CreateMilestone) -> Result<Milestone> {
        if params.name.trim().is_empty() {
            return Err(EngineError::invalid_input("name", "Name cannot be empty"));
        }
        let baseline_start =
            super::parse_optional_date("baseline_start", params.baseline_start.as_deref())?;
        let baseline_end =
            super::parse_optional_date("baseline_end", params.baseline_end.as_deref())?;
        if let (Some(start), Some(end)) = (baseline_start, baseline_end) {
            if end < start {
                return Err(EngineError::invalid_input(
                    "baseline_end",
                    "End date cannot be before start date",
                ));
            }
        }

        let now = Timestamp::now();
        self.connection
            .execute(
                INSERT_MILESTONE_SQL,
                params![
                    params.project_id as i64,
                    &params.name,
                    params.baseline_cost,
                    baseline_start.map(|d| d.to_string()),
                    baseline_end.map(|d| d.to_string()),
                    &now.to_string(),
                ],
            )
            .map_err(|e| EngineError::database_error("Failed to insert milestone", e))?;

        let id = self.connection.last_insert_rowid() as u64;

        Ok(Milestone {
            id,
            project_id: params.project_id,
            name: params.name.clone(),
            baseline_cost: params.baseline_cost,
            baseline_start,
            baseline_end,
            forecast_cost: params.baseline_cost,
            forecast_end: baseline_end,
            billable_amount: params.baseline_cost,
            created_at: now,
            updated_at: now,
        })
    }

    /// Retrieves a milestone by its ID.
    pub fn get_milestone(&self, id: u64) -> Result<Option<Milestone>> {
        let sql = format!(
            "SELECT {} FROM milestones WHERE id = ?1",
            super::MILESTONE_COLUMNS
        );
        self.connection
            .prepare(&sql)
            .map_err(|e| EngineError::database_error("Failed to prepare query", e))?
            .query_row(params![id as i64], super::milestone_from_row)
            .optional()
            .map_err(|e| EngineError::database_error("Failed to query milestone", e))
    }

    /// Like [`Self::get_milestone`] but fails with a typed error when absent.
    pub fn require_milestone(&self, id: u64) -> Result<Milestone> {
        self.get_milestone(id)?
            .ok_or(EngineError::MilestoneNotFound { id })
    }

    /// The full baseline revision history of a milestone, oldest first.
    pub fn baseline_history(&self, milestone_id: u64) -> Result<Vec<BaselineVersion>> {
        if self.get_milestone(milestone_id)?.is_none() {
            return Err(EngineError::MilestoneNotFound { id: milestone_id });
        }

        let sql = format!(
            "SELECT {} FROM baseline_versions WHERE milestone_id = ?1 ORDER BY version",
            super::VERSION_COLUMNS
        );
        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(|e| EngineError::database_error("Failed to prepare query", e))?;
        let versions = stmt
            .query_map(params![milestone_id as i64], super::version_from_row)
            .map_err(|e| EngineError::database_error("Failed to query baseline versions", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read baseline version rows")?;
        Ok(versions)
    }
}
