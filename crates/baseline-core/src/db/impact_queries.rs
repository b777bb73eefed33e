//! Milestone impact ledger operations.
//!
//! Impact rows pair a variation with an affected milestone and hold the
//! original baseline alongside the proposed one. Rows are editable until the
//! first signature arrives.

use jiff::Timestamp;
use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    error::{DatabaseResultExt, EngineError, Result},
    models::{MilestoneImpact, UpdateImpactRequest},
    params::AddImpact,
    workflow,
};

const INSERT_IMPACT_SQL: &str = "INSERT INTO milestone_impacts (variation_id, milestone_id, \
     original_cost, original_start, original_end, new_cost, new_start, new_end, rationale, \
     created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?3, ?4, ?5, ?6, ?7, ?7)";
const CHECK_IMPACT_EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM milestone_impacts \
     WHERE variation_id = ?1 AND milestone_id = ?2)";
const UPDATE_IMPACT_SQL: &str = "UPDATE milestone_impacts SET new_cost = ?1, new_start = ?2, \
     new_end = ?3, rationale = ?4, updated_at = ?5 WHERE id = ?6";
const DELETE_IMPACT_SQL: &str = "DELETE FROM milestone_impacts WHERE id = ?1";
const DELETE_ALL_IMPACTS_SQL: &str = "DELETE FROM milestone_impacts WHERE variation_id = ?1";
const INSERT_ADJUSTMENT_SQL: &str = "INSERT INTO deliverable_adjustments (variation_id, \
     milestone_id, deliverable_id, adjustment, created_at) VALUES (?1, ?2, ?3, ?4, ?5)";
const DELETE_IMPACT_ADJUSTMENTS_SQL: &str = "DELETE FROM deliverable_adjustments \
     WHERE variation_id = ?1 AND milestone_id = ?2";

impl super::Database {
    /// Adds a milestone to a variation's impact ledger.
    ///
    /// The milestone's current baseline is copied into the row as both the
    /// original values and the initial proposed values, so a freshly added
    /// impact is a no-op change until edited.
    pub fn add_impact(&mut self, params: &AddImpact) -> Result<MilestoneImpact> {
        let variation = self.require_variation(params.variation_id)?;
        if !workflow::can_edit_impacts(variation.status) {
            return Err(EngineError::invalid_state("add impacts to", variation.status));
        }
        let milestone = self.require_milestone(params.milestone_id)?;
        if milestone.project_id != variation.project_id {
            return Err(EngineError::invalid_input(
                "milestone_id",
                "Milestone belongs to a different project",
            ));
        }

        let exists: bool = self
            .connection
            .query_row(
                CHECK_IMPACT_EXISTS_SQL,
                params![params.variation_id as i64, params.milestone_id as i64],
                |row| row.get(0),
            )
            .db_context("Failed to check impact existence")?;
        if exists {
            return Err(EngineError::invalid_input(
                "milestone_id",
                "Milestone is already on this variation's impact ledger",
            ));
        }

        let now = Timestamp::now();
        self.connection
            .execute(
                INSERT_IMPACT_SQL,
                params![
                    params.variation_id as i64,
                    params.milestone_id as i64,
                    milestone.baseline_cost,
                    milestone.baseline_start.map(|d| d.to_string()),
                    milestone.baseline_end.map(|d| d.to_string()),
                    params.rationale.as_deref(),
                    &now.to_string(),
                ],
            )
            .map_err(|e| EngineError::database_error("Failed to insert milestone impact", e))?;

        let id = self.connection.last_insert_rowid() as u64;

        Ok(MilestoneImpact {
            id,
            variation_id: params.variation_id,
            milestone_id: params.milestone_id,
            original_cost: milestone.baseline_cost,
            original_start: milestone.baseline_start,
            original_end: milestone.baseline_end,
            new_cost: milestone.baseline_cost,
            new_start: milestone.baseline_start,
            new_end: milestone.baseline_end,
            version_before: None,
            version_after: None,
            rationale: params.rationale.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates the proposed values of an impact row. Fields left as `None`
    /// keep their current values.
    pub fn update_impact(&mut self, id: u64, request: &UpdateImpactRequest) -> Result<MilestoneImpact> {
        let impact = self.require_impact(id)?;
        let variation = self.require_variation(impact.variation_id)?;
        if !workflow::can_edit_impacts(variation.status) {
            return Err(EngineError::invalid_state("edit impacts of", variation.status));
        }

        let new_cost = request.new_cost.unwrap_or(impact.new_cost);
        let new_start = request.new_start.or(impact.new_start);
        let new_end = request.new_end.or(impact.new_end);
        let rationale = request.rationale.clone().or(impact.rationale);

        if let (Some(start), Some(end)) = (new_start, new_end) {
            if end < start {
                return Err(EngineError::invalid_input(
                    "new_end",
                    "End date cannot be before start date",
                ));
            }
        }

        self.connection
            .execute(
                UPDATE_IMPACT_SQL,
                params![
                    new_cost,
                    new_start.map(|d| d.to_string()),
                    new_end.map(|d| d.to_string()),
                    rationale.as_deref(),
                    &Timestamp::now().to_string(),
                    id as i64,
                ],
            )
            .map_err(|e| EngineError::database_error("Failed to update milestone impact", e))?;

        self.require_impact(id)
    }

    /// Removes a single impact row from its variation.
    pub fn remove_impact(&mut self, id: u64) -> Result<MilestoneImpact> {
        let impact = self.require_impact(id)?;
        let variation = self.require_variation(impact.variation_id)?;
        if !workflow::can_edit_impacts(variation.status) {
            return Err(EngineError::invalid_state("edit impacts of", variation.status));
        }

        self.connection
            .execute(DELETE_IMPACT_SQL, params![id as i64])
            .map_err(|e| EngineError::database_error("Failed to delete milestone impact", e))?;

        // Best-effort cascade; adjustment rows belong to the deliverable
        // subsystem and must not block the removal.
        if let Err(e) = self.connection.execute(
            DELETE_IMPACT_ADJUSTMENTS_SQL,
            params![impact.variation_id as i64, impact.milestone_id as i64],
        ) {
            log::warn!(
                "Failed to delete deliverable adjustments for variation {} milestone {}: {e}",
                impact.variation_id,
                impact.milestone_id
            );
        }

        Ok(impact)
    }

    /// Removes every impact row from a variation.
    pub fn clear_impacts(&mut self, variation_id: u64) -> Result<u32> {
        let variation = self.require_variation(variation_id)?;
        if !workflow::can_edit_impacts(variation.status) {
            return Err(EngineError::invalid_state("edit impacts of", variation.status));
        }

        let removed = self
            .connection
            .execute(DELETE_ALL_IMPACTS_SQL, params![variation_id as i64])
            .map_err(|e| EngineError::database_error("Failed to clear milestone impacts", e))?;

        Ok(removed as u32)
    }

    /// Records a deliverable adjustment against a variation and milestone.
    ///
    /// Boundary hook for the deliverable subsystem; the engine only stores
    /// the row and cascades its deletion with the variation or impact row.
    pub fn record_deliverable_adjustment(
        &mut self,
        variation_id: u64,
        milestone_id: u64,
        deliverable_id: u64,
        adjustment: Option<&str>,
    ) -> Result<()> {
        if !self.variation_exists(variation_id)? {
            return Err(EngineError::VariationNotFound { id: variation_id });
        }
        self.connection
            .execute(
                INSERT_ADJUSTMENT_SQL,
                params![
                    variation_id as i64,
                    milestone_id as i64,
                    deliverable_id as i64,
                    adjustment,
                    &Timestamp::now().to_string(),
                ],
            )
            .map_err(|e| EngineError::database_error("Failed to record deliverable adjustment", e))?;
        Ok(())
    }

    fn require_impact(&self, id: u64) -> Result<MilestoneImpact> {
        self.get_impact(id)?.ok_or(EngineError::ImpactNotFound { id })
    }

    /// Retrieves a single impact row by its ID.
    pub fn get_impact(&self, id: u64) -> Result<Option<MilestoneImpact>> {
        let sql = format!(
            "SELECT {} FROM milestone_impacts WHERE id = ?1",
            super::IMPACT_COLUMNS
        );
        self.connection
            .prepare(&sql)
            .map_err(|e| EngineError::database_error("Failed to prepare query", e))?
            .query_row(params![id as i64], super::impact_from_row)
            .optional()
            .map_err(|e| EngineError::database_error("Failed to query milestone impact", e))
    }

    /// All impact rows of a variation, usable inside a transaction.
    pub(crate) fn query_impacts(conn: &Connection, variation_id: u64) -> Result<Vec<MilestoneImpact>> {
        let sql = format!(
            "SELECT {} FROM milestone_impacts WHERE variation_id = ?1 ORDER BY id",
            super::IMPACT_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| EngineError::database_error("Failed to prepare query", e))?;
        let impacts = stmt
            .query_map(params![variation_id as i64], super::impact_from_row)
            .map_err(|e| EngineError::database_error("Failed to query milestone impacts", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| EngineError::database_error("Failed to read impact rows", e))?;
        Ok(impacts)
    }
}
