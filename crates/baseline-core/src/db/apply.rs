//! Applying an approved variation to the project baselines.
//!
//! This is the commit point of the whole workflow: every affected milestone
//! gets its baseline rewritten, a new append-only version row, and the
//! variation is frozen into a certificate. Everything happens in one
//! transaction; a failure anywhere leaves no trace.

use jiff::Timestamp;
use rusqlite::params;

use crate::{
    error::{DatabaseResultExt, EngineError, Result},
    models::{CertificateData, CertificateMilestone, Variation, VariationStatus},
    workflow,
};

const MAX_VERSION_SQL: &str =
    "SELECT COALESCE(MAX(version), 0) FROM baseline_versions WHERE milestone_id = ?1";
const REWRITE_MILESTONE_SQL: &str = "UPDATE milestones SET baseline_cost = ?1, \
     baseline_start = ?2, baseline_end = ?3, forecast_cost = ?1, forecast_end = ?3, \
     billable_amount = ?1, updated_at = ?4 WHERE id = ?5";
const INSERT_VERSION_SQL: &str = "INSERT INTO baseline_versions (milestone_id, version, \
     baseline_cost, baseline_start, baseline_end, variation_id, supplier_signed_by, \
     supplier_signed_at, customer_signed_by, customer_signed_at, created_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";
const STAMP_IMPACT_SQL: &str = "UPDATE milestone_impacts SET version_before = ?1, \
     version_after = ?2, updated_at = ?3 WHERE id = ?4";
const FINALIZE_SQL: &str = "UPDATE variations SET status = 'applied', certificate_number = ?1, \
     certificate_data = ?2, applied_at = ?3, updated_at = ?3 \
     WHERE id = ?4 AND status = 'approved'";

impl super::Database {
    /// Applies an approved variation: rewrites every affected milestone's
    /// baseline, appends a version row per milestone, and freezes the
    /// certificate snapshot.
    ///
    /// Runs as a single transaction. The final status update is guarded on
    /// the variation still being approved, so two racing appliers cannot
    /// both succeed.
    pub fn apply_variation(&mut self, id: u64) -> Result<Variation> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let variation =
            Self::query_variation(&tx, id)?.ok_or(EngineError::VariationNotFound { id })?;
        if !workflow::can_apply(variation.status) {
            return Err(EngineError::invalid_state("apply", variation.status));
        }
        let (supplier_signature, customer_signature) = match (
            variation.supplier_signature.clone(),
            variation.customer_signature.clone(),
        ) {
            (Some(s), Some(c)) => (s, c),
            _ => {
                return Err(EngineError::Configuration {
                    message: format!("Approved variation {id} is missing a signature"),
                })
            }
        };

        let now = Timestamp::now();
        let now_str = now.to_string();
        let mut certificate_milestones = Vec::with_capacity(variation.impacts.len());

        for impact in &variation.impacts {
            let current_version: i64 = tx
                .query_row(MAX_VERSION_SQL, params![impact.milestone_id as i64], |row| {
                    row.get(0)
                })
                .map_err(|e| EngineError::database_error("Failed to read baseline version", e))?;
            let new_version = (current_version + 1) as u32;

            tx.execute(
                REWRITE_MILESTONE_SQL,
                params![
                    impact.new_cost,
                    impact.new_start.map(|d| d.to_string()),
                    impact.new_end.map(|d| d.to_string()),
                    &now_str,
                    impact.milestone_id as i64,
                ],
            )
            .map_err(|e| EngineError::database_error("Failed to rewrite milestone baseline", e))?;

            tx.execute(
                INSERT_VERSION_SQL,
                params![
                    impact.milestone_id as i64,
                    new_version as i64,
                    impact.new_cost,
                    impact.new_start.map(|d| d.to_string()),
                    impact.new_end.map(|d| d.to_string()),
                    variation.id as i64,
                    &supplier_signature.signer_id,
                    &supplier_signature.signed_at.to_string(),
                    &customer_signature.signer_id,
                    &customer_signature.signed_at.to_string(),
                    &now_str,
                ],
            )
            .map_err(|e| EngineError::database_error("Failed to insert baseline version", e))?;

            // An unversioned milestone counts as being at version 1.
            tx.execute(
                STAMP_IMPACT_SQL,
                params![
                    current_version.max(1),
                    new_version as i64,
                    &now_str,
                    impact.id as i64,
                ],
            )
            .map_err(|e| EngineError::database_error("Failed to stamp milestone impact", e))?;

            let milestone_name: String = tx
                .query_row(
                    "SELECT name FROM milestones WHERE id = ?1",
                    params![impact.milestone_id as i64],
                    |row| row.get(0),
                )
                .map_err(|e| EngineError::database_error("Failed to read milestone name", e))?;

            certificate_milestones.push(CertificateMilestone {
                milestone_id: impact.milestone_id,
                name: milestone_name,
                original_cost: impact.original_cost,
                new_cost: impact.new_cost,
                original_start: impact.original_start,
                new_start: impact.new_start,
                original_end: impact.original_end,
                new_end: impact.new_end,
                version: new_version,
            });
        }

        let certificate_number =
            format!("CERT-{:03}-{}", variation.project_id, variation.reference);
        let certificate = CertificateData {
            certificate_number: certificate_number.clone(),
            project_id: variation.project_id,
            reference: variation.reference.clone(),
            variation_type: variation.variation_type,
            title: variation.title.clone(),
            description: variation.description.clone(),
            impact_summary: variation.impact_summary.clone(),
            total_cost_impact: variation.total_cost_impact,
            total_days_impact: variation.total_days_impact,
            milestones: certificate_milestones,
            supplier_signature,
            customer_signature,
            applied_at: now,
        };
        let certificate_json = serde_json::to_string(&certificate)?;

        let updated = tx
            .execute(
                FINALIZE_SQL,
                params![&certificate_number, &certificate_json, &now_str, id as i64],
            )
            .map_err(|e| EngineError::database_error("Failed to finalize variation", e))?;
        if updated == 0 {
            // Another applier won the race; rolling back leaves its result intact.
            return Err(EngineError::invalid_state("apply", VariationStatus::Applied));
        }

        tx.commit().db_context("Failed to commit transaction")?;

        self.require_variation(id)
    }
}
