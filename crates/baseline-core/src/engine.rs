//! High-level engine API with async support.

use std::path::{Path, PathBuf};

use tokio::task;

use crate::{
    db::Database,
    error::{EngineError, Result},
    models::{
        BaselineVersion, Milestone, MilestoneImpact, ProjectSummary, UpdateImpactRequest,
        Variation, VariationSummary,
    },
    params::{
        Actor, AddImpact, CreateMilestone, CreateVariation, Id, ProjectId, RejectVariation,
        SaveFormProgress, SignVariation, SubmitVariation, UpdateImpact,
    },
};

/// Main engine interface for managing variations and baselines.
pub struct Engine {
    db_path: PathBuf,
}

impl Engine {
    /// Creates a new engine with the specified database path.
    fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Creates a new draft variation with an automatically allocated
    /// per-project reference.
    pub async fn create_variation(
        &self,
        params: &CreateVariation,
        actor: &Actor,
    ) -> Result<Variation> {
        let db_path = self.db_path.clone();
        let params = params.clone();
        let actor = actor.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.create_variation(&params, &actor)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Retrieves a variation by its ID, with impacts eagerly loaded.
    pub async fn get_with_details(&self, params: &Id) -> Result<Option<Variation>> {
        let db_path = self.db_path.clone();
        let variation_id = params.id;

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.get_variation(variation_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Saves form wizard progress on a draft variation.
    pub async fn save_form_progress(&self, params: &SaveFormProgress) -> Result<Variation> {
        let db_path = self.db_path.clone();
        let params = params.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.save_form_progress(&params)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Submits a draft for approval, freezing its impact totals.
    pub async fn submit_for_approval(&self, params: &SubmitVariation) -> Result<Variation> {
        let db_path = self.db_path.clone();
        let params = params.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.submit_for_approval(&params)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Records a party's signature. When the second signature arrives the
    /// variation is applied immediately; if the apply fails it stays
    /// approved for a retry via [`Self::apply_variation`].
    pub async fn sign_variation(&self, params: &SignVariation, actor: &Actor) -> Result<Variation> {
        let db_path = self.db_path.clone();
        let params = params.clone();
        let actor = actor.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.sign_variation(&params, &actor)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Rejects a variation, recording who rejected it and why.
    pub async fn reject_variation(
        &self,
        params: &RejectVariation,
        actor: &Actor,
    ) -> Result<Variation> {
        let db_path = self.db_path.clone();
        let params = params.clone();
        let actor = actor.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.reject_variation(&params, &actor)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Resets a rejected variation back to draft, clearing signatures and
    /// the rejection record.
    pub async fn reset_to_draft(&self, params: &Id) -> Result<Variation> {
        let db_path = self.db_path.clone();
        let variation_id = params.id;

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.reset_to_draft(variation_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Permanently deletes a variation and its impact rows.
    /// Only legal while unsigned or after rejection.
    pub async fn delete_variation(&self, params: &Id) -> Result<Variation> {
        let db_path = self.db_path.clone();
        let variation_id = params.id;

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.delete_variation(variation_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Applies an approved variation to the project baselines. Normally
    /// invoked automatically by the second signature; exposed for retrying
    /// after a failed automatic apply.
    pub async fn apply_variation(&self, params: &Id) -> Result<Variation> {
        let db_path = self.db_path.clone();
        let variation_id = params.id;

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.apply_variation(variation_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Lists a project's variations with impact statistics, newest first.
    pub async fn list_with_stats(&self, params: &ProjectId) -> Result<Vec<VariationSummary>> {
        let db_path = self.db_path.clone();
        let project_id = params.project_id;

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.list_variations(project_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Computes per-status counts and applied totals for a project.
    pub async fn project_summary(&self, params: &ProjectId) -> Result<ProjectSummary> {
        let db_path = self.db_path.clone();
        let project_id = params.project_id;

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.project_summary(project_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Adds a milestone to a variation's impact ledger.
    pub async fn add_impact(&self, params: &AddImpact) -> Result<MilestoneImpact> {
        let db_path = self.db_path.clone();
        let params = params.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.add_impact(&params)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Updates the proposed values of an impact row.
    pub async fn update_impact(&self, params: &UpdateImpact) -> Result<MilestoneImpact> {
        let db_path = self.db_path.clone();
        let params = params.clone();

        let request = UpdateImpactRequest {
            new_cost: params.new_cost,
            new_start: crate::db::parse_optional_date("new_start", params.new_start.as_deref())?,
            new_end: crate::db::parse_optional_date("new_end", params.new_end.as_deref())?,
            rationale: params.rationale.clone(),
        };

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.update_impact(params.id, &request)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Removes a single impact row from its variation.
    pub async fn remove_impact(&self, params: &Id) -> Result<MilestoneImpact> {
        let db_path = self.db_path.clone();
        let impact_id = params.id;

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.remove_impact(impact_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Removes every impact row from a variation; returns how many went.
    pub async fn clear_impacts(&self, params: &Id) -> Result<u32> {
        let db_path = self.db_path.clone();
        let variation_id = params.id;

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.clear_impacts(variation_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Creates a milestone with forecast and billable seeded from the
    /// baseline.
    pub async fn create_milestone(&self, params: &CreateMilestone) -> Result<Milestone> {
        let db_path = self.db_path.clone();
        let params = params.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.create_milestone(&params)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Retrieves a milestone by its ID.
    pub async fn get_milestone(&self, params: &Id) -> Result<Option<Milestone>> {
        let db_path = self.db_path.clone();
        let milestone_id = params.id;

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.get_milestone(milestone_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// The full baseline revision history of a milestone, oldest first.
    pub async fn baseline_history(&self, params: &Id) -> Result<Vec<BaselineVersion>> {
        let db_path = self.db_path.clone();
        let milestone_id = params.id;

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.baseline_history(milestone_id)
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }
}

/// Builder for configuring [`Engine`] instances.
pub struct EngineBuilder {
    database_path: Option<PathBuf>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            database_path: None,
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/baseline/baseline.db` or
    /// `~/.local/share/baseline/baseline.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Builds the configured engine instance.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::FileSystem` if the database path is invalid
    /// Returns `EngineError::Database` if database initialization fails
    pub async fn build(self) -> Result<Engine> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        // Create parent directories if they don't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        // Test database connection
        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), EngineError>(())
        })
        .await
        .map_err(|e| EngineError::Configuration {
            message: format!("Task join error: {e}"),
        })??;

        Ok(Engine::new(db_path))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("baseline")
            .place_data_file("baseline.db")
            .map_err(|e| EngineError::XdgDirectory(e.to_string()))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::VariationStatus;

    /// Helper function to create a test engine
    async fn create_test_engine() -> (TempDir, Engine) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let engine = EngineBuilder::new()
            .with_database_path(&db_path)
            .build()
            .await
            .expect("Failed to create engine");
        (temp_dir, engine)
    }

    #[tokio::test]
    async fn test_create_variation_allocates_references() {
        let (_temp_dir, engine) = create_test_engine().await;
        let actor = Actor::new("alice");

        let first = engine
            .create_variation(
                &CreateVariation {
                    project_id: 1,
                    variation_type: "combined".to_string(),
                    title: "First change".to_string(),
                    ..Default::default()
                },
                &actor,
            )
            .await
            .expect("Failed to create variation");
        let second = engine
            .create_variation(
                &CreateVariation {
                    project_id: 1,
                    variation_type: "cost_adjustment".to_string(),
                    title: "Second change".to_string(),
                    ..Default::default()
                },
                &actor,
            )
            .await
            .expect("Failed to create variation");

        assert_eq!(first.reference, "VAR-001");
        assert_eq!(second.reference, "VAR-002");
        assert_eq!(first.status, VariationStatus::Draft);
        assert_eq!(first.created_by, "alice");
    }

    #[tokio::test]
    async fn test_references_are_scoped_per_project() {
        let (_temp_dir, engine) = create_test_engine().await;
        let actor = Actor::new("alice");

        for project_id in [1, 2] {
            let variation = engine
                .create_variation(
                    &CreateVariation {
                        project_id,
                        variation_type: "combined".to_string(),
                        title: "Change".to_string(),
                        ..Default::default()
                    },
                    &actor,
                )
                .await
                .expect("Failed to create variation");
            assert_eq!(variation.reference, "VAR-001");
        }
    }

    #[tokio::test]
    async fn test_get_with_details_missing() {
        let (_temp_dir, engine) = create_test_engine().await;
        let found = engine
            .get_with_details(&Id { id: 42 })
            .await
            .expect("Query failed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_with_stats_counts_impacts() {
        let (_temp_dir, engine) = create_test_engine().await;
        let actor = Actor::new("alice");

        let milestone = engine
            .create_milestone(&CreateMilestone {
                project_id: 1,
                name: "Phase one".to_string(),
                baseline_cost: 5000.0,
                baseline_start: Some("2026-01-01".to_string()),
                baseline_end: Some("2026-03-31".to_string()),
            })
            .await
            .expect("Failed to create milestone");
        let variation = engine
            .create_variation(
                &CreateVariation {
                    project_id: 1,
                    variation_type: "cost_adjustment".to_string(),
                    title: "More budget".to_string(),
                    ..Default::default()
                },
                &actor,
            )
            .await
            .expect("Failed to create variation");
        engine
            .add_impact(&AddImpact {
                variation_id: variation.id,
                milestone_id: milestone.id,
                rationale: None,
            })
            .await
            .expect("Failed to add impact");

        let summaries = engine
            .list_with_stats(&ProjectId { project_id: 1 })
            .await
            .expect("Failed to list variations");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].milestone_count, 1);
    }
}
