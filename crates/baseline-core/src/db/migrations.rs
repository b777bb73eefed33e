//! Database schema initialization and migrations.

use crate::error::{DatabaseResultExt, EngineError, Result};

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        // Enable foreign keys for this connection
        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        // Execute the schema SQL
        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        // Apply migrations for existing databases
        self.apply_migrations()?;

        Ok(())
    }

    /// Apply database migrations for existing databases
    fn apply_migrations(&self) -> Result<()> {
        // Check if rationale column exists in milestone_impacts table
        let has_rationale_column: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('milestone_impacts') WHERE name = 'rationale'",
                [],
                |row| row.get(0),
            )
            .map(|count: i64| count > 0)
            .unwrap_or(false);

        // Add rationale column if it doesn't exist
        if !has_rationale_column {
            self.connection
                .execute("ALTER TABLE milestone_impacts ADD COLUMN rationale TEXT", [])
                .map_err(|e| {
                    EngineError::database_error(
                        "Failed to add rationale column to milestone_impacts table",
                        e,
                    )
                })?;
        }

        // Check if milestone_id column exists in deliverable_adjustments table
        let has_milestone_column: bool = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('deliverable_adjustments') WHERE name = 'milestone_id'",
                [],
                |row| row.get(0),
            )
            .map(|count: i64| count > 0)
            .unwrap_or(false);

        // Add milestone_id column if it doesn't exist
        if !has_milestone_column {
            self.connection
                .execute(
                    "ALTER TABLE deliverable_adjustments ADD COLUMN milestone_id INTEGER REFERENCES milestones(id)",
                    [],
                )
                .map_err(|e| {
                    EngineError::database_error(
                        "Failed to add milestone_id column to deliverable_adjustments table",
                        e,
                    )
                })?;
        }

        Ok(())
    }
}
