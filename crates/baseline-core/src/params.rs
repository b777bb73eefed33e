//! Parameter structures for engine operations
//!
//! This module contains shared parameter structures that can be used across
//! different interfaces (CLI today, other frontends later) without
//! framework-specific derives or dependencies.
//!
//! ## Architecture: Parameter Wrapper Pattern
//!
//! Interface layers create wrapper structs that add their own derives
//! (for the CLI, `clap::Args`) and convert into these core types via
//! `into_params()` methods. That keeps the core crate free of UI framework
//! dependencies while each frontend gets compile-time checked conversions.
//!
//! ```ignore
//! // In baseline-cli/src/cli.rs
//! #[derive(Args)]
//! pub struct CreateVariationArgs {
//!     pub title: String,
//!     // ... clap-specific attributes
//! }
//!
//! impl CreateVariationArgs {
//!     fn into_params(self) -> CreateVariation { ... }
//! }
//! ```
//!
//! Caller identity is never ambient: operations that record who acted take
//! an explicit [`Actor`] alongside their parameters.

use serde::{Deserialize, Serialize};

/// The identity performing an operation.
///
/// Passed explicitly to every operation that records authorship (creation,
/// signatures, rejections). The engine trusts the caller to have
/// authenticated the identity; it only records it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Stable identifier of the acting user
    pub user_id: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Generic parameters for operations requiring just a variation ID.
///
/// Used for operations like get_with_details, reset_to_draft,
/// apply_variation, delete_draft_variation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id {
    /// The ID of the resource to operate on
    pub id: u64,
}

/// Generic parameters for operations scoped to a project.
///
/// Used for list_with_stats and project_summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectId {
    /// The project to operate on
    pub project_id: u64,
}

/// Parameters for creating a new variation.
///
/// The variation starts in draft status with an automatically allocated
/// per-project reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateVariation {
    /// Project the variation belongs to
    pub project_id: u64,
    /// Classification of the change ('scope_extension', 'scope_reduction',
    /// 'time_extension', 'cost_adjustment', or 'combined')
    pub variation_type: String,
    /// Title of the variation (required)
    pub title: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// Optional reason for the change
    pub reason: Option<String>,
    /// Optional initial form wizard blob
    pub form_data: Option<serde_json::Value>,
}

/// Parameters for saving form wizard progress on a draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveFormProgress {
    /// Variation ID to update (must be in draft status)
    pub id: u64,
    /// Opaque form blob to persist
    pub form_data: serde_json::Value,
    /// Wizard step reached (1-based)
    pub form_step: u32,
}

/// Parameters for submitting a draft for approval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitVariation {
    /// Variation ID to submit
    pub id: u64,
    /// Summary of the overall impact (required)
    pub impact_summary: String,
}

/// Parameters for recording a party's signature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignVariation {
    /// Variation ID to sign
    pub id: u64,
    /// Signing party ('supplier' or 'customer')
    pub party: String,
}

/// Parameters for rejecting a variation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectVariation {
    /// Variation ID to reject
    pub id: u64,
    /// Reason for the rejection (required)
    pub reason: String,
}

/// Parameters for adding a milestone to a variation's impact ledger.
///
/// The milestone's current baseline is copied into the new row as both the
/// original and the initial proposed values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddImpact {
    /// Variation to add the impact to
    pub variation_id: u64,
    /// Milestone being affected
    pub milestone_id: u64,
    /// Optional rationale for this milestone's change
    pub rationale: Option<String>,
}

/// Parameters for updating the proposed values of an impact row.
///
/// Fields left unset keep their current values. Dates use `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateImpact {
    /// Impact row ID to update
    pub id: u64,
    /// New proposed baseline cost
    pub new_cost: Option<f64>,
    /// New proposed baseline start date (`YYYY-MM-DD`)
    pub new_start: Option<String>,
    /// New proposed baseline end date (`YYYY-MM-DD`)
    pub new_end: Option<String>,
    /// Updated rationale
    pub rationale: Option<String>,
}

/// Parameters for creating a milestone.
///
/// Milestone authoring belongs to a separate subsystem in production; this
/// operation exists so a database can be seeded and exercised end to end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMilestone {
    /// Project the milestone belongs to
    pub project_id: u64,
    /// Name of the milestone (required)
    pub name: String,
    /// Initial baseline cost
    pub baseline_cost: f64,
    /// Initial baseline start date (`YYYY-MM-DD`)
    pub baseline_start: Option<String>,
    /// Initial baseline end date (`YYYY-MM-DD`)
    pub baseline_end: Option<String>,
}
