//! Core library for the Baseline change-control engine.
//!
//! This crate provides the business logic for contract variations: drafting,
//! dual-party approval, atomic application to project baselines, and the
//! append-only baseline version history, including database operations, data
//! models, and error handling.
//!
//! # Display Architecture
//!
//! The crate implements a Display-based architecture for formatting output:
//!
//! - **Domain Models** ([`models`]): Implement [`std::fmt::Display`] for
//!   direct markdown formatting
//! - **Display Wrappers** ([`display`]): Provide contextual and specialized
//!   formatting (lists, operation results)
//! - **Terminal Rendering**: Rich markdown output via the CLI's terminal
//!   renderer
//!
//! # Quick Start
//!
//! ```rust
//! use baseline_core::{
//!     params::{Actor, CreateVariation},
//!     EngineBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create an engine instance
//! let engine = EngineBuilder::new()
//!     .with_database_path("test.db")
//!     .build()
//!     .await?;
//!
//! // Create a new draft variation
//! let params = CreateVariation {
//!     project_id: 1,
//!     variation_type: "time_extension".to_string(),
//!     title: "Extend phase two".to_string(),
//!     ..Default::default()
//! };
//! let actor = Actor::new("alice");
//!
//! let variation = engine.create_variation(&params, &actor).await?;
//! println!("Created variation: {}", variation);
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod params;
pub mod workflow;

// Re-export commonly used types
pub use db::Database;
pub use display::{
    CreateResult, DeleteResult, ImpactList, OperationStatus, VariationList, VersionHistory,
};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result};
pub use models::{
    BaselineVersion, CertificateData, LocalDateTime, Milestone, MilestoneImpact, Party,
    ProjectSummary, Rejection, SignatureStamp, UpdateImpactRequest, Variation, VariationStatus,
    VariationSummary, VariationType,
};
pub use params::{
    Actor, AddImpact, CreateMilestone, CreateVariation, Id, ProjectId, RejectVariation,
    SaveFormProgress, SignVariation, SubmitVariation, UpdateImpact,
};
