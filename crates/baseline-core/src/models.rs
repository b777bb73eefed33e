//! Data models for variations, milestone impacts, and baseline versions.
//!
//! This module contains the core domain models of the change-control engine.
//! A [`Variation`] is the change-request aggregate: it owns a set of
//! [`MilestoneImpact`] rows (one per affected milestone) and, once applied,
//! a frozen certificate snapshot. Every baseline revision ever applied to a
//! milestone is recorded as an append-only [`BaselineVersion`] row.
//!
//! All models implement [`std::fmt::Display`] producing markdown, mirroring
//! the dual-display approach of the [`crate::display`] wrapper types: direct
//! display for standalone output, wrappers for lists and operation results.

use std::{fmt, str::FromStr};

use jiff::{civil::Date, tz::TimeZone, Timestamp};
use serde::{Deserialize, Serialize};

/// Type-safe enumeration of variation workflow statuses.
///
/// Legal transitions are defined in [`crate::workflow`]; this type only
/// carries the status value and its string representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariationStatus {
    /// Being drafted; fully editable
    #[default]
    Draft,

    /// Submitted for dual-party approval; totals are frozen
    Submitted,

    /// Supplier has signed; waiting on the customer
    AwaitingCustomer,

    /// Customer has signed; waiting on the supplier
    AwaitingSupplier,

    /// Both parties signed; apply pending or failed (retryable)
    Approved,

    /// Baselines rewritten and certificate frozen; terminal
    Applied,

    /// Rejected by either party; may be reset to draft
    Rejected,
}

impl FromStr for VariationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(VariationStatus::Draft),
            "submitted" => Ok(VariationStatus::Submitted),
            "awaiting_customer" => Ok(VariationStatus::AwaitingCustomer),
            "awaiting_supplier" => Ok(VariationStatus::AwaitingSupplier),
            "approved" => Ok(VariationStatus::Approved),
            "applied" => Ok(VariationStatus::Applied),
            "rejected" => Ok(VariationStatus::Rejected),
            _ => Err(format!("Invalid variation status: {s}")),
        }
    }
}

impl fmt::Display for VariationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl VariationStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VariationStatus::Draft => "draft",
            VariationStatus::Submitted => "submitted",
            VariationStatus::AwaitingCustomer => "awaiting_customer",
            VariationStatus::AwaitingSupplier => "awaiting_supplier",
            VariationStatus::Approved => "approved",
            VariationStatus::Applied => "applied",
            VariationStatus::Rejected => "rejected",
        }
    }

    /// Get status with consistent icon formatting for display.
    pub fn with_icon(&self) -> &'static str {
        match self {
            VariationStatus::Draft => "○ Draft",
            VariationStatus::Submitted => "➤ Submitted",
            VariationStatus::AwaitingCustomer => "⧗ Awaiting Customer",
            VariationStatus::AwaitingSupplier => "⧗ Awaiting Supplier",
            VariationStatus::Approved => "✓ Approved",
            VariationStatus::Applied => "✦ Applied",
            VariationStatus::Rejected => "✗ Rejected",
        }
    }
}

/// Classification of what a variation changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariationType {
    ScopeExtension,
    ScopeReduction,
    TimeExtension,
    CostAdjustment,
    #[default]
    Combined,
}

impl FromStr for VariationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scope_extension" => Ok(VariationType::ScopeExtension),
            "scope_reduction" => Ok(VariationType::ScopeReduction),
            "time_extension" => Ok(VariationType::TimeExtension),
            "cost_adjustment" => Ok(VariationType::CostAdjustment),
            "combined" => Ok(VariationType::Combined),
            _ => Err(format!("Invalid variation type: {s}")),
        }
    }
}

impl fmt::Display for VariationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl VariationType {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VariationType::ScopeExtension => "scope_extension",
            VariationType::ScopeReduction => "scope_reduction",
            VariationType::TimeExtension => "time_extension",
            VariationType::CostAdjustment => "cost_adjustment",
            VariationType::Combined => "combined",
        }
    }
}

/// One of the two signing parties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Supplier,
    Customer,
}

impl FromStr for Party {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supplier" => Ok(Party::Supplier),
            "customer" => Ok(Party::Customer),
            _ => Err(format!("Invalid party: {s}")),
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Party::Supplier => "supplier",
            Party::Customer => "customer",
        };
        write!(f, "{s}")
    }
}

/// A recorded signature: who signed and when.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignatureStamp {
    /// Identity of the signer, supplied by the authentication layer
    pub signer_id: String,

    /// Timestamp of the signature (UTC)
    pub signed_at: Timestamp,
}

/// A recorded rejection: who rejected, when, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rejection {
    pub rejected_by: String,
    pub rejected_at: Timestamp,
    pub reason: String,
}

/// The change-request aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variation {
    /// Unique identifier for the variation
    pub id: u64,

    /// Project this variation belongs to
    pub project_id: u64,

    /// Human-readable reference, unique per project (`VAR-001`, `VAR-002`, …)
    pub reference: String,

    /// Classification of the change
    #[serde(default)]
    pub variation_type: VariationType,

    /// Short title of the change request
    pub title: String,

    /// Free-text description (opaque to the engine)
    pub description: Option<String>,

    /// Free-text reason for the change (opaque to the engine)
    pub reason: Option<String>,

    /// Current workflow status
    #[serde(default)]
    pub status: VariationStatus,

    /// Wizard progress, persisted so drafting can resume where it left off
    pub form_step: u32,

    /// Opaque draft blob saved by the form wizard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_data: Option<serde_json::Value>,

    /// Summary of the overall impact, captured at submission
    pub impact_summary: Option<String>,

    /// Σ (new − original) cost across all impact rows, set at submission
    pub total_cost_impact: Option<f64>,

    /// Σ day-deltas of (new_end − original_end), set at submission
    pub total_days_impact: Option<i64>,

    /// Supplier signature, if the supplier has signed
    pub supplier_signature: Option<SignatureStamp>,

    /// Customer signature, if the customer has signed
    pub customer_signature: Option<SignatureStamp>,

    /// Rejection details, if the variation was rejected
    pub rejection: Option<Rejection>,

    /// Certificate number, derived at apply time
    pub certificate_number: Option<String>,

    /// Immutable certificate snapshot, frozen at apply time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_data: Option<serde_json::Value>,

    /// Timestamp when the variation was applied (UTC)
    pub applied_at: Option<Timestamp>,

    /// Identity of the creating user
    pub created_by: String,

    /// Timestamp when the variation was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the variation was last modified (UTC)
    pub updated_at: Timestamp,

    /// Milestone impact rows (eagerly loaded)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub impacts: Vec<MilestoneImpact>,
}

impl Variation {
    /// Whether the given party has already signed.
    pub fn is_signed_by(&self, party: Party) -> bool {
        match party {
            Party::Supplier => self.supplier_signature.is_some(),
            Party::Customer => self.customer_signature.is_some(),
        }
    }
}

/// One row per (variation, milestone): original vs. proposed baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilestoneImpact {
    /// Unique identifier for the impact row
    pub id: u64,

    /// Owning variation
    pub variation_id: u64,

    /// Affected milestone
    pub milestone_id: u64,

    /// Baseline cost at the time the milestone was added to the variation
    pub original_cost: f64,

    /// Baseline start date at add-time
    pub original_start: Option<Date>,

    /// Baseline end date at add-time
    pub original_end: Option<Date>,

    /// Proposed baseline cost (mutable while the parent is editable)
    pub new_cost: f64,

    /// Proposed baseline start date
    pub new_start: Option<Date>,

    /// Proposed baseline end date
    pub new_end: Option<Date>,

    /// Milestone baseline version before apply (filled at apply time)
    pub version_before: Option<u32>,

    /// Milestone baseline version after apply (filled at apply time)
    pub version_after: Option<u32>,

    /// Free-text rationale for this milestone's change
    pub rationale: Option<String>,

    /// Timestamp when the row was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the row was last updated (UTC)
    pub updated_at: Timestamp,
}

impl MilestoneImpact {
    /// Signed cost delta: proposed minus original.
    pub fn cost_delta(&self) -> f64 {
        self.new_cost - self.original_cost
    }

    /// Signed day delta between the proposed and original end dates,
    /// when both are present.
    pub fn days_delta(&self) -> Option<i64> {
        match (self.original_end, self.new_end) {
            (Some(original), Some(new)) => Some((new - original).get_days() as i64),
            _ => None,
        }
    }
}

/// Append-only record of one baseline revision applied to a milestone.
///
/// Versions for a milestone are strictly increasing with no gaps, starting
/// at 1. Rows are never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaselineVersion {
    pub id: u64,
    pub milestone_id: u64,
    pub version: u32,
    pub baseline_cost: f64,
    pub baseline_start: Option<Date>,
    pub baseline_end: Option<Date>,

    /// The variation whose application produced this revision
    pub variation_id: u64,

    /// Copy of the supplier signature at apply time
    pub supplier_signature: Option<SignatureStamp>,

    /// Copy of the customer signature at apply time
    pub customer_signature: Option<SignatureStamp>,

    pub created_at: Timestamp,
}

/// A project milestone as seen by the engine.
///
/// Milestones are owned by a separate subsystem; the engine only mutates the
/// baseline, forecast, and billable fields at apply time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub id: u64,
    pub project_id: u64,
    pub name: String,
    pub baseline_cost: f64,
    pub baseline_start: Option<Date>,
    pub baseline_end: Option<Date>,
    pub forecast_cost: f64,
    pub forecast_end: Option<Date>,
    pub billable_amount: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Summary information about a variation with impact statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationSummary {
    pub id: u64,
    pub project_id: u64,
    pub reference: String,
    pub title: String,
    pub variation_type: VariationType,
    pub status: VariationStatus,
    pub total_cost_impact: Option<f64>,
    pub total_days_impact: Option<i64>,
    /// Number of milestone impact rows on the ledger
    pub milestone_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Variation> for VariationSummary {
    fn from(variation: &Variation) -> Self {
        Self {
            id: variation.id,
            project_id: variation.project_id,
            reference: variation.reference.clone(),
            title: variation.title.clone(),
            variation_type: variation.variation_type,
            status: variation.status,
            total_cost_impact: variation.total_cost_impact,
            total_days_impact: variation.total_days_impact,
            milestone_count: variation.impacts.len() as u32,
            created_at: variation.created_at,
            updated_at: variation.updated_at,
        }
    }
}

/// Per-project variation counts and applied totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSummary {
    pub project_id: u64,
    pub total: u32,
    pub draft: u32,
    /// Submitted plus awaiting either signature
    pub in_approval: u32,
    pub approved: u32,
    pub applied: u32,
    pub rejected: u32,
    /// Sum of cost impacts across applied variations
    pub applied_cost_impact: f64,
    /// Sum of day impacts across applied variations
    pub applied_days_impact: i64,
}

/// The self-contained certificate snapshot frozen at apply time.
///
/// Serialized to JSON and stored on the variation; never mutated afterwards.
/// External renderers consume this structure to produce printable documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertificateData {
    pub certificate_number: String,
    pub project_id: u64,
    pub reference: String,
    pub variation_type: VariationType,
    pub title: String,
    pub description: Option<String>,
    pub impact_summary: Option<String>,
    pub total_cost_impact: Option<f64>,
    pub total_days_impact: Option<i64>,
    pub milestones: Vec<CertificateMilestone>,
    pub supplier_signature: SignatureStamp,
    pub customer_signature: SignatureStamp,
    pub applied_at: Timestamp,
}

/// One affected milestone inside a certificate snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertificateMilestone {
    pub milestone_id: u64,
    pub name: String,
    pub original_cost: f64,
    pub new_cost: f64,
    pub original_start: Option<Date>,
    pub new_start: Option<Date>,
    pub original_end: Option<Date>,
    pub new_end: Option<Date>,
    /// Baseline version created by this application
    pub version: u32,
}

/// Partial-update request for a milestone impact row.
///
/// Fields left as `None` keep their current values, so a proposed date can
/// be replaced but not cleared back to unset. Removing and re-adding the
/// impact resets the row to the milestone's baseline.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateImpactRequest {
    pub new_cost: Option<f64>,
    pub new_start: Option<Date>,
    pub new_end: Option<Date>,
    pub rationale: Option<String>,
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}. {}", self.reference, self.title)?;
        writeln!(f)?;

        writeln!(f, "- Status: {}", self.status.with_icon())?;
        writeln!(f, "- Type: {}", self.variation_type)?;
        writeln!(f, "- Project: {}", self.project_id)?;
        writeln!(
            f,
            "- Created: {} by {}",
            LocalDateTime(&self.created_at),
            self.created_by
        )?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;

        if let (Some(cost), Some(days)) = (self.total_cost_impact, self.total_days_impact) {
            writeln!(f, "- Impact: {cost:+.2} cost, {days:+} days")?;
        }

        if let Some(sig) = &self.supplier_signature {
            writeln!(
                f,
                "- Supplier signed: {} at {}",
                sig.signer_id,
                LocalDateTime(&sig.signed_at)
            )?;
        }
        if let Some(sig) = &self.customer_signature {
            writeln!(
                f,
                "- Customer signed: {} at {}",
                sig.signer_id,
                LocalDateTime(&sig.signed_at)
            )?;
        }
        if let Some(rejection) = &self.rejection {
            writeln!(
                f,
                "- Rejected: {} at {} ({})",
                rejection.rejected_by,
                LocalDateTime(&rejection.rejected_at),
                rejection.reason
            )?;
        }
        if let Some(number) = &self.certificate_number {
            writeln!(f, "- Certificate: {number}")?;
        }

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }

        if let Some(summary) = &self.impact_summary {
            writeln!(f, "\n## Impact Summary")?;
            writeln!(f)?;
            writeln!(f, "{summary}")?;
        }

        if !self.impacts.is_empty() {
            writeln!(f, "\n## Milestone Impacts")?;
            writeln!(f)?;
            for impact in &self.impacts {
                write!(f, "{impact}")?;
            }
        } else {
            writeln!(f, "\nNo milestone impacts on this variation.")?;
        }

        Ok(())
    }
}

impl fmt::Display for MilestoneImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "### {}. Milestone {} ({:+.2})",
            self.id,
            self.milestone_id,
            self.cost_delta()
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "- Cost: {:.2} → {:.2}",
            self.original_cost, self.new_cost
        )?;
        if self.original_start.is_some() || self.new_start.is_some() {
            writeln!(
                f,
                "- Start: {} → {}",
                OptionalDate(&self.original_start),
                OptionalDate(&self.new_start)
            )?;
        }
        if self.original_end.is_some() || self.new_end.is_some() {
            writeln!(
                f,
                "- End: {} → {}",
                OptionalDate(&self.original_end),
                OptionalDate(&self.new_end)
            )?;
        }
        if let Some(days) = self.days_delta() {
            writeln!(f, "- Days: {days:+}")?;
        }
        if let (Some(before), Some(after)) = (self.version_before, self.version_after) {
            writeln!(f, "- Baseline version: {before} → {after}")?;
        }
        if let Some(rationale) = &self.rationale {
            writeln!(f)?;
            writeln!(f, "{rationale}")?;
        }
        writeln!(f)?;
        Ok(())
    }
}

impl fmt::Display for BaselineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "### v{} for milestone {} (variation {})",
            self.version, self.milestone_id, self.variation_id
        )?;
        writeln!(f)?;
        writeln!(f, "- Cost: {:.2}", self.baseline_cost)?;
        writeln!(
            f,
            "- Dates: {} → {}",
            OptionalDate(&self.baseline_start),
            OptionalDate(&self.baseline_end)
        )?;
        writeln!(f, "- Recorded: {}", LocalDateTime(&self.created_at))?;
        writeln!(f)?;
        Ok(())
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}. {}", self.id, self.name)?;
        writeln!(f)?;
        writeln!(f, "- Project: {}", self.project_id)?;
        writeln!(f, "- Baseline cost: {:.2}", self.baseline_cost)?;
        writeln!(
            f,
            "- Baseline dates: {} → {}",
            OptionalDate(&self.baseline_start),
            OptionalDate(&self.baseline_end)
        )?;
        writeln!(f, "- Forecast cost: {:.2}", self.forecast_cost)?;
        writeln!(f, "- Billable amount: {:.2}", self.billable_amount)?;
        Ok(())
    }
}

impl fmt::Display for VariationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "## {} - {} (ID: {})",
            self.reference, self.title, self.id
        )?;
        writeln!(f)?;
        writeln!(f, "- **Status**: {}", self.status.with_icon())?;
        writeln!(f, "- **Type**: {}", self.variation_type)?;
        if let Some(cost) = self.total_cost_impact {
            writeln!(f, "- **Cost impact**: {cost:+.2}")?;
        }
        if let Some(days) = self.total_days_impact {
            writeln!(f, "- **Days impact**: {days:+}")?;
        }
        writeln!(f, "- **Milestones**: {}", self.milestone_count)?;
        writeln!(f, "- **Created**: {}", LocalDateTime(&self.created_at))?;
        writeln!(f)?;
        Ok(())
    }
}

impl fmt::Display for ProjectSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Project {} variations", self.project_id)?;
        writeln!(f)?;
        writeln!(f, "- Total: {}", self.total)?;
        writeln!(f, "- Draft: {}", self.draft)?;
        writeln!(f, "- In approval: {}", self.in_approval)?;
        writeln!(f, "- Approved (unapplied): {}", self.approved)?;
        writeln!(f, "- Applied: {}", self.applied)?;
        writeln!(f, "- Rejected: {}", self.rejected)?;
        writeln!(
            f,
            "- Applied impact: {:+.2} cost, {:+} days",
            self.applied_cost_impact, self.applied_days_impact
        )?;
        Ok(())
    }
}

/// A wrapper around `Timestamp` that formats in the system timezone.
///
/// Format: `YYYY-MM-DD HH:MM:SS TZ`.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl<'a> LocalDateTime<'a> {
    /// Create a new `LocalDateTime` wrapper around a timestamp reference.
    pub fn new(timestamp: &'a Timestamp) -> Self {
        Self(timestamp)
    }
}

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .to_zoned(TimeZone::system())
                .strftime("%Y-%m-%d %H:%M:%S %Z")
        )
    }
}

/// Displays an optional civil date, `(unset)` when absent.
struct OptionalDate<'a>(&'a Option<Date>);

impl fmt::Display for OptionalDate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(date) => write!(f, "{date}"),
            None => write!(f, "(unset)"),
        }
    }
}
