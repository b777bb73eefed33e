//! Display wrapper types for formatting different contexts.
//!
//! This module provides wrapper types that implement Display for collections
//! and operation results, enabling consistent formatting across different
//! output contexts (lists, operations, etc.).
//!
//! Instead of implementing every presentation concern on the domain models,
//! specialized wrappers format the same data differently depending on
//! context: a [`VariationList`] compacts summaries into a listing, a
//! [`CreateResult`] prefixes the created resource with a confirmation line,
//! and so on. All formatters produce markdown for rich terminal display.

use std::fmt;

use crate::models::{BaselineVersion, Milestone, MilestoneImpact, Variation, VariationSummary};

/// Wrapper type for displaying a collection of variation summaries.
pub struct VariationList<'a> {
    variations: &'a [VariationSummary],
    title: Option<&'a str>,
}

impl<'a> VariationList<'a> {
    /// Create a new VariationList wrapper.
    pub fn new(variations: &'a [VariationSummary]) -> Self {
        Self {
            variations,
            title: None,
        }
    }

    /// Create a VariationList with a title header.
    pub fn with_title(variations: &'a [VariationSummary], title: &'a str) -> Self {
        Self {
            variations,
            title: Some(title),
        }
    }
}

impl fmt::Display for VariationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = self.title {
            writeln!(f, "# {title}")?;
            writeln!(f)?;
        }

        if self.variations.is_empty() {
            writeln!(f, "No variations found.")?;
            return Ok(());
        }

        for variation in self.variations {
            write!(f, "{variation}")?;
        }

        Ok(())
    }
}

/// Wrapper type for displaying the impact ledger of a variation.
pub struct ImpactList<'a> {
    impacts: &'a [MilestoneImpact],
    title: Option<&'a str>,
}

impl<'a> ImpactList<'a> {
    /// Create a new ImpactList wrapper.
    pub fn new(impacts: &'a [MilestoneImpact]) -> Self {
        Self {
            impacts,
            title: None,
        }
    }

    /// Create an ImpactList with a title header.
    pub fn with_title(impacts: &'a [MilestoneImpact], title: &'a str) -> Self {
        Self {
            impacts,
            title: Some(title),
        }
    }
}

impl fmt::Display for ImpactList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = self.title {
            writeln!(f, "# {title}")?;
            writeln!(f)?;
        }

        if self.impacts.is_empty() {
            writeln!(f, "No milestone impacts found.")?;
            return Ok(());
        }

        for impact in self.impacts {
            write!(f, "{impact}")?;
        }

        Ok(())
    }
}

/// Wrapper type for displaying a milestone's baseline version history.
pub struct VersionHistory<'a> {
    milestone: &'a Milestone,
    versions: &'a [BaselineVersion],
}

impl<'a> VersionHistory<'a> {
    /// Create a new VersionHistory wrapper.
    pub fn new(milestone: &'a Milestone, versions: &'a [BaselineVersion]) -> Self {
        Self {
            milestone,
            versions,
        }
    }
}

impl fmt::Display for VersionHistory<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# Baseline history for {} (ID: {})",
            self.milestone.name, self.milestone.id
        )?;
        writeln!(f)?;

        if self.versions.is_empty() {
            writeln!(f, "No baseline revisions recorded.")?;
            return Ok(());
        }

        for version in self.versions {
            write!(f, "{version}")?;
        }

        Ok(())
    }
}

/// Wrapper type for displaying the result of create operations.
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    /// Create a new CreateResult wrapper.
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Variation> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Created variation {} with ID: {}",
            self.resource.reference, self.resource.id
        )?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for CreateResult<Milestone> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created milestone with ID: {}", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

impl fmt::Display for CreateResult<MilestoneImpact> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Added milestone impact with ID: {}", self.resource.id)?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Wrapper type for displaying the result of delete operations.
pub struct DeleteResult {
    pub resource_id: u64,
    pub resource_type: &'static str,
    pub resource_title: Option<String>,
}

impl DeleteResult {
    /// Create a new DeleteResult wrapper.
    pub fn new(resource_id: u64, resource_type: &'static str) -> Self {
        Self {
            resource_id,
            resource_type,
            resource_title: None,
        }
    }

    /// Create a DeleteResult with the resource title for better context.
    pub fn with_title(resource_id: u64, resource_type: &'static str, title: String) -> Self {
        Self {
            resource_id,
            resource_type,
            resource_title: Some(title),
        }
    }
}

impl fmt::Display for DeleteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource_title {
            Some(title) => writeln!(
                f,
                "Deleted {} '{}' (ID: {})",
                self.resource_type, title, self.resource_id
            ),
            None => writeln!(
                f,
                "Deleted {} with ID: {}",
                self.resource_type, self.resource_id
            ),
        }
    }
}

/// Wrapper type for displaying operation confirmation messages.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    /// Create a new success status.
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
        }
    }

    /// Create a new failure status.
    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.success { "Success:" } else { "Error:" };
        writeln!(f, "{} {}", prefix, self.message)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::models::{VariationStatus, VariationType};

    fn test_summary() -> VariationSummary {
        VariationSummary {
            id: 1,
            project_id: 1,
            reference: "VAR-001".to_string(),
            title: "Test variation".to_string(),
            variation_type: VariationType::Combined,
            status: VariationStatus::Draft,
            total_cost_impact: None,
            total_days_impact: None,
            milestone_count: 0,
            created_at: Timestamp::from_second(1640995200).unwrap(),
            updated_at: Timestamp::from_second(1640995200).unwrap(),
        }
    }

    #[test]
    fn test_variation_list_empty() {
        let list = VariationList::new(&[]);
        assert!(format!("{list}").contains("No variations found."));
    }

    #[test]
    fn test_variation_list_with_title() {
        let summaries = vec![test_summary()];
        let list = VariationList::with_title(&summaries, "Project 1 Variations");
        let output = format!("{list}");
        assert!(output.contains("# Project 1 Variations"));
        assert!(output.contains("VAR-001"));
    }

    #[test]
    fn test_delete_result_with_title() {
        let result = DeleteResult::with_title(7, "variation", "Old change".to_string());
        assert_eq!(
            format!("{result}"),
            "Deleted variation 'Old change' (ID: 7)\n"
        );
    }

    #[test]
    fn test_operation_status() {
        let ok = OperationStatus::success("Applied".to_string());
        assert_eq!(format!("{ok}"), "Success: Applied\n");
        let err = OperationStatus::failure("Nope".to_string());
        assert_eq!(format!("{err}"), "Error: Nope\n");
    }
}
