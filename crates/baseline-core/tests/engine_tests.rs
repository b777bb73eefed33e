mod common;

use baseline_core::{
    Actor, AddImpact, CreateMilestone, CreateVariation, Engine, EngineError, Id, ProjectId,
    RejectVariation, SignVariation, SubmitVariation, UpdateImpact, Variation, VariationStatus,
};
use common::create_test_engine;

async fn seed_milestone(engine: &Engine) -> u64 {
    engine
        .create_milestone(&CreateMilestone {
            project_id: 1,
            name: "Phase one".to_string(),
            baseline_cost: 1000.0,
            baseline_start: Some("2026-01-01".to_string()),
            baseline_end: Some("2026-03-31".to_string()),
        })
        .await
        .expect("Failed to create milestone")
        .id
}

/// Drives a variation from creation through submission.
async fn seed_submitted(engine: &Engine, milestone_id: u64) -> Variation {
    let variation = engine
        .create_variation(
            &CreateVariation {
                project_id: 1,
                variation_type: "combined".to_string(),
                title: "End-to-end change".to_string(),
                description: Some("Cost and schedule adjustment".to_string()),
                ..Default::default()
            },
            &Actor::new("alice"),
        )
        .await
        .expect("Failed to create variation");

    let impact = engine
        .add_impact(&AddImpact {
            variation_id: variation.id,
            milestone_id,
            rationale: Some("Scope grew".to_string()),
        })
        .await
        .expect("Failed to add impact");
    engine
        .update_impact(&UpdateImpact {
            id: impact.id,
            new_cost: Some(1500.0),
            new_end: Some("2026-04-30".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to update impact");

    engine
        .submit_for_approval(&SubmitVariation {
            id: variation.id,
            impact_summary: "More budget and a month of slack".to_string(),
        })
        .await
        .expect("Failed to submit variation")
}

async fn sign(engine: &Engine, id: u64, party: &str, signer: &str) -> Variation {
    engine
        .sign_variation(
            &SignVariation {
                id,
                party: party.to_string(),
            },
            &Actor::new(signer),
        )
        .await
        .expect("Failed to sign variation")
}

#[tokio::test]
async fn test_full_approval_flow() {
    let (_temp_dir, engine) = create_test_engine().await;
    let milestone_id = seed_milestone(&engine).await;

    let submitted = seed_submitted(&engine, milestone_id).await;
    assert_eq!(submitted.status, VariationStatus::Submitted);
    assert_eq!(submitted.total_cost_impact, Some(500.0));
    assert_eq!(submitted.total_days_impact, Some(30));

    let half_signed = sign(&engine, submitted.id, "customer", "customer-1").await;
    assert_eq!(half_signed.status, VariationStatus::AwaitingSupplier);

    let applied = sign(&engine, submitted.id, "supplier", "supplier-1").await;
    assert_eq!(applied.status, VariationStatus::Applied);
    assert_eq!(
        applied.certificate_number.as_deref(),
        Some("CERT-001-VAR-001")
    );

    // The milestone now carries the new baseline and one version row.
    let milestone = engine
        .get_milestone(&Id { id: milestone_id })
        .await
        .expect("Query failed")
        .expect("Milestone should exist");
    assert_eq!(milestone.baseline_cost, 1500.0);

    let history = engine
        .baseline_history(&Id { id: milestone_id })
        .await
        .expect("Failed to read history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version, 1);
}

#[tokio::test]
async fn test_rejection_resets_and_resubmits() {
    let (_temp_dir, engine) = create_test_engine().await;
    let milestone_id = seed_milestone(&engine).await;
    let submitted = seed_submitted(&engine, milestone_id).await;

    sign(&engine, submitted.id, "supplier", "supplier-1").await;
    let rejected = engine
        .reject_variation(
            &RejectVariation {
                id: submitted.id,
                reason: "Schedule slip unacceptable".to_string(),
            },
            &Actor::new("customer-1"),
        )
        .await
        .expect("Failed to reject");
    assert_eq!(rejected.status, VariationStatus::Rejected);

    let reset = engine
        .reset_to_draft(&Id { id: submitted.id })
        .await
        .expect("Failed to reset");
    assert_eq!(reset.status, VariationStatus::Draft);
    assert!(reset.supplier_signature.is_none());
    assert_eq!(reset.impacts.len(), 1);

    // The impact ledger can be cleared to rebuild the proposal from scratch.
    let removed = engine
        .clear_impacts(&Id { id: submitted.id })
        .await
        .expect("Failed to clear impacts");
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn test_delete_variation_after_rejection() {
    let (_temp_dir, engine) = create_test_engine().await;
    let milestone_id = seed_milestone(&engine).await;
    let submitted = seed_submitted(&engine, milestone_id).await;

    engine
        .reject_variation(
            &RejectVariation {
                id: submitted.id,
                reason: "Not needed".to_string(),
            },
            &Actor::new("customer-1"),
        )
        .await
        .expect("Failed to reject");

    let deleted = engine
        .delete_variation(&Id { id: submitted.id })
        .await
        .expect("Failed to delete");
    assert_eq!(deleted.id, submitted.id);

    let gone = engine
        .get_with_details(&Id { id: submitted.id })
        .await
        .expect("Query failed");
    assert!(gone.is_none());
}

#[tokio::test]
async fn test_apply_requires_approval() {
    let (_temp_dir, engine) = create_test_engine().await;
    let milestone_id = seed_milestone(&engine).await;
    let submitted = seed_submitted(&engine, milestone_id).await;

    let result = engine.apply_variation(&Id { id: submitted.id }).await;
    assert!(matches!(result, Err(EngineError::InvalidState { .. })));
}

#[tokio::test]
async fn test_project_summary_after_flow() {
    let (_temp_dir, engine) = create_test_engine().await;
    let milestone_id = seed_milestone(&engine).await;
    let submitted = seed_submitted(&engine, milestone_id).await;

    sign(&engine, submitted.id, "supplier", "supplier-1").await;
    sign(&engine, submitted.id, "customer", "customer-1").await;

    let summary = engine
        .project_summary(&ProjectId { project_id: 1 })
        .await
        .expect("Failed to summarize");
    assert_eq!(summary.total, 1);
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.applied_cost_impact, 500.0);
    assert_eq!(summary.applied_days_impact, 30);

    let listing = engine
        .list_with_stats(&ProjectId { project_id: 1 })
        .await
        .expect("Failed to list");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].status, VariationStatus::Applied);
    assert_eq!(listing[0].milestone_count, 1);
}

#[tokio::test]
async fn test_update_impact_rejects_bad_date() {
    let (_temp_dir, engine) = create_test_engine().await;
    let milestone_id = seed_milestone(&engine).await;
    let variation = engine
        .create_variation(
            &CreateVariation {
                project_id: 1,
                variation_type: "time_extension".to_string(),
                title: "Bad date".to_string(),
                ..Default::default()
            },
            &Actor::new("alice"),
        )
        .await
        .expect("Failed to create variation");
    let impact = engine
        .add_impact(&AddImpact {
            variation_id: variation.id,
            milestone_id,
            rationale: None,
        })
        .await
        .expect("Failed to add impact");

    let result = engine
        .update_impact(&UpdateImpact {
            id: impact.id,
            new_end: Some("next tuesday".to_string()),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
}
