use baseline_core::{
    Actor, AddImpact, CreateMilestone, CreateVariation, Database, EngineError, Milestone,
    RejectVariation, SaveFormProgress, SignVariation, SubmitVariation, UpdateImpactRequest,
    Variation, VariationStatus,
};
use tempfile::NamedTempFile;

/// Helper function to create a temporary database for testing
fn create_test_db() -> (NamedTempFile, Database) {
    let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
    let db = Database::new(temp_file.path()).expect("Failed to create test database");
    (temp_file, db)
}

fn create_milestone(db: &mut Database, name: &str, cost: f64) -> Milestone {
    db.create_milestone(&CreateMilestone {
        project_id: 1,
        name: name.to_string(),
        baseline_cost: cost,
        baseline_start: Some("2026-01-01".to_string()),
        baseline_end: Some("2026-03-31".to_string()),
    })
    .expect("Failed to create milestone")
}

fn create_variation(db: &mut Database, title: &str) -> Variation {
    db.create_variation(
        &CreateVariation {
            project_id: 1,
            variation_type: "combined".to_string(),
            title: title.to_string(),
            ..Default::default()
        },
        &Actor::new("alice"),
    )
    .expect("Failed to create variation")
}

/// Creates a variation with one impact raising the milestone's cost by 500
/// and pushing its end date out by 30 days, then submits it.
fn submitted_variation(db: &mut Database, milestone_id: u64) -> Variation {
    let variation = create_variation(db, "Change");
    let impact = db
        .add_impact(&AddImpact {
            variation_id: variation.id,
            milestone_id,
            rationale: None,
        })
        .expect("Failed to add impact");
    db.update_impact(
        impact.id,
        &UpdateImpactRequest {
            new_cost: Some(impact.new_cost + 500.0),
            new_end: Some("2026-04-30".parse().unwrap()),
            ..Default::default()
        },
    )
    .expect("Failed to update impact");
    db.submit_for_approval(&SubmitVariation {
        id: variation.id,
        impact_summary: "More budget and time".to_string(),
    })
    .expect("Failed to submit variation")
}

fn sign(db: &mut Database, id: u64, party: &str, signer: &str) -> Variation {
    db.sign_variation(
        &SignVariation {
            id,
            party: party.to_string(),
        },
        &Actor::new(signer),
    )
    .expect("Failed to sign variation")
}

#[test]
fn test_database_initialization() {
    let (temp_file, _db) = create_test_db();
    assert!(temp_file.path().exists());
}

#[test]
fn test_create_variation_starts_as_draft() {
    let (_temp_file, mut db) = create_test_db();

    let variation = create_variation(&mut db, "First change");

    assert_eq!(variation.reference, "VAR-001");
    assert_eq!(variation.status, VariationStatus::Draft);
    assert_eq!(variation.form_step, 1);
    assert_eq!(variation.created_by, "alice");
    assert!(variation.impacts.is_empty());
}

#[test]
fn test_references_survive_deletion_without_reuse() {
    let (_temp_file, mut db) = create_test_db();

    let first = create_variation(&mut db, "First");
    let second = create_variation(&mut db, "Second");
    assert_eq!(second.reference, "VAR-002");

    db.delete_variation(first.id).expect("Failed to delete");
    db.delete_variation(second.id).expect("Failed to delete");

    // The counter keeps climbing even though the table is empty again.
    let third = create_variation(&mut db, "Third");
    assert_eq!(third.reference, "VAR-003");
}

#[test]
fn test_save_form_progress_draft_only() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);

    let draft = create_variation(&mut db, "Draft");
    let updated = db
        .save_form_progress(&SaveFormProgress {
            id: draft.id,
            form_data: serde_json::json!({"step2": {"title": "Draft"}}),
            form_step: 2,
        })
        .expect("Failed to save form progress");
    assert_eq!(updated.form_step, 2);
    assert!(updated.form_data.is_some());

    let submitted = submitted_variation(&mut db, milestone.id);
    let result = db.save_form_progress(&SaveFormProgress {
        id: submitted.id,
        form_data: serde_json::json!({}),
        form_step: 3,
    });
    assert!(matches!(result, Err(EngineError::InvalidState { .. })));
}

#[test]
fn test_submit_requires_impacts() {
    let (_temp_file, mut db) = create_test_db();
    let variation = create_variation(&mut db, "Empty");

    let result = db.submit_for_approval(&SubmitVariation {
        id: variation.id,
        impact_summary: "Nothing to see".to_string(),
    });
    assert!(matches!(result, Err(EngineError::InvalidInput { .. })));

    // The failed submit left the draft untouched.
    let unchanged = db
        .get_variation(variation.id)
        .expect("Query failed")
        .expect("Variation should exist");
    assert_eq!(unchanged.status, VariationStatus::Draft);
}

#[test]
fn test_submit_freezes_totals() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);

    let submitted = submitted_variation(&mut db, milestone.id);

    assert_eq!(submitted.status, VariationStatus::Submitted);
    assert_eq!(submitted.total_cost_impact, Some(500.0));
    assert_eq!(submitted.total_days_impact, Some(30));
    assert_eq!(
        submitted.impact_summary,
        Some("More budget and time".to_string())
    );
}

#[test]
fn test_single_signature_awaits_other_party() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = submitted_variation(&mut db, milestone.id);

    let signed = sign(&mut db, variation.id, "supplier", "supplier-1");
    assert_eq!(signed.status, VariationStatus::AwaitingCustomer);
    assert!(signed.supplier_signature.is_some());
    assert!(signed.customer_signature.is_none());
}

#[test]
fn test_dual_signature_applies_either_order() {
    for order in [["supplier", "customer"], ["customer", "supplier"]] {
        let (_temp_file, mut db) = create_test_db();
        let milestone = create_milestone(&mut db, "Phase one", 1000.0);
        let variation = submitted_variation(&mut db, milestone.id);

        sign(&mut db, variation.id, order[0], "first-signer");
        let applied = sign(&mut db, variation.id, order[1], "second-signer");

        assert_eq!(applied.status, VariationStatus::Applied);
        assert!(applied.supplier_signature.is_some());
        assert!(applied.customer_signature.is_some());
        assert!(applied.applied_at.is_some());
        assert!(applied.certificate_number.is_some());
    }
}

#[test]
fn test_repeat_signature_refreshes_without_advancing() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = submitted_variation(&mut db, milestone.id);

    sign(&mut db, variation.id, "supplier", "supplier-1");
    let re_signed = sign(&mut db, variation.id, "supplier", "supplier-2");

    assert_eq!(re_signed.status, VariationStatus::AwaitingCustomer);
    let stamp = re_signed.supplier_signature.expect("Signature should exist");
    assert_eq!(stamp.signer_id, "supplier-2");
}

#[test]
fn test_apply_rewrites_baseline_and_versions() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = submitted_variation(&mut db, milestone.id);

    sign(&mut db, variation.id, "supplier", "supplier-1");
    let applied = sign(&mut db, variation.id, "customer", "customer-1");

    // Milestone baseline, forecast, and billable all follow the new values.
    let rewritten = db
        .get_milestone(milestone.id)
        .expect("Query failed")
        .expect("Milestone should exist");
    assert_eq!(rewritten.baseline_cost, 1500.0);
    assert_eq!(rewritten.forecast_cost, 1500.0);
    assert_eq!(rewritten.billable_amount, 1500.0);
    assert_eq!(rewritten.baseline_end, Some("2026-04-30".parse().unwrap()));

    // One version row, carrying both signature copies.
    let history = db
        .baseline_history(milestone.id)
        .expect("Failed to read history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version, 1);
    assert_eq!(history[0].baseline_cost, 1500.0);
    assert_eq!(history[0].variation_id, variation.id);
    assert!(history[0].supplier_signature.is_some());
    assert!(history[0].customer_signature.is_some());

    // The impact row is stamped with the version transition.
    assert_eq!(applied.impacts[0].version_before, Some(1));
    assert_eq!(applied.impacts[0].version_after, Some(1));
}

#[test]
fn test_versions_grow_monotonically_across_variations() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);

    for _ in 0..2 {
        let variation = submitted_variation(&mut db, milestone.id);
        sign(&mut db, variation.id, "supplier", "supplier-1");
        sign(&mut db, variation.id, "customer", "customer-1");
    }

    let history = db
        .baseline_history(milestone.id)
        .expect("Failed to read history");
    let versions: Vec<u32> = history.iter().map(|v| v.version).collect();
    assert_eq!(versions, vec![1, 2]);

    // The second variation started from the first one's applied baseline.
    assert_eq!(history[1].baseline_cost, 2000.0);
}

#[test]
fn test_certificate_snapshot_is_frozen() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = submitted_variation(&mut db, milestone.id);

    sign(&mut db, variation.id, "supplier", "supplier-1");
    let applied = sign(&mut db, variation.id, "customer", "customer-1");

    assert_eq!(
        applied.certificate_number.as_deref(),
        Some("CERT-001-VAR-001")
    );
    let data = applied.certificate_data.expect("Certificate should exist");
    assert_eq!(data["reference"], "VAR-001");
    assert_eq!(data["total_cost_impact"], 500.0);
    assert_eq!(data["milestones"][0]["name"], "Phase one");
    assert_eq!(data["milestones"][0]["new_cost"], 1500.0);
    assert_eq!(data["supplier_signature"]["signer_id"], "supplier-1");
    assert_eq!(data["customer_signature"]["signer_id"], "customer-1");
}

#[test]
fn test_apply_is_not_repeatable() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = submitted_variation(&mut db, milestone.id);

    sign(&mut db, variation.id, "supplier", "supplier-1");
    sign(&mut db, variation.id, "customer", "customer-1");

    let result = db.apply_variation(variation.id);
    assert!(matches!(result, Err(EngineError::InvalidState { .. })));

    // Still exactly one version row.
    let history = db
        .baseline_history(milestone.id)
        .expect("Failed to read history");
    assert_eq!(history.len(), 1);
}

#[test]
fn test_sign_illegal_states() {
    let (_temp_file, mut db) = create_test_db();
    let draft = create_variation(&mut db, "Draft");

    let result = db.sign_variation(
        &SignVariation {
            id: draft.id,
            party: "supplier".to_string(),
        },
        &Actor::new("supplier-1"),
    );
    assert!(matches!(result, Err(EngineError::InvalidState { .. })));
}

#[test]
fn test_reject_and_reset_round_trip() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = submitted_variation(&mut db, milestone.id);
    sign(&mut db, variation.id, "supplier", "supplier-1");

    let rejected = db
        .reject_variation(
            &RejectVariation {
                id: variation.id,
                reason: "Too expensive".to_string(),
            },
            &Actor::new("customer-1"),
        )
        .expect("Failed to reject");
    assert_eq!(rejected.status, VariationStatus::Rejected);
    let rejection = rejected.rejection.expect("Rejection should be recorded");
    assert_eq!(rejection.rejected_by, "customer-1");
    assert_eq!(rejection.reason, "Too expensive");
    // The rejection stands but the supplier signature is kept on record
    // until a reset.
    assert!(rejected.supplier_signature.is_some());

    let reset = db.reset_to_draft(variation.id).expect("Failed to reset");
    assert_eq!(reset.status, VariationStatus::Draft);
    assert_eq!(reset.form_step, 1);
    assert!(reset.supplier_signature.is_none());
    assert!(reset.rejection.is_none());
    // Impact rows survive the reset for reworking.
    assert_eq!(reset.impacts.len(), 1);
}

#[test]
fn test_reject_applied_fails() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = submitted_variation(&mut db, milestone.id);
    sign(&mut db, variation.id, "supplier", "supplier-1");
    sign(&mut db, variation.id, "customer", "customer-1");

    let result = db.reject_variation(
        &RejectVariation {
            id: variation.id,
            reason: "Changed my mind".to_string(),
        },
        &Actor::new("customer-1"),
    );
    assert!(matches!(result, Err(EngineError::InvalidState { .. })));
}

#[test]
fn test_delete_rules() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);

    // A part-signed variation is not deletable.
    let signed = submitted_variation(&mut db, milestone.id);
    sign(&mut db, signed.id, "supplier", "supplier-1");
    assert!(matches!(
        db.delete_variation(signed.id),
        Err(EngineError::InvalidState { .. })
    ));

    // A draft is, and its impact rows go with it.
    let draft = create_variation(&mut db, "Doomed");
    let impact = db
        .add_impact(&AddImpact {
            variation_id: draft.id,
            milestone_id: milestone.id,
            rationale: None,
        })
        .expect("Failed to add impact");
    db.delete_variation(draft.id).expect("Failed to delete");
    assert!(db.get_variation(draft.id).expect("Query failed").is_none());
    assert!(db.get_impact(impact.id).expect("Query failed").is_none());
}

#[test]
fn test_impact_editing_frozen_after_signature() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let other = create_milestone(&mut db, "Phase two", 2000.0);
    let variation = submitted_variation(&mut db, milestone.id);
    sign(&mut db, variation.id, "supplier", "supplier-1");

    let add = db.add_impact(&AddImpact {
        variation_id: variation.id,
        milestone_id: other.id,
        rationale: None,
    });
    assert!(matches!(add, Err(EngineError::InvalidState { .. })));

    let impact_id = variation.impacts[0].id;
    let update = db.update_impact(
        impact_id,
        &UpdateImpactRequest {
            new_cost: Some(9999.0),
            ..Default::default()
        },
    );
    assert!(matches!(update, Err(EngineError::InvalidState { .. })));

    let remove = db.remove_impact(impact_id);
    assert!(matches!(remove, Err(EngineError::InvalidState { .. })));
}

#[test]
fn test_add_impact_copies_current_baseline() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = create_variation(&mut db, "Change");

    let impact = db
        .add_impact(&AddImpact {
            variation_id: variation.id,
            milestone_id: milestone.id,
            rationale: Some("Scope grew".to_string()),
        })
        .expect("Failed to add impact");

    assert_eq!(impact.original_cost, 1000.0);
    assert_eq!(impact.new_cost, 1000.0);
    assert_eq!(impact.original_end, Some("2026-03-31".parse().unwrap()));
    assert_eq!(impact.cost_delta(), 0.0);
}

#[test]
fn test_add_impact_rejects_duplicates_and_foreign_milestones() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = create_variation(&mut db, "Change");

    db.add_impact(&AddImpact {
        variation_id: variation.id,
        milestone_id: milestone.id,
        rationale: None,
    })
    .expect("Failed to add impact");

    let duplicate = db.add_impact(&AddImpact {
        variation_id: variation.id,
        milestone_id: milestone.id,
        rationale: None,
    });
    assert!(matches!(duplicate, Err(EngineError::InvalidInput { .. })));

    let foreign = db
        .create_milestone(&CreateMilestone {
            project_id: 2,
            name: "Other project".to_string(),
            baseline_cost: 100.0,
            baseline_start: None,
            baseline_end: None,
        })
        .expect("Failed to create milestone");
    let cross_project = db.add_impact(&AddImpact {
        variation_id: variation.id,
        milestone_id: foreign.id,
        rationale: None,
    });
    assert!(matches!(cross_project, Err(EngineError::InvalidInput { .. })));
}

#[test]
fn test_clear_impacts() {
    let (_temp_file, mut db) = create_test_db();
    let first = create_milestone(&mut db, "Phase one", 1000.0);
    let second = create_milestone(&mut db, "Phase two", 2000.0);
    let variation = create_variation(&mut db, "Change");

    for milestone_id in [first.id, second.id] {
        db.add_impact(&AddImpact {
            variation_id: variation.id,
            milestone_id,
            rationale: None,
        })
        .expect("Failed to add impact");
    }

    let removed = db.clear_impacts(variation.id).expect("Failed to clear");
    assert_eq!(removed, 2);
    let variation = db
        .get_variation(variation.id)
        .expect("Query failed")
        .expect("Variation should exist");
    assert!(variation.impacts.is_empty());
}

#[test]
fn test_update_impact_rejects_inverted_dates() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = create_variation(&mut db, "Change");
    let impact = db
        .add_impact(&AddImpact {
            variation_id: variation.id,
            milestone_id: milestone.id,
            rationale: None,
        })
        .expect("Failed to add impact");

    let result = db.update_impact(
        impact.id,
        &UpdateImpactRequest {
            new_end: Some("2025-12-01".parse().unwrap()),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
}

#[test]
fn test_variation_not_found() {
    let (_temp_file, mut db) = create_test_db();
    let result = db.submit_for_approval(&SubmitVariation {
        id: 404,
        impact_summary: "Ghost".to_string(),
    });
    assert!(matches!(
        result,
        Err(EngineError::VariationNotFound { id: 404 })
    ));
}

#[test]
fn test_list_variations_newest_first() {
    let (_temp_file, mut db) = create_test_db();
    create_variation(&mut db, "First");
    create_variation(&mut db, "Second");

    let listed = db.list_variations(1).expect("Failed to list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].reference, "VAR-002");
    assert_eq!(listed[1].reference, "VAR-001");
}

#[test]
fn test_project_summary_buckets() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);

    create_variation(&mut db, "Still a draft");

    let in_approval = submitted_variation(&mut db, milestone.id);
    sign(&mut db, in_approval.id, "supplier", "supplier-1");

    let applied = submitted_variation(&mut db, milestone.id);
    sign(&mut db, applied.id, "supplier", "supplier-1");
    sign(&mut db, applied.id, "customer", "customer-1");

    let rejected = create_variation(&mut db, "Rejected one");
    db.reject_variation(
        &RejectVariation {
            id: rejected.id,
            reason: "No".to_string(),
        },
        &Actor::new("customer-1"),
    )
    .expect("Failed to reject");

    let summary = db.project_summary(1).expect("Failed to summarize");
    assert_eq!(summary.total, 4);
    assert_eq!(summary.draft, 1);
    assert_eq!(summary.in_approval, 1);
    assert_eq!(summary.approved, 0);
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.applied_cost_impact, 500.0);
    assert_eq!(summary.applied_days_impact, 30);
}

#[test]
fn test_record_deliverable_adjustment_cascades_on_delete() {
    let (_temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = create_variation(&mut db, "With deliverables");

    db.record_deliverable_adjustment(variation.id, milestone.id, 9, Some("shifted"))
        .expect("Failed to record adjustment");
    db.delete_variation(variation.id)
        .expect("Failed to delete variation");
}

#[test]
fn test_remove_impact_cascades_deliverable_adjustments() {
    let (temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = create_variation(&mut db, "With deliverables");
    let impact = db
        .add_impact(&AddImpact {
            variation_id: variation.id,
            milestone_id: milestone.id,
            rationale: None,
        })
        .expect("Failed to add impact");

    db.record_deliverable_adjustment(variation.id, milestone.id, 9, Some("shifted"))
        .expect("Failed to record adjustment");
    db.remove_impact(impact.id).expect("Failed to remove impact");

    let raw =
        rusqlite::Connection::open(temp_file.path()).expect("Failed to open raw connection");
    let remaining: i64 = raw
        .query_row(
            "SELECT COUNT(*) FROM deliverable_adjustments WHERE variation_id = ?1",
            rusqlite::params![variation.id as i64],
            |row| row.get(0),
        )
        .expect("Failed to count adjustments");
    assert_eq!(remaining, 0);
}

#[test]
fn test_second_signature_stands_when_apply_fails() {
    let (temp_file, mut db) = create_test_db();
    let milestone = create_milestone(&mut db, "Phase one", 1000.0);
    let variation = submitted_variation(&mut db, milestone.id);
    sign(&mut db, variation.id, "supplier", "supplier-1");

    // Pull the milestone out from under the variation through a raw
    // connection with foreign keys switched off (the bundled SQLite is
    // compiled with SQLITE_DEFAULT_FOREIGN_KEYS=1, so the default is on).
    let raw =
        rusqlite::Connection::open(temp_file.path()).expect("Failed to open raw connection");
    raw.pragma_update(None, "foreign_keys", false)
        .expect("Failed to disable foreign keys");
    raw.execute(
        "DELETE FROM milestones WHERE id = ?1",
        rusqlite::params![milestone.id as i64],
    )
    .expect("Failed to delete milestone");

    // The second signature lands and is kept even though the apply fails.
    let signed = sign(&mut db, variation.id, "customer", "customer-1");
    assert_eq!(signed.status, VariationStatus::Approved);
    assert!(signed.supplier_signature.is_some());
    assert!(signed.customer_signature.is_some());
    assert!(signed.certificate_number.is_none());

    raw.execute(
        "INSERT INTO milestones (id, project_id, name, baseline_cost, baseline_start, \
         baseline_end, forecast_cost, forecast_end, billable_amount, created_at, updated_at) \
         VALUES (?1, 1, 'Phase one', 1000.0, '2026-01-01', '2026-03-31', 1000.0, \
         '2026-03-31', 1000.0, ?2, ?2)",
        rusqlite::params![milestone.id as i64, "2026-01-01T00:00:00Z"],
    )
    .expect("Failed to restore milestone");

    let applied = db
        .apply_variation(variation.id)
        .expect("Failed to apply variation");
    assert_eq!(applied.status, VariationStatus::Applied);
    assert_eq!(
        applied.certificate_number.as_deref(),
        Some("CERT-001-VAR-001")
    );
}
