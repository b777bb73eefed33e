use baseline_core::EngineBuilder;
use tempfile::TempDir;

/// Helper function to create a test engine
pub async fn create_test_engine() -> (TempDir, baseline_core::Engine) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let engine = EngineBuilder::new()
        .with_database_path(&db_path)
        .build()
        .await
        .expect("Failed to create engine");
    (temp_dir, engine)
}
