//! The collector as global logger: a full pipeline run ends up on disk.
//!
//! Only one logger can be installed per process, so this binary holds a
//! single test.

mod common;

use common::*;
use devbox_bootstrap::orchestrator::Pipeline;
use devbox_bootstrap::LogCollector;
use log::LevelFilter;
use tempfile::TempDir;
use tokio::sync::watch;

#[tokio::test]
async fn test_pipeline_run_is_persisted_to_session_log() {
    let tmp = TempDir::new().unwrap();
    let collector =
        LogCollector::new(tmp.path().join("logs"), LevelFilter::Debug, LevelFilter::Off).unwrap();
    collector.install().unwrap();

    let world = healthy_world();
    let mut ctx = context(test_config(&tmp), &world);
    let (_tx, rx) = watch::channel(false);
    Pipeline::standard(rx).run(&mut ctx).await.unwrap();

    collector.wait_for_empty().await.unwrap();
    let content = std::fs::read_to_string(collector.session_log_path()).unwrap();

    assert!(content.contains("[Pipeline] [1/10] prerequisites"));
    assert!(content.contains("[Pipeline] [10/10] cloud_config"));
    assert!(content.contains("[Installer] ✓ bosh installed"));
    assert!(content.contains("[Credentials] Profile written to"));
    assert!(content.contains("[Repository] Cloned"));
    assert!(content.contains(FAKE_HEAD));

    let first = content.find("[1/10]").unwrap();
    let last = content.find("[10/10]").unwrap();
    assert!(first < last);
}
