use std::collections::HashSet;
use std::sync::OnceLock;

use metrics_util::debugging::{DebuggingRecorder, Snapshotter};
use quorum::cache::{CacheConfig, CacheHandler, CachePolicy, CachingKey};
use quorum::domain::types::ContentType;
use quorum::infra::telemetry;
use serial_test::serial;

static SNAPSHOTTER: OnceLock<Snapshotter> = OnceLock::new();

fn snapshotter() -> &'static Snapshotter {
    SNAPSHOTTER.get_or_init(|| {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        recorder
            .install()
            .expect("debug metrics recorder should install in this test process");
        telemetry::describe_metrics();
        snapshotter
    })
}

fn metric_names(snapshotter: &Snapshotter) -> HashSet<String> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect()
}

#[test]
#[serial]
fn cache_paths_emit_expected_metric_keys() {
    let snapshotter = snapshotter();
    let cache = CacheHandler::new(CacheConfig {
        max_entries: 1,
        ..Default::default()
    });
    let policy = CachePolicy::minutes(10, 2);
    let first = CachingKey::user_saved_items(ContentType::Comment, "alice");
    let second = CachingKey::user_saved_items(ContentType::Submission, "alice");

    assert!(cache.get::<u32>(&first).is_none());
    cache.set(first.clone(), 1_u32, policy);
    assert_eq!(cache.get::<u32>(&first), Some(1));
    cache.set(second.clone(), 2_u32, policy);
    assert_eq!(cache.invalidate_bucket(&CachingKey::user_bucket("alice")), 1);

    let names = metric_names(snapshotter);
    let expected = [
        "quorum_cache_hit_total",
        "quorum_cache_miss_total",
        "quorum_cache_evict_total",
        "quorum_cache_invalidate_total",
        "quorum_cache_entries",
    ];
    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}

#[test]
#[serial]
fn key_removal_is_counted_as_invalidation() {
    let snapshotter = snapshotter();
    let cache = CacheHandler::new(CacheConfig::default());
    let key = CachingKey::user_preferences("bob");

    cache.set(key.clone(), "prefs".to_string(), CachePolicy::minutes(5, 1));
    assert!(cache.remove(&key));
    assert!(!cache.remove(&key));

    let names = metric_names(snapshotter);
    assert!(names.contains("quorum_cache_invalidate_total"));
    assert!(names.contains("quorum_cache_entries"));
}
