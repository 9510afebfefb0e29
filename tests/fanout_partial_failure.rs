// tests/fanout_partial_failure.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use content_hub::error::{RecordError, SourceError};
use content_hub::ownership::OwnerHints;
use content_hub::source::{SourceAdapter, StoreAdapter};
use content_hub::store::MemoryStore;
use content_hub::{
    Aggregator, DeleteOutcome, EmptyState, Identity, NormalizedRecord, OwnershipResolver,
    RawRecord, SourceKey,
};
use serde_json::json;

fn u1() -> Identity {
    Identity::new("u1", Some("u1@example.com"))
}

fn adapter(key: SourceKey, store: MemoryStore) -> Arc<dyn SourceAdapter> {
    Arc::new(StoreAdapter::new(key, Arc::new(store)))
}

fn aggregator(sources: Vec<Arc<dyn SourceAdapter>>) -> Aggregator {
    Aggregator::new(sources, OwnershipResolver::default())
}

#[tokio::test]
async fn one_failing_source_out_of_three_degrades_but_keeps_the_rest() {
    let a = MemoryStore::from_json(vec![
        json!({"id": "a1", "title": "Room", "userId": "u1", "createdAt": "2024-01-01T00:00:00Z"}),
    ]);
    let b = MemoryStore::from_json(vec![
        json!({"id": "b1", "title": "Not mine", "userId": "u2", "createdAt": "2024-02-01T00:00:00Z"}),
    ]);
    let c = MemoryStore::from_json(vec![]).failing("connection reset");

    let agg = aggregator(vec![
        adapter(SourceKey::Rent, a),
        adapter(SourceKey::Jobs, b),
        adapter(SourceKey::News, c),
    ])
    .load_aggregate(&u1())
    .await;

    let records = agg.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "a1");
    assert_eq!(records[0].source_key, SourceKey::Rent);
    assert_eq!(
        records[0].created_at,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );

    assert!(agg.is_degraded());
    assert_eq!(agg.degraded_sources().len(), 1);
    assert_eq!(agg.degraded_sources()[0].key, SourceKey::News);
    assert_eq!(agg.empty_state(), EmptyState::HasContent);
}

#[tokio::test]
async fn valid_records_from_healthy_sources_all_survive() {
    let jobs = MemoryStore::from_json(vec![
        json!({"id": 1, "title": "Cook", "userId": "u1", "createdAt": 1_704_067_200_000i64}),
        json!({"id": 2, "title": "Waiter", "user_id": "u1", "createdAt": 1_704_153_600_000i64}),
    ]);
    let forum = MemoryStore::from_json(vec![
        json!({"id": "p1", "title": "Hello", "userEmail": "u1@example.com", "createdAt": "2024-01-03T00:00:00Z"}),
    ]);
    let broken = MemoryStore::from_json(vec![]).failing("quota exceeded");

    let agg = aggregator(vec![
        adapter(SourceKey::Jobs, jobs),
        adapter(SourceKey::Forum, forum),
        adapter(SourceKey::Cv, broken),
    ])
    .load_aggregate(&u1())
    .await;

    let ids: Vec<_> = agg.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "2", "1"]);
    assert!(agg.is_degraded());
}

#[tokio::test]
async fn no_matching_records_is_empty_not_error() {
    let jobs = MemoryStore::from_json(vec![json!({"id": 1, "userId": "someone-else"})]);
    let rent = MemoryStore::from_json(vec![]);

    let agg = aggregator(vec![adapter(SourceKey::Jobs, jobs), adapter(SourceKey::Rent, rent)])
        .load_aggregate(&u1())
        .await;

    assert!(agg.is_empty());
    assert!(!agg.is_degraded());
    assert_eq!(agg.empty_state(), EmptyState::NoContent);
}

#[tokio::test]
async fn zero_sources_is_empty_and_not_degraded() {
    let agg = aggregator(vec![]).load_aggregate(&u1()).await;
    assert!(agg.is_empty());
    assert!(!agg.is_degraded());
    assert_eq!(agg.empty_state(), EmptyState::NoContent);
}

#[tokio::test]
async fn all_sources_failing_is_flagged_unavailable() {
    let agg = aggregator(vec![
        adapter(SourceKey::Jobs, MemoryStore::new(vec![]).failing("down")),
        Arc::new(StoreAdapter::unconfigured(SourceKey::News)),
    ])
    .load_aggregate(&u1())
    .await;

    assert!(agg.is_empty());
    assert!(agg.all_sources_failed());
    assert_eq!(agg.empty_state(), EmptyState::Unavailable);
    let reasons: Vec<_> = agg
        .degraded_sources()
        .iter()
        .map(|d| d.reason.as_str())
        .collect();
    assert!(reasons.iter().any(|r| r.contains("no backing store")));
}

#[tokio::test]
async fn ownerless_records_never_appear() {
    let forum = MemoryStore::from_json(vec![
        // Older forum posts were stored without any owner field.
        json!({"id": 1, "title": "legacy", "createdAt": "2023-05-01T00:00:00Z"}),
        json!({"id": 2, "title": "mine", "ownerId": "u1"}),
    ]);
    let agg = aggregator(vec![adapter(SourceKey::Forum, forum)])
        .load_aggregate(&u1())
        .await;
    let ids: Vec<_> = agg.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec!["2".to_string()]);
}

#[tokio::test]
async fn ordering_is_identical_across_reloads() {
    let same_ts = "2024-03-01T12:00:00Z";
    let build = || {
        aggregator(vec![
            adapter(
                SourceKey::News,
                MemoryStore::from_json(vec![
                    json!({"id": "z", "userId": "u1", "createdAt": same_ts}),
                    json!({"id": "a", "userId": "u1", "createdAt": same_ts}),
                ]),
            ),
            adapter(
                SourceKey::Jobs,
                MemoryStore::from_json(vec![
                    json!({"id": "m", "userId": "u1", "createdAt": same_ts}),
                    json!({"id": "old", "userId": "u1"}),
                ]),
            ),
        ])
    };
    let agg = build();
    let first: Vec<_> = agg.load_aggregate(&u1()).await.records();
    let second: Vec<_> = agg.load_aggregate(&u1()).await.records();
    assert_eq!(first, second);

    let order: Vec<_> = first.iter().map(|r| (r.source_key, r.id.as_str())).collect();
    assert_eq!(
        order,
        vec![
            (SourceKey::Jobs, "m"),
            (SourceKey::News, "a"),
            (SourceKey::News, "z"),
            // no createdAt: epoch zero, so last
            (SourceKey::Jobs, "old"),
        ]
    );
}

#[tokio::test]
async fn duplicate_ids_within_a_source_keep_the_first() {
    let jobs = MemoryStore::from_json(vec![
        json!({"id": 7, "title": "first", "userId": "u1"}),
        json!({"id": "7", "title": "second", "userId": "u1"}),
    ]);
    let agg = aggregator(vec![adapter(SourceKey::Jobs, jobs)])
        .load_aggregate(&u1())
        .await;
    assert_eq!(agg.len(), 1);
    assert_eq!(agg.records()[0].title, "first");
}

struct SlowSource;

#[async_trait]
impl SourceAdapter for SlowSource {
    fn key(&self) -> SourceKey {
        SourceKey::Cv
    }

    fn label(&self) -> &str {
        "CVs"
    }

    async fn fetch_all(&self, _identity: &Identity) -> Result<Vec<RawRecord>, SourceError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![])
    }

    async fn delete_one(
        &self,
        _id: &str,
        _identity: &Identity,
    ) -> Result<DeleteOutcome, SourceError> {
        Ok(DeleteOutcome::NotFound)
    }

    fn normalize(
        &self,
        _raw: &RawRecord,
        _owner: OwnerHints,
    ) -> Result<NormalizedRecord, RecordError> {
        Err(RecordError::MissingId)
    }
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_without_blocking_others() {
    let jobs = MemoryStore::from_json(vec![json!({"id": 1, "userId": "u1"})]);
    let agg = aggregator(vec![adapter(SourceKey::Jobs, jobs), Arc::new(SlowSource)])
        .with_fetch_timeout(Duration::from_millis(200))
        .load_aggregate(&u1())
        .await;

    assert_eq!(agg.len(), 1);
    assert_eq!(agg.degraded_sources().len(), 1);
    assert_eq!(agg.degraded_sources()[0].key, SourceKey::Cv);
    assert!(agg.degraded_sources()[0].reason.contains("timed out"));
}
