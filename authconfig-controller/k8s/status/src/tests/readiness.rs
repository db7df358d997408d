use super::*;
use crate::Outcome;
use maplit::btreemap;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[tokio::test]
async fn ready_when_cache_has_keys() {
    let client = FakeClient::with_config(mk_config(None, false));
    let cache = FakeCache::with_keys(&test_key(), &[TEST_HOST]);
    let (reconciler, metrics) = mk_reconciler(&client, &cache, None);

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Done);
    assert!(client.stored_ready());
    assert_eq!(client.writes(), vec![AuthConfigStatus { ready: true }]);
    assert_eq!(metrics.reconciles("ready"), 1);
    assert_eq!(metrics.status_updates(true), 1);
}

#[tokio::test]
async fn not_ready_requeues_when_cache_is_empty() {
    let client = FakeClient::with_config(mk_config(None, false));
    let cache = FakeCache::empty();
    let (reconciler, metrics) = mk_reconciler(&client, &cache, None);

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Requeue(REQUEUE_AFTER));
    assert!(!client.stored_ready());
    assert_eq!(cache.lookups(), 1);
    // Already not ready, so nothing is written.
    assert!(client.writes().is_empty());
    assert_eq!(metrics.reconciles("not_ready"), 1);
}

/// A status without `ready` set reads as not ready.
#[tokio::test]
async fn missing_status_reads_as_not_ready() {
    let mut config = mk_config(None, false);
    config.status = None;
    let client = FakeClient::with_config(config);
    let cache = FakeCache::empty();
    let (reconciler, _) = mk_reconciler(&client, &cache, None);

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Requeue(REQUEUE_AFTER));
    assert!(client.writes().is_empty());
}

#[tokio::test]
async fn evicted_config_becomes_not_ready() {
    let client = FakeClient::with_config(mk_config(None, true));
    let cache = FakeCache::empty();
    let (reconciler, metrics) = mk_reconciler(&client, &cache, None);

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Requeue(REQUEUE_AFTER));
    assert!(!client.stored_ready());
    assert_eq!(client.writes(), vec![AuthConfigStatus { ready: false }]);
    assert_eq!(metrics.status_updates(false), 1);
}

/// Readiness only requires that something is indexed, not that every host is.
#[tokio::test]
async fn any_indexed_key_is_ready() {
    let mut config = mk_config(None, false);
    config.spec.hosts = vec![TEST_HOST.to_string(), "talker-api".to_string()];
    let client = FakeClient::with_config(config);
    let cache = FakeCache::with_keys(&test_key(), &["talker-api"]);
    let (reconciler, _) = mk_reconciler(&client, &cache, None);

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Done);
    assert!(client.stored_ready());
}

#[rstest]
#[case::no_selector(None)]
#[case::matching_selector(Some("authorino.kuadrant.io/managed-by=authorino"))]
#[case::matching_set_selector(Some("authorino.kuadrant.io/managed-by in (authorino,other)"))]
#[tokio::test]
async fn managed_config_is_ready(#[case] selector: Option<&str>) {
    let labels = btreemap! { MANAGED_BY.to_string() => "authorino".to_string() };
    let client = FakeClient::with_config(mk_config(Some(labels), false));
    let cache = FakeCache::with_keys(&test_key(), &[TEST_HOST]);
    let (reconciler, _) = mk_reconciler(&client, &cache, selector);

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Done);
    assert!(client.stored_ready());
}

#[rstest]
#[case::matching_selector(Some("authorino.kuadrant.io/managed-by=authorino"))]
#[case::no_selector(None)]
#[tokio::test]
async fn managed_config_requeues_until_indexed(#[case] selector: Option<&str>) {
    let labels = btreemap! { MANAGED_BY.to_string() => "authorino".to_string() };
    let client = FakeClient::with_config(mk_config(Some(labels), false));
    let cache = FakeCache::empty();
    let (reconciler, _) = mk_reconciler(&client, &cache, selector);

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Requeue(REQUEUE_AFTER));
    assert!(!client.stored_ready());
}

#[rstest]
#[case::was_not_ready(false)]
#[case::was_ready(true)]
#[tokio::test]
async fn unmatched_selector_forces_not_ready(#[case] was_ready: bool) {
    let labels = btreemap! { MANAGED_BY.to_string() => "other".to_string() };
    let client = FakeClient::with_config(mk_config(Some(labels), was_ready));
    let cache = FakeCache::with_keys(&test_key(), &[TEST_HOST]);
    let (reconciler, metrics) = mk_reconciler(
        &client,
        &cache,
        Some("authorino.kuadrant.io/managed-by=authorino"),
    );

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Done);
    assert!(!client.stored_ready());
    assert_eq!(cache.lookups(), 0, "cache must not be queried");
    let expected_writes = if was_ready {
        vec![AuthConfigStatus { ready: false }]
    } else {
        vec![]
    };
    assert_eq!(client.writes(), expected_writes);
    assert_eq!(metrics.reconciles("unmanaged"), 1);
}

#[tokio::test]
async fn unlabeled_config_is_unmanaged_with_selector() {
    let client = FakeClient::with_config(mk_config(None, true));
    let cache = FakeCache::with_keys(&test_key(), &[TEST_HOST]);
    let (reconciler, _) = mk_reconciler(
        &client,
        &cache,
        Some("authorino.kuadrant.io/managed-by=authorino"),
    );

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Done);
    assert!(!client.stored_ready());
}

#[tokio::test]
async fn missing_config_is_a_noop() {
    let client = Arc::new(FakeClient::default());
    let cache = FakeCache::with_keys(&test_key(), &[TEST_HOST]);
    let (reconciler, metrics) = mk_reconciler(&client, &cache, None);

    let outcome = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(outcome, Outcome::Done);
    assert!(client.stored().is_none());
    assert!(client.writes().is_empty());
    assert_eq!(cache.lookups(), 0);
    assert_eq!(metrics.reconciles("not_found"), 1);
}

#[tokio::test]
async fn other_config_is_not_found() {
    let client = FakeClient::with_config(mk_config(None, false));
    let cache = FakeCache::with_keys(&test_key(), &[TEST_HOST]);
    let (reconciler, _) = mk_reconciler(&client, &cache, None);

    let outcome = reconciler
        .reconcile(&ResourceId::new(TEST_NAMESPACE, "auth-config-2"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Done);
    assert!(client.writes().is_empty());
}

#[rstest]
#[case::indexed(&[TEST_HOST], Outcome::Done)]
#[case::not_indexed(&[], Outcome::Requeue(REQUEUE_AFTER))]
#[tokio::test]
async fn second_pass_writes_nothing(#[case] keys: &[&str], #[case] expected: Outcome) {
    let client = FakeClient::with_config(mk_config(None, false));
    let cache = FakeCache::with_keys(&test_key(), keys);
    let (reconciler, _) = mk_reconciler(&client, &cache, None);

    let first = reconciler.reconcile(&test_id()).await.unwrap();
    let ready = client.stored_ready();
    let writes = client.writes().len();

    let second = reconciler.reconcile(&test_id()).await.unwrap();

    assert_eq!(first, expected);
    assert_eq!(second, expected);
    assert_eq!(client.stored_ready(), ready);
    assert_eq!(client.writes().len(), writes);
}
