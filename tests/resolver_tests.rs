//! Lookup orchestration tests with an in-process fetcher

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use common::{MockFetcher, provider};
use geolookup::config::LoadBalanceStrategy;
use geolookup::errors::{GeoLookupError, ProviderErrorKind};
use geolookup::services::geoip::{GeoResolver, Provider, ProviderRegistry, ResolverSettings};

fn settings() -> ResolverSettings {
    ResolverSettings {
        retry_backoff: Duration::from_millis(1),
        ..ResolverSettings::default()
    }
}

fn resolver(
    providers: Vec<Provider>,
    settings: ResolverSettings,
    fetcher: Arc<MockFetcher>,
) -> GeoResolver {
    GeoResolver::new(ProviderRegistry::from_providers(providers), settings, fetcher)
}

fn body(country: &str) -> Value {
    json!({"country": country, "region": "CA", "city": ""})
}

#[tokio::test]
async fn test_warm_cache_skips_providers() {
    let fetcher = MockFetcher::new();
    fetcher.succeed("a", body("US"));
    let r = resolver(vec![provider("a", 10)], settings(), fetcher.clone());

    let first = r.resolve("8.8.8.8").await.unwrap();
    let second = r.resolve("8.8.8.8").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fetcher.calls(), vec!["a"]);
    assert_eq!(r.list_provider_status()[0].current_requests, 1);
}

#[tokio::test]
async fn test_expired_cache_triggers_fresh_call() {
    let fetcher = MockFetcher::new();
    fetcher.succeed("a", body("US"));
    let r = resolver(
        vec![provider("a", 10)],
        ResolverSettings {
            cache_ttl: Duration::from_millis(30),
            ..settings()
        },
        fetcher.clone(),
    );

    r.resolve("8.8.8.8").await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    r.resolve("8.8.8.8").await.unwrap();

    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(r.cache_snapshot().size, 1);
}

#[tokio::test]
async fn test_round_robin_rotates_across_lookups() {
    let fetcher = MockFetcher::new();
    for name in ["a", "b", "c"] {
        fetcher.succeed(name, body("JP"));
    }
    let r = resolver(
        vec![provider("a", 10), provider("b", 10), provider("c", 10)],
        settings(),
        fetcher.clone(),
    );

    for i in 1..=6 {
        let result = r.resolve(&format!("10.0.0.{}", i)).await.unwrap();
        assert_eq!(result.data["ip"], json!(format!("10.0.0.{}", i)));
    }
    assert_eq!(fetcher.calls(), vec!["a", "b", "c", "a", "b", "c"]);
}

#[tokio::test]
async fn test_exhausted_provider_is_skipped() {
    let fetcher = MockFetcher::new();
    fetcher.succeed("a", body("US"));
    fetcher.succeed("b", body("DE"));
    let r = resolver(
        vec![provider("a", 1), provider("b", 10)],
        settings(),
        fetcher.clone(),
    );

    assert_eq!(r.resolve("1.1.1.1").await.unwrap().source, "a");
    assert_eq!(r.resolve("1.1.1.2").await.unwrap().source, "b");
    assert_eq!(r.resolve("1.1.1.3").await.unwrap().source, "b");

    let status = r.list_provider_status();
    assert!(!status[0].available);
    assert_eq!(status[0].current_requests, 1);
    assert_eq!(status[1].current_requests, 2);
}

#[tokio::test]
async fn test_all_attempts_failed_writes_no_cache() {
    let fetcher = MockFetcher::new();
    fetcher.fail("a", ProviderErrorKind::Status(503));
    fetcher.fail("b", ProviderErrorKind::Timeout);
    let r = resolver(
        vec![provider("a", 100), provider("b", 100)],
        settings(),
        fetcher.clone(),
    );

    let err = r.resolve("9.9.9.9").await.unwrap_err();
    match err {
        GeoLookupError::AllAttemptsFailed(last) => {
            assert!(last.provider == "a" || last.provider == "b");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // 默认 2 次重试，共 3 轮，每轮两个 provider
    assert_eq!(fetcher.calls().len(), 6);
    assert_eq!(r.cache_snapshot().size, 0);
}

#[tokio::test]
async fn test_failover_within_round() {
    let fetcher = MockFetcher::new();
    fetcher.fail("bad", ProviderErrorKind::Network("connection reset".to_string()));
    fetcher.succeed("good", body("FR"));
    let r = resolver(
        vec![provider("bad", 10), provider("good", 10)],
        settings(),
        fetcher.clone(),
    );

    let result = r.resolve("5.5.5.5").await.unwrap();
    assert_eq!(result.source, "good");
    assert_eq!(result.data["country"], json!("FR"));
    assert_eq!(fetcher.calls(), vec!["bad", "good"]);
}

#[tokio::test]
async fn test_clear_cache_forces_fresh_call() {
    let fetcher = MockFetcher::new();
    fetcher.succeed("a", body("US"));
    let r = resolver(vec![provider("a", 10)], settings(), fetcher.clone());

    r.resolve("8.8.4.4").await.unwrap();
    r.resolve("1.0.0.1").await.unwrap();
    assert_eq!(r.clear_cache(), 2);
    assert_eq!(r.cache_snapshot().size, 0);

    r.resolve("8.8.4.4").await.unwrap();
    assert_eq!(fetcher.calls().len(), 3);
}

#[tokio::test]
async fn test_concatenated_field_skips_empty_values() {
    let fetcher = MockFetcher::new();
    fetcher.succeed("a", json!({"country": "", "region": "CA", "city": ""}));
    let r = resolver(vec![provider("a", 10)], settings(), fetcher);

    let result = r.resolve("4.4.4.4").await.unwrap();
    assert_eq!(result.data["location"], json!("CA"));
    assert_eq!(result.data["country"], json!(""));
}

#[tokio::test]
async fn test_response_fields_filter_output() {
    let fetcher = MockFetcher::new();
    fetcher.succeed("a", json!({"country": "BR", "city": "São Paulo", "extra": 1}));
    let r = resolver(
        vec![provider("a", 10)],
        ResolverSettings {
            response_fields: vec!["ip".to_string(), "city".to_string()],
            ..settings()
        },
        fetcher,
    );

    let result = r.resolve("200.1.1.1").await.unwrap();
    let keys: Vec<&str> = result.data.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["city", "ip"]);
    assert_eq!(result.raw_data["extra"], json!(1));
}

#[tokio::test]
async fn test_no_provider_available() {
    let fetcher = MockFetcher::new();
    let mut disabled = provider("off", 10);
    disabled.enabled = false;
    let r = resolver(vec![disabled], settings(), fetcher.clone());

    let err = r.resolve("1.2.3.4").await.unwrap_err();
    assert!(matches!(err, GeoLookupError::NoProviderAvailable));
    assert!(fetcher.calls().is_empty());

    let empty = resolver(vec![], settings(), fetcher);
    assert!(matches!(
        empty.resolve("1.2.3.4").await.unwrap_err(),
        GeoLookupError::NoProviderAvailable
    ));
}

#[tokio::test]
async fn test_quota_exhausted_during_retries() {
    let fetcher = MockFetcher::new();
    fetcher.fail("a", ProviderErrorKind::Status(500));
    fetcher.fail("b", ProviderErrorKind::Status(502));
    let r = resolver(
        vec![provider("a", 1), provider("b", 1)],
        settings(),
        fetcher.clone(),
    );

    let err = r.resolve("7.7.7.7").await.unwrap_err();
    assert!(matches!(err, GeoLookupError::AllAttemptsFailed(_)));
    // 每个 provider 只有一次额度，后续轮次没有候选
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(r.available_count(), 0);
}

#[tokio::test]
async fn test_least_used_strategy() {
    let fetcher = MockFetcher::new();
    fetcher.succeed("a", body("US"));
    fetcher.succeed("b", body("US"));
    let r = resolver(
        vec![provider("a", 10), provider("b", 10)],
        ResolverSettings {
            strategy: LoadBalanceStrategy::LeastUsed,
            ..settings()
        },
        fetcher.clone(),
    );

    for i in 1..=4 {
        r.resolve(&format!("172.16.0.{}", i)).await.unwrap();
    }
    assert_eq!(fetcher.calls(), vec!["a", "b", "a", "b"]);
}

#[tokio::test]
async fn test_concurrent_lookups_respect_limit() {
    let fetcher = MockFetcher::new();
    fetcher.succeed("a", body("US"));
    let r = Arc::new(resolver(
        vec![provider("a", 5)],
        ResolverSettings {
            max_retries: 0,
            ..settings()
        },
        fetcher.clone(),
    ));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let r = r.clone();
            tokio::spawn(async move { r.resolve(&format!("192.0.2.{}", i)).await })
        })
        .collect();

    let mut ok = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 5);
    assert_eq!(fetcher.calls().len(), 5);
    assert_eq!(r.list_provider_status()[0].current_requests, 5);
}
