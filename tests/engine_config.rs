use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cascade_core::cache::{OptionsCache, OptionsKey};
use cascade_core::config::ConfigLoadError;
use cascade_core::definition::{FilterDefinition, FilterDefinitionSet};
use cascade_core::provider::{provider_fn, AncestorSelections, StaticProvider};
use cascade_core::{EngineConfig, FilterEngine, FilterId, FilterOption, ReconcilePolicy};
use tempfile::tempdir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.json");
    std::fs::write(&path, r#"{ "policy": "always_reset", "extra_dependencies": ["tenant:7"] }"#).unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.policy, ReconcilePolicy::AlwaysReset);
    assert!(config.cache_options, "missing fields keep their default");
    assert_eq!(config.extra_dependencies, vec!["tenant:7".to_string()]);
}

#[test]
fn empty_object_is_the_default_config() {
    assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
}

#[test]
fn load_errors_are_typed() {
    let dir = tempdir().unwrap();

    let missing = EngineConfig::load(&dir.path().join("absent.json"));
    assert!(matches!(missing, Err(ConfigLoadError::Io(_))));

    let bad = EngineConfig::from_json_str(r#"{ "policy": "sometimes" }"#);
    assert!(matches!(bad, Err(ConfigLoadError::Parse(_))));
}

/// country -> city, counting city fetches.
fn counted_engine(config: EngineConfig) -> (FilterEngine, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let cities = {
        let calls = Arc::clone(&calls);
        let inner = StaticProvider::new(vec![
            FilterOption::new(100, "Paris").with_attribute("country_id", 10),
            FilterOption::new(300, "Tokyo").with_attribute("country_id", 30),
        ]);
        provider_fn(move |ancestors: AncestorSelections| {
            calls.fetch_add(1, Ordering::SeqCst);
            let options = inner.filter(&ancestors);
            async move { Ok(options) }
        })
    };

    let definitions = FilterDefinitionSet::new(vec![
        FilterDefinition::new(
            "country",
            StaticProvider::new(vec![FilterOption::new(10, "France"), FilterOption::new(30, "Japan")]),
        ),
        FilterDefinition::new("city", cities).depends_on(["country"]),
    ])
    .unwrap();
    (FilterEngine::with_config(definitions, config), calls)
}

#[tokio::test]
async fn identical_provider_calls_are_cached() {
    init_tracing();
    let (engine, calls) = counted_engine(EngineConfig::default());

    engine.apply_change("country", FilterOption::new(10, "France")).await.unwrap();
    engine.options("city").await.unwrap();
    engine.apply_change("country", FilterOption::new(30, "Japan")).await.unwrap();
    engine.apply_change("country", FilterOption::new(10, "France")).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2, "one call per distinct country");

    engine.clear_cache();
    engine.options("city").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn disabled_cache_always_calls_the_provider() {
    let config = EngineConfig {
        cache_options: false,
        ..EngineConfig::default()
    };
    let (engine, calls) = counted_engine(config);

    engine.apply_change("country", FilterOption::new(10, "France")).await.unwrap();
    engine.options("city").await.unwrap();
    engine.options("city").await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn extra_dependencies_separate_cache_entries() {
    let mut ancestors = AncestorSelections::new();
    ancestors.push(FilterId::new("country"), vec![FilterOption::new(30, "Japan"), FilterOption::new(10, "France")]);
    let mut reordered = AncestorSelections::new();
    reordered.push(FilterId::new("country"), vec![FilterOption::new(10, "France"), FilterOption::new(30, "Japan")]);

    let alice = OptionsKey::new(FilterId::new("city"), &ancestors, &["user:alice".to_string()]);
    let alice_again = OptionsKey::new(FilterId::new("city"), &reordered, &["user:alice".to_string()]);
    let bob = OptionsKey::new(FilterId::new("city"), &ancestors, &["user:bob".to_string()]);
    assert_eq!(alice, alice_again, "selection order does not matter");
    assert_ne!(alice, bob);

    let cache = OptionsCache::new();
    cache.insert(alice.clone(), vec![FilterOption::new(300, "Tokyo")].into());
    assert!(cache.get(&alice_again).is_some());
    assert!(cache.get(&bob).is_none());
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn always_reset_skips_provider_calls() {
    let config = EngineConfig {
        policy: ReconcilePolicy::AlwaysReset,
        ..EngineConfig::default()
    };
    let (engine, calls) = counted_engine(config);

    engine.apply_change("city", FilterOption::new(100, "Paris")).await.unwrap();
    engine.apply_change("country", FilterOption::new(10, "France")).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(engine.get_selection("city").unwrap().is_default());
}
