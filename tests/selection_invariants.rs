use cascade_core::definition::{FilterDefinition, FilterDefinitionSet};
use cascade_core::provider::{provider_fn, AncestorSelections, StaticProvider};
use cascade_core::{FilterEngine, FilterOption, Selection};

fn all() -> FilterOption {
    FilterOption::all()
}

fn opt(id: i64) -> FilterOption {
    FilterOption::new(id, format!("option {id}"))
}

#[test]
fn invariant_multi_normalization() {
    let empty = Selection::Multi(Vec::new()).normalized_for(true, &all());
    assert_eq!(empty, Selection::Multi(vec![all()]));

    let mixed = Selection::Multi(vec![all(), opt(2), opt(1), opt(2)]).normalized_for(true, &all());
    assert_eq!(mixed, Selection::Multi(vec![opt(2), opt(1)]), "deduplicated, default dropped");

    let bare = Selection::Single(opt(5)).normalized_for(true, &all());
    assert_eq!(bare, Selection::Multi(vec![opt(5)]));

    let only_default = Selection::Multi(vec![all(), all()]).normalized_for(true, &all());
    assert_eq!(only_default, Selection::Multi(vec![all()]));
}

#[test]
fn invariant_single_normalization() {
    let from_list = Selection::Multi(vec![all(), opt(3), opt(4)]).normalized_for(false, &all());
    assert_eq!(from_list, Selection::Single(opt(3)));

    let from_empty = Selection::Multi(Vec::new()).normalized_for(false, &all());
    assert_eq!(from_empty, Selection::Single(all()));

    assert_eq!(Selection::multi(Vec::new(), &all()), Selection::Multi(vec![all()]));
}

#[test]
fn toggling_multi_selection() {
    let start = Selection::default_for(true, &all());

    let one = start.toggled(opt(1), &all());
    assert_eq!(one, Selection::Multi(vec![opt(1)]), "real option replaces the default");

    let two = one.toggled(opt(2), &all());
    assert_eq!(two, Selection::Multi(vec![opt(1), opt(2)]));

    let back = two.toggled(opt(1), &all());
    assert_eq!(back, Selection::Multi(vec![opt(2)]));

    let emptied = back.toggled(opt(2), &all());
    assert_eq!(emptied, Selection::Multi(vec![all()]), "last option removed falls back to default");

    let cleared = two.toggled(all(), &all());
    assert_eq!(cleared, Selection::Multi(vec![all()]), "clicking the default clears everything");
}

#[test]
fn toggling_single_selection() {
    let start = Selection::default_for(false, &all());
    let chosen = start.toggled(opt(7), &all());
    assert_eq!(chosen, Selection::Single(opt(7)));
    assert_eq!(chosen.toggled(opt(8), &all()), Selection::Single(opt(8)));
    assert_eq!(chosen.toggled(opt(7), &all()), Selection::Single(all()));
}

fn store_a() -> FilterOption {
    FilterOption::new(10, "StoreA").with_attribute("city_id", 1)
}

fn store_b() -> FilterOption {
    FilterOption::new(20, "StoreB").with_attribute("city_id", 2)
}

#[tokio::test]
async fn scenario_b_multi_descendant_is_narrowed() {
    let definitions = FilterDefinitionSet::new(vec![
        FilterDefinition::new(
            "city",
            StaticProvider::new(vec![FilterOption::new(1, "City1"), FilterOption::new(2, "City2")]),
        ),
        FilterDefinition::new("store", StaticProvider::new(vec![store_a(), store_b()]))
            .depends_on(["city"])
            .multi(),
    ])
    .unwrap();
    let engine = FilterEngine::new(definitions);

    engine
        .apply_change("store", vec![store_a(), store_b()])
        .await
        .unwrap();
    engine
        .apply_change("city", FilterOption::new(1, "City1"))
        .await
        .unwrap();

    assert_eq!(engine.get_selection("store").unwrap(), Selection::Multi(vec![store_a()]));
}

#[tokio::test]
async fn scenario_c_nothing_survives_falls_back_to_default() {
    let empty = provider_fn(|_ancestors: AncestorSelections| async move { Ok(Vec::new()) });
    let definitions = FilterDefinitionSet::new(vec![
        FilterDefinition::new("city", StaticProvider::new(vec![FilterOption::new(1, "City1")])),
        FilterDefinition::new("store", empty).depends_on(["city"]).multi(),
    ])
    .unwrap();
    let engine = FilterEngine::new(definitions);

    engine
        .apply_change("store", vec![store_a(), store_b()])
        .await
        .unwrap();
    engine
        .apply_change("city", FilterOption::new(1, "City1"))
        .await
        .unwrap();

    assert_eq!(engine.get_selection("store").unwrap(), Selection::Multi(vec![all()]));
}

/// Small deterministic generator so the sequence is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next() as usize) % items.len()]
    }
}

fn universe() -> (FilterDefinitionSet, Vec<(&'static str, Vec<FilterOption>)>) {
    let regions = vec![FilterOption::new(1, "North"), FilterOption::new(2, "South")];
    let cities = vec![
        FilterOption::new(11, "N1").with_attribute("region_id", 1),
        FilterOption::new(12, "N2").with_attribute("region_id", 1),
        FilterOption::new(21, "S1").with_attribute("region_id", 2),
    ];
    let stores = vec![
        FilterOption::new(111, "N1a").with_attribute("region_id", 1).with_attribute("city_id", 11),
        FilterOption::new(112, "N1b").with_attribute("region_id", 1).with_attribute("city_id", 11),
        FilterOption::new(121, "N2a").with_attribute("region_id", 1).with_attribute("city_id", 12),
        FilterOption::new(211, "S1a").with_attribute("region_id", 2).with_attribute("city_id", 21),
    ];

    let definitions = FilterDefinitionSet::new(vec![
        FilterDefinition::new("region", StaticProvider::new(regions.clone())),
        FilterDefinition::new("city", StaticProvider::new(cities.clone())).depends_on(["region"]),
        FilterDefinition::new("store", StaticProvider::new(stores.clone()))
            .depends_on(["region", "city"])
            .multi(),
    ])
    .unwrap();

    let choices = vec![("region", regions), ("city", cities), ("store", stores)];
    (definitions, choices)
}

#[tokio::test]
async fn invariant_state_stays_well_formed_under_random_changes() {
    let (definitions, choices) = universe();
    let engine = FilterEngine::new(definitions);
    let mut rng = Lcg(0x5eed);

    for _ in 0..200 {
        let (filter, options) = rng.pick(&choices);
        let mut candidates = options.clone();
        candidates.push(all());

        let selection: Selection = if *filter == "store" {
            let count = rng.next() % 3;
            (0..count).map(|_| rng.pick(&candidates).clone()).collect::<Vec<_>>().into()
        } else {
            rng.pick(&candidates).clone().into()
        };

        let report = engine.apply_change(filter, selection).await.unwrap();
        assert!(report.failed.is_empty());
        assert!(report.stale.is_empty());

        let snapshot = engine.snapshot();
        for def in engine.definitions().iter() {
            let current = snapshot.get(def.id.as_str()).unwrap();
            assert_eq!(current.is_multi(), def.is_multi, "{} changed shape", def.id);
            assert!(!current.options().is_empty());
            if current.options().len() > 1 {
                assert!(!current.is_default() && current.options().iter().all(|o| !o.is_default()));
            }
        }

        for descendant in engine.definitions().descendants_of(filter).unwrap() {
            let offered = engine.options(descendant.id.as_str()).await.unwrap();
            for id in snapshot.get(descendant.id.as_str()).unwrap().ids() {
                assert!(
                    offered.iter().any(|o| o.id == id),
                    "{} kept {id} after {filter} changed",
                    descendant.id
                );
            }
        }
    }
}
