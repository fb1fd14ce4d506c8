use std::env;
use std::fs;

use bookrec_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use bookrec_core::{
    compose_item_key, DistanceMetric, DomainError, IdentifierDomain, IdentifierMap,
    InteractionModel, NeighborResult, NeighborSearchEngine, RatingRecord, RecommendationAssembler,
    SparseMatrixBuilder,
};
use tempfile::TempDir;

type FlowTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        match (&$left, &$right) {
            (left, right) => {
                if left != right {
                    return Err(format!(
                        "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                        left, right
                    ));
                }
            }
        }
    };
}

fn scenario_records() -> Vec<RatingRecord> {
    vec![
        RatingRecord::new("u1", "A", 5.0),
        RatingRecord::new("u1", "B", 4.0),
        RatingRecord::new("u2", "A", 5.0),
        RatingRecord::new("u2", "C", 1.0),
        RatingRecord::new("u3", "B", 5.0),
        RatingRecord::new("u3", "C", 5.0),
    ]
}

/// Shelf export with both rated and unrated rows, keyed like the ratings
/// warehouse keys books.
fn shelf_records() -> Vec<RatingRecord> {
    let pride = compose_item_key("Pride and Prejudice", "Austen, Jane");
    let emma = compose_item_key("Emma", "Austen, Jane");
    let persuasion = compose_item_key("Persuasion", "Austen, Jane");
    let dune = compose_item_key("Dune", "Herbert, Frank");
    let foundation = compose_item_key("Foundation", "Asimov, Isaac");

    let mut records = Vec::new();
    for (user, books) in [
        ("reader-01", vec![(&pride, 5.0), (&emma, 4.0), (&persuasion, 5.0)]),
        ("reader-02", vec![(&pride, 4.0), (&emma, 5.0), (&dune, 0.0)]),
        ("reader-03", vec![(&persuasion, 4.0), (&pride, 5.0)]),
        ("reader-04", vec![(&dune, 5.0), (&foundation, 4.0)]),
        ("reader-05", vec![(&dune, 4.0), (&foundation, 5.0), (&emma, 1.0)]),
        ("reader-06", vec![(&foundation, 0.0), (&dune, 5.0)]),
    ] {
        for (book, rating) in books {
            records.push(RatingRecord::new(user, book.as_str(), rating));
        }
    }
    records
}

#[test]
fn concrete_scenario_recommends_b_for_a() -> FlowTestResult {
    let model = InteractionModel::from_records(scenario_records()).map_err(|e| e.to_string())?;
    let engine = NeighborSearchEngine::new(&model);

    let result = engine.find_similar("A", 1, DistanceMetric::Cosine).map_err(|e| e.to_string())?;
    require_eq!(result.identifiers().collect::<Vec<_>>(), vec!["B"]);

    let ab = engine.distance("A", "B", DistanceMetric::Cosine).map_err(|e| e.to_string())?;
    let ac = engine.distance("A", "C", DistanceMetric::Cosine).map_err(|e| e.to_string())?;
    require!((ab - 0.558).abs() < 1e-3, "distance(A, B) was {ab}");
    require!((ac - 0.861).abs() < 1e-3, "distance(A, C) was {ac}");
    Ok(())
}

#[test]
fn partial_batch_failure_reports_ghost_as_skipped() -> FlowTestResult {
    let model = InteractionModel::from_records(scenario_records()).map_err(|e| e.to_string())?;
    let assembler =
        RecommendationAssembler::new(NeighborSearchEngine::new(&model), Default::default());

    let recommendations =
        assembler.assemble(&["A", "B", "ghost"], 1).map_err(|e| e.to_string())?;

    require_eq!(recommendations.suggestions.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    require_eq!(recommendations.skipped, vec!["ghost".to_string()]);
    Ok(())
}

#[test]
fn two_items_cannot_serve_five_neighbors() -> FlowTestResult {
    let model = InteractionModel::from_records(vec![
        RatingRecord::new("u1", "A", 5.0),
        RatingRecord::new("u2", "B", 2.0),
    ])
    .map_err(|e| e.to_string())?;
    let engine = NeighborSearchEngine::new(&model);

    let outcome = engine.find_similar("A", 5, DistanceMetric::Cosine);
    require_eq!(
        outcome,
        Err::<NeighborResult, _>(DomainError::InsufficientCandidates { requested: 5, available: 1 })
    );
    require_eq!(
        engine.find_similar("A", 1, DistanceMetric::Cosine).map(|result| result.len()),
        Ok::<_, DomainError>(1)
    );
    Ok(())
}

#[test]
fn matrix_shape_and_duplicate_summation_hold_end_to_end() -> FlowTestResult {
    let users = IdentifierMap::build(IdentifierDomain::User, ["u1", "u2", "u3"])
        .map_err(|e| e.to_string())?;
    let items =
        IdentifierMap::build(IdentifierDomain::Item, ["A", "B"]).map_err(|e| e.to_string())?;
    let records = vec![RatingRecord::new("u2", "B", 3.0), RatingRecord::new("u2", "B", 2.0)];

    let matrix = SparseMatrixBuilder::build(&records, &users, &items).map_err(|e| e.to_string())?;

    require_eq!(matrix.shape(), (users.len(), items.len()));
    let (user, item) = (
        users.index_of("u2").map_err(|e| e.to_string())?,
        items.index_of("B").map_err(|e| e.to_string())?,
    );
    require_eq!(matrix.get(user, item), 5.0);
    require_eq!(matrix.nnz(), 1);
    Ok(())
}

#[test]
fn shelf_export_clusters_by_reader_overlap() -> FlowTestResult {
    let model = InteractionModel::from_records(shelf_records()).map_err(|e| e.to_string())?;
    let engine = NeighborSearchEngine::new(&model);
    let pride = compose_item_key("Pride and Prejudice", "Austen, Jane");
    let dune = compose_item_key("Dune", "Herbert, Frank");

    // reader-06 only has rated Dune; the unrated Foundation row is dropped
    require_eq!(model.users().len(), 6);
    require_eq!(model.items().len(), 5);

    let austen =
        engine.find_similar(&pride, 2, DistanceMetric::Cosine).map_err(|e| e.to_string())?;
    for neighbor in austen.identifiers() {
        require!(neighbor.ends_with("Austen, Jane"), "unexpected neighbor {neighbor} for {pride}");
    }

    let scifi =
        engine.find_similar(&dune, 1, DistanceMetric::Cosine).map_err(|e| e.to_string())?;
    require_eq!(
        scifi.identifiers().collect::<Vec<_>>(),
        vec![compose_item_key("Foundation", "Asimov, Isaac").as_str()]
    );
    Ok(())
}

#[test]
fn configured_batch_runs_in_parallel_with_seed_order() -> FlowTestResult {
    // no other test in this binary reads BOOKREC_* variables
    for (key, _) in env::vars().filter(|(key, _)| key.starts_with("BOOKREC_")) {
        env::remove_var(key);
    }
    let dir = TempDir::new().map_err(|e| e.to_string())?;
    let path = dir.path().join("bookrec.toml");
    fs::write(&path, "[recommender]\nneighbors = 4\nmetric = \"cosine\"\n")
        .map_err(|e| e.to_string())?;

    let config = AppConfig::load(LoadOptions {
        config_path: Some(path),
        require_file: true,
        overrides: ConfigOverrides {
            neighbors: Some(2),
            parallel: Some(true),
            ..ConfigOverrides::default()
        },
    })
    .map_err(|e| e.to_string())?;
    require_eq!(config.recommender.metric, DistanceMetric::Cosine);
    require!(config.recommender.parallel, "override should enable parallel fan-out");

    let model = InteractionModel::from_records(shelf_records()).map_err(|e| e.to_string())?;
    let assembler =
        RecommendationAssembler::new(NeighborSearchEngine::new(&model), config.assembler_options());

    let seeds = vec![
        compose_item_key("Dune", "Herbert, Frank"),
        compose_item_key("The Hobbit", "Tolkien, J.R.R."),
        compose_item_key("Emma", "Austen, Jane"),
    ];
    let recommendations =
        assembler.assemble(&seeds, config.recommender.neighbors).map_err(|e| e.to_string())?;

    require_eq!(
        recommendations.suggestions.keys().cloned().collect::<Vec<_>>(),
        vec![seeds[0].clone(), seeds[2].clone()]
    );
    require_eq!(recommendations.skipped, vec![seeds[1].clone()]);
    for result in recommendations.suggestions.values() {
        require_eq!(result.len(), 2);
        require!(result.identifiers().all(|id| id != result.query), "query leaked into result");
    }

    let rows = serde_json::to_value(recommendations.rows()).map_err(|e| e.to_string())?;
    require_eq!(rows[0]["recently_read"], serde_json::json!(seeds[0]));
    require!(rows[0].get("suggestion_2").is_some(), "rows should carry numbered suggestions");
    Ok(())
}
