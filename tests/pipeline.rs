use std::fs;

use chrono::NaiveDate;
use farm_yield::app::pipeline::{predict_all, predict_crop};
use farm_yield::data::{generate_demo_history, seed_store, DemoConfig};
use farm_yield::domain::{HarvestFilter, NewCrop, NewHarvest, KNOWN_CROPS};
use farm_yield::io::{apply_import, export_predictions, parse_import};
use farm_yield::report::compute_harvest_stats;
use farm_yield::store::{FarmRepository, JsonFileStore};
use farm_yield::YieldEstimator;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn seeded_store_predicts_every_crop_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("farm.json");

    let config = DemoConfig::default();
    let history = generate_demo_history(&config).unwrap();
    let planted = history.len();

    let mut store = JsonFileStore::open(&path).unwrap();
    seed_store(&mut store, 1, history).unwrap();
    store.flush().unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    let predictions = predict_all(&store, 1, &YieldEstimator::default()).unwrap();
    assert_eq!(predictions.len(), planted);

    // Every planting of a crop name trains on all of that name's harvests.
    let per_name = planted / KNOWN_CROPS.len();
    for p in &predictions {
        assert_eq!(p.result.training_points, per_name, "{}", p.crop.name);
        assert!(p.result.used_regression_model);
        assert_eq!(p.result.crop_name, p.crop.name);
    }

    let out = dir.path().join("predictions.csv");
    export_predictions(&out, &predictions).unwrap();
    let lines = fs::read_to_string(&out).unwrap().lines().count();
    assert_eq!(lines, planted + 1);
}

#[test]
fn owners_never_see_each_others_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::open(dir.path().join("farm.json")).unwrap();

    let mine = store
        .create_crop(
            1,
            NewCrop {
                name: "Rice".into(),
                area: 1.0,
                planting_date: date(2024, 10, 5),
            },
        )
        .unwrap();
    for (i, amount) in [2000.0, 2100.0, 1900.0, 2200.0].into_iter().enumerate() {
        let theirs = store
            .create_crop(
                2,
                NewCrop {
                    name: "Rice".into(),
                    area: 1.0,
                    planting_date: date(2020 + i as i32, 10, 5),
                },
            )
            .unwrap();
        store
            .create_harvest(
                2,
                theirs.id,
                NewHarvest {
                    date: date(2021 + i as i32, 2, 1),
                    yield_amount: amount,
                },
            )
            .unwrap();
    }

    let p = predict_crop(&store, 1, mine.id, &YieldEstimator::default()).unwrap();
    assert_eq!(p.result.training_points, 0);
    assert!(!p.result.used_regression_model);

    let stats = compute_harvest_stats(&store.list_harvests(&HarvestFilter::for_owner(1)).unwrap());
    assert_eq!(stats.total_harvests, 0);
    let stats = compute_harvest_stats(&store.list_harvests(&HarvestFilter::for_owner(2)).unwrap());
    assert_eq!(stats.total_harvests, 4);
    assert_eq!(stats.total_yield, 8200.0);
    assert_eq!(stats.top_crop.as_deref(), Some("Rice"));
}

#[test]
fn imported_history_feeds_predictions() {
    let csv = "crop_name,area,planting_date,harvest_date,yield_amount\n\
               Maize,2,2023-03-10,2023-07-15,1300\n\
               Maize,3,2023-04-02,2023-08-01,2100\n\
               Maize,4,2023-11-20,2024-03-01,2480\n\
               Maize,2.5,2024-03-15,,\n\
               Maize,oops,2024-03-15,,\n";
    let parsed = parse_import(csv.as_bytes()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("farm.json");
    let mut store = JsonFileStore::open(&path).unwrap();
    let summary = apply_import(&mut store, 1, parsed).unwrap();
    store.flush().unwrap();

    assert_eq!(summary.crops_created, 4);
    assert_eq!(summary.harvests_created, 3);
    assert_eq!(summary.rows_skipped(), 1);

    let store = JsonFileStore::open(&path).unwrap();
    let newest = store.list_crops(1).unwrap().remove(0);
    assert_eq!(newest.planting_date, date(2024, 3, 15));

    let p = predict_crop(&store, 1, newest.id, &YieldEstimator::default()).unwrap();
    assert_eq!(p.result.training_points, 3);
    assert!(p.result.used_regression_model);
    assert_eq!(p.result.month, 3);
    assert_eq!(p.result.predicted_yield, p.result.predicted_yield_per_area * 2.5);
}

#[test]
fn deleting_a_crop_removes_it_from_training() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::open(dir.path().join("farm.json")).unwrap();

    let mut ids = Vec::new();
    for month in [3, 4, 5] {
        let crop = store
            .create_crop(
                1,
                NewCrop {
                    name: "Sorghum".into(),
                    area: 1.0,
                    planting_date: date(2024, month, 1),
                },
            )
            .unwrap();
        store
            .create_harvest(
                1,
                crop.id,
                NewHarvest {
                    date: date(2024, month + 4, 1),
                    yield_amount: 500.0,
                },
            )
            .unwrap();
        ids.push(crop.id);
    }

    let before = predict_crop(&store, 1, ids[0], &YieldEstimator::default()).unwrap();
    assert_eq!(before.result.training_points, 3);

    assert_eq!(store.delete_crop(1, ids[2]).unwrap(), 1);
    let after = predict_crop(&store, 1, ids[0], &YieldEstimator::default()).unwrap();
    assert_eq!(after.result.training_points, 2);
    assert!(!after.result.used_regression_model);
}
