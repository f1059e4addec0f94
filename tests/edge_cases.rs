use geodex::{Config, DocId, GeoDb, GeodexError, RTree, SpatialPredicate};
use geojson::GeoJson;
use serde_json::json;

fn doc(value: serde_json::Value) -> GeoJson {
    GeoJson::from_json_value(value).unwrap()
}

fn point(x: f64, y: f64) -> GeoJson {
    doc(json!({ "type": "Point", "coordinates": [x, y] }))
}

fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> GeoJson {
    doc(json!({
        "type": "Polygon",
        "coordinates": [[
            [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
        ]]
    }))
}

/// Test 1: Large dataset stress test
#[test]
fn test_large_dataset_bulk_load() {
    let mut db = GeoDb::new();

    // 10K points on a 100x100 grid (kept reasonable for CI)
    let docs: Vec<(i64, GeoJson)> = (0..10_000)
        .map(|i| (i, point((i % 100) as f64, (i / 100) as f64)))
        .collect();
    db.load(docs).unwrap();

    assert_eq!(db.len(), 10_000);
    db.tree().check_invariants(false);

    // A 10x10 window holds an 11x11 grid of points (boundary-inclusive).
    let hits = db.coveredby(&rect(20.0, 20.0, 30.0, 30.0)).unwrap();
    assert_eq!(hits.len(), 121);

    // The packed tree stays shallow.
    let stats = db.tree().stats();
    assert!(stats.depth <= 5, "depth {} too deep for 10K entries", stats.depth);
}

/// Test 2: Alternating insert/remove storm
#[test]
fn test_mutation_storm() {
    let mut db = GeoDb::new();

    for round in 0..5i64 {
        for i in 0..400i64 {
            let id = round * 400 + i;
            let x = (id % 40) as f64;
            let y = (id / 40) as f64;
            db.add(id, &rect(x, y, x + 0.5, y + 0.5)).unwrap();
        }
        // Drop every other entry added this round.
        for i in (0..400i64).step_by(2) {
            db.remove(round * 400 + i);
        }
        db.tree().check_invariants(true);
    }

    assert_eq!(db.len(), 1000);
    let all = db.intersects(&rect(-1.0, -1.0, 100.0, 100.0)).unwrap();
    assert_eq!(all.len(), 1000);
    assert!(all.iter().all(|id| matches!(id, DocId::Int(n) if n % 2 == 1)));
}

/// Test 3: Extreme coordinate values
#[test]
fn test_extreme_coordinates() {
    let mut db = GeoDb::new();

    db.add("north_pole", &point(0.0, 90.0)).unwrap();
    db.add("south_pole", &point(0.0, -90.0)).unwrap();
    db.add("date_line_west", &point(180.0, 0.0)).unwrap();
    db.add("date_line_east", &point(-180.0, 0.0)).unwrap();
    db.add("unprojected", &point(1.0e15, -1.0e15)).unwrap();

    let northern = db.coveredby(&rect(-180.0, 0.0, 180.0, 90.0)).unwrap();
    assert_eq!(northern.len(), 3);

    // Far-out planar coordinates still participate in full scans.
    let far_probe = rect(0.9e15, -1.1e15, 1.1e15, -0.9e15);
    assert_eq!(db.coveredby(&far_probe).unwrap(), vec![DocId::from("unprojected")]);
    assert_eq!(db.disjoint(&far_probe).unwrap().len(), 4);
}

/// Test 4: Non-finite coordinates are rejected, not indexed
#[test]
fn test_non_finite_coordinates_rejected() {
    let mut db = GeoDb::new();

    let nan_point = GeoJson::Geometry(geojson::Geometry::new(geojson::Value::Point(vec![
        f64::NAN,
        0.0,
    ])));
    let inf_point = GeoJson::Geometry(geojson::Geometry::new(geojson::Value::Point(vec![
        0.0,
        f64::INFINITY,
    ])));

    assert!(matches!(
        db.add(1, &nan_point),
        Err(GeodexError::MalformedGeometry(_))
    ));
    assert!(matches!(
        db.add(2, &inf_point),
        Err(GeodexError::MalformedGeometry(_))
    ));
    assert!(db.is_empty());

    // And as a query, after valid data is in place.
    db.add(3, &point(0.0, 0.0)).unwrap();
    assert!(db.intersects(&nan_point).is_err());
}

/// Test 5: Degenerate geometries
#[test]
fn test_degenerate_geometries() {
    let mut db = GeoDb::new();
    db.add("pin", &point(2.0, 2.0)).unwrap();
    db.add(
        "sliver",
        &doc(json!({
            "type": "LineString",
            "coordinates": [[0.0, 5.0], [4.0, 5.0]]
        })),
    )
    .unwrap();

    // A point equals itself and nothing else.
    assert_eq!(db.equals(&point(2.0, 2.0)).unwrap(), vec![DocId::from("pin")]);
    assert!(db.equals(&point(2.0, 2.1)).unwrap().is_empty());

    // A probe ending exactly on the line endpoint touches it.
    let touching = doc(json!({
        "type": "LineString",
        "coordinates": [[4.0, 5.0], [8.0, 9.0]]
    }));
    assert_eq!(db.touches(&touching).unwrap(), vec![DocId::from("sliver")]);
}

/// Test 6: Every predicate on an empty database
#[test]
fn test_empty_database_queries() {
    let db = GeoDb::new();
    for predicate in SpatialPredicate::ALL {
        assert!(db.evaluate(predicate, &point(0.0, 0.0)).unwrap().is_empty());
    }
    assert_eq!(db.tree().stats().node_count, 0);
}

/// Test 7: Minimum fanout configuration under load
#[test]
fn test_minimum_fanout_under_load() {
    let mut db = GeoDb::with_config(Config::with_max_node_entries(4));

    for i in 0..200i64 {
        let x = (i % 20) as f64 * 2.0;
        let y = (i / 20) as f64 * 2.0;
        db.add(i, &rect(x, y, x + 1.0, y + 1.0)).unwrap();
    }
    db.tree().check_invariants(true);

    // Tiny fanout means a tall tree, never a broken one.
    assert!(db.tree().stats().depth >= 4);
    for i in (0..200i64).step_by(7) {
        db.remove(i);
    }
    db.tree().check_invariants(true);
    assert_eq!(db.len(), 200 - 29);
}

/// Test 8: Identical rectangles pile into the same leaves
#[test]
fn test_many_identical_envelopes() {
    let mut db = GeoDb::new();
    for i in 0..50i64 {
        db.add(i, &rect(5.0, 5.0, 6.0, 6.0)).unwrap();
    }

    assert_eq!(db.len(), 50);
    db.tree().check_invariants(true);
    assert_eq!(db.equals(&rect(5.0, 5.0, 6.0, 6.0)).unwrap().len(), 50);

    for i in 0..50i64 {
        db.remove(i);
    }
    assert!(db.is_empty());
}

/// Test 9: The raw index rejects nothing and loses nothing under reuse
#[test]
fn test_raw_tree_reuse_after_clear_by_removal() {
    #[derive(Debug)]
    struct Item(u32, geodex::BBox);
    impl geodex::SpatialObject for Item {
        fn envelope(&self) -> geodex::BBox {
            self.1
        }
    }

    let mut tree: RTree<Item> = RTree::new();
    for pass in 0..3u32 {
        for i in 0..30 {
            let x = f64::from(i) * 2.0;
            tree.insert(Item(pass * 100 + i, geodex::BBox::new(x, 0.0, x + 1.0, 1.0)));
        }
        assert_eq!(tree.len(), 30);
        for i in 0..30 {
            let x = f64::from(i) * 2.0;
            let target = geodex::BBox::new(x, 0.0, x + 1.0, 1.0);
            assert!(tree
                .remove_with(&target, |item| item.0 == pass * 100 + i)
                .is_some());
        }
        assert!(tree.is_empty());
    }
}
