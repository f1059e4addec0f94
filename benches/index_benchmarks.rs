use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geodex::{BBox, GeoDb, RTree, SpatialObject};
use geojson::GeoJson;
use serde_json::json;

#[derive(Debug, Clone)]
struct Cell {
    id: u32,
    bbox: BBox,
}

impl SpatialObject for Cell {
    fn envelope(&self) -> BBox {
        self.bbox
    }
}

fn cells(count: u32) -> Vec<Cell> {
    (0..count)
        .map(|i| {
            let x = f64::from(i % 1000) * 2.0;
            let y = f64::from(i / 1000) * 2.0;
            Cell {
                id: i,
                bbox: BBox::new(x, y, x + 1.0, y + 1.0),
            }
        })
        .collect()
}

fn point(x: f64, y: f64) -> GeoJson {
    GeoJson::from_json_value(json!({ "type": "Point", "coordinates": [x, y] })).unwrap()
}

fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> GeoJson {
    GeoJson::from_json_value(json!({
        "type": "Polygon",
        "coordinates": [[
            [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
        ]]
    }))
    .unwrap()
}

fn benchmark_tree_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_construction");

    for size in [1_000u32, 10_000] {
        group.bench_with_input(BenchmarkId::new("insert", size), &size, |b, &size| {
            b.iter_batched(
                || cells(size),
                |items| {
                    let mut tree = RTree::new();
                    for item in items {
                        tree.insert(item);
                    }
                    tree
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("bulk_load", size), &size, |b, &size| {
            b.iter_batched(
                || cells(size),
                |items| {
                    let mut tree = RTree::new();
                    tree.bulk_load(items);
                    tree
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn benchmark_tree_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_search");

    let mut tree = RTree::new();
    tree.bulk_load(cells(100_000));

    group.bench_function("window_hit_100", |b| {
        let window = BBox::new(100.0, 100.0, 120.0, 118.0);
        b.iter(|| tree.search(black_box(&window)))
    });

    group.bench_function("window_miss", |b| {
        let window = BBox::new(-500.0, -500.0, -400.0, -400.0);
        b.iter(|| tree.search(black_box(&window)))
    });

    group.bench_function("remove_reinsert", |b| {
        let (x, y) = (f64::from(5_000u32 % 1000) * 2.0, f64::from(5_000u32 / 1000) * 2.0);
        let target = BBox::new(x, y, x + 1.0, y + 1.0);
        b.iter(|| {
            let removed = tree.remove_with(&target, |cell| cell.id == 5_000);
            tree.insert(removed.unwrap());
        })
    });

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicate_queries");

    let mut db = GeoDb::new();
    let docs: Vec<(i64, GeoJson)> = (0..10_000)
        .map(|i| (i, point(f64::from(i % 100), f64::from(i / 100))))
        .collect();
    db.load(docs).unwrap();

    group.bench_function("coveredby_window", |b| {
        let window = rect(40.0, 40.0, 50.0, 50.0);
        b.iter(|| db.coveredby(black_box(&window)).unwrap())
    });

    group.bench_function("intersects_point", |b| {
        let probe = point(37.0, 52.0);
        b.iter(|| db.intersects(black_box(&probe)).unwrap())
    });

    // Disjoint cannot prune; this is the full-scan worst case.
    group.bench_function("disjoint_full_scan", |b| {
        let window = rect(40.0, 40.0, 50.0, 50.0);
        b.iter(|| db.disjoint(black_box(&window)).unwrap())
    });

    group.finish();
}

fn benchmark_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion");

    group.bench_function("add_1000_points", |b| {
        b.iter_batched(
            || {
                (0..1_000i64)
                    .map(|i| (i, point(f64::from(i as i32 % 100), f64::from(i as i32 / 100))))
                    .collect::<Vec<_>>()
            },
            |docs| {
                let mut db = GeoDb::new();
                for (id, doc) in docs {
                    db.add(id, &doc).unwrap();
                }
                db
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("load_1000_points", |b| {
        b.iter_batched(
            || {
                (0..1_000i64)
                    .map(|i| (i, point(f64::from(i as i32 % 100), f64::from(i as i32 / 100))))
                    .collect::<Vec<_>>()
            },
            |docs| {
                let mut db = GeoDb::new();
                db.load(docs).unwrap();
                db
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_tree_construction,
    benchmark_tree_search,
    benchmark_queries,
    benchmark_ingestion
);
criterion_main!(benches);
