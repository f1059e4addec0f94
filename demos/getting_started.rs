//! Minimal walkthrough: index a few landmarks, ask topological questions.
//!
//! Run with `RUST_LOG=debug` to watch the query pipeline.

use geodex::prelude::*;
use serde_json::json;

fn main() -> Result<()> {
    env_logger::init();

    let mut db = Geodex::new();

    let landmarks = [
        ("space_needle", json!({ "type": "Point", "coordinates": [-122.349, 47.620] })),
        ("pike_place", json!({ "type": "Point", "coordinates": [-122.342, 47.609] })),
        ("mount_rainier", json!({ "type": "Point", "coordinates": [-121.760, 46.853] })),
    ];
    for (id, value) in landmarks {
        let doc = GeoJson::from_json_value(value).expect("static fixture");
        let record = db.add(id, &doc)?;
        println!("indexed {} at {:?}", record.id, record.bbox);
    }

    let downtown = GeoJson::from_json_value(json!({
        "type": "Polygon",
        "coordinates": [[
            [-122.37, 47.59], [-122.32, 47.59],
            [-122.32, 47.63], [-122.37, 47.63],
            [-122.37, 47.59]
        ]]
    }))
    .expect("static fixture");

    println!("within downtown:   {:?}", db.within(&downtown)?);
    println!("outside downtown:  {:?}", db.disjoint(&downtown)?);

    db.remove("pike_place");
    println!("after removal:     {:?}", db.within(&downtown)?);

    Ok(())
}
