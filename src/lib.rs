//! Embedded in-memory geospatial index answering exact topological queries
//! over GeoJSON documents.
//!
//! Documents are reduced to bounding rectangles held in an R-tree; queries
//! prune by rectangle overlap, then confirm each surviving candidate with a
//! DE-9IM intersection matrix.
//!
//! ```rust
//! use geodex::{DocId, Geodex};
//! use geojson::GeoJson;
//!
//! let mut db = Geodex::new();
//! let seattle: GeoJson = r#"{"type": "Point", "coordinates": [-122.33, 47.61]}"#
//!     .parse()
//!     .unwrap();
//! db.add("seattle", &seattle)?;
//!
//! let washington: GeoJson = r#"{
//!     "type": "Polygon",
//!     "coordinates": [[[-124.8, 45.5], [-116.9, 45.5], [-116.9, 49.0], [-124.8, 49.0], [-124.8, 45.5]]]
//! }"#.parse().unwrap();
//! assert_eq!(db.coveredby(&washington)?, vec![DocId::from("seattle")]);
//! # Ok::<(), geodex::GeodexError>(())
//! ```

pub mod bbox;
pub mod db;
pub mod error;
pub mod relate;
pub mod rtree;
pub mod types;

pub use bbox::BBox;
pub use db::{Entry, EntryRecord, GeoDb};
pub use error::{GeodexError, Result};
pub use relate::{De9imOracle, SpatialPredicate, TopologyOracle};
pub use rtree::{RTree, SpatialObject, TreeStats};
pub use types::{Config, DocId};

pub type Geodex = GeoDb;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoDb, Geodex, GeodexError, Result};

    pub use crate::{BBox, Config, DocId};

    pub use crate::{De9imOracle, SpatialPredicate, TopologyOracle};

    pub use crate::rtree::{RTree, SpatialObject};

    pub use geojson::GeoJson;
}
