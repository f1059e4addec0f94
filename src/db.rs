//! The query pipeline: GeoJSON ingestion, rectangle pruning, exact
//! topological filtering.
//!
//! `GeoDb` owns an [`RTree`] of geometry entries plus an identifier map used
//! for replacement and removal. Queries run in two phases: the index yields
//! candidates whose rectangles overlap the probe rectangle, then the
//! topology oracle confirms or rejects each candidate exactly. Pruning never
//! affects correctness for the nine local predicates; `disjoint` probes with
//! the all-plane envelope instead, trading the scan for exactness.

use geo::Geometry;
use geojson::GeoJson;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::error::{GeodexError, Result};
use crate::relate::{De9imOracle, SpatialPredicate, TopologyOracle};
use crate::rtree::{RTree, SpatialObject};
use crate::types::{Config, DocId};

/// One indexed document: identifier, envelope, and parsed geometry.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: DocId,
    pub bbox: BBox,
    pub geometry: Geometry<f64>,
}

impl SpatialObject for Entry {
    fn envelope(&self) -> BBox {
        self.bbox
    }
}

/// Ingestion receipt: what was indexed and under which bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: DocId,
    pub bbox: BBox,
}

/// In-memory geospatial database over GeoJSON documents.
///
/// # Example
///
/// ```rust
/// use geodex::GeoDb;
/// use geojson::GeoJson;
///
/// let mut db = GeoDb::new();
/// let doc: GeoJson = r#"{"type": "Point", "coordinates": [2.0, 3.0]}"#.parse().unwrap();
/// db.add("landmark", &doc).unwrap();
///
/// let probe: GeoJson = r#"{
///     "type": "Polygon",
///     "coordinates": [[[0.0, 0.0], [5.0, 0.0], [5.0, 5.0], [0.0, 5.0], [0.0, 0.0]]]
/// }"#.parse().unwrap();
/// let hits = db.contains(&probe).unwrap();
/// assert_eq!(hits.len(), 0); // a point contains no polygon
/// let hits = db.within(&probe).unwrap();
/// assert_eq!(hits.len(), 1);
/// ```
pub struct GeoDb {
    tree: RTree<Entry>,
    bounds_by_id: FxHashMap<DocId, BBox>,
    oracle: Box<dyn TopologyOracle + Send + Sync>,
}

impl GeoDb {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_oracle(config, Box::new(De9imOracle))
    }

    /// Construct with a custom topology engine.
    pub fn with_oracle(config: Config, oracle: Box<dyn TopologyOracle + Send + Sync>) -> Self {
        Self {
            tree: RTree::with_config(&config),
            bounds_by_id: FxHashMap::default(),
            oracle,
        }
    }

    /// Index one document under `id`. A document already held under the same
    /// identifier is replaced.
    ///
    /// Accepts a bare GeoJSON geometry or a feature; feature collections and
    /// documents without computable finite bounds are rejected.
    pub fn add(&mut self, id: impl Into<DocId>, doc: &GeoJson) -> Result<EntryRecord> {
        let id = id.into();
        let (geometry, bbox) = Self::payload(doc)?;

        if let Some(old) = self.bounds_by_id.remove(&id) {
            log::debug!("replacing entry {id}");
            self.tree.remove_with(&old, |entry| entry.id == id);
        }

        self.bounds_by_id.insert(id.clone(), bbox);
        self.tree.insert(Entry {
            id: id.clone(),
            bbox,
            geometry,
        });
        log::debug!("indexed entry {id}, {} total", self.tree.len());

        Ok(EntryRecord { id, bbox })
    }

    /// Index a batch of documents in one bulk-load pass.
    ///
    /// All-or-nothing: every document is validated before any is indexed, so
    /// one malformed record leaves the database untouched. When an identifier
    /// repeats within the batch the last occurrence wins; identifiers already
    /// held are replaced, as with [`GeoDb::add`].
    pub fn load<I, K>(&mut self, docs: I) -> Result<Vec<EntryRecord>>
    where
        I: IntoIterator<Item = (K, GeoJson)>,
        K: Into<DocId>,
    {
        let mut entries = Vec::new();
        for (id, doc) in docs {
            let (geometry, bbox) = Self::payload(&doc)?;
            entries.push(Entry {
                id: id.into(),
                bbox,
                geometry,
            });
        }

        // Last occurrence wins for identifiers repeated within the batch.
        let mut seen = FxHashSet::default();
        let mut deduped = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().rev() {
            if seen.insert(entry.id.clone()) {
                deduped.push(entry);
            }
        }
        deduped.reverse();

        for entry in &deduped {
            if let Some(old) = self.bounds_by_id.remove(&entry.id) {
                self.tree.remove_with(&old, |held| held.id == entry.id);
            }
            self.bounds_by_id.insert(entry.id.clone(), entry.bbox);
        }

        let records = deduped
            .iter()
            .map(|entry| EntryRecord {
                id: entry.id.clone(),
                bbox: entry.bbox,
            })
            .collect();
        let count = deduped.len();
        self.tree.bulk_load(deduped);
        log::debug!("bulk-loaded {count} entries, {} total", self.tree.len());

        Ok(records)
    }

    /// Drop the document held under `id`. Returns the identifier whether or
    /// not anything was held under it, so removal is idempotent.
    pub fn remove(&mut self, id: impl Into<DocId>) -> DocId {
        let id = id.into();
        if let Some(bbox) = self.bounds_by_id.remove(&id) {
            self.tree.remove_with(&bbox, |entry| entry.id == id);
            log::debug!("removed entry {id}, {} remaining", self.tree.len());
        }
        id
    }

    /// Identifiers of all held documents satisfying
    /// `candidate <predicate> query`. Result order follows index traversal
    /// and is otherwise unspecified.
    pub fn evaluate(&self, predicate: SpatialPredicate, query: &GeoJson) -> Result<Vec<DocId>> {
        let (query_geometry, query_bbox) = Self::payload(query)?;
        let probe = if predicate.prunes_by_bbox() {
            query_bbox
        } else {
            BBox::GLOBAL
        };

        let candidates = self.tree.search(&probe);
        let scanned = candidates.len();
        let hits: Vec<DocId> = candidates
            .into_iter()
            .filter(|entry| {
                self.oracle
                    .relate(&entry.geometry, &query_geometry, predicate)
            })
            .map(|entry| entry.id.clone())
            .collect();
        log::debug!(
            "{predicate}: {} of {scanned} candidates matched",
            hits.len()
        );

        Ok(hits)
    }

    pub fn contains(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::Contains, query)
    }

    pub fn coveredby(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::CoveredBy, query)
    }

    pub fn covers(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::Covers, query)
    }

    pub fn crosses(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::Crosses, query)
    }

    pub fn disjoint(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::Disjoint, query)
    }

    pub fn equals(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::Equals, query)
    }

    pub fn intersects(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::Intersects, query)
    }

    pub fn overlaps(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::Overlaps, query)
    }

    pub fn touches(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::Touches, query)
    }

    pub fn within(&self, query: &GeoJson) -> Result<Vec<DocId>> {
        self.evaluate(SpatialPredicate::Within, query)
    }

    /// Number of documents currently held.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Envelope of the document held under `id`, if any.
    pub fn bounds_of(&self, id: &DocId) -> Option<BBox> {
        self.bounds_by_id.get(id).copied()
    }

    /// Read access to the underlying index.
    pub fn tree(&self) -> &RTree<Entry> {
        &self.tree
    }

    /// Extract geometry and envelope from a GeoJSON document.
    ///
    /// A carried `bbox` member is trusted when well-formed (a feature-level
    /// bbox shadows the geometry-level one); otherwise bounds are derived
    /// from the coordinates.
    fn payload(doc: &GeoJson) -> Result<(Geometry<f64>, BBox)> {
        let (value, carried) = match doc {
            GeoJson::Geometry(geometry) => (&geometry.value, geometry.bbox.as_deref()),
            GeoJson::Feature(feature) => {
                let geometry = feature.geometry.as_ref().ok_or_else(|| {
                    GeodexError::MalformedGeometry("feature without geometry".to_string())
                })?;
                (
                    &geometry.value,
                    feature.bbox.as_deref().or(geometry.bbox.as_deref()),
                )
            }
            GeoJson::FeatureCollection(_) => {
                return Err(GeodexError::MalformedGeometry(
                    "feature collections cannot be indexed as one document".to_string(),
                ));
            }
        };

        let geometry = Geometry::<f64>::try_from(value.clone())?;

        let bbox = carried
            .and_then(BBox::from_geojson_bbox)
            .or_else(|| BBox::from_geometry(&geometry))
            .ok_or_else(|| {
                GeodexError::MalformedGeometry("geometry has no extent".to_string())
            })?;
        if !bbox.is_finite() {
            return Err(GeodexError::MalformedGeometry(
                "geometry has non-finite bounds".to_string(),
            ));
        }

        Ok((geometry, bbox))
    }
}

impl Default for GeoDb {
    fn default() -> Self {
        Self::new()
    }
}
