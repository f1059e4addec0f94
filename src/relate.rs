//! Topological predicates and their exact evaluation.
//!
//! Candidate geometries that survive rectangle pruning are checked against
//! the query geometry with a DE-9IM intersection matrix. The matrix is
//! computed once per candidate and interrogated for the requested predicate,
//! with the candidate geometry always on the left-hand side, so asymmetric
//! predicates (contains, within, covers, coveredby) read as "candidate
//! <predicate> query".

use geo::{Geometry, Relate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The ten supported spatial relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialPredicate {
    Contains,
    CoveredBy,
    Covers,
    Crosses,
    Disjoint,
    Equals,
    Intersects,
    Overlaps,
    Touches,
    Within,
}

impl SpatialPredicate {
    pub const ALL: [SpatialPredicate; 10] = [
        SpatialPredicate::Contains,
        SpatialPredicate::CoveredBy,
        SpatialPredicate::Covers,
        SpatialPredicate::Crosses,
        SpatialPredicate::Disjoint,
        SpatialPredicate::Equals,
        SpatialPredicate::Intersects,
        SpatialPredicate::Overlaps,
        SpatialPredicate::Touches,
        SpatialPredicate::Within,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpatialPredicate::Contains => "contains",
            SpatialPredicate::CoveredBy => "coveredby",
            SpatialPredicate::Covers => "covers",
            SpatialPredicate::Crosses => "crosses",
            SpatialPredicate::Disjoint => "disjoint",
            SpatialPredicate::Equals => "equals",
            SpatialPredicate::Intersects => "intersects",
            SpatialPredicate::Overlaps => "overlaps",
            SpatialPredicate::Touches => "touches",
            SpatialPredicate::Within => "within",
        }
    }

    /// Whether rectangle pruning applies. Disjoint is the one predicate that
    /// can hold for candidates arbitrarily far from the query geometry, so
    /// its scan must visit every entry.
    pub fn prunes_by_bbox(&self) -> bool {
        !matches!(self, SpatialPredicate::Disjoint)
    }
}

impl fmt::Display for SpatialPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpatialPredicate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(SpatialPredicate::Contains),
            "coveredby" => Ok(SpatialPredicate::CoveredBy),
            "covers" => Ok(SpatialPredicate::Covers),
            "crosses" => Ok(SpatialPredicate::Crosses),
            "disjoint" => Ok(SpatialPredicate::Disjoint),
            "equals" => Ok(SpatialPredicate::Equals),
            "intersects" => Ok(SpatialPredicate::Intersects),
            "overlaps" => Ok(SpatialPredicate::Overlaps),
            "touches" => Ok(SpatialPredicate::Touches),
            "within" => Ok(SpatialPredicate::Within),
            other => Err(format!("unknown spatial predicate: {other}")),
        }
    }
}

/// Exact-evaluation seam of the query pipeline.
///
/// The database consults an oracle for every candidate that survives
/// rectangle pruning; swapping the implementation swaps the topology engine
/// without touching indexing or ingestion.
pub trait TopologyOracle {
    /// Whether `candidate <predicate> query` holds.
    fn relate(
        &self,
        candidate: &Geometry<f64>,
        query: &Geometry<f64>,
        predicate: SpatialPredicate,
    ) -> bool;
}

/// Default oracle: full DE-9IM intersection matrices.
#[derive(Debug, Clone, Copy, Default)]
pub struct De9imOracle;

impl TopologyOracle for De9imOracle {
    fn relate(
        &self,
        candidate: &Geometry<f64>,
        query: &Geometry<f64>,
        predicate: SpatialPredicate,
    ) -> bool {
        let matrix = candidate.relate(query);
        match predicate {
            SpatialPredicate::Contains => matrix.is_contains(),
            SpatialPredicate::CoveredBy => matrix.is_coveredby(),
            SpatialPredicate::Covers => matrix.is_covers(),
            SpatialPredicate::Crosses => matrix.is_crosses(),
            SpatialPredicate::Disjoint => matrix.is_disjoint(),
            SpatialPredicate::Equals => matrix.is_equal_topo(),
            SpatialPredicate::Intersects => matrix.is_intersects(),
            SpatialPredicate::Overlaps => matrix.is_overlaps(),
            SpatialPredicate::Touches => matrix.is_touches(),
            SpatialPredicate::Within => matrix.is_within(),
        }
    }
}
