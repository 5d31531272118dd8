//! Sparse 1-degree wind lookup keyed by rounded geographic cell.

mod ingest;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{inverse_project, Coordinate, GeoPoint};

pub use ingest::{parse_csv, read_csv, records_from_gfs_json, write_csv, CsvDialect, IngestError};

/// Source wind components are multiplied by this to get a per-tick
/// displacement in projected metres.
pub const WIND_SCALE: f64 = 100.0;

/// One row of the wind table, in source units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindRecord {
    pub u: f64,
    pub v: f64,
    pub lat: f64,
    pub lon: f64,
}

/// Per-tick displacement in projected units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindVector {
    pub u: f64,
    pub v: f64,
}

/// Integer cell key. Longitude is the first component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub lon: i32,
    pub lat: i32,
}

/// How a rounded longitude is folded into a cell key.
///
/// GFS tables store longitudes in `0..360`. `Wrap360` folds negative
/// (western) longitudes onto that range so both hemispheres resolve to
/// their own cells. `Absolute` keeps the legacy behaviour of taking
/// `|round(lon)|` on lookup, which maps 20°W onto 20°E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongitudePolicy {
    #[default]
    Wrap360,
    Absolute,
}

impl LongitudePolicy {
    fn insert_key(self, lon: i32) -> i32 {
        match self {
            LongitudePolicy::Wrap360 => lon.rem_euclid(360),
            LongitudePolicy::Absolute => lon,
        }
    }

    fn lookup_key(self, lon: i32) -> i32 {
        match self {
            LongitudePolicy::Wrap360 => lon.rem_euclid(360),
            LongitudePolicy::Absolute => lon.abs(),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WindError {
    #[error("no wind data for cell lat {lat}, lon {lon}")]
    CellNotFound { lat: i32, lon: i32 },
}

#[derive(Debug, Clone, Default)]
pub struct WindField {
    cells: HashMap<Cell, WindVector>,
    policy: LongitudePolicy,
}

impl WindField {
    pub fn new(policy: LongitudePolicy) -> Self {
        Self {
            cells: HashMap::new(),
            policy,
        }
    }

    /// Builds the field from parsed records. A later record for the same
    /// cell replaces an earlier one.
    pub fn build(records: impl IntoIterator<Item = WindRecord>, policy: LongitudePolicy) -> Self {
        let mut field = Self::new(policy);
        for record in records {
            field.insert(&record);
        }
        field
    }

    pub fn insert(&mut self, record: &WindRecord) {
        let cell = Cell {
            lon: self.policy.insert_key(round_degree(record.lon)),
            lat: round_degree(record.lat),
        };
        self.cells.insert(
            cell,
            WindVector {
                u: record.u * WIND_SCALE,
                v: record.v * WIND_SCALE,
            },
        );
    }

    /// Cell a geographic point resolves to under this field's longitude policy.
    pub fn cell_for(&self, geo: GeoPoint) -> Cell {
        Cell {
            lon: self.policy.lookup_key(round_degree(geo.lon)),
            lat: round_degree(geo.lat),
        }
    }

    pub fn lookup(&self, position: &Coordinate) -> Result<WindVector, WindError> {
        let cell = self.cell_for(inverse_project(position));
        self.cells
            .get(&cell)
            .copied()
            .ok_or(WindError::CellNotFound {
                lat: cell.lat,
                lon: cell.lon,
            })
    }

    pub fn policy(&self) -> LongitudePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn round_degree(value: f64) -> i32 {
    value.round() as i32
}
