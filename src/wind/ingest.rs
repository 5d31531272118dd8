//! Wind table ingestion: the `U,V,la,lo` CSV and GFS surface-wind JSON.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::WindRecord;

/// GFS grids start at the north pole and prime meridian.
const GFS_FIRST_LAT: f64 = 90.0;
const GFS_LON_COUNT: u32 = 360;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("wind table io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed GFS json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("GFS document needs U and V grids, found {0}")]
    MissingGrid(usize),
}

/// Field separator and decimal mark of a wind CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvDialect {
    /// `,` between fields and `.` as decimal mark.
    #[default]
    Comma,
    /// `;` between fields and `,` as decimal mark.
    Semicolon,
}

impl CsvDialect {
    fn separator(self) -> char {
        match self {
            CsvDialect::Comma => ',',
            CsvDialect::Semicolon => ';',
        }
    }

    fn parse_field(self, raw: &str) -> Option<f64> {
        let raw = raw.trim();
        match self {
            CsvDialect::Comma => raw.parse().ok(),
            CsvDialect::Semicolon => raw.replace(',', ".").parse().ok(),
        }
    }

    fn format_field(self, value: f64) -> String {
        match self {
            CsvDialect::Comma => value.to_string(),
            CsvDialect::Semicolon => value.to_string().replace('.', ","),
        }
    }
}

/// Parses a wind table with header `U,V,la,lo`.
///
/// The header row is discarded and blank lines are skipped. A field that
/// does not parse, or is missing, reads as `0.0`; the row is still kept.
pub fn parse_csv(text: &str, dialect: CsvDialect) -> Vec<WindRecord> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split(dialect.separator());
        let mut values = [0.0_f64; 4];
        for (column, slot) in values.iter_mut().enumerate() {
            let raw = fields.next().unwrap_or("");
            match dialect.parse_field(raw) {
                Some(value) => *slot = value,
                None => debug!(line = index + 1, column, raw, "malformed wind field, using 0.0"),
            }
        }
        let [u, v, lat, lon] = values;
        records.push(WindRecord { u, v, lat, lon });
    }
    records
}

pub fn read_csv(path: impl AsRef<Path>, dialect: CsvDialect) -> Result<Vec<WindRecord>, IngestError> {
    let text = fs::read_to_string(path)?;
    Ok(parse_csv(&text, dialect))
}

#[derive(Debug, Deserialize)]
struct GfsGrid {
    data: Vec<f64>,
}

/// Converts a GFS surface-wind document (U grid then V grid) into records.
///
/// Samples are row-major: longitude runs `0..360` and latitude drops by one
/// degree after each full row, starting from 90.
pub fn records_from_gfs_json(text: &str) -> Result<Vec<WindRecord>, IngestError> {
    let grids: Vec<GfsGrid> = serde_json::from_str(text)?;
    let (u_grid, v_grid) = match grids.as_slice() {
        [u, v, ..] => (u, v),
        _ => return Err(IngestError::MissingGrid(grids.len())),
    };

    let mut records = Vec::with_capacity(u_grid.data.len().min(v_grid.data.len()));
    let mut lat = GFS_FIRST_LAT;
    let mut lon = 0_u32;
    for (&u, &v) in u_grid.data.iter().zip(&v_grid.data) {
        records.push(WindRecord {
            u,
            v,
            lat,
            lon: f64::from(lon),
        });
        lon += 1;
        if lon == GFS_LON_COUNT {
            lon = 0;
            lat -= 1.0;
        }
    }
    Ok(records)
}

/// Writes records back out in the `U,V,la,lo` layout `parse_csv` reads.
pub fn write_csv(
    records: &[WindRecord],
    mut out: impl Write,
    dialect: CsvDialect,
) -> Result<(), IngestError> {
    let sep = dialect.separator();
    writeln!(out, "U{sep}V{sep}la{sep}lo")?;
    for record in records {
        writeln!(
            out,
            "{}{sep}{}{sep}{}{sep}{}",
            dialect.format_field(record.u),
            dialect.format_field(record.v),
            dialect.format_field(record.lat),
            dialect.format_field(record.lon),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_discarded_and_columns_are_u_v_lat_lon() {
        let records = parse_csv("U,V,la,lo\n1.5,-2,10,20\n", CsvDialect::Comma);
        assert_eq!(
            records,
            vec![WindRecord {
                u: 1.5,
                v: -2.0,
                lat: 10.0,
                lon: 20.0
            }]
        );
    }

    #[test]
    fn malformed_fields_read_as_zero() {
        let records = parse_csv("U,V,la,lo\nabc,2,,20\n3,4\n\n", CsvDialect::Comma);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].u, 0.0);
        assert_eq!(records[0].lat, 0.0);
        assert_eq!(records[0].lon, 20.0);
        assert_eq!(records[1].lat, 0.0);
        assert_eq!(records[1].lon, 0.0);
    }

    #[test]
    fn semicolon_dialect_accepts_decimal_commas() {
        let records = parse_csv("U;V;la;lo\n0,25;-1,5;45;340\n", CsvDialect::Semicolon);
        assert_eq!(records[0].u, 0.25);
        assert_eq!(records[0].v, -1.5);
        assert_eq!(records[0].lon, 340.0);
    }

    #[test]
    fn gfs_grid_walks_longitude_then_latitude() {
        let u: Vec<f64> = (0..362).map(f64::from).collect();
        let v = vec![1.0; 362];
        let json = serde_json::json!([
            { "header": { "parameterNumber": 2 }, "data": u },
            { "header": { "parameterNumber": 3 }, "data": v },
        ]);
        let records = records_from_gfs_json(&json.to_string()).unwrap();
        assert_eq!(records.len(), 362);
        assert_eq!((records[0].lat, records[0].lon), (90.0, 0.0));
        assert_eq!((records[359].lat, records[359].lon), (90.0, 359.0));
        assert_eq!((records[360].lat, records[360].lon), (89.0, 0.0));
        assert_eq!(records[361].u, 361.0);
    }

    #[test]
    fn gfs_document_without_v_grid_is_rejected() {
        let err = records_from_gfs_json(r#"[{"data":[1.0]}]"#).unwrap_err();
        assert!(matches!(err, IngestError::MissingGrid(1)));
    }

    #[test]
    fn written_table_parses_back() {
        let records = vec![WindRecord {
            u: -0.5,
            v: 3.25,
            lat: -12.0,
            lon: 181.0,
        }];
        for dialect in [CsvDialect::Comma, CsvDialect::Semicolon] {
            let mut buffer = Vec::new();
            write_csv(&records, &mut buffer, dialect).unwrap();
            let text = String::from_utf8(buffer).unwrap();
            assert_eq!(parse_csv(&text, dialect), records);
        }
    }
}
