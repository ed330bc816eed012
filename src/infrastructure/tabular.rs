//! CSV row source.
//!
//! Header names are trimmed and lower-cased before matching, so
//! `" Resource_Name "` and `resource_name` address the same column. Missing
//! columns yield `None` fields; unknown columns are ignored.

use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, instrument};

use crate::domain::Row;
use crate::infrastructure::traits::RowSource;

/// Parse rows from any reader producing CSV with a header line.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<Row>, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    debug!(?headers, "normalized headers");
    rdr.set_headers(headers);

    rdr.deserialize::<Row>().collect()
}

/// Reads rows from CSV files on disk.
#[derive(Debug, Default)]
pub struct CsvRowSource;

impl RowSource for CsvRowSource {
    #[instrument(level = "debug", skip(self))]
    fn read_rows(&self, path: &Path) -> io::Result<Vec<Row>> {
        let file = std::fs::File::open(path)?;
        let rows = parse_rows(io::BufReader::new(file)).map_err(|e| {
            if e.is_io_error() {
                io::Error::from(e)
            } else {
                io::Error::new(io::ErrorKind::InvalidData, e)
            }
        })?;
        debug!(rows = rows.len(), "read csv");
        Ok(rows)
    }
}
