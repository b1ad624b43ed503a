use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

use super::RecordSource;
use crate::error::{AnalyticsError, Result};
use crate::model::RawRestaurant;

/// Reads records from a CSV export with a header row.
///
/// Files ending in `.gz` are decompressed on the fly.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_gzip(&self) -> bool {
        self.path.extension().and_then(|e| e.to_str()) == Some("gz")
    }

    fn unavailable(&self, reason: impl ToString) -> AnalyticsError {
        AnalyticsError::SourceUnavailable {
            source_name: self.name(),
            reason: reason.to_string(),
        }
    }

    /// Errors raised once the file is open, including I/O errors from a
    /// corrupt gzip stream, mean the content is bad rather than unreachable.
    fn csv_error(&self, e: csv::Error) -> AnalyticsError {
        AnalyticsError::MalformedRecord {
            line: e.position().map(|p| p.line()).unwrap_or_default(),
            reason: e.to_string(),
        }
    }
}

impl RecordSource for CsvSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    #[tracing::instrument(skip(self), fields(source = %self.path.display()))]
    fn load(&self) -> Result<Vec<RawRestaurant>> {
        let file = File::open(&self.path).map_err(|e| self.unavailable(e))?;
        let reader: Box<dyn Read> = if self.is_gzip() {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        debug!(gzip = self.is_gzip(), "Reading CSV records");

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers().map_err(|e| self.csv_error(e))?.clone();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let raw: RawRestaurant = record.deserialize(Some(&headers)).map_err(|e| {
                AnalyticsError::MalformedRecord {
                    line,
                    reason: e.to_string(),
                }
            })?;
            raw.validate(line)?;
            rows.push(raw);
        }

        info!(records = rows.len(), "Loaded CSV records");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const HEADER: &str =
        "Restaurant_Name,Category,Pricing_for_2,Locality,Dining_Rating,Dining_Review_Count,Website\n";

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("{HEADER}{body}")).unwrap();
        path
    }

    #[test]
    fn test_loads_rows_and_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "r.csv",
            "Cafe Lota,\"Cafe, North Indian\",1200,\"Pragati Maidan, New Delhi\",4.5,1500,http://x\n\
             Sparse,,,,,,\n",
        );

        let rows = CsvSource::new(&path).load().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category.as_deref(), Some("Cafe, North Indian"));
        assert_eq!(rows[0].pricing_for_2, Some(1200.0));
        assert_eq!(rows[0].dining_review_count, Some(1500));
        assert_eq!(rows[1].dining_rating, None);
        assert_eq!(rows[1].locality, None);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = CsvSource::new("/no/such/restaurants.csv").load().unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_unparseable_field_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "bad.csv",
            "Good,Cafe,500,\"A, Noida\",4.0,10,\n\
             Bad,Cafe,cheap,\"B, Noida\",4.0,10,\n",
        );

        match CsvSource::new(&path).load() {
            Err(AnalyticsError::MalformedRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_rating_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "range.csv", "Odd,Cafe,500,\"A, Noida\",9.1,10,\n");
        assert!(matches!(
            CsvSource::new(&path).load(),
            Err(AnalyticsError::MalformedRecord { line: 2, .. })
        ));
    }

    #[test]
    fn test_corrupt_gzip_is_malformed_not_transient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv.gz");
        std::fs::write(&path, b"this is not gzip data").unwrap();

        let err = CsvSource::new(&path).load().unwrap_err();
        assert!(matches!(err, AnalyticsError::MalformedRecord { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_reads_gzip_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.csv.gz");

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(format!("{HEADER}Olive,Italian,3000,\"Mehrauli, New Delhi\",4.7,800,\n").as_bytes())
            .unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let rows = CsvSource::new(&path).load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Olive");
    }
}
