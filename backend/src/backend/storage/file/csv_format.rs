use csv::{ReaderBuilder, Writer};
use super::{FieldMap, FileFormat, FlatRecord};
use crate::backend::storage::error::DataAccessError;

/// CSV collection files: one header row naming the fields, one row per record
///
/// Reading matches cells to fields by header name, so files written with a
/// different column order still load.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormat;

impl FileFormat for CsvFormat {
    const EXTENSION: &'static str = "csv";

    fn decode<R: FlatRecord>(content: &str) -> Result<Vec<R>, DataAccessError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(content.as_bytes());

        let headers = csv_reader
            .headers()
            .map_err(|e| DataAccessError::serialization(R::ENTITY, e))?
            .clone();

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let row = result.map_err(|e| DataAccessError::serialization(R::ENTITY, e))?;

            let mut fields = FieldMap::new(R::ENTITY);
            for (name, value) in headers.iter().zip(row.iter()) {
                fields.insert(name.trim(), value);
            }

            records.push(R::from_fields(&fields)?);
        }

        Ok(records)
    }

    fn encode<R: FlatRecord>(records: &[R]) -> Result<String, DataAccessError> {
        let mut csv_writer = Writer::from_writer(Vec::new());

        csv_writer
            .write_record(R::FIELDS)
            .map_err(|e| DataAccessError::serialization(R::ENTITY, e))?;

        for record in records {
            csv_writer
                .write_record(record.to_fields())
                .map_err(|e| DataAccessError::serialization(R::ENTITY, e))?;
        }

        let bytes = csv_writer
            .into_inner()
            .map_err(|e| DataAccessError::serialization(R::ENTITY, e))?;
        String::from_utf8(bytes).map_err(|e| DataAccessError::serialization(R::ENTITY, e))
    }
}
