use crate::domain::model::FlatTable;
use crate::utils::error::{NuldcError, Result};

/// Header row followed by one row per record, standard CSV quoting.
pub fn to_csv_bytes(table: &FlatTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    writer.into_inner().map_err(|e| NuldcError::ProcessingError {
        message: format!("Failed to finish CSV output: {}", e),
    })
}
