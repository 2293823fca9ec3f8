use std::io::Write;

use super::BatchError;
use crate::analytics::domain::ScoredRecord;

pub const EXPORT_HEADER: [&str; 4] = ["Row", "Persona", "Risk Score", "Risk Tier"];

/// Flat prediction dump, one line per scored record in the given order.
pub fn export_predictions<W: Write>(records: &[ScoredRecord], writer: W) -> Result<(), BatchError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXPORT_HEADER)?;

    for scored in records {
        csv_writer.write_record([
            scored.row.to_string().as_str(),
            scored.persona().name(),
            scored.risk.risk_score.to_string().as_str(),
            scored.risk.tier.label(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_to_string(records: &[ScoredRecord]) -> Result<String, BatchError> {
    let mut buffer = Vec::new();
    export_predictions(records, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
