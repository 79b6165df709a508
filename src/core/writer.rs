use crate::domain::model::OutputRow;
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::path::Path;

/// Renders rows in the EmComm Tools format: a header line, then one
/// `|`-separated line per row. Fields are written verbatim, so a `|` inside a
/// value is not escaped.
pub fn render_rows(rows: &[OutputRow]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'|')
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(OutputRow::HEADER)?;
    for row in rows {
        writer.write_record(row.fields())?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

/// Replaces `path` with the rendered rows. Nothing is created if rendering fails.
pub async fn write_output<S: Storage>(storage: &S, path: &Path, rows: &[OutputRow]) -> Result<()> {
    let data = render_rows(rows)?;
    tracing::debug!("Writing {} bytes to {}", data.len(), path.display());
    storage.write_file(path, &data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RegistrantType;

    fn row(tail_number: &str, make: &str, registrant_type: RegistrantType) -> OutputRow {
        OutputRow {
            tail_number: tail_number.to_string(),
            make: make.to_string(),
            model: "172".to_string(),
            year: "1998".to_string(),
            owner_name: "Jane Doe".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            mode_s_hex: "A1B2C3".to_string(),
            registrant_type,
        }
    }

    #[test]
    fn test_render_header_and_rows() {
        let rows = vec![
            row("N12345", "Cessna", RegistrantType::Government),
            row("N6789", "", RegistrantType::Unknown),
        ];

        let output = String::from_utf8(render_rows(&rows).unwrap()).unwrap();
        assert_eq!(
            output,
            "tail_number|make|model|year|owner_name|city|state|mode_s_hex|registrant_type\n\
             N12345|Cessna|172|1998|Jane Doe|Austin|TX|A1B2C3|Government\n\
             N6789||172|1998|Jane Doe|Austin|TX|A1B2C3|Unknown\n"
        );
    }

    #[test]
    fn test_render_never_quotes() {
        let mut tricky = row("N1", "Smith, \"Jr\"", RegistrantType::Individual);
        tricky.owner_name = "A|B".to_string();

        let output = String::from_utf8(render_rows(&[tricky]).unwrap()).unwrap();
        let line = output.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "N1|Smith, \"Jr\"|172|1998|A|B|Austin|TX|A1B2C3|Individual"
        );
    }

    #[test]
    fn test_render_empty() {
        let output = render_rows(&[]).unwrap();
        assert_eq!(output.iter().filter(|b| **b == b'\n').count(), 1);
    }
}
