use crate::core::columns::{self, Columns};
use crate::domain::model::{ProcessingStats, RecordIssue, ReferenceCode, ReferenceRecord};
use crate::utils::error::Result;
use std::collections::{HashMap, HashSet};
use std::io::Read;

pub const REFERENCE_FILE: &str = "ACFTREF.txt";

/// Aircraft reference data keyed by manufacturer/model/series code.
///
/// Built once from `ACFTREF.txt` and only read afterwards. When a code appears
/// more than once the last row wins.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    entries: HashMap<ReferenceCode, ReferenceRecord>,
    manufacturers: HashSet<String>,
}

impl ReferenceIndex {
    pub fn from_reader<R: Read>(
        input: R,
        delimiter: u8,
        stats: &mut ProcessingStats,
    ) -> Result<Self> {
        let mut reader = columns::reader(input, delimiter);
        let layout = Columns::from_headers(REFERENCE_FILE, reader.byte_headers()?);

        let code_column = layout.required("CODE")?;
        let make_column = layout.required("MFR")?;
        let model_column = layout.required("MODEL")?;
        let year_column = layout.optional(&["YEAR MFR", "YEAR"]);

        let mut entries = HashMap::new();

        for result in reader.byte_records() {
            let record = result?;
            let line = columns::line(&record);
            stats.reference_rows += 1;

            if record.len() != layout.width() {
                stats.record(RecordIssue::MalformedReference {
                    line,
                    reason: format!(
                        "expected {} fields, found {}",
                        layout.width(),
                        record.len()
                    ),
                });
                continue;
            }

            let code = columns::field(&record, code_column);
            if code.is_empty() {
                stats.record(RecordIssue::MalformedReference {
                    line,
                    reason: "empty aircraft code".to_string(),
                });
                continue;
            }

            let entry = ReferenceRecord {
                make: columns::field(&record, make_column),
                model: columns::field(&record, model_column),
                year: year_column
                    .map(|column| columns::field(&record, column))
                    .filter(|year| !year.is_empty()),
            };

            if entries.insert(ReferenceCode::new(code), entry).is_some() {
                stats.duplicate_reference_codes += 1;
                tracing::debug!("Duplicate aircraft code on line {}, keeping the later row", line);
            }
        }

        stats.reference_entries = entries.len() as u64;
        let manufacturers = entries
            .keys()
            .map(|code| code.manufacturer().to_string())
            .collect();

        Ok(Self {
            entries,
            manufacturers,
        })
    }

    pub fn get(&self, code: &ReferenceCode) -> Option<&ReferenceRecord> {
        self.entries.get(code)
    }

    /// Whether any entry shares the manufacturer part of `code`.
    pub fn has_manufacturer(&self, code: &ReferenceCode) -> bool {
        self.manufacturers.contains(code.manufacturer())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
