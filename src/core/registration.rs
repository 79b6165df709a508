use crate::core::columns::{self, Columns};
use crate::core::reference::ReferenceIndex;
use crate::domain::model::{
    OutputRow, ProcessingStats, RecordIssue, ReferenceCode, RegistrantType, RegistrationRecord,
    UnresolvedPolicy,
};
use crate::utils::error::Result;
use csv::ByteRecordsIntoIter;
use std::io::Read;

pub const REGISTRATION_FILE: &str = "MASTER.txt";

struct RegistrationColumns {
    tail_number: usize,
    reference_code: usize,
    year: Option<usize>,
    registrant_type: usize,
    owner_name: usize,
    city: usize,
    state: usize,
    mode_s_hex: usize,
    width: usize,
}

impl RegistrationColumns {
    fn locate(layout: &Columns) -> Result<Self> {
        Ok(Self {
            tail_number: layout.required("N-NUMBER")?,
            reference_code: layout.required("MFR MDL CODE")?,
            year: layout.optional(&["YEAR MFR"]),
            registrant_type: layout.required("TYPE REGISTRANT")?,
            owner_name: layout.required("NAME")?,
            city: layout.required("CITY")?,
            state: layout.required("STATE")?,
            mode_s_hex: layout.required("MODE S CODE HEX")?,
            width: layout.width(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRow {
    Valid { line: u64, record: RegistrationRecord },
    Malformed(RecordIssue),
}

/// Lazily parses `MASTER.txt` rows in file order.
pub struct RegistrationReader<R: Read> {
    records: ByteRecordsIntoIter<R>,
    columns: RegistrationColumns,
}

impl<R: Read> RegistrationReader<R> {
    pub fn new(input: R, delimiter: u8) -> Result<Self> {
        let mut reader = columns::reader(input, delimiter);
        let layout = Columns::from_headers(REGISTRATION_FILE, reader.byte_headers()?);
        let columns = RegistrationColumns::locate(&layout)?;

        Ok(Self {
            records: reader.into_byte_records(),
            columns,
        })
    }

    fn parse(&self, record: &csv::ByteRecord) -> ParsedRow {
        let line = columns::line(record);
        let c = &self.columns;

        if record.len() != c.width {
            return ParsedRow::Malformed(RecordIssue::MalformedRegistration {
                line,
                reason: format!("expected {} fields, found {}", c.width, record.len()),
            });
        }

        let tail_number = columns::field(record, c.tail_number);
        if tail_number.is_empty() {
            return ParsedRow::Malformed(RecordIssue::MalformedRegistration {
                line,
                reason: "missing N-number".to_string(),
            });
        }

        ParsedRow::Valid {
            line,
            record: RegistrationRecord {
                tail_number,
                reference_code: ReferenceCode::new(columns::field(record, c.reference_code)),
                year: c
                    .year
                    .map(|column| columns::field(record, column))
                    .filter(|year| !year.is_empty()),
                owner_name: columns::field(record, c.owner_name),
                city: columns::field(record, c.city),
                state: columns::field(record, c.state),
                mode_s_hex: columns::field(record, c.mode_s_hex),
                registrant_type_code: columns::field(record, c.registrant_type),
            },
        }
    }
}

impl<R: Read> Iterator for RegistrationReader<R> {
    type Item = Result<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(Ok(self.parse(&record)))
    }
}

/// Joins registrations against the reference index.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationTransformer<'i> {
    index: &'i ReferenceIndex,
    policy: UnresolvedPolicy,
}

impl<'i> RegistrationTransformer<'i> {
    pub fn new(index: &'i ReferenceIndex, policy: UnresolvedPolicy) -> Self {
        Self { index, policy }
    }

    /// Returns `None` when the row is dropped by the unresolved policy.
    pub fn transform_record(
        &self,
        line: u64,
        record: RegistrationRecord,
        stats: &mut ProcessingStats,
    ) -> Option<OutputRow> {
        let RegistrationRecord {
            tail_number,
            reference_code,
            year,
            owner_name,
            city,
            state,
            mode_s_hex,
            registrant_type_code,
        } = record;

        let (make, model, year) = match self.index.get(&reference_code) {
            Some(reference) => (
                reference.make.clone(),
                reference.model.clone(),
                reference.year.clone().or(year),
            ),
            None => {
                stats.record(RecordIssue::UnresolvedReference {
                    line,
                    tail_number: tail_number.clone(),
                    known_manufacturer: self.index.has_manufacturer(&reference_code),
                    code: reference_code,
                });
                match self.policy {
                    UnresolvedPolicy::Drop => {
                        stats.dropped_rows += 1;
                        return None;
                    }
                    UnresolvedPolicy::Blank => (String::new(), String::new(), year),
                    UnresolvedPolicy::Unknown => {
                        ("Unknown".to_string(), "Unknown".to_string(), year)
                    }
                }
            }
        };

        let registrant_type = match RegistrantType::from_code(&registrant_type_code) {
            Some(registrant_type) => registrant_type,
            None => {
                if !registrant_type_code.is_empty() {
                    stats.record(RecordIssue::UnmappedRegistrantType {
                        line,
                        tail_number: tail_number.clone(),
                        code: registrant_type_code,
                    });
                }
                RegistrantType::Unknown
            }
        };

        Some(OutputRow {
            tail_number,
            make,
            model,
            year: year.unwrap_or_default(),
            owner_name,
            city,
            state,
            mode_s_hex,
            registrant_type,
        })
    }

    pub fn rows<'s, R: Read>(
        self,
        reader: RegistrationReader<R>,
        stats: &'s mut ProcessingStats,
    ) -> OutputRows<'i, 's, R> {
        OutputRows {
            reader,
            transformer: self,
            stats,
        }
    }
}

/// Output rows in registration file order; malformed and dropped records are
/// counted in the stats and never yielded.
pub struct OutputRows<'i, 's, R: Read> {
    reader: RegistrationReader<R>,
    transformer: RegistrationTransformer<'i>,
    stats: &'s mut ProcessingStats,
}

impl<R: Read> Iterator for OutputRows<'_, '_, R> {
    type Item = Result<OutputRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let parsed = match self.reader.next()? {
                Ok(parsed) => parsed,
                Err(e) => return Some(Err(e)),
            };
            self.stats.registration_rows += 1;

            match parsed {
                ParsedRow::Malformed(issue) => self.stats.record(issue),
                ParsedRow::Valid { line, record } => {
                    if let Some(row) = self.transformer.transform_record(line, record, self.stats) {
                        self.stats.rows_emitted += 1;
                        return Some(Ok(row));
                    }
                }
            }
        }
    }
}
