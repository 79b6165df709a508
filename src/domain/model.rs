use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Composite aircraft reference code: 3 characters of manufacturer, 2 of
/// model and 2 of series, e.g. `2072738`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceCode(String);

impl ReferenceCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn manufacturer(&self) -> &str {
        self.part(0, 3)
    }

    pub fn model(&self) -> &str {
        self.part(3, 5)
    }

    pub fn series(&self) -> &str {
        self.part(5, 7)
    }

    fn part(&self, start: usize, end: usize) -> &str {
        let len = self.0.len();
        self.0.get(start.min(len)..end.min(len)).unwrap_or("")
    }
}

impl fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRecord {
    pub make: String,
    pub model: String,
    pub year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub tail_number: String,
    pub reference_code: ReferenceCode,
    pub year: Option<String>,
    pub owner_name: String,
    pub city: String,
    pub state: String,
    pub mode_s_hex: String,
    pub registrant_type_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrantType {
    Individual,
    Partnership,
    Corporation,
    CoOwned,
    Government,
    Llc,
    NonCitizenCorporation,
    NonCitizenCoOwned,
    Unknown,
}

impl RegistrantType {
    /// FAA `TYPE REGISTRANT` code. Code 6 is unassigned.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(RegistrantType::Individual),
            "2" => Some(RegistrantType::Partnership),
            "3" => Some(RegistrantType::Corporation),
            "4" => Some(RegistrantType::CoOwned),
            "5" => Some(RegistrantType::Government),
            "7" => Some(RegistrantType::Llc),
            "8" => Some(RegistrantType::NonCitizenCorporation),
            "9" => Some(RegistrantType::NonCitizenCoOwned),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RegistrantType::Individual => "Individual",
            RegistrantType::Partnership => "Partnership",
            RegistrantType::Corporation => "Corporation",
            RegistrantType::CoOwned => "Co-Owned",
            RegistrantType::Government => "Government",
            RegistrantType::Llc => "LLC",
            RegistrantType::NonCitizenCorporation => "Non Citizen Corporation",
            RegistrantType::NonCitizenCoOwned => "Non Citizen Co-Owned",
            RegistrantType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RegistrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub tail_number: String,
    pub make: String,
    pub model: String,
    pub year: String,
    pub owner_name: String,
    pub city: String,
    pub state: String,
    pub mode_s_hex: String,
    pub registrant_type: RegistrantType,
}

impl OutputRow {
    pub const HEADER: [&'static str; 9] = [
        "tail_number",
        "make",
        "model",
        "year",
        "owner_name",
        "city",
        "state",
        "mode_s_hex",
        "registrant_type",
    ];

    pub fn fields(&self) -> [&str; 9] {
        [
            &self.tail_number,
            &self.make,
            &self.model,
            &self.year,
            &self.owner_name,
            &self.city,
            &self.state,
            &self.mode_s_hex,
            self.registrant_type.label(),
        ]
    }
}

/// What happens to a registration whose reference code is not indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Keep the row with empty make and model
    #[default]
    Blank,
    /// Skip the row
    Drop,
    /// Keep the row with make and model set to "Unknown"
    Unknown,
}

impl UnresolvedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedPolicy::Blank => "blank",
            UnresolvedPolicy::Drop => "drop",
            UnresolvedPolicy::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMode {
    Download {
        url: String,
    },
    Local {
        registration: PathBuf,
        reference: PathBuf,
    },
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::Download { url } => write!(f, "{}", url),
            SourceMode::Local {
                registration,
                reference,
            } => write!(f, "{} + {}", registration.display(), reference.display()),
        }
    }
}

/// Raw bytes of the two FAA files.
#[derive(Debug, Clone)]
pub struct SourceFiles {
    pub registration: Vec<u8>,
    pub reference: Vec<u8>,
}

/// A record that was skipped or degraded without stopping the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordIssue {
    MalformedReference { line: u64, reason: String },
    MalformedRegistration { line: u64, reason: String },
    UnresolvedReference {
        line: u64,
        tail_number: String,
        code: ReferenceCode,
        known_manufacturer: bool,
    },
    UnmappedRegistrantType { line: u64, tail_number: String, code: String },
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIssue::MalformedReference { line, reason } => {
                write!(f, "reference line {}: {}", line, reason)
            }
            RecordIssue::MalformedRegistration { line, reason } => {
                write!(f, "registration line {}: {}", line, reason)
            }
            RecordIssue::UnresolvedReference {
                line,
                tail_number,
                code,
                known_manufacturer,
            } => {
                write!(
                    f,
                    "registration line {} ({}): reference code '{}' not found",
                    line, tail_number, code
                )?;
                if *known_manufacturer {
                    write!(
                        f,
                        " (manufacturer {} known, model {} series {} missing)",
                        code.manufacturer(),
                        code.model(),
                        code.series()
                    )
                } else {
                    write!(f, " (unknown manufacturer {})", code.manufacturer())
                }
            }
            RecordIssue::UnmappedRegistrantType {
                line,
                tail_number,
                code,
            } => write!(
                f,
                "registration line {} ({}): registrant type '{}' mapped to Unknown",
                line, tail_number, code
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub reference_rows: u64,
    pub reference_entries: u64,
    pub duplicate_reference_codes: u64,
    pub malformed_reference_rows: u64,
    pub registration_rows: u64,
    pub malformed_registration_rows: u64,
    pub unresolved_references: u64,
    pub dropped_rows: u64,
    pub unmapped_registrant_types: u64,
    pub rows_emitted: u64,
    pub samples: Vec<RecordIssue>,
}

impl ProcessingStats {
    pub const MAX_SAMPLES: usize = 10;

    /// Counts the issue and keeps it as a sample while there is room.
    pub fn record(&mut self, issue: RecordIssue) {
        match &issue {
            RecordIssue::MalformedReference { .. } => self.malformed_reference_rows += 1,
            RecordIssue::MalformedRegistration { .. } => self.malformed_registration_rows += 1,
            RecordIssue::UnresolvedReference { .. } => self.unresolved_references += 1,
            RecordIssue::UnmappedRegistrantType { .. } => self.unmapped_registrant_types += 1,
        }

        if self.samples.len() < Self::MAX_SAMPLES {
            tracing::warn!("{}", issue);
            self.samples.push(issue);
        } else {
            tracing::debug!("{}", issue);
        }
    }

    pub fn skipped_rows(&self) -> u64 {
        self.malformed_registration_rows + self.dropped_rows
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub rows: Vec<OutputRow>,
    pub stats: ProcessingStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub source: String,
    pub output_path: String,
    pub unresolved_policy: UnresolvedPolicy,
    pub stats: ProcessingStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registrant_type_table() {
        let expected = [
            ("1", "Individual"),
            ("2", "Partnership"),
            ("3", "Corporation"),
            ("4", "Co-Owned"),
            ("5", "Government"),
            ("7", "LLC"),
            ("8", "Non Citizen Corporation"),
            ("9", "Non Citizen Co-Owned"),
        ];
        for (code, label) in expected {
            assert_eq!(RegistrantType::from_code(code).unwrap().label(), label);
        }

        for code in ["", "0", "6", "10", "A", " 1"] {
            assert!(RegistrantType::from_code(code).is_none(), "code {:?}", code);
        }
    }

    #[test]
    fn test_reference_code_parts() {
        let code = ReferenceCode::new("2072738");
        assert_eq!(code.manufacturer(), "207");
        assert_eq!(code.model(), "27");
        assert_eq!(code.series(), "38");

        let short = ReferenceCode::new("X");
        assert_eq!(short.manufacturer(), "X");
        assert_eq!(short.model(), "");
        assert_eq!(short.series(), "");
    }

    #[test]
    fn test_unresolved_reference_names_code_parts() {
        let issue = RecordIssue::UnresolvedReference {
            line: 4,
            tail_number: "N777".to_string(),
            code: ReferenceCode::new("2072799"),
            known_manufacturer: true,
        };
        assert_eq!(
            issue.to_string(),
            "registration line 4 (N777): reference code '2072799' not found (manufacturer 207 known, model 27 series 99 missing)"
        );

        let issue = RecordIssue::UnresolvedReference {
            line: 5,
            tail_number: "N8".to_string(),
            code: ReferenceCode::new("9990101"),
            known_manufacturer: false,
        };
        assert!(issue.to_string().ends_with("(unknown manufacturer 999)"));

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "unresolved_reference");
        assert_eq!(json["code"], "9990101");
        assert_eq!(json["known_manufacturer"], false);
    }

    #[test]
    fn test_output_row_fields_follow_header_order() {
        let row = OutputRow {
            tail_number: "N12345".to_string(),
            make: "Cessna".to_string(),
            model: "172".to_string(),
            year: "1998".to_string(),
            owner_name: "Jane Doe".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            mode_s_hex: "A1B2C3".to_string(),
            registrant_type: RegistrantType::Government,
        };
        assert_eq!(
            row.fields().join("|"),
            "N12345|Cessna|172|1998|Jane Doe|Austin|TX|A1B2C3|Government"
        );
        assert_eq!(
            OutputRow::HEADER.join("|"),
            "tail_number|make|model|year|owner_name|city|state|mode_s_hex|registrant_type"
        );
    }

    #[test]
    fn test_stats_keep_bounded_samples() {
        let mut stats = ProcessingStats::default();
        for line in 0..25 {
            stats.record(RecordIssue::MalformedRegistration {
                line,
                reason: "wrong field count".to_string(),
            });
        }
        assert_eq!(stats.malformed_registration_rows, 25);
        assert_eq!(stats.samples.len(), ProcessingStats::MAX_SAMPLES);
        assert_eq!(stats.skipped_rows(), 25);
    }
}
