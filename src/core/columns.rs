use crate::utils::error::{EtlError, Result};
use csv::{ByteRecord, Reader, ReaderBuilder};
use std::io::Read;

/// Header-driven reader for the FAA text files. Rows of the wrong width are
/// reported by the callers instead of failing the whole file.
pub(crate) fn reader<R: Read>(input: R, delimiter: u8) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

pub(crate) struct Columns {
    file: &'static str,
    names: Vec<String>,
}

impl Columns {
    pub(crate) fn from_headers(file: &'static str, headers: &ByteRecord) -> Self {
        let names = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let name = String::from_utf8_lossy(name);
                let name = if i == 0 {
                    name.trim_start_matches('\u{feff}')
                } else {
                    &*name
                };
                name.trim().to_ascii_uppercase()
            })
            .collect();

        Self { file, names }
    }

    pub(crate) fn required(&self, name: &str) -> Result<usize> {
        self.position(name).ok_or_else(|| EtlError::SchemaError {
            file: self.file.to_string(),
            column: name.to_string(),
        })
    }

    /// First of `candidates` present in the header.
    pub(crate) fn optional(&self, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|name| self.position(name))
    }

    pub(crate) fn width(&self) -> usize {
        self.names.len()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

pub(crate) fn field(record: &ByteRecord, index: usize) -> String {
    record
        .get(index)
        .map(|raw| String::from_utf8_lossy(raw).trim().to_string())
        .unwrap_or_default()
}

pub(crate) fn line(record: &ByteRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}
