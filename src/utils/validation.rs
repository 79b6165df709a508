use crate::utils::error::{EtlError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Parses a one character field delimiter into the byte the csv reader wants.
pub fn parse_delimiter(field_name: &str, value: &str) -> Result<u8> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '\n' && c != '\r' && c != '"' => Ok(c as u8),
        _ => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Delimiter must be a single ASCII character".to_string(),
        }),
    }
}
