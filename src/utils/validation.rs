use crate::utils::error::{EtlError, Result};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
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

pub fn validate_existing_file(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;
    if !Path::new(path).is_file() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_evalue(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "E-value threshold must be a finite number greater than 0".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output_file", "scores.tsv").is_ok());
        assert!(validate_path("output_file", "").is_err());
        assert!(validate_path("output_file", "   ").is_err());
        assert!(validate_path("output_file", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_evalue() {
        assert!(validate_evalue("evalue", 10.0).is_ok());
        assert!(validate_evalue("evalue", 1e-30).is_ok());
        assert!(validate_evalue("evalue", 0.0).is_err());
        assert!(validate_evalue("evalue", -1.0).is_err());
        assert!(validate_evalue("evalue", f64::NAN).is_err());
        assert!(validate_evalue("evalue", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("num_iterations", 3, 1).is_ok());
        assert!(validate_positive_number("num_iterations", 0, 1).is_err());
    }

    #[test]
    fn test_validate_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        assert!(validate_existing_file("protein_ids_file", path).is_ok());
        assert!(validate_existing_file("protein_ids_file", "/definitely/not/here.txt").is_err());
    }
}
