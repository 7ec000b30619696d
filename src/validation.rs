use crate::error::{DashboardError, Result};

/// Maximum guidance length accepted for a regeneration
pub const MAX_GUIDANCE_LEN: usize = 2000;
/// Maximum identifier length
pub const MAX_ID_LEN: usize = 128;

/// Validation utilities for input sanitization and edge case handling.
///
/// Everything here runs before a backend call; failures are
/// [`DashboardError::Validation`] and never reach the API layer.
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

fn invalid(message: impl Into<String>) -> DashboardError {
    DashboardError::Validation(message.into())
}

impl InputValidator {
    /// Validate a record identifier
    pub fn validate_id(id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(invalid("Identifier cannot be empty"));
        }

        if id.len() > MAX_ID_LEN {
            return Err(invalid(format!("Identifier too long (max {MAX_ID_LEN} characters)")));
        }

        if id.chars().any(|c| c.is_control() || c == '/' || c == '?' || c == '#') {
            return Err(invalid("Identifier contains invalid characters"));
        }

        Ok(())
    }

    /// Validate regeneration guidance and return the trimmed text
    pub fn validate_guidance(guidance: &str) -> Result<String> {
        let trimmed = guidance.trim();
        if trimmed.is_empty() {
            return Err(invalid("Please provide guidance for regeneration"));
        }

        if trimmed.chars().count() > MAX_GUIDANCE_LEN {
            return Err(invalid(format!("Guidance too long (max {MAX_GUIDANCE_LEN} characters)")));
        }

        Ok(trimmed.to_string())
    }

    /// Validate a free-text knowledge entry
    pub fn validate_text_entry(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(invalid("Knowledge entry cannot be empty"));
        }

        Ok(())
    }

    /// Validate a confidence score
    pub fn validate_confidence(confidence: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(invalid(format!("Confidence must be between 0.0 and 1.0, got {confidence}")));
        }

        Ok(())
    }

    /// Lower-cased extension of `filename` with a leading dot.
    ///
    /// Takes the text after the last dot; a name without a dot yields the
    /// whole name, which never matches an accepted type.
    #[must_use]
    pub fn file_extension(filename: &str) -> String {
        let tail = filename.rsplit('.').next().unwrap_or(filename);
        format!(".{}", tail.to_lowercase())
    }

    /// Human rendering of the accepted types: `.pdf`, `.docx` → `PDF or DOCX`
    #[must_use]
    pub fn describe_accepted_types(accepted_types: &[String]) -> String {
        accepted_types.join(" or ").replace('.', "").to_uppercase()
    }

    /// Validate an upload's extension against the accepted list
    pub fn validate_upload(filename: &str, accepted_types: &[String]) -> Result<()> {
        if filename.trim().is_empty() {
            return Err(invalid("File name cannot be empty"));
        }

        let extension = Self::file_extension(filename);
        if !accepted_types.iter().any(|accepted| accepted.eq_ignore_ascii_case(&extension)) {
            return Err(invalid(format!(
                "Unsupported file type. Please upload a {} file.",
                Self::describe_accepted_types(accepted_types)
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_extraction() {
        assert_eq!(InputValidator::file_extension("Report.PDF"), ".pdf");
        assert_eq!(InputValidator::file_extension("archive.tar.gz"), ".gz");
        assert_eq!(InputValidator::file_extension("README"), ".readme");
    }

    #[test]
    fn test_guidance_is_trimmed() {
        assert_eq!(InputValidator::validate_guidance("  shorter  ").unwrap(), "shorter");
    }
}
