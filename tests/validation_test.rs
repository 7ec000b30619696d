//! Comprehensive unit tests for validation.rs module

use auditor_dashboard::error::DashboardError;
use auditor_dashboard::validation::{InputValidator, MAX_GUIDANCE_LEN, MAX_ID_LEN};

fn accepted(types: &[&str]) -> Vec<String> {
    types.iter().map(|t| (*t).to_string()).collect()
}

#[test]
fn test_validate_id_valid() {
    assert!(InputValidator::validate_id("1").is_ok());
    assert!(InputValidator::validate_id("9b2f6c1e-4d3a-4f8e-9a51-0c7d2e8b1a34").is_ok());
}

#[test]
fn test_validate_id_empty() {
    assert!(InputValidator::validate_id("").is_err());
    assert!(InputValidator::validate_id("   ").is_err());
}

#[test]
fn test_validate_id_too_long() {
    let id = "a".repeat(MAX_ID_LEN + 1);
    assert!(InputValidator::validate_id(&id).is_err());
    assert!(InputValidator::validate_id(&"a".repeat(MAX_ID_LEN)).is_ok());
}

#[test]
fn test_validate_id_rejects_path_characters() {
    assert!(InputValidator::validate_id("1/status").is_err());
    assert!(InputValidator::validate_id("1?x=2").is_err());
    assert!(InputValidator::validate_id("1#frag").is_err());
    assert!(InputValidator::validate_id("1\n").is_err());
}

#[test]
fn test_validate_guidance_empty() {
    let err = InputValidator::validate_guidance("").unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));
    assert_eq!(err.inline_message(), "Please provide guidance for regeneration");
}

#[test]
fn test_validate_guidance_whitespace_only() {
    assert!(InputValidator::validate_guidance(" \n\t ").is_err());
}

#[test]
fn test_validate_guidance_trims() {
    assert_eq!(InputValidator::validate_guidance("\tmore detail\n").unwrap(), "more detail");
}

#[test]
fn test_validate_guidance_too_long() {
    let long = "g".repeat(MAX_GUIDANCE_LEN + 1);
    assert!(InputValidator::validate_guidance(&long).is_err());
    assert!(InputValidator::validate_guidance(&"g".repeat(MAX_GUIDANCE_LEN)).is_ok());
}

#[test]
fn test_validate_text_entry() {
    assert!(InputValidator::validate_text_entry("A note").is_ok());
    assert!(InputValidator::validate_text_entry("  ").is_err());
}

#[test]
fn test_validate_confidence_range() {
    assert!(InputValidator::validate_confidence(0.0).is_ok());
    assert!(InputValidator::validate_confidence(1.0).is_ok());
    assert!(InputValidator::validate_confidence(1.01).is_err());
    assert!(InputValidator::validate_confidence(-0.01).is_err());
}

#[test]
fn test_file_extension() {
    assert_eq!(InputValidator::file_extension("notes.txt"), ".txt");
    assert_eq!(InputValidator::file_extension("Scan.JPEG"), ".jpeg");
    assert_eq!(InputValidator::file_extension("backup.tar.gz"), ".gz");
}

#[test]
fn test_describe_accepted_types() {
    assert_eq!(InputValidator::describe_accepted_types(&accepted(&[".pdf", ".docx"])), "PDF or DOCX");
    assert_eq!(InputValidator::describe_accepted_types(&accepted(&[".txt"])), "TXT");
}

#[test]
fn test_validate_upload_accepts_listed_extension() {
    assert!(InputValidator::validate_upload("notes.txt", &accepted(&[".txt"])).is_ok());
    assert!(InputValidator::validate_upload("NOTES.TXT", &accepted(&[".txt"])).is_ok());
}

#[test]
fn test_validate_upload_rejects_unlisted_extension() {
    let err = InputValidator::validate_upload("report.exe", &accepted(&[".pdf", ".docx"])).unwrap_err();
    assert_eq!(err.inline_message(), "Unsupported file type. Please upload a PDF or DOCX file.");
}

#[test]
fn test_validate_upload_without_extension() {
    assert!(InputValidator::validate_upload("README", &accepted(&[".txt"])).is_err());
    assert!(InputValidator::validate_upload("", &accepted(&[".txt"])).is_err());
}
