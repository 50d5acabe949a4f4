//! Tests for error types

use pipegrid::Error;

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("k must be positive".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
    assert!(error_str.contains("k must be positive"));
}

#[test]
fn test_invalid_state_error() {
    let error = Error::InvalidState("scores not set".to_string());
    assert!(format!("{error}").contains("scores not set"));
}

#[test]
fn test_missing_resource_error() {
    let error = Error::MissingResource("data/train.csv".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("data/train.csv"));
}

#[test]
fn test_shape_mismatch_error() {
    let error = Error::ShapeMismatch {
        expected: "3 columns".to_string(),
        actual: "2 columns".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("3 columns"));
    assert!(error_str.contains("2 columns"));
}

#[test]
fn test_not_fitted_error() {
    let error = Error::NotFitted("predict".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("fit()"));
    assert!(error_str.contains("predict"));
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("file not found".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Storage error"));
    assert!(error_str.contains("file not found"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: Error = io.into();
    assert!(matches!(error, Error::Io(_)));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}

#[test]
fn test_model_error_conversion() {
    let model = aprender::AprenderError::from("Cannot fit with zero samples");
    let error: Error = model.into();
    assert!(matches!(error, Error::Model(_)));
    assert!(format!("{error}").contains("zero samples"));
}
