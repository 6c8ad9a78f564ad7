//! Test utilities and helpers for unit tests
//!
//! - Credential builders
//! - Helper functions for creating test fixtures

#[cfg(test)]
pub mod test_helpers {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Create a temporary directory for testing
    pub fn create_temp_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    /// Create a temporary file with content
    pub fn create_temp_file_with_content(dir: &TempDir, filename: &str, content: &[u8]) -> PathBuf {
        let file_path = dir.path().join(filename);
        std::fs::write(&file_path, content).expect("Failed to write temp file");
        file_path
    }

    /// Build an unsigned credential around `payload`, URL-safe alphabet
    pub fn make_token(payload: Value) -> String {
        make_token_with_engine(payload, &URL_SAFE_NO_PAD)
    }

    /// Build an unsigned credential, encoding the segments with `engine`
    pub fn make_token_with_engine(payload: Value, engine: &impl Engine) -> String {
        let header = engine.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = engine.encode(payload.to_string());
        let signature = engine.encode(b"signature");
        format!("{}.{}.{}", header, body, signature)
    }

    pub fn customer_token(exp: i64) -> String {
        make_token(json!({
            "sub": "asha",
            "role": "CUSTOMER",
            "iat": exp - 3600,
            "exp": exp,
        }))
    }

    pub fn manager_token(exp: i64) -> String {
        make_token(json!({
            "sub": "ravi",
            "role": "BANK_MANAGER",
            "iat": exp - 3600,
            "exp": exp,
        }))
    }
}
