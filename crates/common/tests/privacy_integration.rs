//! Integration tests for privacy module
//!
//! Tests redaction of request parameters and API responses before logging

#![cfg(feature = "foundation")]

use serde_json::json;
use smsdesk_common::privacy::{Redactor, REDACTED, TRUNCATED};

/// Validates that a contact payload is safe to log after redaction.
///
/// Contact payloads carry phone numbers and emails under both obvious keys
/// and free-text notes. Neither may survive into the logged copy.
///
/// # Test Steps
/// 1. Build a contact payload with sensitive keys and embedded PII
/// 2. Redact it
/// 3. Verify every sensitive key is replaced
/// 4. Verify embedded PII in free text is scrubbed
/// 5. Verify non-sensitive fields are untouched
#[test]
fn test_contact_payload_is_scrubbed() {
    let redactor = Redactor::new();
    let payload = json!({
        "phone": "+15551234567",
        "email": "jane@example.com",
        "first_name": "Jane",
        "tags": ["vip", "reach at 555-123-4567"],
        "notes": { "internal": "prefers email to jane@example.com" }
    });

    let logged = redactor.redact_value(&payload);
    let text = logged.to_string();

    assert_eq!(logged["phone"], REDACTED);
    assert_eq!(logged["email"], REDACTED);
    assert_eq!(logged["first_name"], "Jane");
    assert_eq!(logged["tags"][0], "vip");
    assert!(!text.contains("555-123-4567"));
    assert!(!text.contains("jane@example.com"));
}

/// Validates that credentials never appear in the redacted copy.
///
/// # Test Steps
/// 1. Build a request-parameter object holding several credential shapes
/// 2. Redact it
/// 3. Verify no credential substring survives anywhere in the output
#[test]
fn test_credentials_are_removed() {
    let redactor = Redactor::new();
    let params = json!({
        "accessToken": "shpat_abcdef",
        "headers": { "Authorization": "Bearer shpat_abcdef" },
        "message": "failed with Bearer shpat_abcdef at step 2",
        "client_secret": "s3cr3t",
    });

    let text = redactor.redact_value(&params).to_string();

    assert!(!text.contains("shpat_abcdef"));
    assert!(!text.contains("s3cr3t"));
    assert!(text.contains("step 2"));
}

/// Validates that redaction terminates on deeply nested input.
///
/// # Test Steps
/// 1. Build a 50-level nested object
/// 2. Redact it with the default depth limit
/// 3. Verify the nested tail is replaced with the truncation marker
#[test]
fn test_deep_nesting_is_bounded() {
    let mut value = json!("leaf");
    for _ in 0..50 {
        value = json!({ "child": value });
    }

    let redacted = Redactor::new().redact_value(&value);

    let mut cursor = &redacted;
    let mut depth = 0;
    while let Some(child) = cursor.get("child") {
        cursor = child;
        depth += 1;
    }
    assert_eq!(cursor, &json!(TRUNCATED));
    assert!(depth < 50);
}

/// Validates that scalars and nulls pass through redaction unchanged.
#[test]
fn test_scalars_pass_through() {
    let redactor = Redactor::new();
    assert_eq!(redactor.redact_value(&json!(null)), json!(null));
    assert_eq!(redactor.redact_value(&json!(true)), json!(true));
    assert_eq!(redactor.redact_value(&json!(12.5)), json!(12.5));
    assert_eq!(redactor.redact_value(&json!("plain words")), json!("plain words"));
}
