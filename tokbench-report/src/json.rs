//! JSON Output

use serde::Serialize;

/// Generate a prettified JSON report from any serializable payload.
pub fn generate_json_report<T: Serialize>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}
