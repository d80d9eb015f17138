//! Wire types of the rmon backend

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access: String,
}

/// Body of error responses that carry a human-readable message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorMessage {
    #[serde(default, alias = "detail")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    #[serde(deserialize_with = "string_or_number")]
    pub account_id: String,
    #[serde(default)]
    pub project_name: String,
}

/// Account ids arrive as strings or bare numbers depending on the backend
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected account id string, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_id_accepts_number() {
        let details: AccountDetails =
            serde_json::from_value(json!({"account_id": 123456789012u64, "project_name": "acme"}))
                .unwrap();
        assert_eq!(details.account_id, "123456789012");

        let details: AccountDetails =
            serde_json::from_value(json!({"account_id": "000123"})).unwrap();
        assert_eq!(details.account_id, "000123");
        assert_eq!(details.project_name, "");
    }

    #[test]
    fn test_error_message_accepts_detail() {
        let msg: ErrorMessage =
            serde_json::from_value(json!({"detail": "Given token not valid"})).unwrap();
        assert_eq!(msg.message, "Given token not valid");
    }
}
