// src/models/user.rs
use serde::{Deserialize, Serialize};

/// A user as served by the remote user service.
///
/// Values handed out by the cache are owned copies; the stored entry is only
/// ever replaced wholesale.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,         // opaque external ID, e.g. "5fe0cce861c8ea54018385ae"
    pub first_name: String,
    pub last_name: String,
}

impl UserRecord {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_camel_case_body() {
        let body = r#"{"id":"5fe0cce861c8ea54018385ae","firstName":"Lance","lastName":"Armstrong"}"#;
        let user: UserRecord = serde_json::from_str(body).unwrap();
        assert_eq!(user, UserRecord::new("5fe0cce861c8ea54018385ae", "Lance", "Armstrong"));
    }

    #[test]
    fn test_serializes_with_wire_field_names() {
        let user = UserRecord::new("42", "Greg", "LeMond");
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "id": "42", "firstName": "Greg", "lastName": "LeMond" })
        );
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let body = r#"{"id":"42","firstName":"Greg"}"#;
        assert!(serde_json::from_str::<UserRecord>(body).is_err());
    }
}
