use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One managed identity under the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub profile_id: String,
    pub display_label: String,
}

impl ProfileRecord {
    pub fn new(profile_id: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            display_label: display_label.into(),
        }
    }
}

/// The analytics data layer embedded in the account landing page.
///
/// Kept whole; only a couple of keys from the first entry are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountMetadata {
    pub data_layer: Vec<Value>,
}

impl AccountMetadata {
    fn first_str(&self, key: &str) -> Option<&str> {
        self.data_layer.first()?.get(key)?.as_str()
    }

    /// Profile id of the account owner.
    pub fn profile_id(&self) -> Option<&str> {
        self.first_str("profile_id")
    }

    pub fn account_id(&self) -> Option<&str> {
        self.first_str("account_id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_reads_first_entry() {
        let meta: AccountMetadata = serde_json::from_value(json!([
            {"profile_id": "0123456789abcdef", "account_id": "acc1"},
            {"profile_id": "ignored"}
        ]))
        .unwrap();
        assert_eq!(meta.profile_id(), Some("0123456789abcdef"));
        assert_eq!(meta.account_id(), Some("acc1"));
    }

    #[test]
    fn metadata_tolerates_missing_keys() {
        let meta: AccountMetadata = serde_json::from_value(json!([{"event": "pageview"}])).unwrap();
        assert_eq!(meta.profile_id(), None);
        let empty = AccountMetadata { data_layer: vec![] };
        assert_eq!(empty.account_id(), None);
    }
}
