use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Gender;

/// Column order the export layer writes match tables in.
pub const MATCH_COLUMNS: &[&str] = &[
    "share_status",
    "desc",
    "eiid",
    "rel_upper",
    "match_id",
    "max_grandparents_same_country",
    "patside",
    "resend_date",
    "segs",
    "year",
    "ehid",
    "birth_country_maternal_gma",
    "first",
    "res",
    "rel_alt",
    "url",
    "birth_country_maternal_gpa",
    "first_initial",
    "rel_alg",
    "last",
    "first_name",
    "visible",
    "tree_url",
    "rel_alg_label",
    "disc",
    "last_initial",
    "pct",
    "anc",
    "locs",
    "matside",
    "full",
    "pat",
    "invitation_status",
    "rel_label",
    "hide_rel",
    "favorite",
    "new_share_status",
    "birth",
    "eid",
    "mat",
    "rel_range",
    "rel_lower",
    "img",
    "self_reported_ashkenazi",
    "rel_user",
    "updated",
    "can_resend",
    "sex",
    "birth_country_paternal_gma",
    "last_name",
    "added",
    "surs",
    "birth_country_paternal_gpa",
    "intro_status",
];

/// One potential relative reported for a profile.
///
/// The upstream record is wide and loosely typed, so it is kept as the JSON
/// object it arrived as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchRecord {
    pub fields: Map<String, Value>,
}

impl MatchRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Profile id of the matched person, when they share one.
    pub fn ehid(&self) -> Option<&str> {
        self.fields
            .get("ehid")?
            .as_str()
            .filter(|id| !id.is_empty())
    }

    pub fn gender(&self) -> Gender {
        self.fields
            .get("sex")
            .and_then(Value::as_str)
            .map(Gender::from_label)
            .unwrap_or_default()
    }
}

/// Body of the match-finder endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RelfinderResponse {
    pub matches: Vec<MatchRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn columns_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for column in MATCH_COLUMNS {
            assert!(seen.insert(column), "duplicate column {}", column);
        }
        assert_eq!(MATCH_COLUMNS.len(), 54);
    }

    #[test]
    fn accessors_read_known_fields() {
        let record: MatchRecord = serde_json::from_value(json!({
            "ehid": "fedcba9876543210",
            "sex": "Female",
            "pct": 3.2,
            "rel_label": "Second Cousin"
        }))
        .unwrap();
        assert_eq!(record.ehid(), Some("fedcba9876543210"));
        assert_eq!(record.gender(), Gender::Female);
        assert_eq!(record.get("pct"), Some(&json!(3.2)));
    }

    #[test]
    fn anonymous_matches_have_no_ehid() {
        let record: MatchRecord =
            serde_json::from_value(json!({"ehid": null, "sex": "Male"})).unwrap();
        assert_eq!(record.ehid(), None);
        let blank: MatchRecord = serde_json::from_value(json!({"ehid": ""})).unwrap();
        assert_eq!(blank.ehid(), None);
        assert_eq!(blank.gender(), Gender::Unknown);
    }
}
