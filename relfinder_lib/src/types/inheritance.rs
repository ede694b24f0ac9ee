use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Gender;

/// Profiles covered by the shared-ancestry (inheritance) view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InheritanceView {
    #[serde(default)]
    pub people_ids: Vec<String>,
    #[serde(default)]
    pub people_labels: Vec<String>,
    /// Parallel to `people_ids`; empty until genders are resolved.
    #[serde(default)]
    pub genders: Vec<Gender>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InheritanceView {
    /// `(id, label, gender)` rows; gender is `Unknown` until resolved.
    pub fn people(&self) -> impl Iterator<Item = (&str, &str, Gender)> + '_ {
        self.people_ids.iter().enumerate().map(move |(i, id)| {
            (
                id.as_str(),
                self.people_labels.get(i).map(String::as_str).unwrap_or(""),
                self.genders.get(i).copied().unwrap_or_default(),
            )
        })
    }
}
