use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference samples that have no profile page but a known sex.
pub const REFERENCE_MALES: &[&str] = &[
    "v$SP1_FATHER_V4",
    "v$SP1_SON1_V2",
    "v$SP1_SON2_V2",
    "v$SP1_MOTHERS_FATHER_V2",
    "v$SP1_FATHERS_FATHER_V2",
    "v$NA18558",
    "v$NA18944",
    "v$NA19160",
];

pub const REFERENCE_FEMALES: &[&str] = &[
    "v$SP1_MOTHER_V4",
    "v$SP1_DAUGHTER_V2",
    "v$SP1_MOTHERS_MOTHER_V2",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// Parses the labels used on profile pages and in match records.
    /// Anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Male" | "male" | "M" => Gender::Male,
            "Female" | "female" | "F" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sex of a reference sample, without touching the network.
pub fn reference_gender(profile_id: &str) -> Option<Gender> {
    if REFERENCE_MALES.contains(&profile_id) {
        Some(Gender::Male)
    } else if REFERENCE_FEMALES.contains(&profile_id) {
        Some(Gender::Female)
    } else {
        None
    }
}
