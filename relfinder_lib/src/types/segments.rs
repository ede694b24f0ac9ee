use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Interval payload the service returns for two profiles with nothing in common.
pub const EMPTY_INTERVALS: &str = r#"{"20": [[], []], "21": [[], []], "22": [[], []], "1": [[], []], "3": [[], []], "2": [[], []], "5": [[], []], "4": [[], []], "7": [[], []], "6": [[], []], "9": [[], []], "8": [[], []], "Y": [[], []], "X": [[], []], "11": [[], []], "10": [[], []], "13": [[], []], "12": [[], []], "15": [[], []], "14": [[], []], "17": [[], []], "16": [[], []], "19": [[], []], "18": [[], []]}"#;

/// Unordered pair of profile ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfilePair {
    low: String,
    high: String,
}

impl ProfilePair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn ids(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    pub fn contains(&self, profile_id: &str) -> bool {
        self.low == profile_id || self.high == profile_id
    }
}

/// Shared segments between two profiles, as returned by the pairwise view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseSegmentRecord {
    #[serde(rename = "p1", default)]
    pub profile_a: String,
    #[serde(rename = "p2", default)]
    pub profile_b: String,
    /// Per-chromosome interval lists. Usually a JSON document encoded as a string.
    #[serde(default)]
    pub intervals: Value,
    #[serde(default)]
    pub unassayble_regions: Value,
    #[serde(default)]
    pub function_call: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PairwiseSegmentRecord {
    pub fn pair(&self) -> ProfilePair {
        ProfilePair::new(self.profile_a.as_str(), self.profile_b.as_str())
    }

    /// Intervals as a JSON value, decoding the string form when needed.
    pub fn intervals_value(&self) -> Value {
        match &self.intervals {
            Value::String(raw) => serde_json::from_str(raw).unwrap_or_else(|_| self.intervals.clone()),
            other => other.clone(),
        }
    }

    /// False when the intervals equal the canonical empty payload.
    ///
    /// The comparison is structural, so key order and spacing do not matter.
    pub fn has_shared_segments(&self) -> bool {
        self.intervals_value() != empty_intervals()
    }
}

/// [`EMPTY_INTERVALS`] as a JSON value: chromosomes 1-22, X and Y, each `[[], []]`.
pub fn empty_intervals() -> Value {
    let mut map = Map::new();
    let chromosomes = (1..=22).map(|n| n.to_string()).chain(["X".to_string(), "Y".to_string()]);
    for chromosome in chromosomes {
        map.insert(
            chromosome,
            Value::Array(vec![Value::Array(vec![]), Value::Array(vec![])]),
        );
    }
    Value::Object(map)
}
