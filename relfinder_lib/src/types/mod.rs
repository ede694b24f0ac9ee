mod gender;
pub use self::gender::{reference_gender, Gender, REFERENCE_FEMALES, REFERENCE_MALES};

mod profile;
pub use self::profile::{AccountMetadata, ProfileRecord};

mod matches;
pub use self::matches::{MatchRecord, RelfinderResponse, MATCH_COLUMNS};

mod segments;
pub use self::segments::{PairwiseSegmentRecord, ProfilePair, EMPTY_INTERVALS};

mod inheritance;
pub use self::inheritance::InheritanceView;
