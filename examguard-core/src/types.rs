use serde::{Deserialize, Serialize};
use std::fmt;

pub const RECORDING_MIME_TYPE: &str = "video/webm";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptNumber(pub u32);

impl fmt::Display for AttemptNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque question identifier. In the test form this is the name of the answer input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Deterministic artifact name for a candidate's recording.
pub fn artifact_file_name(candidate: &CandidateId, attempt: AttemptNumber) -> String {
    format!("candidate{}attempt{}.webm", candidate, attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_name_is_deterministic() {
        let name = artifact_file_name(&CandidateId::new("42"), AttemptNumber(3));
        assert_eq!(name, "candidate42attempt3.webm");
    }
}
