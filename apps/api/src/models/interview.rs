use serde::{Deserialize, Serialize};

/// Categorical affect label shared by the text and facial analyzers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewState {
    Confident,
    Nervous,
    Hesitant,
    Calm,
    #[default]
    Neutral,
}

impl InterviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewState::Confident => "confident",
            InterviewState::Nervous => "nervous",
            InterviewState::Hesitant => "hesitant",
            InterviewState::Calm => "calm",
            InterviewState::Neutral => "neutral",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interview_state_serializes_snake_case() {
        let json = serde_json::to_string(&InterviewState::Hesitant).unwrap();
        assert_eq!(json, r#""hesitant""#);
        let state: InterviewState = serde_json::from_str(r#""confident""#).unwrap();
        assert_eq!(state, InterviewState::Confident);
    }

    #[test]
    fn test_default_state_is_neutral() {
        assert_eq!(InterviewState::default(), InterviewState::Neutral);
        assert_eq!(InterviewState::default().as_str(), "neutral");
    }
}
