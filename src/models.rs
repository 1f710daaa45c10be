use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The backend emits `isoformat()` strings with no UTC offset; accept
/// those as UTC alongside full RFC3339.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| s.parse::<NaiveDateTime>().map(|naive| naive.and_utc()))
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_timestamp(&s).map_err(serde::de::Error::custom)
}

fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    #[serde(default)]
    pub conversation_id: Option<i64>,
    pub sender: Sender,
    pub content: String,
    #[serde(default = "Utc::now", deserialize_with = "de_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<MessageAnalysis>,
}

impl Message {
    pub fn local(id: i64, sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id,
            conversation_id: None,
            sender,
            content: content.into(),
            timestamp: Utc::now(),
            analysis: None,
        }
    }
}

/// Per-message analysis attached by the backend to user messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageAnalysis {
    #[serde(default)]
    pub grammar_errors: Vec<String>,
    #[serde(default)]
    pub vocabulary_used: Vec<String>,
    #[serde(default)]
    pub positive_aspects: Vec<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

impl MessageAnalysis {
    pub fn is_empty(&self) -> bool {
        self.grammar_errors.is_empty()
            && self.vocabulary_used.is_empty()
            && self.positive_aspects.is_empty()
            && self.confidence_score.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnglishLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl EnglishLevel {
    pub fn all() -> [EnglishLevel; 3] {
        [
            EnglishLevel::Beginner,
            EnglishLevel::Intermediate,
            EnglishLevel::Advanced,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnglishLevel::Beginner => "beginner",
            EnglishLevel::Intermediate => "intermediate",
            EnglishLevel::Advanced => "advanced",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EnglishLevel::Beginner => "Just starting your English journey!",
            EnglishLevel::Intermediate => "Making great progress!",
            EnglishLevel::Advanced => "Almost fluent! Keep polishing!",
        }
    }

    pub fn next(&self) -> EnglishLevel {
        match self {
            EnglishLevel::Beginner => EnglishLevel::Intermediate,
            EnglishLevel::Intermediate => EnglishLevel::Advanced,
            EnglishLevel::Advanced => EnglishLevel::Beginner,
        }
    }

    pub fn prev(&self) -> EnglishLevel {
        match self {
            EnglishLevel::Beginner => EnglishLevel::Advanced,
            EnglishLevel::Intermediate => EnglishLevel::Beginner,
            EnglishLevel::Advanced => EnglishLevel::Intermediate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub english_level: EnglishLevel,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One day of progress scores. Scores are fractions of 1.0 on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub vocabulary_score: f64,
    #[serde(default)]
    pub grammar_score: f64,
    #[serde(default)]
    pub fluency_score: f64,
    #[serde(default)]
    pub pronunciation_score: f64,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub messages_sent: u32,
    /// Minutes spent in conversation that day.
    #[serde(default)]
    pub conversation_duration: u32,
}

impl ProgressRecord {
    /// Average of the four scores the dashboard headlines.
    pub fn overall(&self) -> f64 {
        (self.vocabulary_score + self.grammar_score + self.fluency_score + self.confidence_score)
            / 4.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default)]
    pub overall_progress: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub next_goals: Vec<String>,
    #[serde(default)]
    pub motivation_message: String,
    #[serde(default)]
    pub learning_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Word,
    Phrase,
    Topic,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Word => "word",
            ItemType::Phrase => "phrase",
            ItemType::Topic => "topic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: i64,
    pub content: String,
    pub item_type: ItemType,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub mastery_level: f64,
    #[serde(default)]
    pub times_encountered: u32,
    #[serde(default)]
    pub times_used_correctly: u32,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub last_encountered: Option<DateTime<Utc>>,
}

impl KnowledgeItem {
    pub fn mastery_label(&self) -> &'static str {
        if self.mastery_level >= 0.8 {
            "Mastered"
        } else if self.mastery_level >= 0.6 {
            "Learning"
        } else {
            "Beginner"
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechFeedback {
    #[serde(default)]
    pub pronunciation: PronunciationAnalysis,
    #[serde(default)]
    pub overall_assessment: OverallAssessment,
    #[serde(default)]
    pub personalized_tips: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PronunciationAnalysis {
    #[serde(default)]
    pub overall_score: f64,
    #[serde(default)]
    pub difficult_words: Vec<DifficultWord>,
    #[serde(default)]
    pub sound_focus_areas: Vec<SoundFocusArea>,
    #[serde(default)]
    pub encouragement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultWord {
    pub word: String,
    #[serde(default)]
    pub phonetic: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub tips: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundFocusArea {
    pub sound: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub practice_words: Vec<String>,
    #[serde(default)]
    pub tip: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallAssessment {
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PronunciationExercises {
    #[serde(default)]
    pub warm_up_exercises: Vec<WarmUpExercise>,
    #[serde(default)]
    pub daily_practice_plan: Option<DailyPracticePlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmUpExercise {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPracticePlan {
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub sequence: Vec<String>,
    #[serde(default)]
    pub progress_tracking: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_uses_lowercase_on_the_wire() {
        let json = serde_json::to_string(&Sender::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let back: Sender = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(back, Sender::User);
    }

    #[test]
    fn message_parses_backend_payload() {
        let json = r#"{
            "id": 42,
            "conversation_id": 7,
            "sender": "assistant",
            "content": "Nice work!",
            "timestamp": "2025-08-01T12:30:00Z"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, 42);
        assert_eq!(msg.conversation_id, Some(7));
        assert!(msg.analysis.is_none());
    }

    #[test]
    fn timestamps_parse_without_utc_offset() {
        // The backend's isoformat() carries microseconds but no offset
        let json = r#"{
            "id": 3,
            "sender": "assistant",
            "content": "Keep going!",
            "timestamp": "2026-08-25T14:00:00.123456"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.timestamp.date_naive().to_string(), "2026-08-25");
        assert_eq!(msg.timestamp.format("%H:%M").to_string(), "14:00");

        let profile: UserProfile = serde_json::from_str(
            r#"{"id": 1, "username": "a", "email": "a@b.c", "created_at": "2026-01-02T03:04:05"}"#,
        )
        .unwrap();
        assert!(profile.created_at.is_some());

        let conversation: Conversation =
            serde_json::from_str(r#"{"id": 9, "started_at": "2026-08-25T13:59:59"}"#).unwrap();
        assert!(conversation.started_at.is_some());
    }

    #[test]
    fn level_cycle_is_closed() {
        for level in EnglishLevel::all() {
            assert_eq!(level.next().prev(), level);
        }
    }

    #[test]
    fn knowledge_mastery_labels() {
        let mut item = KnowledgeItem {
            id: 1,
            content: "nevertheless".into(),
            item_type: ItemType::Word,
            category: "connectors".into(),
            difficulty: "hard".into(),
            mastery_level: 0.9,
            times_encountered: 4,
            times_used_correctly: 3,
            last_encountered: None,
        };
        assert_eq!(item.mastery_label(), "Mastered");
        item.mastery_level = 0.65;
        assert_eq!(item.mastery_label(), "Learning");
        item.mastery_level = 0.2;
        assert_eq!(item.mastery_label(), "Beginner");
    }
}
