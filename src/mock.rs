//! Randomly generated placeholder data, substituted whenever a backend
//! request fails so every screen stays demonstrable offline.

use chrono::{Duration, Utc};
use rand::prelude::*;

use crate::models::{
    DailyPracticePlan, DifficultWord, EnglishLevel, Insights, ItemType, KnowledgeItem,
    OverallAssessment, ProgressRecord, PronunciationAnalysis, PronunciationExercises,
    SoundFocusArea, SpeechFeedback, UserProfile, WarmUpExercise,
};

pub const WELCOME_MESSAGE: &str =
    "Hey there! How's your day going? I'm so excited to chat with you and help you practice your English!";

pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, I'm having some technical difficulties right now. But don't worry, we can keep chatting! Could you try again?";

const CANNED_REPLIES: [&str; 4] = [
    "That's really interesting! Tell me more about that. I love hearing your thoughts!",
    "Wow, you're doing great with your English! Keep going, I'm really enjoying our conversation!",
    "That sounds amazing! I can tell you're getting more confident. What else would you like to share?",
    "You're expressing yourself so well! I'm proud of your progress. What's on your mind next?",
];

/// Pick a canned assistant reply at random.
pub fn canned_reply() -> String {
    let mut rng = rand::rng();
    CANNED_REPLIES
        .choose(&mut rng)
        .copied()
        .unwrap_or(CANNED_REPLIES[0])
        .to_string()
}

/// The demo profile used when the backend cannot provide one.
pub fn demo_profile() -> UserProfile {
    UserProfile {
        id: 1,
        username: "learner".to_string(),
        email: "learner@example.com".to_string(),
        english_level: EnglishLevel::Intermediate,
        interests: vec![
            "travel".to_string(),
            "technology".to_string(),
            "movies".to_string(),
        ],
        goals: vec![
            "improve fluency".to_string(),
            "expand vocabulary".to_string(),
            "gain confidence".to_string(),
        ],
        created_at: None,
    }
}

/// A two-week score series with a gentle upward trend.
pub fn progress_series(days: u32) -> Vec<ProgressRecord> {
    let mut rng = rand::rng();
    let today = Utc::now().date_naive();
    let mut records = Vec::with_capacity(days as usize);

    for i in (0..days).rev() {
        let date = today - Duration::days(i as i64);
        let trend = (days - 1 - i) as f64;
        records.push(ProgressRecord {
            date,
            vocabulary_score: clamp_score(rng.random_range(0.0..0.3) + 0.6 + trend * 0.01),
            grammar_score: clamp_score(rng.random_range(0.0..0.3) + 0.5 + trend * 0.015),
            fluency_score: clamp_score(rng.random_range(0.0..0.3) + 0.55 + trend * 0.012),
            pronunciation_score: clamp_score(rng.random_range(0.0..0.3) + 0.45 + trend * 0.018),
            confidence_score: clamp_score(rng.random_range(0.0..0.3) + 0.5 + trend * 0.02),
            messages_sent: rng.random_range(5..20),
            conversation_duration: rng.random_range(10..40),
        });
    }

    records
}

pub fn insights() -> Insights {
    Insights {
        overall_progress: "You're making fantastic progress! Your confidence has grown significantly over the past two weeks.".to_string(),
        strengths: vec![
            "Natural conversation flow".to_string(),
            "Rich vocabulary usage".to_string(),
            "Consistent practice".to_string(),
        ],
        areas_for_improvement: vec![
            "Complex grammar structures".to_string(),
            "Pronunciation of certain sounds".to_string(),
        ],
        achievements: vec![
            "Completed 14 days of consistent practice".to_string(),
            "Improved confidence by 25%".to_string(),
            "Learned 47 new words".to_string(),
        ],
        next_goals: vec![
            "Practice conditional sentences".to_string(),
            "Work on 'th' sound pronunciation".to_string(),
            "Expand business vocabulary".to_string(),
        ],
        motivation_message: "You're doing amazing! Your dedication is really paying off. Keep up this fantastic momentum!".to_string(),
        learning_recommendations: vec![
            "Try discussing current events".to_string(),
            "Practice describing complex situations".to_string(),
            "Focus on storytelling".to_string(),
        ],
    }
}

pub fn knowledge_items() -> Vec<KnowledgeItem> {
    let words: [(&str, f64, &str, &str); 15] = [
        ("amazing", 0.9, "adjectives", "easy"),
        ("sophisticated", 0.7, "adjectives", "medium"),
        ("nevertheless", 0.6, "connectors", "hard"),
        ("breakthrough", 0.8, "nouns", "medium"),
        ("accomplish", 0.85, "verbs", "medium"),
        ("fascinating", 0.75, "adjectives", "medium"),
        ("opportunity", 0.9, "nouns", "easy"),
        ("challenge", 0.95, "nouns", "easy"),
        ("incredible", 0.8, "adjectives", "easy"),
        ("experience", 0.92, "nouns", "easy"),
        ("technology", 0.88, "nouns", "easy"),
        ("environment", 0.7, "nouns", "medium"),
        ("definitely", 0.65, "adverbs", "medium"),
        ("particularly", 0.6, "adverbs", "hard"),
        ("conversation", 0.95, "nouns", "easy"),
    ];
    let phrases: [(&str, f64, &str, &str); 5] = [
        ("break the ice", 0.8, "idioms", "medium"),
        ("piece of cake", 0.9, "idioms", "easy"),
        ("hit the nail on the head", 0.6, "idioms", "hard"),
        ("in my opinion", 0.95, "expressions", "easy"),
        ("on the other hand", 0.85, "connectors", "medium"),
    ];
    let topics: [(&str, f64, &str, &str); 5] = [
        ("travel", 0.9, "conversation_topics", "easy"),
        ("technology", 0.8, "conversation_topics", "medium"),
        ("movies", 0.85, "conversation_topics", "easy"),
        ("food", 0.92, "conversation_topics", "easy"),
        ("career", 0.7, "conversation_topics", "medium"),
    ];

    let mut rng = rand::rng();
    let mut items = Vec::new();
    let push = |list: &[(&str, f64, &str, &str)], item_type: ItemType, items: &mut Vec<KnowledgeItem>, rng: &mut ThreadRng| {
        for (content, mastery, category, difficulty) in list {
            let encountered = rng.random_range(5..25);
            items.push(KnowledgeItem {
                id: items.len() as i64 + 1,
                content: content.to_string(),
                item_type,
                category: category.to_string(),
                difficulty: difficulty.to_string(),
                mastery_level: *mastery,
                times_encountered: encountered,
                times_used_correctly: rng.random_range(3..=encountered),
                last_encountered: Some(
                    Utc::now() - Duration::hours(rng.random_range(1..24 * 7)),
                ),
            });
        }
    };
    push(&words, ItemType::Word, &mut items, &mut rng);
    push(&phrases, ItemType::Phrase, &mut items, &mut rng);
    push(&topics, ItemType::Topic, &mut items, &mut rng);
    items
}

pub fn speech_feedback() -> SpeechFeedback {
    SpeechFeedback {
        pronunciation: PronunciationAnalysis {
            overall_score: 0.75,
            difficult_words: vec![DifficultWord {
                word: "pronunciation".to_string(),
                phonetic: "/pr\u{259}\u{2cc}n\u{28c}nsi\u{2c8}e\u{26a}\u{283}\u{259}n/".to_string(),
                difficulty: "medium".to_string(),
                tips: "Break it down: pro-nun-ci-a-tion".to_string(),
            }],
            sound_focus_areas: vec![SoundFocusArea {
                sound: "/\u{3b8}/".to_string(),
                description: "The 'th' sound as in 'think'".to_string(),
                practice_words: vec![
                    "think".to_string(),
                    "thank".to_string(),
                    "three".to_string(),
                ],
                tip: "Put your tongue between your teeth and blow air gently".to_string(),
            }],
            encouragement: "Great job! Your pronunciation is getting clearer!".to_string(),
        },
        overall_assessment: OverallAssessment {
            strengths: "Clear vowel sounds and good rhythm".to_string(),
            focus_areas: vec!["/\u{3b8}/".to_string(), "/r/".to_string()],
            next_steps: vec![
                "Practice tongue twisters".to_string(),
                "Work on word stress".to_string(),
            ],
        },
        personalized_tips: vec![
            "Practice the th sound with: think, thank, three".to_string(),
            "Record yourself speaking to track your progress".to_string(),
            "Practice a little bit every day for best results".to_string(),
        ],
    }
}

pub fn pronunciation_exercises() -> PronunciationExercises {
    PronunciationExercises {
        warm_up_exercises: vec![
            WarmUpExercise {
                title: "Tongue twister warm-up".to_string(),
                description: "Say each one slowly three times, then speed up.".to_string(),
                examples: vec![
                    "Three thin thinkers thought thick thoughts".to_string(),
                    "Thirty-three thousand thistles".to_string(),
                ],
            },
            WarmUpExercise {
                title: "Minimal pairs".to_string(),
                description: "Alternate between the pairs, exaggerating the difference.".to_string(),
                examples: vec!["think / sink".to_string(), "three / free".to_string()],
            },
        ],
        daily_practice_plan: Some(DailyPracticePlan {
            duration: "10-15 minutes".to_string(),
            sequence: vec![
                "Warm up with tongue twisters".to_string(),
                "Practice the focus sounds in isolation".to_string(),
                "Read a short paragraph aloud".to_string(),
            ],
            progress_tracking: "Record yourself once a week and compare.".to_string(),
        }),
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_series_scores_stay_in_range() {
        let records = progress_series(14);
        assert_eq!(records.len(), 14);
        for record in &records {
            for score in [
                record.vocabulary_score,
                record.grammar_score,
                record.fluency_score,
                record.pronunciation_score,
                record.confidence_score,
            ] {
                assert!((0.0..=1.0).contains(&score), "score out of range: {score}");
            }
            assert!(record.messages_sent >= 5);
        }
        // Dates are ascending and end today.
        assert!(records.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(records.last().unwrap().date, Utc::now().date_naive());
    }

    #[test]
    fn knowledge_items_have_unique_ids_and_consistent_counts() {
        let items = knowledge_items();
        assert!(!items.is_empty());
        let mut ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), items.len());
        for item in &items {
            assert!(item.times_used_correctly <= item.times_encountered);
            assert!((0.0..=1.0).contains(&item.mastery_level));
        }
    }

    #[test]
    fn canned_reply_comes_from_the_fixed_set() {
        for _ in 0..20 {
            let reply = canned_reply();
            assert!(CANNED_REPLIES.contains(&reply.as_str()));
        }
    }

    #[test]
    fn mock_feedback_names_focus_sounds() {
        let feedback = speech_feedback();
        assert!(!feedback.pronunciation.sound_focus_areas.is_empty());
        assert!(!feedback.personalized_tips.is_empty());
    }
}
