use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::{
    Conversation, Insights, KnowledgeItem, Message, MessageAnalysis, ProgressRecord,
    PronunciationExercises, SpeechFeedback, UserProfile,
};

#[derive(Serialize)]
struct SendMessageRequest {
    content: String,
}

#[derive(Serialize)]
struct SpeechFeedbackRequest {
    text: String,
    context: String,
}

#[derive(Serialize)]
struct ExercisesRequest {
    difficult_sounds: Vec<String>,
}

#[derive(Serialize)]
struct UpdateProfileRequest {
    username: String,
    email: String,
    english_level: String,
    interests: Vec<String>,
    goals: Vec<String>,
}

#[derive(Deserialize)]
pub struct NewConversationResponse {
    pub conversation: Conversation,
    pub starter_message: Message,
}

#[derive(Deserialize)]
pub struct SendMessageResponse {
    pub user_message: Message,
    pub assistant_message: Message,
    #[serde(default)]
    pub analysis: Option<MessageAnalysis>,
}

/// Thin client over the tutor backend. All endpoints are JSON; failures
/// surface as `anyhow` errors and the caller substitutes mock data.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_profile(&self, user_id: i64) -> Result<UserProfile> {
        let url = format!("{}/users/{}", self.base_url, user_id);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Fetching profile failed: {}", response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        profile: &UserProfile,
    ) -> Result<UserProfile> {
        let url = format!("{}/users/{}", self.base_url, user_id);
        let request = UpdateProfileRequest {
            username: profile.username.clone(),
            email: profile.email.clone(),
            english_level: profile.english_level.as_str().to_string(),
            interests: profile.interests.clone(),
            goals: profile.goals.clone(),
        };
        let response = self.client.put(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Updating profile failed: {}", response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn start_conversation(&self, user_id: i64) -> Result<NewConversationResponse> {
        let url = format!("{}/users/{}/conversations", self.base_url, user_id);
        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Starting conversation failed: {}",
                response.status()
            ));
        }
        Ok(response.json().await?)
    }

    pub async fn send_message(
        &self,
        conversation_id: i64,
        content: &str,
    ) -> Result<SendMessageResponse> {
        let url = format!("{}/conversations/{}/messages", self.base_url, conversation_id);
        let request = SendMessageRequest {
            content: content.to_string(),
        };
        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Sending message failed: {}", response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn fetch_progress(&self, user_id: i64, days: u32) -> Result<Vec<ProgressRecord>> {
        let url = format!("{}/users/{}/progress?days={}", self.base_url, user_id, days);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Fetching progress failed: {}", response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn fetch_insights(&self, user_id: i64) -> Result<Insights> {
        let url = format!("{}/users/{}/insights", self.base_url, user_id);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Fetching insights failed: {}", response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn fetch_knowledge(&self, user_id: i64) -> Result<Vec<KnowledgeItem>> {
        let url = format!("{}/users/{}/knowledge", self.base_url, user_id);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Fetching knowledge failed: {}", response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn speech_feedback(&self, user_id: i64, text: &str) -> Result<SpeechFeedback> {
        let url = format!("{}/users/{}/speech-feedback", self.base_url, user_id);
        let request = SpeechFeedbackRequest {
            text: text.to_string(),
            context: "conversation".to_string(),
        };
        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Fetching speech feedback failed: {}",
                response.status()
            ));
        }
        Ok(response.json().await?)
    }

    pub async fn pronunciation_exercises(
        &self,
        user_id: i64,
        difficult_sounds: &[String],
    ) -> Result<PronunciationExercises> {
        let url = format!(
            "{}/users/{}/pronunciation-exercises",
            self.base_url, user_id
        );
        let request = ExercisesRequest {
            difficult_sounds: difficult_sounds.to_vec(),
        };
        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Fetching pronunciation exercises failed: {}",
                response.status()
            ));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let api = ApiClient::new("http://localhost:5000/api/");
        assert_eq!(api.base_url, "http://localhost:5000/api");
    }

    #[test]
    fn send_message_response_parses_with_analysis() {
        let json = r#"{
            "user_message": {"id": 1, "sender": "user", "content": "hi"},
            "assistant_message": {"id": 2, "sender": "assistant", "content": "hello!"},
            "analysis": {
                "vocabulary_used": ["hi"],
                "positive_aspects": ["friendly greeting"],
                "confidence_score": 0.8
            }
        }"#;
        let resp: SendMessageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.assistant_message.content, "hello!");
        let analysis = resp.analysis.unwrap();
        assert_eq!(analysis.positive_aspects.len(), 1);
        assert_eq!(analysis.confidence_score, Some(0.8));
    }
}
