use anyhow::Result;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::api::{ApiClient, NewConversationResponse, SendMessageResponse};
use crate::config::Config;
use crate::mock;
use crate::models::{
    Conversation, EnglishLevel, Insights, KnowledgeItem, Message, ProgressRecord,
    PronunciationExercises, Sender, SpeechFeedback, UserProfile,
};

pub const PROGRESS_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Chat,
    Progress,
    Knowledge,
    Profile,
}

impl Screen {
    pub fn all() -> [Screen; 4] {
        [
            Screen::Chat,
            Screen::Progress,
            Screen::Knowledge,
            Screen::Profile,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KnowledgeFilter {
    #[default]
    All,
    Words,
    Phrases,
    Topics,
}

impl KnowledgeFilter {
    pub fn label(&self) -> &'static str {
        match self {
            KnowledgeFilter::All => "All",
            KnowledgeFilter::Words => "Words",
            KnowledgeFilter::Phrases => "Phrases",
            KnowledgeFilter::Topics => "Topics",
        }
    }

    pub fn next(&self) -> KnowledgeFilter {
        match self {
            KnowledgeFilter::All => KnowledgeFilter::Words,
            KnowledgeFilter::Words => KnowledgeFilter::Phrases,
            KnowledgeFilter::Phrases => KnowledgeFilter::Topics,
            KnowledgeFilter::Topics => KnowledgeFilter::All,
        }
    }

    pub fn matches(&self, item: &KnowledgeItem) -> bool {
        use crate::models::ItemType;
        match self {
            KnowledgeFilter::All => true,
            KnowledgeFilter::Words => item.item_type == ItemType::Word,
            KnowledgeFilter::Phrases => item.item_type == ItemType::Phrase,
            KnowledgeFilter::Topics => item.item_type == ItemType::Topic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Username,
    Email,
    Level,
    NewInterest,
    NewGoal,
}

impl ProfileField {
    pub fn next(&self) -> ProfileField {
        match self {
            ProfileField::Username => ProfileField::Email,
            ProfileField::Email => ProfileField::Level,
            ProfileField::Level => ProfileField::NewInterest,
            ProfileField::NewInterest => ProfileField::NewGoal,
            ProfileField::NewGoal => ProfileField::Username,
        }
    }
}

/// Local working copy of the profile while editing. Only committed to the
/// backend on an explicit save; cancel throws it away.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub username: String,
    pub email: String,
    pub english_level: EnglishLevel,
    pub interests: Vec<String>,
    pub goals: Vec<String>,
    pub new_interest: String,
    pub new_goal: String,
}

impl ProfileDraft {
    fn from_profile(profile: &UserProfile) -> Self {
        Self {
            username: profile.username.clone(),
            email: profile.email.clone(),
            english_level: profile.english_level,
            interests: profile.interests.clone(),
            goals: profile.goals.clone(),
            new_interest: String::new(),
            new_goal: String::new(),
        }
    }

    fn to_profile(&self, id: i64) -> UserProfile {
        UserProfile {
            id,
            username: self.username.clone(),
            email: self.email.clone(),
            english_level: self.english_level,
            interests: self.interests.clone(),
            goals: self.goals.clone(),
            created_at: None,
        }
    }
}

/// Case-insensitive membership check used before tag inserts.
fn contains_tag(tags: &[String], candidate: &str) -> bool {
    tags.iter().any(|t| t.eq_ignore_ascii_case(candidate))
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub offline: bool,

    // User profile
    pub user_id: i64,
    pub profile: UserProfile,
    pub draft: Option<ProfileDraft>,
    pub profile_field: ProfileField,
    pub interests_state: ListState,
    pub goals_state: ListState,
    pub profile_status: Option<String>,
    pub profile_saving: bool,

    // Chat state
    pub conversation: Option<Conversation>,
    pub messages: Vec<Message>,
    pub chat_input: String,
    pub chat_cursor: usize,
    pub chat_loading: bool,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub selected_message_idx: Option<usize>,
    pub animation_frame: u8,
    next_local_id: i64,

    // Pronunciation feedback popup
    pub show_feedback: bool,
    pub feedback_text: String,
    pub feedback: Option<SpeechFeedback>,
    pub exercises: Option<PronunciationExercises>,
    pub feedback_loading: bool,
    pub feedback_scroll: u16,

    // Progress dashboard
    pub progress: Option<Vec<ProgressRecord>>,
    pub insights: Option<Insights>,
    pub progress_loading: bool,

    // Knowledge cloud
    pub knowledge: Option<Vec<KnowledgeItem>>,
    pub knowledge_loading: bool,
    pub knowledge_filter: KnowledgeFilter,
    pub knowledge_state: ListState,

    // In-flight request tasks, polled on tick
    pub bootstrap_task: Option<JoinHandle<Result<NewConversationResponse>>>,
    pub send_task: Option<JoinHandle<Result<SendMessageResponse>>>,
    pub profile_fetch_task: Option<JoinHandle<Result<UserProfile>>>,
    pub profile_save_task: Option<JoinHandle<Result<UserProfile>>>,
    pub progress_task: Option<JoinHandle<Result<Vec<ProgressRecord>>>>,
    pub insights_task: Option<JoinHandle<Result<Insights>>>,
    pub knowledge_task: Option<JoinHandle<Result<Vec<KnowledgeItem>>>>,
    pub feedback_task: Option<JoinHandle<Result<SpeechFeedback>>>,
    pub exercises_task: Option<JoinHandle<Result<PronunciationExercises>>>,

    pub api: ApiClient,
    pub config: Config,
}

impl App {
    pub fn new(config: Config, offline: bool) -> Self {
        let api = ApiClient::new(&config.server_url());
        let user_id = config.user_id.unwrap_or(1);

        Self {
            should_quit: false,
            screen: Screen::Chat,
            input_mode: InputMode::Normal,
            offline,

            user_id,
            profile: mock::demo_profile(),
            draft: None,
            profile_field: ProfileField::Username,
            interests_state: ListState::default(),
            goals_state: ListState::default(),
            profile_status: None,
            profile_saving: false,

            conversation: None,
            messages: Vec::new(),
            chat_input: String::new(),
            chat_cursor: 0,
            chat_loading: false,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            selected_message_idx: None,
            animation_frame: 0,
            next_local_id: 1,

            show_feedback: false,
            feedback_text: String::new(),
            feedback: None,
            exercises: None,
            feedback_loading: false,
            feedback_scroll: 0,

            progress: None,
            insights: None,
            progress_loading: false,

            knowledge: None,
            knowledge_loading: false,
            knowledge_filter: KnowledgeFilter::default(),
            knowledge_state: ListState::default(),

            bootstrap_task: None,
            send_task: None,
            profile_fetch_task: None,
            profile_save_task: None,
            progress_task: None,
            insights_task: None,
            knowledge_task: None,
            feedback_task: None,
            exercises_task: None,

            api,
            config,
        }
    }

    /// Kick off the session: fetch the profile and bootstrap a conversation.
    /// Offline mode seeds the static greeting straight away.
    pub fn start(&mut self) {
        if self.offline {
            self.seed_welcome();
            return;
        }

        let api = self.api.clone();
        let user_id = self.user_id;
        self.profile_fetch_task = Some(tokio::spawn(async move {
            api.fetch_profile(user_id).await
        }));

        let api = self.api.clone();
        self.chat_loading = true;
        self.bootstrap_task = Some(tokio::spawn(async move {
            api.start_conversation(user_id).await
        }));
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_local_id;
        self.next_local_id += 1;
        id
    }

    fn seed_welcome(&mut self) {
        let id = self.next_id();
        self.messages
            .push(Message::local(id, Sender::Assistant, mock::WELCOME_MESSAGE));
        self.chat_loading = false;
    }

    // --- Chat -----------------------------------------------------------

    /// Optimistic half of the send: validates and appends the user message,
    /// returning the text to post. `None` means nothing was sent (empty
    /// input, or a request already outstanding).
    pub fn begin_send(&mut self) -> Option<String> {
        if self.chat_loading || self.send_task.is_some() {
            return None;
        }
        let text = self.chat_input.trim().to_string();
        if text.is_empty() {
            return None;
        }

        let id = self.next_id();
        self.messages.push(Message::local(id, Sender::User, text.clone()));
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.chat_loading = true;
        self.scroll_chat_to_bottom();
        Some(text)
    }

    /// Spawn the backend call for a begun send, or answer locally with a
    /// canned reply when no conversation exists (bootstrap failed/offline).
    pub fn dispatch_send(&mut self, text: String) {
        match &self.conversation {
            Some(conversation) if !self.offline => {
                let api = self.api.clone();
                let conversation_id = conversation.id;
                self.send_task = Some(tokio::spawn(async move {
                    api.send_message(conversation_id, &text).await
                }));
            }
            _ => {
                let id = self.next_id();
                self.messages
                    .push(Message::local(id, Sender::Assistant, mock::canned_reply()));
                self.chat_loading = false;
                self.scroll_chat_to_bottom();
            }
        }
    }

    /// Apply a finished send: exactly one assistant reply on success,
    /// exactly one apology on failure. No retry.
    pub fn complete_send(&mut self, result: Result<SendMessageResponse>) {
        self.chat_loading = false;
        match result {
            Ok(response) => {
                let analysis = response
                    .analysis
                    .or(response.user_message.analysis)
                    .filter(|a| !a.is_empty());
                if let Some(analysis) = analysis {
                    if let Some(last_user) = self
                        .messages
                        .iter_mut()
                        .rev()
                        .find(|m| m.sender == Sender::User)
                    {
                        last_user.analysis = Some(analysis);
                    }
                }
                self.messages.push(response.assistant_message);
            }
            Err(e) => {
                warn!("message send failed, substituting apology: {e:#}");
                let id = self.next_id();
                self.messages
                    .push(Message::local(id, Sender::Assistant, mock::APOLOGY_MESSAGE));
            }
        }
        self.scroll_chat_to_bottom();
    }

    pub fn complete_bootstrap(&mut self, result: Result<NewConversationResponse>) {
        self.chat_loading = false;
        match result {
            Ok(response) => {
                self.conversation = Some(response.conversation);
                self.messages.clear();
                self.messages.push(response.starter_message);
            }
            Err(e) => {
                warn!("starting conversation failed, using static greeting: {e:#}");
                self.seed_welcome();
            }
        }
    }

    pub fn complete_profile_fetch(&mut self, result: Result<UserProfile>) {
        match result {
            Ok(profile) => self.profile = profile,
            Err(e) => {
                warn!("fetching profile failed, keeping demo profile: {e:#}");
            }
        }
    }

    pub fn selected_message(&self) -> Option<&Message> {
        self.selected_message_idx.and_then(|i| self.messages.get(i))
    }

    pub fn select_prev_message(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        self.selected_message_idx = Some(match self.selected_message_idx {
            Some(i) => i.saturating_sub(1),
            None => self.messages.len() - 1,
        });
    }

    pub fn select_next_message(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        let last = self.messages.len() - 1;
        self.selected_message_idx = Some(match self.selected_message_idx {
            Some(i) => (i + 1).min(last),
            None => last,
        });
    }

    /// Tick animation frame for the typing indicator.
    pub fn tick_animation(&mut self) {
        if self.chat_loading || self.feedback_loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_down(&mut self) {
        let max = self.chat_total_lines().saturating_sub(self.chat_height);
        if self.chat_scroll < max {
            self.chat_scroll += 1;
        }
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        let total = self.chat_total_lines();
        let visible = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_scroll = total.saturating_sub(visible);
    }

    /// Estimate rendered transcript height, using character counts so
    /// wrapped UTF-8 lines are counted correctly. The scrollbar and
    /// scroll-to-bottom both use this estimate.
    pub fn chat_total_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.messages {
            total += 1; // role + time line
            for line in msg.content.lines() {
                let chars = line.chars().count();
                total += ((chars / wrap_width) + 1) as u16;
            }
            if msg.analysis.as_ref().is_some_and(|a| !a.is_empty()) {
                total += 2;
            }
            total += 1; // blank line between messages
        }
        if self.chat_loading {
            total += 2; // typing indicator
        }
        total
    }

    // --- Pronunciation feedback ----------------------------------------

    pub fn open_feedback(&mut self, text: String) {
        self.show_feedback = true;
        self.feedback = None;
        self.exercises = None;
        self.feedback_scroll = 0;
        self.feedback_text = text.clone();

        if self.offline {
            self.feedback_loading = false;
            self.feedback = Some(mock::speech_feedback());
            self.exercises = Some(mock::pronunciation_exercises());
            return;
        }

        self.feedback_loading = true;
        let api = self.api.clone();
        let user_id = self.user_id;
        self.feedback_task = Some(tokio::spawn(async move {
            api.speech_feedback(user_id, &text).await
        }));
    }

    pub fn close_feedback(&mut self) {
        self.show_feedback = false;
        self.feedback = None;
        self.exercises = None;
        self.feedback_loading = false;
        if let Some(task) = self.feedback_task.take() {
            task.abort();
        }
        if let Some(task) = self.exercises_task.take() {
            task.abort();
        }
    }

    pub fn complete_feedback(&mut self, result: Result<SpeechFeedback>) {
        self.feedback_loading = false;
        match result {
            Ok(feedback) => {
                // Follow up with practice exercises when the analysis names
                // sounds to work on. An exercise failure is non-fatal.
                let sounds: Vec<String> = feedback
                    .pronunciation
                    .sound_focus_areas
                    .iter()
                    .map(|area| area.sound.clone())
                    .collect();
                if !sounds.is_empty() {
                    let api = self.api.clone();
                    let user_id = self.user_id;
                    self.exercises_task = Some(tokio::spawn(async move {
                        api.pronunciation_exercises(user_id, &sounds).await
                    }));
                }
                self.feedback = Some(feedback);
            }
            Err(e) => {
                warn!("speech feedback failed, substituting mock analysis: {e:#}");
                self.feedback = Some(mock::speech_feedback());
                self.exercises = Some(mock::pronunciation_exercises());
            }
        }
    }

    pub fn complete_exercises(&mut self, result: Result<PronunciationExercises>) {
        match result {
            Ok(exercises) => self.exercises = Some(exercises),
            Err(e) => {
                warn!("pronunciation exercises failed: {e:#}");
            }
        }
    }

    // --- Progress dashboard --------------------------------------------

    pub fn ensure_progress_loaded(&mut self) {
        if self.progress.is_none() && self.progress_task.is_none() {
            self.refresh_progress();
        }
    }

    pub fn refresh_progress(&mut self) {
        if self.offline {
            self.progress = Some(mock::progress_series(PROGRESS_DAYS));
            self.insights = Some(mock::insights());
            return;
        }

        self.progress_loading = true;
        let api = self.api.clone();
        let user_id = self.user_id;
        self.progress_task = Some(tokio::spawn(async move {
            api.fetch_progress(user_id, PROGRESS_DAYS).await
        }));

        let api = self.api.clone();
        self.insights_task = Some(tokio::spawn(async move {
            api.fetch_insights(user_id).await
        }));
    }

    pub fn complete_progress(&mut self, result: Result<Vec<ProgressRecord>>) {
        self.progress_loading = false;
        match result {
            Ok(records) if !records.is_empty() => self.progress = Some(records),
            Ok(_) => {
                warn!("progress series came back empty, using mock data");
                self.progress = Some(mock::progress_series(PROGRESS_DAYS));
            }
            Err(e) => {
                warn!("fetching progress failed, using mock data: {e:#}");
                self.progress = Some(mock::progress_series(PROGRESS_DAYS));
            }
        }
    }

    pub fn complete_insights(&mut self, result: Result<Insights>) {
        match result {
            Ok(insights) => self.insights = Some(insights),
            Err(e) => {
                warn!("fetching insights failed, using mock data: {e:#}");
                self.insights = Some(mock::insights());
            }
        }
    }

    // --- Knowledge cloud ------------------------------------------------

    pub fn ensure_knowledge_loaded(&mut self) {
        if self.knowledge.is_none() && self.knowledge_task.is_none() {
            self.refresh_knowledge();
        }
    }

    pub fn refresh_knowledge(&mut self) {
        if self.offline {
            self.knowledge = Some(mock::knowledge_items());
            return;
        }

        self.knowledge_loading = true;
        let api = self.api.clone();
        let user_id = self.user_id;
        self.knowledge_task = Some(tokio::spawn(async move {
            api.fetch_knowledge(user_id).await
        }));
    }

    pub fn complete_knowledge(&mut self, result: Result<Vec<KnowledgeItem>>) {
        self.knowledge_loading = false;
        match result {
            Ok(items) if !items.is_empty() => self.knowledge = Some(items),
            Ok(_) => {
                warn!("knowledge cloud came back empty, using mock data");
                self.knowledge = Some(mock::knowledge_items());
            }
            Err(e) => {
                warn!("fetching knowledge failed, using mock data: {e:#}");
                self.knowledge = Some(mock::knowledge_items());
            }
        }
        self.knowledge_state.select(Some(0));
    }

    /// Items visible under the current category filter, mastery-descending.
    pub fn filtered_knowledge(&self) -> Vec<&KnowledgeItem> {
        let mut items: Vec<&KnowledgeItem> = self
            .knowledge
            .iter()
            .flatten()
            .filter(|item| self.knowledge_filter.matches(item))
            .collect();
        items.sort_by(|a, b| {
            b.mastery_level
                .partial_cmp(&a.mastery_level)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        items
    }

    pub fn cycle_knowledge_filter(&mut self) {
        self.knowledge_filter = self.knowledge_filter.next();
        self.knowledge_state.select(Some(0));
    }

    pub fn knowledge_nav_down(&mut self) {
        let len = self.filtered_knowledge().len();
        if len > 0 {
            let i = self.knowledge_state.selected().unwrap_or(0);
            self.knowledge_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn knowledge_nav_up(&mut self) {
        let i = self.knowledge_state.selected().unwrap_or(0);
        self.knowledge_state.select(Some(i.saturating_sub(1)));
    }

    // --- Profile editing ------------------------------------------------

    pub fn is_editing_profile(&self) -> bool {
        self.draft.is_some()
    }

    pub fn start_profile_edit(&mut self) {
        self.draft = Some(ProfileDraft::from_profile(&self.profile));
        self.profile_field = ProfileField::Username;
        self.profile_status = None;
        self.input_mode = InputMode::Editing;
        self.interests_state.select(None);
        self.goals_state.select(None);
    }

    pub fn cancel_profile_edit(&mut self) {
        self.draft = None;
        self.profile_status = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn add_draft_interest(&mut self) {
        if let Some(draft) = &mut self.draft {
            let tag = draft.new_interest.trim().to_string();
            if !tag.is_empty() && !contains_tag(&draft.interests, &tag) {
                draft.interests.push(tag);
            }
            draft.new_interest.clear();
        }
    }

    pub fn add_draft_goal(&mut self) {
        if let Some(draft) = &mut self.draft {
            let tag = draft.new_goal.trim().to_string();
            if !tag.is_empty() && !contains_tag(&draft.goals, &tag) {
                draft.goals.push(tag);
            }
            draft.new_goal.clear();
        }
    }

    pub fn remove_selected_interest(&mut self) {
        if let (Some(draft), Some(i)) = (&mut self.draft, self.interests_state.selected()) {
            if i < draft.interests.len() {
                draft.interests.remove(i);
                if draft.interests.is_empty() {
                    self.interests_state.select(None);
                } else if i >= draft.interests.len() {
                    self.interests_state.select(Some(draft.interests.len() - 1));
                }
            }
        }
    }

    pub fn remove_selected_goal(&mut self) {
        if let (Some(draft), Some(i)) = (&mut self.draft, self.goals_state.selected()) {
            if i < draft.goals.len() {
                draft.goals.remove(i);
                if draft.goals.is_empty() {
                    self.goals_state.select(None);
                } else if i >= draft.goals.len() {
                    self.goals_state.select(Some(draft.goals.len() - 1));
                }
            }
        }
    }

    pub fn save_profile(&mut self) {
        let Some(draft) = &self.draft else {
            return;
        };
        if self.profile_saving {
            return;
        }

        let updated = draft.to_profile(self.profile.id);
        if self.offline {
            self.profile = updated;
            self.draft = None;
            self.input_mode = InputMode::Normal;
            self.profile_status = Some("Saved locally (offline)".to_string());
            return;
        }

        self.profile_saving = true;
        self.profile_status = Some("Saving...".to_string());
        let api = self.api.clone();
        let user_id = self.user_id;
        self.profile_save_task = Some(tokio::spawn(async move {
            api.update_profile(user_id, &updated).await
        }));
    }

    pub fn complete_profile_save(&mut self, result: Result<UserProfile>) {
        self.profile_saving = false;
        match result {
            Ok(profile) => {
                self.profile = profile;
                self.draft = None;
                self.input_mode = InputMode::Normal;
                self.profile_status = Some("Profile saved".to_string());
            }
            Err(e) => {
                warn!("saving profile failed: {e:#}");
                self.profile_status =
                    Some("Could not reach the server; your edits are still here".to_string());
            }
        }
    }

    // --- Task polling ----------------------------------------------------

    /// Reap any finished request tasks and fold their results into state.
    /// Called from the event loop on every tick.
    pub async fn poll_tasks(&mut self) {
        if let Some(task) = self.bootstrap_task.take_if(|t| t.is_finished()) {
            let result = flatten(task.await);
            self.complete_bootstrap(result);
        }
        if let Some(task) = self.send_task.take_if(|t| t.is_finished()) {
            let result = flatten(task.await);
            self.complete_send(result);
        }
        if let Some(task) = self.profile_fetch_task.take_if(|t| t.is_finished()) {
            let result = flatten(task.await);
            self.complete_profile_fetch(result);
        }
        if let Some(task) = self.profile_save_task.take_if(|t| t.is_finished()) {
            let result = flatten(task.await);
            self.complete_profile_save(result);
        }
        if let Some(task) = self.progress_task.take_if(|t| t.is_finished()) {
            let result = flatten(task.await);
            self.complete_progress(result);
        }
        if let Some(task) = self.insights_task.take_if(|t| t.is_finished()) {
            let result = flatten(task.await);
            self.complete_insights(result);
        }
        if let Some(task) = self.knowledge_task.take_if(|t| t.is_finished()) {
            let result = flatten(task.await);
            self.complete_knowledge(result);
        }
        if let Some(task) = self.feedback_task.take_if(|t| t.is_finished()) {
            let result = flatten(task.await);
            if self.show_feedback {
                self.complete_feedback(result);
            }
        }
        if let Some(task) = self.exercises_task.take_if(|t| t.is_finished()) {
            let result = flatten(task.await);
            if self.show_feedback {
                self.complete_exercises(result);
            }
        }
    }
}

fn flatten<T>(joined: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(anyhow::Error::from(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SendMessageResponse;
    use anyhow::anyhow;

    fn test_app() -> App {
        App::new(Config::new(), false)
    }

    fn send_response(reply: &str) -> SendMessageResponse {
        serde_json::from_value(serde_json::json!({
            "user_message": {"id": 10, "sender": "user", "content": "hello"},
            "assistant_message": {"id": 11, "sender": "assistant", "content": reply},
            "analysis": {
                "positive_aspects": ["clear phrasing"],
                "confidence_score": 0.7
            }
        }))
        .unwrap()
    }

    #[test]
    fn whitespace_only_input_sends_nothing() {
        let mut app = test_app();
        app.chat_input = "   \t ".to_string();
        assert!(app.begin_send().is_none());
        assert!(app.messages.is_empty());
        assert!(!app.chat_loading);
    }

    #[test]
    fn send_is_rejected_while_loading() {
        let mut app = test_app();
        app.chat_input = "first".to_string();
        assert!(app.begin_send().is_some());
        assert!(app.chat_loading);

        app.chat_input = "second".to_string();
        assert!(app.begin_send().is_none());
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.chat_input, "second");
    }

    #[test]
    fn successful_send_appends_exactly_one_reply() {
        let mut app = test_app();
        app.chat_input = "hello there".to_string();
        let text = app.begin_send().unwrap();
        assert_eq!(text, "hello there");
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].sender, Sender::User);

        app.complete_send(Ok(send_response("Nice to meet you!")));
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::Assistant);
        assert_eq!(app.messages[1].content, "Nice to meet you!");
        assert!(!app.chat_loading);

        // Analysis lands on the user message, not the reply.
        let analysis = app.messages[0].analysis.as_ref().unwrap();
        assert_eq!(analysis.confidence_score, Some(0.7));
        assert!(app.messages[1].analysis.is_none());
    }

    #[test]
    fn failed_send_appends_exactly_one_apology() {
        let mut app = test_app();
        app.chat_input = "hello".to_string();
        app.begin_send().unwrap();

        app.complete_send(Err(anyhow!("connection refused")));
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::Assistant);
        assert_eq!(app.messages[1].content, mock::APOLOGY_MESSAGE);
        assert!(!app.chat_loading);
    }

    #[test]
    fn send_without_conversation_answers_with_canned_reply() {
        let mut app = test_app();
        assert!(app.conversation.is_none());
        app.chat_input = "anyone there?".to_string();
        let text = app.begin_send().unwrap();
        app.dispatch_send(text);
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::Assistant);
        assert!(!app.chat_loading);
        assert!(app.send_task.is_none());
    }

    #[test]
    fn failed_bootstrap_seeds_static_greeting() {
        let mut app = test_app();
        app.complete_bootstrap(Err(anyhow!("backend down")));
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].content, mock::WELCOME_MESSAGE);
        assert!(app.conversation.is_none());
    }

    #[test]
    fn message_ids_are_unique_within_session() {
        let mut app = test_app();
        app.complete_bootstrap(Err(anyhow!("down")));
        for text in ["one", "two", "three"] {
            app.chat_input = text.to_string();
            let sent = app.begin_send().unwrap();
            app.dispatch_send(sent);
        }
        let mut ids: Vec<i64> = app.messages.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), app.messages.len());
    }

    #[test]
    fn cancel_restores_draft_to_saved_values() {
        let mut app = test_app();
        let saved_name = app.profile.username.clone();
        let saved_interests = app.profile.interests.clone();

        app.start_profile_edit();
        {
            let draft = app.draft.as_mut().unwrap();
            draft.username = "someone-else".to_string();
            draft.interests.push("gardening".to_string());
        }
        app.cancel_profile_edit();
        assert!(app.draft.is_none());
        assert_eq!(app.profile.username, saved_name);
        assert_eq!(app.profile.interests, saved_interests);

        // Re-entering edit mode starts from the saved values again.
        app.start_profile_edit();
        let draft = app.draft.as_ref().unwrap();
        assert_eq!(draft.username, saved_name);
        assert_eq!(draft.interests, saved_interests);
    }

    #[test]
    fn duplicate_tags_leave_the_set_unchanged() {
        let mut app = test_app();
        app.start_profile_edit();

        let before = app.draft.as_ref().unwrap().interests.clone();
        assert!(before.contains(&"travel".to_string()));

        app.draft.as_mut().unwrap().new_interest = " Travel ".to_string();
        app.add_draft_interest();
        let draft = app.draft.as_ref().unwrap();
        assert_eq!(draft.interests, before);
        assert!(draft.new_interest.is_empty());

        app.draft.as_mut().unwrap().new_goal = "improve fluency".to_string();
        let goals_before = app.draft.as_ref().unwrap().goals.clone();
        app.add_draft_goal();
        assert_eq!(app.draft.as_ref().unwrap().goals, goals_before);
    }

    #[test]
    fn new_tags_are_trimmed_and_appended() {
        let mut app = test_app();
        app.start_profile_edit();
        app.draft.as_mut().unwrap().new_interest = "  photography  ".to_string();
        app.add_draft_interest();
        let draft = app.draft.as_ref().unwrap();
        assert_eq!(draft.interests.last().map(String::as_str), Some("photography"));
    }

    #[test]
    fn failed_save_keeps_edit_mode_and_draft() {
        let mut app = test_app();
        app.start_profile_edit();
        app.draft.as_mut().unwrap().username = "renamed".to_string();
        app.profile_saving = true;

        app.complete_profile_save(Err(anyhow!("500")));
        assert!(app.is_editing_profile());
        assert_eq!(app.draft.as_ref().unwrap().username, "renamed");
        assert!(app.profile_status.is_some());
        assert!(!app.profile_saving);
    }

    #[test]
    fn knowledge_filter_narrows_and_sorts_by_mastery() {
        let mut app = test_app();
        app.complete_knowledge(Ok(mock::knowledge_items()));
        let all = app.filtered_knowledge();
        assert!(all
            .windows(2)
            .all(|w| w[0].mastery_level >= w[1].mastery_level));
        let all_len = all.len();

        app.knowledge_filter = KnowledgeFilter::Phrases;
        let phrases = app.filtered_knowledge();
        assert!(!phrases.is_empty());
        assert!(phrases.len() < all_len);
        assert!(phrases
            .iter()
            .all(|i| i.item_type == crate::models::ItemType::Phrase));
    }

    #[test]
    fn failed_progress_fetch_substitutes_mock_series() {
        let mut app = test_app();
        app.progress_loading = true;
        app.complete_progress(Err(anyhow!("timeout")));
        let records = app.progress.as_ref().unwrap();
        assert_eq!(records.len(), PROGRESS_DAYS as usize);
        assert!(!app.progress_loading);
    }

    #[test]
    fn failed_feedback_substitutes_mock_analysis() {
        let mut app = test_app();
        app.show_feedback = true;
        app.feedback_loading = true;
        app.complete_feedback(Err(anyhow!("503")));
        assert!(app.feedback.is_some());
        assert!(app.exercises.is_some());
        assert!(!app.feedback_loading);
    }

    #[tokio::test]
    async fn feedback_with_focus_sounds_requests_exercises() {
        let mut app = test_app();
        app.show_feedback = true;
        app.feedback_loading = true;
        app.complete_feedback(Ok(mock::speech_feedback()));
        assert!(app.feedback.is_some());
        assert!(!app.feedback_loading);
        // Exercises come from a follow-up request, not from mock data
        assert!(app.exercises_task.is_some());
        assert!(app.exercises.is_none());
    }

    #[test]
    fn feedback_without_focus_sounds_skips_exercises() {
        let mut app = test_app();
        app.show_feedback = true;
        app.complete_feedback(Ok(SpeechFeedback::default()));
        assert!(app.feedback.is_some());
        assert!(app.exercises_task.is_none());
        assert!(app.exercises.is_none());
    }

    #[test]
    fn chat_line_estimate_accounts_for_wrapping() {
        let mut app = test_app();
        app.chat_width = 10;
        app.chat_height = 5;
        app.messages
            .push(Message::local(1, Sender::User, "a".repeat(40)));

        // header line + 5 wrapped content lines + trailing blank
        assert_eq!(app.chat_total_lines(), 7);

        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, 2);
    }
}
