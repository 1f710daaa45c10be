use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode, ProfileField, Screen};
use crate::models::Sender;
use crate::speech;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_tasks().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The feedback popup swallows input while open
    if app.show_feedback {
        handle_feedback_popup(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_feedback_popup(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_feedback(),
        KeyCode::Char('j') | KeyCode::Down => {
            app.feedback_scroll = app.feedback_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.feedback_scroll = app.feedback_scroll.saturating_sub(1);
        }
        KeyCode::Char('g') => app.feedback_scroll = 0,
        // Hear the analyzed sentence
        KeyCode::Char('v') => {
            speech::speak(&app.feedback_text, app.config.speech_command.as_deref());
        }
        // Hear the practice words for the first focus sound
        KeyCode::Char('w') => {
            let words = app
                .feedback
                .as_ref()
                .and_then(|f| f.pronunciation.sound_focus_areas.first())
                .map(|area| area.practice_words.join(", "))
                .filter(|w| !w.is_empty());
            if let Some(words) = words {
                speech::speak(&words, app.config.speech_command.as_deref());
            }
        }
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // Screen switching works from any screen in normal mode
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('1') => {
            app.screen = Screen::Chat;
            return;
        }
        KeyCode::Char('2') => {
            switch_to(app, Screen::Progress);
            return;
        }
        KeyCode::Char('3') => {
            switch_to(app, Screen::Knowledge);
            return;
        }
        KeyCode::Char('4') => {
            app.screen = Screen::Profile;
            return;
        }
        KeyCode::Tab => {
            let screens = Screen::all();
            let i = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            switch_to(app, screens[(i + 1) % screens.len()]);
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Chat => handle_chat_normal(app, key),
        Screen::Progress => handle_progress_normal(app, key),
        Screen::Knowledge => handle_knowledge_normal(app, key),
        Screen::Profile => handle_profile_normal(app, key),
    }
}

fn switch_to(app: &mut App, screen: Screen) {
    app.screen = screen;
    match screen {
        Screen::Progress => app.ensure_progress_loaded(),
        Screen::Knowledge => app.ensure_knowledge_loaded(),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.chat_cursor = app.chat_input.chars().count();
        }

        // Transcript navigation
        KeyCode::Char('j') => app.select_next_message(),
        KeyCode::Char('k') => app.select_prev_message(),
        KeyCode::Down => app.scroll_chat_down(),
        KeyCode::Up => app.scroll_chat_up(),
        KeyCode::Char('g') => {
            app.chat_scroll = 0;
            if !app.messages.is_empty() {
                app.selected_message_idx = Some(0);
            }
        }
        KeyCode::Char('G') => {
            app.scroll_chat_to_bottom();
            if !app.messages.is_empty() {
                app.selected_message_idx = Some(app.messages.len() - 1);
            }
        }
        KeyCode::Esc => app.selected_message_idx = None,

        // Hear the selected message (or the latest reply)
        KeyCode::Char('v') => {
            let text = app
                .selected_message()
                .or_else(|| app.messages.iter().rev().find(|m| m.sender == Sender::Assistant))
                .map(|m| m.content.clone());
            if let Some(text) = text {
                speech::speak(&text, app.config.speech_command.as_deref());
            }
        }

        // Pronunciation feedback on the selected message (or your latest)
        KeyCode::Char('p') => {
            let text = app
                .selected_message()
                .filter(|m| m.sender == Sender::User)
                .or_else(|| app.messages.iter().rev().find(|m| m.sender == Sender::User))
                .map(|m| m.content.clone());
            if let Some(text) = text {
                app.open_feedback(text);
            }
        }

        _ => {}
    }
}

fn handle_progress_normal(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('r') {
        app.refresh_progress();
    }
}

fn handle_knowledge_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.refresh_knowledge(),
        KeyCode::Char('f') | KeyCode::Char('l') | KeyCode::Right => {
            app.cycle_knowledge_filter();
        }
        KeyCode::Char('j') | KeyCode::Down => app.knowledge_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.knowledge_nav_up(),
        _ => {}
    }
}

fn handle_profile_normal(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('e') {
        app.start_profile_edit();
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Chat => handle_chat_editing(app, key),
        Screen::Profile => handle_profile_editing(app, key),
        _ => app.input_mode = InputMode::Normal,
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if let Some(text) = app.begin_send() {
                app.dispatch_send(text);
            }
        }
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn handle_profile_editing(app: &mut App, key: KeyEvent) {
    // Ctrl-S saves from any field
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.save_profile();
        return;
    }

    match key.code {
        KeyCode::Esc => app.cancel_profile_edit(),
        KeyCode::Tab => {
            app.profile_field = app.profile_field.next();
        }
        KeyCode::BackTab => {
            // Cycle backwards: four forward steps
            for _ in 0..4 {
                app.profile_field = app.profile_field.next();
            }
        }
        KeyCode::Enter => match app.profile_field {
            ProfileField::NewInterest => app.add_draft_interest(),
            ProfileField::NewGoal => app.add_draft_goal(),
            _ => app.profile_field = app.profile_field.next(),
        },
        KeyCode::Left => {
            if app.profile_field == ProfileField::Level {
                if let Some(draft) = &mut app.draft {
                    draft.english_level = draft.english_level.prev();
                }
            }
        }
        KeyCode::Right => {
            if app.profile_field == ProfileField::Level {
                if let Some(draft) = &mut app.draft {
                    draft.english_level = draft.english_level.next();
                }
            }
        }
        KeyCode::Down => match app.profile_field {
            ProfileField::NewInterest => {
                if let Some(draft) = &app.draft {
                    list_nav_down(&mut app.interests_state, draft.interests.len());
                }
            }
            ProfileField::NewGoal => {
                if let Some(draft) = &app.draft {
                    list_nav_down(&mut app.goals_state, draft.goals.len());
                }
            }
            _ => {}
        },
        KeyCode::Up => match app.profile_field {
            ProfileField::NewInterest => list_nav_up(&mut app.interests_state),
            ProfileField::NewGoal => list_nav_up(&mut app.goals_state),
            _ => {}
        },
        KeyCode::Delete => match app.profile_field {
            ProfileField::NewInterest => app.remove_selected_interest(),
            ProfileField::NewGoal => app.remove_selected_goal(),
            _ => {}
        },
        KeyCode::Backspace => {
            if let Some(draft) = &mut app.draft {
                match app.profile_field {
                    ProfileField::Username => {
                        draft.username.pop();
                    }
                    ProfileField::Email => {
                        draft.email.pop();
                    }
                    ProfileField::NewInterest => {
                        draft.new_interest.pop();
                    }
                    ProfileField::NewGoal => {
                        draft.new_goal.pop();
                    }
                    ProfileField::Level => {}
                }
            }
        }
        KeyCode::Char(c) => {
            if let Some(draft) = &mut app.draft {
                match app.profile_field {
                    ProfileField::Username => draft.username.push(c),
                    ProfileField::Email => draft.email.push(c),
                    ProfileField::NewInterest => draft.new_interest.push(c),
                    ProfileField::NewGoal => draft.new_goal.push(c),
                    ProfileField::Level => {}
                }
            }
        }
        _ => {}
    }
}

fn list_nav_down(state: &mut ratatui::widgets::ListState, len: usize) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(i) => (i + 1).min(len - 1),
        None => 0,
    };
    state.select(Some(i));
}

fn list_nav_up(state: &mut ratatui::widgets::ListState) {
    if let Some(i) = state.selected() {
        state.select(Some(i.saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> App {
        App::new(Config::new(), false)
    }

    #[test]
    fn char_to_byte_index_handles_multibyte() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn typing_inserts_at_cursor() {
        let mut app = test_app();
        app.screen = Screen::Chat;
        app.input_mode = InputMode::Editing;

        for c in "héllo".chars() {
            handle_chat_editing(&mut app, key(KeyCode::Char(c)));
        }
        assert_eq!(app.chat_input, "héllo");

        handle_chat_editing(&mut app, key(KeyCode::Home));
        handle_chat_editing(&mut app, key(KeyCode::Char('>')));
        assert_eq!(app.chat_input, ">héllo");

        handle_chat_editing(&mut app, key(KeyCode::End));
        handle_chat_editing(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.chat_input, ">héll");
    }

    #[test]
    fn number_keys_switch_screens() {
        let mut app = test_app();
        app.offline = true;
        handle_key(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.screen, Screen::Progress);
        // Offline switch seeds the dashboard immediately
        assert!(app.progress.is_some());

        handle_key(&mut app, key(KeyCode::Char('4')));
        assert_eq!(app.screen, Screen::Profile);
        handle_key(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.screen, Screen::Chat);
    }

    #[test]
    fn q_quits_only_in_normal_mode() {
        let mut app = test_app();
        app.input_mode = InputMode::Editing;
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.chat_input, "q");

        app.input_mode = InputMode::Normal;
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn profile_edit_keys_build_a_tag() {
        let mut app = test_app();
        app.screen = Screen::Profile;
        handle_key(&mut app, key(KeyCode::Char('e')));
        assert!(app.is_editing_profile());
        assert_eq!(app.profile_field, ProfileField::Username);

        // Tab over to the interest field and type a new tag
        for _ in 0..3 {
            handle_key(&mut app, key(KeyCode::Tab));
        }
        assert_eq!(app.profile_field, ProfileField::NewInterest);
        for c in "music".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Enter));

        let draft = app.draft.as_ref().unwrap();
        assert!(draft.interests.contains(&"music".to_string()));
        assert!(draft.new_interest.is_empty());
    }

    #[test]
    fn escape_leaves_profile_edit_without_saving() {
        let mut app = test_app();
        app.screen = Screen::Profile;
        handle_key(&mut app, key(KeyCode::Char('e')));
        handle_key(&mut app, key(KeyCode::Char('x')));
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.is_editing_profile());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.profile.username.contains('x'));
    }

    #[test]
    fn feedback_popup_captures_navigation_keys() {
        let mut app = test_app();
        app.show_feedback = true;
        app.feedback_scroll = 0;
        handle_key(&mut app, key(KeyCode::Char('j')));
        assert_eq!(app.feedback_scroll, 1);
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.show_feedback);
    }
}
