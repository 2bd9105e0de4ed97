use folio_core::content::EXAMPLE_QUESTIONS;
use folio_core::{ChatSession, SessionEvent};
use ratatui::layout::Rect;
use tracing::debug;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub session: ChatSession,
    pub endpoint: String,

    // Input editing (the text itself lives in the session)
    pub cursor: usize,

    // Chat scrolling
    pub scroll: u16,
    pub follow_tail: bool,
    pub chat_height: u16, // Inner height of the chat area, updated during render
    pub chat_width: u16,
    pub chat_area: Option<Rect>,

    pub fullscreen: bool,
    pub notice: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(session: ChatSession, endpoint: String) -> Self {
        Self {
            should_quit: false,
            session,
            endpoint,
            cursor: 0,
            scroll: 0,
            follow_tail: true,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            fullscreen: false,
            notice: None,
            animation_frame: 0,
        }
    }

    fn input_len(&self) -> usize {
        self.session.input().chars().count()
    }

    /// Keep the cursor inside the input after it was replaced (e.g. by voice)
    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.input_len());
    }

    pub fn insert_char(&mut self, c: char) {
        self.clamp_cursor();
        let mut input = self.session.input();
        let byte_pos = char_to_byte_index(&input, self.cursor);
        input.insert(byte_pos, c);
        self.session.set_input(&input);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        self.clamp_cursor();
        if self.cursor > 0 {
            self.cursor -= 1;
            let mut input = self.session.input();
            let byte_pos = char_to_byte_index(&input, self.cursor);
            input.remove(byte_pos);
            self.session.set_input(&input);
        }
    }

    pub fn delete(&mut self) {
        self.clamp_cursor();
        let mut input = self.session.input();
        if self.cursor < input.chars().count() {
            let byte_pos = char_to_byte_index(&input, self.cursor);
            input.remove(byte_pos);
            self.session.set_input(&input);
        }
    }

    pub fn cursor_left(&mut self) {
        self.clamp_cursor();
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input_len());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input_len();
    }

    pub fn submit(&mut self) {
        if self.session.submit_input().is_some() {
            self.cursor = 0;
            self.follow_tail = true;
            self.scroll_to_bottom();
        }
    }

    /// Example questions are only offered while nothing has been asked yet
    pub fn examples_visible(&self) -> bool {
        self.session.messages().is_empty() && self.session.input().is_empty()
    }

    pub fn pick_example(&mut self, index: usize) -> bool {
        if !self.examples_visible() {
            return false;
        }
        let Some(question) = EXAMPLE_QUESTIONS.get(index) else {
            return false;
        };
        debug!(question = %question, "example question picked");
        if self.session.submit_example(question).is_some() {
            self.cursor = 0;
            self.follow_tail = true;
            true
        } else {
            false
        }
    }

    pub fn toggle_listening(&mut self) {
        let _ = self.session.toggle_listening();
    }

    /// Speak or stop the most recent finished assistant reply
    pub fn toggle_speech(&mut self) {
        if let Some(id) = self.session.last_complete_reply_id() {
            let _ = self.session.toggle_speech(id);
        }
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        debug!(fullscreen = self.fullscreen, "fullscreen toggled");
    }

    pub fn dismiss_notice(&mut self) -> bool {
        self.notice.take().is_some()
    }

    pub fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Notice(notice) => self.notice = Some(notice.message()),
            SessionEvent::Changed => {
                self.clamp_cursor();
                if self.follow_tail {
                    self.scroll_to_bottom();
                }
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max_scroll);
        self.follow_tail = self.scroll >= max_scroll;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.total_chat_lines().saturating_sub(visible_height)
    }

    /// Estimate wrapped line count of the chat log
    fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.session.messages() {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "AI:")
            let content = if msg.content.is_empty() { " " } else { msg.content.as_str() };
            for line in content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 { 1 } else { char_count / wrap_width + 1 };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }
        total_lines
    }
}
