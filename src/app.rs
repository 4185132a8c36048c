use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::greet::{GreetError, Greeter};
use crate::tui::AppEvent;
use crate::window::WindowControl;

/// Shown once per session, before any user interaction.
pub const WELCOME_MESSAGE: &str = "Welcome to TARS! Press Ctrl+Space to summon me anytime.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Assistant,
}

/// One transcript entry. Append-only; insertion order is display order.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub origin: Origin,
    pub text: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub messages: Vec<ChatMessage>,

    // Input buffer state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // In-flight greet calls (input stays enabled while these settle)
    pub pending_calls: usize,

    // Transcript scroll state
    pub transcript_scroll: u16,
    pub transcript_height: u16, // Height of transcript area for scroll calculations
    pub transcript_width: u16,  // Width of transcript area for wrap calculations
    pub total_transcript_lines: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Injected capabilities
    greeter: Arc<dyn Greeter>,
    window: Arc<dyn WindowControl>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        greeter: Arc<dyn Greeter>,
        window: Arc<dyn WindowControl>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let mut app = Self {
            should_quit: false,
            messages: Vec::new(),

            input: String::new(),
            cursor: 0,

            pending_calls: 0,

            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,
            total_transcript_lines: 0,

            animation_frame: 0,

            greeter,
            window,
            events,
        };

        app.push_message(Origin::Assistant, WELCOME_MESSAGE.to_string());
        app
    }

    /// Submit the current input buffer to the greet backend.
    ///
    /// Whitespace-only input is a no-op and leaves the buffer as-is. For
    /// anything else: the user message is appended and the buffer cleared
    /// before the call is issued, and the reply lands later via
    /// `finish_greet`. Submissions are not serialized; several calls may be
    /// in flight at once.
    pub fn submit(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }

        self.push_message(Origin::User, text.clone());
        self.input.clear();
        self.cursor = 0;
        self.pending_calls += 1;

        tracing::debug!(pending = self.pending_calls, "submitting greet call");

        let greeter = Arc::clone(&self.greeter);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = greeter.greet(&text).await;
            let _ = events.send(AppEvent::Greet(outcome));
        });
    }

    /// Record the outcome of a settled greet call as an assistant message.
    pub fn finish_greet(&mut self, outcome: Result<String, GreetError>) {
        self.pending_calls = self.pending_calls.saturating_sub(1);

        match outcome {
            Ok(reply) => self.push_message(Origin::Assistant, reply),
            Err(err) => {
                tracing::warn!(error = %err, "greet call failed");
                self.push_message(Origin::Assistant, format!("Error: {}", err));
            }
        }
    }

    /// Ask the window collaborator to hide the chat window. Fire-and-forget;
    /// nothing else changes here.
    pub fn request_hide(&self) {
        self.window.request_hide();
    }

    fn push_message(&mut self, origin: Origin, text: String) {
        self.messages.push(ChatMessage { origin, text });
        self.scroll_to_bottom();
    }

    // Transcript scrolling
    pub fn scroll_down(&mut self) {
        if self.transcript_scroll
            < self
                .total_transcript_lines
                .saturating_sub(self.transcript_height)
        {
            self.transcript_scroll = self.transcript_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.transcript_height / 2;
        let max_scroll = self
            .total_transcript_lines
            .saturating_sub(self.transcript_height);
        self.transcript_scroll = (self.transcript_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.transcript_height / 2;
        self.transcript_scroll = self.transcript_scroll.saturating_sub(half_page);
    }

    /// Scroll the transcript so the newest entry is visible.
    pub fn scroll_to_bottom(&mut self) {
        // Use actual transcript width for wrap calculation, default to 50 if not set
        let wrap_width = if self.transcript_width > 0 {
            self.transcript_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.messages {
            total_lines += 1; // Role line ("You:" or "TARS:")
            // Calculate wrapped lines for each line of content
            for line in msg.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.pending_calls > 0 {
            total_lines += 2; // "TARS:" + "Thinking..."
        }

        let visible_height = if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.transcript_scroll = total_lines.saturating_sub(visible_height);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.pending_calls > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    struct EchoGreeter;

    #[async_trait]
    impl Greeter for EchoGreeter {
        async fn greet(&self, name: &str) -> Result<String, GreetError> {
            Ok(format!("Hello, {}! Welcome to TARS.", name))
        }
    }

    #[derive(Default)]
    struct CountingWindow {
        hides: AtomicUsize,
    }

    impl WindowControl for CountingWindow {
        fn request_hide(&self) {
            self.hides.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_app() -> (App, UnboundedReceiver<AppEvent>, Arc<CountingWindow>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let window = Arc::new(CountingWindow::default());
        let app = App::new(Arc::new(EchoGreeter), window.clone(), tx);
        (app, rx, window)
    }

    fn transcript(app: &App) -> Vec<(Origin, &str)> {
        app.messages
            .iter()
            .map(|m| (m.origin, m.text.as_str()))
            .collect()
    }

    #[test]
    fn starts_with_the_welcome_message_and_an_empty_buffer() {
        let (app, _rx, _window) = test_app();

        assert_eq!(
            transcript(&app),
            vec![(Origin::Assistant, WELCOME_MESSAGE)]
        );
        assert_eq!(app.input, "");
        assert_eq!(app.pending_calls, 0);
    }

    #[tokio::test]
    async fn submit_trims_input_and_clears_the_buffer() {
        let (mut app, _rx, _window) = test_app();
        app.input = "  hello  ".to_string();
        app.cursor = 9;

        app.submit();

        assert_eq!(app.messages.last().unwrap().origin, Origin::User);
        assert_eq!(app.messages.last().unwrap().text, "hello");
        assert_eq!(app.input, "");
        assert_eq!(app.cursor, 0);
        assert_eq!(app.pending_calls, 1);
    }

    #[tokio::test]
    async fn blank_submissions_leave_everything_untouched() {
        let (mut app, mut rx, _window) = test_app();
        app.input = "   ".to_string();
        app.cursor = 3;

        app.submit();

        assert_eq!(app.messages.len(), 1); // welcome only
        assert_eq!(app.input, "   ");
        assert_eq!(app.cursor, 3);
        assert_eq!(app.pending_calls, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn submission_reaches_the_greeter_with_trimmed_text() {
        let (mut app, mut rx, _window) = test_app();
        app.input = " ping ".to_string();

        app.submit();

        match rx.recv().await {
            Some(AppEvent::Greet(Ok(reply))) => {
                assert_eq!(reply, "Hello, ping! Welcome to TARS.");
            }
            other => panic!("expected a settled greet call, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn reply_is_appended_verbatim_after_the_user_message() {
        let (mut app, _rx, _window) = test_app();
        app.input = "ping".to_string();

        app.submit();
        app.finish_greet(Ok("pong".to_string()));

        let tail = &transcript(&app)[1..];
        assert_eq!(tail, [(Origin::User, "ping"), (Origin::Assistant, "pong")]);
        assert_eq!(app.pending_calls, 0);
    }

    #[tokio::test]
    async fn failure_becomes_an_error_message() {
        let (mut app, _rx, _window) = test_app();
        app.input = "bad".to_string();

        app.submit();
        app.finish_greet(Err(GreetError::new("timeout")));

        let tail = &transcript(&app)[1..];
        assert_eq!(
            tail,
            [(Origin::User, "bad"), (Origin::Assistant, "Error: timeout")]
        );
    }

    #[tokio::test]
    async fn replies_append_in_settlement_order() {
        let (mut app, _rx, _window) = test_app();

        app.input = "first".to_string();
        app.submit();
        app.input = "second".to_string();
        app.submit();
        assert_eq!(app.pending_calls, 2);

        // The backend settles the second call before the first.
        app.finish_greet(Ok("reply to second".to_string()));
        app.finish_greet(Ok("reply to first".to_string()));

        let tail = &transcript(&app)[1..];
        assert_eq!(
            tail,
            [
                (Origin::User, "first"),
                (Origin::User, "second"),
                (Origin::Assistant, "reply to second"),
                (Origin::Assistant, "reply to first"),
            ]
        );
    }

    #[test]
    fn hide_request_is_forwarded_exactly_once() {
        let (app, _rx, window) = test_app();

        app.request_hide();

        assert_eq!(window.hides.load(Ordering::SeqCst), 1);
        assert_eq!(app.messages.len(), 1); // no message appended
    }

    #[test]
    fn appending_scrolls_the_transcript_to_the_bottom() {
        let (mut app, _rx, _window) = test_app();
        app.transcript_width = 10;
        app.transcript_height = 4;

        for _ in 0..4 {
            app.finish_greet(Ok("a long reply that wraps a few times".to_string()));
        }

        assert!(app.transcript_scroll > 0);

        let bottom = app.transcript_scroll;
        app.scroll_up();
        assert_eq!(app.transcript_scroll, bottom - 1);
    }

    #[test]
    fn animation_only_runs_while_calls_are_pending() {
        let (mut app, _rx, _window) = test_app();

        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.pending_calls = 1;
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }
}
