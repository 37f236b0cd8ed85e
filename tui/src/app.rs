//! Main Application
//!
//! The App struct drives the TUI as a thin display client:
//! - Event loop (keyboard, mouse, resize)
//! - SessionController for the conversation
//! - Rendering of the timeline, typing affordance, input line, and status
//!
//! All conversation state lives in the core's session controller; the App
//! converts terminal events into controller calls and renders what the
//! controller holds.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

use parley_core::{ChatConfig, Message, Sender, SessionController, WebSocketChannel};

use crate::markdown;
use crate::theme;

/// Input box height (separator + text lines)
const INPUT_HEIGHT: u16 = 4;

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,
    /// The conversation session (owns the channel)
    session: SessionController<WebSocketChannel>,
    /// Scroll offset (lines from bottom, 0 = latest)
    scroll_offset: usize,
    /// Total rendered conversation lines (for scroll bounds)
    total_lines: usize,
    /// Frame counter (drives the typing-dots animation)
    frame_count: u64,
    /// Terminal size
    size: (u16, u16),
}

impl App {
    /// Create a new App for the configured endpoint
    pub fn new(config: &ChatConfig) -> anyhow::Result<Self> {
        let size = crossterm::terminal::size()?;
        let channel = WebSocketChannel::new(config.endpoint.clone());
        let session = SessionController::new(channel);

        Ok(Self {
            running: true,
            session,
            scroll_offset: 0,
            total_lines: 0,
            frame_count: 0,
            size,
        })
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        // Open the channel; a failed connect is not fatal: the session
        // degrades to local echo and the status line shows Offline.
        if let Err(e) = self.session.start().await {
            tracing::warn!(error = %e, "Channel connect failed, continuing offline");
        }

        let frame_duration = Duration::from_millis(100);
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so the user sees UI
        terminal.draw(|frame| self.render(frame))?;

        while self.running {
            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            // Only handle Press events (not Release or Repeat)
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key);
                            }
                            Event::Mouse(mouse) => self.handle_mouse(mouse),
                            Event::Resize(w, h) => self.size = (w, h),
                            _ => {}
                        }
                    }
                }

                // Frame tick
                _ = tokio::time::sleep(frame_duration) => {}
            }

            // Apply responses queued by the channel since the last turn;
            // fresh messages snap the view back to the bottom.
            if self.session.poll_inbound() > 0 {
                self.scroll_offset = 0;
            }

            self.frame_count += 1;
            terminal.draw(|frame| self.render(frame))?;
        }

        self.session.close();
        Ok(())
    }

    /// Handle keyboard input
    fn handle_key(&mut self, key: event::KeyEvent) {
        match key.code {
            // Quit
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }

            // Submit draft
            KeyCode::Enter => {
                self.session.submit();
                self.scroll_offset = 0;
            }

            // Typing
            KeyCode::Char(c) => self.session.push_input(c),
            KeyCode::Backspace => self.session.backspace(),

            // Conversation scrolling
            KeyCode::PageUp => {
                let page = (self.size.1.saturating_sub(INPUT_HEIGHT + 1) / 2) as usize;
                let max_scroll = self.total_lines.saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + page).min(max_scroll);
            }
            KeyCode::PageDown => {
                let page = (self.size.1.saturating_sub(INPUT_HEIGHT + 1) / 2) as usize;
                self.scroll_offset = self.scroll_offset.saturating_sub(page);
            }
            KeyCode::Home if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.scroll_offset = self.total_lines.saturating_sub(1);
            }
            KeyCode::End if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.scroll_offset = 0;
            }

            _ => {}
        }
    }

    /// Handle mouse input
    fn handle_mouse(&mut self, mouse: event::MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                if self.scroll_offset < self.total_lines.saturating_sub(1) {
                    self.scroll_offset += 3;
                }
            }
            MouseEventKind::ScrollDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(3);
            }
            _ => {}
        }
    }

    /// Render the UI
    fn render(&mut self, frame: &mut ratatui::Frame<'_>) {
        let [conversation_area, input_area, status_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        // --- Conversation ---
        let width = conversation_area.width.saturating_sub(2) as usize;
        let height = conversation_area.height as usize;

        if self.session.messages().is_empty() && !self.session.is_waiting() {
            let mut lines = vec![Line::default(); height / 2];
            lines.push(Line::from(Span::styled(
                "Start a conversation",
                Style::default().fg(theme::CHROME_GRAY),
            )));
            frame.render_widget(
                Paragraph::new(lines).alignment(Alignment::Center),
                conversation_area,
            );
            self.total_lines = 0;
        } else {
            let lines = conversation_lines(
                self.session.messages(),
                self.session.is_waiting(),
                self.frame_count,
                width,
            );
            self.total_lines = lines.len();

            let max_scroll = self.total_lines.saturating_sub(height);
            if self.scroll_offset > max_scroll {
                self.scroll_offset = max_scroll;
            }
            let scroll_y = self
                .total_lines
                .saturating_sub(height)
                .saturating_sub(self.scroll_offset);

            frame.render_widget(
                Paragraph::new(lines).scroll((scroll_y as u16, 0)),
                conversation_area,
            );
        }

        // --- Input ---
        let mut input_lines = vec![Line::from(Span::styled(
            "─".repeat(input_area.width as usize),
            Style::default().fg(theme::CHROME_GRAY),
        ))];

        let text_width = (input_area.width.saturating_sub(1) as usize).max(5);
        let text_height = input_area.height.saturating_sub(1) as usize;
        let draft = format!("You: {}_", self.session.input());
        let wrapped = textwrap::wrap(&draft, text_width);
        // Show the tail when the draft outgrows the box
        let skip = wrapped.len().saturating_sub(text_height);
        for piece in wrapped.iter().skip(skip) {
            input_lines.push(Line::from(Span::styled(
                piece.to_string(),
                Style::default().fg(theme::USER_GREEN),
            )));
        }
        frame.render_widget(Paragraph::new(input_lines), input_area);

        // --- Status ---
        let link = if self.session.is_connected() {
            self.session.state().description()
        } else {
            "Offline"
        };
        let waiting = if self.session.is_waiting() {
            format!(" | {} awaiting reply", self.session.pending_responses())
        } else {
            String::new()
        };
        let scroll_info = if self.scroll_offset > 0 {
            format!(" | [^{} lines - PgDn to scroll]", self.scroll_offset)
        } else {
            String::new()
        };
        let status = format!(" {link}{waiting} | Esc to quit | PgUp/PgDn scroll{scroll_info}");
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                status,
                Style::default().fg(theme::CHROME_GRAY),
            ))),
            status_area,
        );
    }
}

/// Build the full conversation as styled lines
///
/// Each message renders as its markdown body with a bold sender prefix on
/// the first line, a dim timestamp line, and a separating blank. While
/// responses are outstanding an animated typing indicator hangs off the end.
fn conversation_lines(
    messages: &[Message],
    waiting: bool,
    frame_count: u64,
    width: usize,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in messages {
        let (prefix, accent) = sender_prefix(message.sender);
        let prefix_span = Span::styled(
            prefix,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        );

        let body = markdown::render_markdown(&message.text, width.saturating_sub(prefix.len()));
        if body.is_empty() {
            lines.push(Line::from(prefix_span));
        } else {
            for (i, line) in body.into_iter().enumerate() {
                if i == 0 {
                    let mut spans = vec![prefix_span.clone()];
                    spans.extend(line.spans);
                    lines.push(Line::from(spans));
                } else {
                    lines.push(line);
                }
            }
        }

        lines.push(Line::from(Span::styled(
            message.timestamp.clone(),
            theme::timestamp(),
        )));
        lines.push(Line::default());
    }

    if waiting {
        let dots = "● ".repeat((frame_count / 3 % 3) as usize + 1);
        lines.push(Line::from(vec![
            Span::styled(
                "AI: ",
                Style::default()
                    .fg(theme::BOT_MAGENTA)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(dots, Style::default().fg(theme::CHROME_GRAY)),
        ]));
    }

    lines
}

fn sender_prefix(sender: Sender) -> (&'static str, ratatui::style::Color) {
    match sender {
        Sender::User => ("You: ", theme::USER_GREEN),
        Sender::Bot => ("AI: ", theme::BOT_MAGENTA),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_conversation_lines_prefixes_and_timestamps() {
        let messages = vec![Message::user("hello"), Message::bot("hi there")];
        let lines = conversation_lines(&messages, false, 0, 60);

        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert!(texts[0].starts_with("You: hello"));
        assert!(texts.iter().any(|t| t.starts_with("AI: hi there")));
        // Timestamp line follows each message body.
        assert!(texts[1].ends_with("AM") || texts[1].ends_with("PM"));
    }

    #[test]
    fn test_typing_indicator_only_while_waiting() {
        let messages = vec![Message::user("hello")];

        let idle = conversation_lines(&messages, false, 0, 60);
        assert!(!line_text(idle.last().unwrap()).contains('●'));

        let waiting = conversation_lines(&messages, true, 0, 60);
        let last = line_text(waiting.last().unwrap());
        assert!(last.starts_with("AI: "));
        assert!(last.contains('●'));
    }

    #[test]
    fn test_typing_dots_animate() {
        let a = line_text(conversation_lines(&[], true, 0, 60).last().unwrap());
        let b = line_text(conversation_lines(&[], true, 4, 60).last().unwrap());
        assert_ne!(a, b);
    }
}
