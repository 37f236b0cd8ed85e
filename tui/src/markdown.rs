//! Markdown Rendering
//!
//! Converts raw message text into styled terminal lines. The core hands the
//! renderer raw, unmodified text; everything visual happens here.
//!
//! Supported: paragraphs with word wrapping, emphasis/strong, GFM
//! strikethrough, headings, lists, tables, and code - inline code spans and
//! fenced code blocks get distinct treatments.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::theme;

/// Render markdown message text into wrapped, styled lines
pub fn render_markdown(text: &str, width: usize) -> Vec<Line<'static>> {
    let width = width.max(10);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let mut renderer = Renderer::new(width);
    for event in Parser::new_ext(text, options) {
        renderer.apply(event);
    }
    renderer.finish()
}

/// Streaming renderer state over pulldown-cmark events
struct Renderer {
    width: usize,
    lines: Vec<Line<'static>>,
    /// Inline spans of the block currently being built
    spans: Vec<(String, Style)>,
    bold: bool,
    italic: bool,
    strike: bool,
    heading: bool,
    in_code_block: bool,
    code_buf: String,
    in_cell: bool,
    cell_buf: String,
    table_row: Vec<String>,
    in_table_head: bool,
}

impl Renderer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            spans: Vec::new(),
            bold: false,
            italic: false,
            strike: false,
            heading: false,
            in_code_block: false,
            code_buf: String::new(),
            in_cell: false,
            cell_buf: String::new(),
            table_row: Vec::new(),
            in_table_head: false,
        }
    }

    fn apply(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),

            Event::Text(text) => {
                if self.in_code_block {
                    self.code_buf.push_str(&text);
                } else if self.in_cell {
                    self.cell_buf.push_str(&text);
                } else {
                    self.spans.push((text.to_string(), self.inline_style()));
                }
            }

            Event::Code(code) => {
                if self.in_cell {
                    self.cell_buf.push_str(&code);
                } else {
                    self.spans.push((code.to_string(), theme::inline_code()));
                }
            }

            Event::SoftBreak => {
                self.spans.push((" ".to_string(), self.inline_style()));
            }
            Event::HardBreak => {
                self.flush_spans();
            }

            Event::Rule => {
                self.flush_spans();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(self.width),
                    Style::default().fg(theme::CHROME_GRAY),
                )));
                self.blank();
            }

            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => self.heading = true,
            Tag::Strong => self.bold = true,
            Tag::Emphasis => self.italic = true,
            Tag::Strikethrough => self.strike = true,
            Tag::CodeBlock(_) => {
                self.flush_spans();
                self.in_code_block = true;
                self.code_buf.clear();
            }
            Tag::Item => {
                self.flush_spans();
                self.spans.push((
                    "-".to_string(),
                    Style::default().fg(theme::CHROME_GRAY),
                ));
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.table_row.clear();
            }
            Tag::TableRow => self.table_row.clear(),
            Tag::TableCell => {
                self.in_cell = true;
                self.cell_buf.clear();
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_spans();
                self.blank();
            }
            TagEnd::Heading(_) => {
                self.flush_spans();
                self.heading = false;
                self.blank();
            }
            TagEnd::Strong => self.bold = false,
            TagEnd::Emphasis => self.italic = false,
            TagEnd::Strikethrough => self.strike = false,
            TagEnd::CodeBlock => {
                self.flush_code_block();
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::Item => self.flush_spans(),
            TagEnd::List(_) => self.blank(),
            TagEnd::TableHead => {
                self.flush_table_row(true);
                self.in_table_head = false;
            }
            TagEnd::TableRow => self.flush_table_row(false),
            TagEnd::TableCell => {
                self.in_cell = false;
                self.table_row.push(self.cell_buf.trim().to_string());
            }
            TagEnd::Table => self.blank(),
            _ => {}
        }
    }

    fn inline_style(&self) -> Style {
        let mut style = if self.heading {
            theme::heading()
        } else {
            Style::default()
        };
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.strike {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        style
    }

    /// Word-wrap the accumulated inline spans into lines
    fn flush_spans(&mut self) {
        if self.spans.is_empty() {
            return;
        }

        let mut current: Vec<Span<'static>> = Vec::new();
        let mut used = 0usize;

        for (text, style) in self.spans.drain(..) {
            for word in text.split_whitespace() {
                let word_width = word.width();
                if used == 0 {
                    current.push(Span::styled(word.to_string(), style));
                    used = word_width;
                } else if used + 1 + word_width <= self.width {
                    current.push(Span::styled(format!(" {word}"), style));
                    used += 1 + word_width;
                } else {
                    self.lines.push(Line::from(std::mem::take(&mut current)));
                    current.push(Span::styled(word.to_string(), style));
                    used = word_width;
                }
            }
        }

        if !current.is_empty() {
            self.lines.push(Line::from(current));
        }
    }

    /// Emit the buffered code block, one padded line per source line
    fn flush_code_block(&mut self) {
        let raw: Vec<&str> = self.code_buf.trim_end_matches('\n').split('\n').collect();
        let block_width = raw
            .iter()
            .map(|l| l.width())
            .max()
            .unwrap_or(0)
            .min(self.width.saturating_sub(2));

        for line in raw {
            let shown: String = line.chars().take(self.width.saturating_sub(2)).collect();
            let pad = block_width.saturating_sub(shown.width());
            self.lines.push(Line::from(Span::styled(
                format!(" {shown}{} ", " ".repeat(pad)),
                theme::code_block(),
            )));
        }
        self.code_buf.clear();
    }

    fn flush_table_row(&mut self, header: bool) {
        if self.table_row.is_empty() {
            return;
        }
        let style = if header {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let row = self.table_row.join(" | ");
        self.lines.push(Line::from(Span::styled(row, style)));
        self.table_row.clear();
    }

    /// Separate blocks with one empty line
    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_spans();
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}
