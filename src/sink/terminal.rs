//! Terminal sink: streams text to a terminal and reformats it in place.
//!
//! While streaming, text is printed as-is followed by a caret. The sink
//! tracks how many rows the raw stream has used, so finalize can move
//! back up, clear it, and print the formatted story in its place.
//!
//! All escape sequences for one operation are accumulated and flushed in
//! a single write.

use super::{DisplaySink, StructuredText};
use crossterm::{
    cursor::{MoveToColumn, MoveUp, RestorePosition, SavePosition},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::io::{self, Write};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Columns per tab stop when expanding tabs.
const TAB_WIDTH: u16 = 4;

/// Configuration for the terminal sink.
#[derive(Debug, Clone)]
pub struct TerminalSinkConfig {
    /// Terminal width in columns (None = query the terminal).
    pub width: Option<u16>,
    /// Terminal height in rows (None = query the terminal).
    pub height: Option<u16>,
    /// Glyph shown after the text while streaming.
    pub caret: char,
    /// Story text color.
    pub text_color: Color,
    /// Caret color.
    pub caret_color: Color,
}

impl Default for TerminalSinkConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            caret: '▌',
            text_color: Color::Rgb {
                r: 220,
                g: 220,
                b: 220,
            },
            caret_color: Color::Rgb {
                r: 120,
                g: 180,
                b: 255,
            },
        }
    }
}

/// A [`DisplaySink`] that writes to a terminal.
pub struct TerminalSink<W: Write> {
    writer: W,
    /// Pending escape sequences and text for the current operation.
    output: Vec<u8>,
    config: TerminalSinkConfig,
    width: u16,
    height: u16,
    /// Column of the cursor within the current row.
    cursor_col: u16,
    /// Rows the raw stream has moved down since `begin`.
    rows_used: u16,
    caret_visible: bool,
}

impl TerminalSink<io::Stdout> {
    /// Create a sink on stdout with default configuration.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    /// Create a sink with default configuration.
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, TerminalSinkConfig::default())
    }

    /// Create a sink with custom configuration.
    pub fn with_config(writer: W, config: TerminalSinkConfig) -> Self {
        let (width, height) = match (config.width, config.height) {
            (Some(width), Some(height)) => (width, height),
            (width, height) => {
                let (cols, rows) = terminal::size().unwrap_or((80, 24));
                (width.unwrap_or(cols), height.unwrap_or(rows))
            }
        };

        Self {
            writer,
            output: Vec::with_capacity(4096),
            config,
            width: width.max(1),
            height: height.max(1),
            cursor_col: 0,
            rows_used: 0,
            caret_visible: false,
        }
    }

    /// Get a reference to the underlying writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Cursor position relative to where the stream began: (column, rows down).
    pub const fn cursor_position(&self) -> (u16, u16) {
        (self.cursor_col, self.rows_used)
    }

    /// Whether the caret is currently drawn.
    pub const fn caret_visible(&self) -> bool {
        self.caret_visible
    }

    /// Update the tracked cursor for `text` and return what to print.
    ///
    /// Tabs are expanded to spaces and lone carriage returns dropped, so
    /// the tracked position matches the terminal.
    fn layout(&mut self, text: &str) -> String {
        let mut printed = String::with_capacity(text.len());

        for grapheme in text.graphemes(true) {
            match grapheme {
                "\n" | "\r\n" => {
                    printed.push('\n');
                    self.cursor_col = 0;
                    self.rows_used = self.rows_used.saturating_add(1);
                }
                "\r" => {}
                "\t" => {
                    let spaces = TAB_WIDTH - (self.cursor_col % TAB_WIDTH);
                    for _ in 0..spaces {
                        self.advance_cols(1);
                        printed.push(' ');
                    }
                }
                _ => {
                    let width = u16::try_from(UnicodeWidthStr::width(grapheme)).unwrap_or(0);
                    self.advance_cols(width);
                    printed.push_str(grapheme);
                }
            }
        }

        printed
    }

    fn advance_cols(&mut self, width: u16) {
        if self.cursor_col + width > self.width {
            self.rows_used = self.rows_used.saturating_add(1);
            self.cursor_col = width;
        } else {
            self.cursor_col += width;
        }
    }

    fn queue_caret(&mut self) -> io::Result<()> {
        queue!(
            self.output,
            SavePosition,
            SetForegroundColor(self.config.caret_color),
            Print(self.config.caret),
            ResetColor,
            RestorePosition
        )?;
        self.caret_visible = true;
        Ok(())
    }

    fn queue_erase_caret(&mut self) -> io::Result<()> {
        if self.caret_visible {
            queue!(self.output, Clear(ClearType::UntilNewLine))?;
            self.caret_visible = false;
        }
        Ok(())
    }

    /// Write everything queued in one call.
    fn flush(&mut self) -> io::Result<()> {
        if !self.output.is_empty() {
            self.writer.write_all(&self.output)?;
            self.output.clear();
        }
        self.writer.flush()
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn begin(&mut self) -> io::Result<()> {
        self.cursor_col = 0;
        self.rows_used = 0;
        queue!(self.output, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
        self.queue_caret()?;
        self.flush()
    }

    fn append(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let printed = self.layout(text);
        self.queue_erase_caret()?;
        queue!(
            self.output,
            SetForegroundColor(self.config.text_color),
            Print(printed),
            ResetColor
        )?;
        self.queue_caret()?;
        self.flush()
    }

    fn keep_latest_visible(&mut self) -> io::Result<()> {
        // The terminal scrolls with the cursor; only pending output matters
        self.flush()
    }

    fn replace_structured(&mut self, story: &StructuredText) -> io::Result<()> {
        self.queue_erase_caret()?;
        queue!(self.output, MoveToColumn(0))?;

        // Rows scrolled off the top cannot be reached again
        let up = self.rows_used.min(self.height.saturating_sub(1));
        if up > 0 {
            queue!(self.output, MoveUp(up))?;
        }
        queue!(
            self.output,
            Clear(ClearType::FromCursorDown),
            SetForegroundColor(self.config.text_color)
        )?;

        for (i, paragraph) in story.paragraphs.iter().enumerate() {
            if i > 0 {
                queue!(self.output, Print('\n'))?;
            }
            for line in &paragraph.lines {
                queue!(self.output, Print(line), Print('\n'))?;
            }
        }
        queue!(self.output, ResetColor)?;

        self.cursor_col = 0;
        self.rows_used = 0;
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::format_story;

    fn sink(width: u16, height: u16) -> TerminalSink<Vec<u8>> {
        TerminalSink::with_config(
            Vec::new(),
            TerminalSinkConfig {
                width: Some(width),
                height: Some(height),
                ..TerminalSinkConfig::default()
            },
        )
    }

    fn written(sink: &TerminalSink<Vec<u8>>) -> String {
        String::from_utf8_lossy(sink.writer()).into_owned()
    }

    #[test]
    fn test_begin_draws_caret() {
        let mut sink = sink(20, 5);
        sink.begin().unwrap();
        assert!(sink.caret_visible());
        assert!(written(&sink).contains('▌'));
    }

    #[test]
    fn test_append_tracks_cursor() {
        let mut sink = sink(20, 5);
        sink.begin().unwrap();
        sink.append("Hello").unwrap();
        assert_eq!(sink.cursor_position(), (5, 0));

        sink.append(" world\nnext").unwrap();
        assert_eq!(sink.cursor_position(), (4, 1));
        assert!(written(&sink).contains("Hello"));
        assert!(written(&sink).contains(" world\nnext"));
    }

    #[test]
    fn test_append_wraps_at_width() {
        let mut sink = sink(10, 5);
        sink.begin().unwrap();
        sink.append(&"x".repeat(25)).unwrap();
        assert_eq!(sink.cursor_position(), (5, 2));
    }

    #[test]
    fn test_wide_chars_and_tabs() {
        let mut sink = sink(10, 5);
        sink.begin().unwrap();
        sink.append("故事").unwrap();
        assert_eq!(sink.cursor_position(), (4, 0));

        sink.append("\tx").unwrap();
        assert_eq!(sink.cursor_position(), (9, 0));
        assert!(!written(&sink).contains('\t'));
    }

    #[test]
    fn test_finalize_replaces_stream() {
        let mut sink = sink(40, 10);
        sink.begin().unwrap();
        sink.append("Hello\nworld\n\nBye").unwrap();
        assert_eq!(sink.cursor_position(), (3, 3));

        let before = sink.writer().len();
        sink.replace_structured(&format_story("Hello\nworld\n\nBye")).unwrap();
        let tail = String::from_utf8_lossy(&sink.writer()[before..]).into_owned();

        assert!(!sink.caret_visible());
        assert!(tail.contains("\x1b[3A"), "moves back up over the raw stream");
        assert!(tail.contains("\x1b[J"), "clears the raw stream");
        assert!(tail.contains("Hello\nworld\n\nBye\n"));
        assert!(!tail.contains('▌'));
        assert_eq!(sink.cursor_position(), (0, 0));
    }

    #[test]
    fn test_finalize_move_clamped_to_screen() {
        let mut sink = sink(10, 4);
        sink.begin().unwrap();
        sink.append(&"line\n".repeat(20)).unwrap();

        let before = sink.writer().len();
        sink.replace_structured(&format_story("done")).unwrap();
        let tail = String::from_utf8_lossy(&sink.writer()[before..]).into_owned();
        assert!(tail.contains("\x1b[3A"));
        assert!(!tail.contains("\x1b[20A"));
    }
}
