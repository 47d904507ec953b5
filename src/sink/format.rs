//! Final story formatting.
//!
//! Paragraphs are separated by blank lines (`"\n\n"`); a single newline
//! inside a paragraph is a line break. Formatting is a pure function of
//! the text.

/// One paragraph: its lines, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// Lines separated by single newlines.
    pub lines: Vec<String>,
}

/// The formatted story.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredText {
    /// Non-blank paragraphs, in order.
    pub paragraphs: Vec<Paragraph>,
}

impl StructuredText {
    /// Whether there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Render as HTML: one `<p>` per paragraph, `<br>` between lines.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for paragraph in &self.paragraphs {
            html.push_str("<p>");
            for (i, line) in paragraph.lines.iter().enumerate() {
                if i > 0 {
                    html.push_str("<br>");
                }
                escape_html_into(line, &mut html);
            }
            html.push_str("</p>");
        }
        html
    }

    /// Render as plain text with a blank line between paragraphs.
    pub fn to_plain(&self) -> String {
        let mut text = String::new();
        for (i, paragraph) in self.paragraphs.iter().enumerate() {
            if i > 0 {
                text.push_str("\n\n");
            }
            text.push_str(&paragraph.lines.join("\n"));
        }
        text
    }
}

/// Split accumulated text into paragraphs and line breaks.
pub fn format_story(text: &str) -> StructuredText {
    let paragraphs = text
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| Paragraph {
            lines: p.split('\n').map(str::to_string).collect(),
        })
        .collect();

    StructuredText { paragraphs }
}

fn escape_html_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}
