use super::style;
use crate::transport::{FenceParser, Segment};
use console::{Term, measure_text_width};
use std::io;

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Styled terminal form of classified segments.
pub fn render_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text { content } => out.push_str(content),
            Segment::Code {
                content,
                language,
                streaming,
            } => {
                break_line(&mut out);
                out.push_str(&style::dim(format!("┌─ {language}")));
                out.push('\n');
                for line in content.lines() {
                    out.push_str(&style::code(line));
                    out.push('\n');
                }
                if !streaming {
                    out.push_str(&style::dim("└─"));
                }
            }
            Segment::ToolResult {
                name,
                content,
                streaming,
            } => {
                break_line(&mut out);
                let label = if *streaming {
                    format!("[{name}…]")
                } else {
                    format!("[{name}]")
                };
                out.push_str(&style::tool(label));
                out.push('\n');
                for line in content.lines() {
                    out.push_str(&style::dim(line));
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// Redraws the assistant message in place as payloads arrive.
///
/// Without a terminal (piped output) payloads are written as-is.
pub struct LiveView {
    term: Term,
    parser: FenceParser,
    rows: usize,
}

impl LiveView {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            parser: FenceParser::new(),
            rows: 0,
        }
    }

    pub fn push(&mut self, payload: &str) -> io::Result<()> {
        let segments = self.parser.push(payload);
        if !self.term.is_term() {
            return self.term.write_str(payload);
        }

        if self.rows > 0 {
            self.term.clear_last_lines(self.rows)?;
        }
        let rendered = render_segments(&segments);
        self.term.write_line(&rendered)?;
        self.rows = rows_of(&rendered, usize::from(self.term.size().1));
        Ok(())
    }

    /// Finish the current message and get ready for the next one.
    pub fn reset(&mut self) -> io::Result<()> {
        if !self.term.is_term() && !self.parser.state().accumulated.is_empty() {
            self.term.write_line("")?;
        }
        self.parser.reset();
        self.rows = 0;
        Ok(())
    }
}

/// Terminal rows taken by `text` followed by a newline.
fn rows_of(text: &str, columns: usize) -> usize {
    let columns = columns.max(1);
    text.split('\n')
        .map(|line| measure_text_width(line).div_ceil(columns).max(1))
        .sum()
}
