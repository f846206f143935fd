//! Line-oriented documents
//!
//! Run-control files (whizard.in, Mokka steering, SLIC macros) are plain
//! text. Each stored line keeps its own terminator so that untouched lines
//! are written back exactly as read, including `\r\n` endings and a missing
//! newline at end of file.

use std::fmt::{self, Display, Formatter};

/// A text document as an ordered sequence of lines
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineDocument {
    lines: Vec<String>,
}

impl LineDocument {
    /// Empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split text into lines, keeping terminators
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    /// Lines with their terminators
    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the document has no lines
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a raw line exactly as given (terminator included, if any)
    pub fn push_raw(&mut self, line: impl Into<String>) {
        self.terminate_last();
        self.lines.push(line.into());
    }

    /// Append `content` as a complete line
    ///
    /// A terminator is added to `content` and to the previous line when
    /// either is missing one.
    pub fn push_line(&mut self, content: &str) {
        self.terminate_last();
        let mut line = content.trim_end_matches(['\r', '\n']).to_string();
        line.push('\n');
        self.lines.push(line);
    }

    /// Make sure the final line ends with a newline
    pub fn terminate_last(&mut self) {
        if let Some(last) = self.lines.last_mut() {
            if !last.ends_with('\n') {
                last.push('\n');
            }
        }
    }

    /// Concatenate back into text
    #[must_use]
    pub fn to_text(&self) -> String {
        self.lines.concat()
    }
}

impl Display for LineDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}

impl FromIterator<String> for LineDocument {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

/// Strip the line terminator from a stored line
#[inline]
#[must_use]
pub fn line_content(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}
