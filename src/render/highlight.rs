// Code-block highlighting for rendered markdown

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("syntax highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),
    #[error("highlighter unavailable: {0}")]
    Unavailable(String),
}

/// Turns the source of one code block into inner HTML for `<code>`.
pub trait SyntaxHighlighter: Send + Sync {
    /// `lang` is the fence info token when the block declared one
    fn highlight(&self, code: &str, lang: Option<&str>) -> Result<String, HighlightError>;
}

/// Escapes code without adding any markup
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl SyntaxHighlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _lang: Option<&str>) -> Result<String, HighlightError> {
        Ok(html_escape::encode_text(code).into_owned())
    }
}

/// Class-based highlighting backed by syntect's bundled grammars.
///
/// The language comes from the fence token when syntect knows it, otherwise
/// from the first line of the code (shebangs, `<?php`, ...), otherwise the
/// block is treated as plain text.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyntectHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntectHighlighter")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .finish()
    }
}

impl SyntaxHighlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: Option<&str>) -> Result<String, HighlightError> {
        let syntax = lang
            .and_then(|token| self.syntaxes.find_syntax_by_token(token))
            .or_else(|| self.syntaxes.find_syntax_by_first_line(code))
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }

        Ok(generator.finalize())
    }
}
