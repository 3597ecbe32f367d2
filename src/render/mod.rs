// Markdown to HTML rendering for the response window

pub mod highlight;

use std::sync::Arc;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use thiserror::Error;

pub use highlight::{HighlightError, PlainHighlighter, SyntaxHighlighter, SyntectHighlighter};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Highlight(#[from] HighlightError),
}

/// Renders a whole markdown buffer to HTML
pub trait MarkdownRenderer: Send + Sync {
    /// Install the code-block hook. Calling it again replaces the previous hook.
    fn set_highlighter(&mut self, highlighter: Arc<dyn SyntaxHighlighter>);

    fn render(&self, markdown: &str) -> Result<String, RenderError>;
}

/// pulldown-cmark renderer with code blocks routed through the highlighter
pub struct CmarkRenderer {
    options: Options,
    highlighter: Option<Arc<dyn SyntaxHighlighter>>,
}

impl CmarkRenderer {
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS,
            highlighter: None,
        }
    }

    fn code_block(&self, code: &str, lang: Option<&str>) -> Result<String, RenderError> {
        let body = match &self.highlighter {
            Some(highlighter) => highlighter.highlight(code, lang)?,
            None => html_escape::encode_text(code).into_owned(),
        };

        Ok(match lang {
            Some(lang) => format!(
                "<pre><code class=\"language-{}\">{body}</code></pre>\n",
                html_escape::encode_double_quoted_attribute(lang)
            ),
            None => format!("<pre><code>{body}</code></pre>\n"),
        })
    }
}

impl Default for CmarkRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CmarkRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmarkRenderer")
            .field("options", &self.options)
            .field("highlighter", &self.highlighter.is_some())
            .finish()
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn set_highlighter(&mut self, highlighter: Arc<dyn SyntaxHighlighter>) {
        self.highlighter = Some(highlighter);
    }

    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let mut events = Vec::new();
        // Language and collected source of the code block being walked, if any
        let mut code: Option<(Option<String>, String)> = None;

        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(ToString::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, source)) = code.take() {
                        let block = self.code_block(&source, lang.as_deref())?;
                        events.push(Event::Html(CowStr::from(block)));
                    }
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, source)) = code.as_mut() {
                        source.push_str(&text);
                    }
                }
                other => events.push(other),
            }
        }

        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, events.into_iter());
        Ok(output)
    }
}
