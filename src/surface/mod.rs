// Display surfaces the handler renders into

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Id of the response window the streaming handler writes to
pub const RESPONSE_WINDOW_ID: &str = "#chat-response-window";

/// A region holding the rendered output of the current exchange.
///
/// Every write replaces or extends the whole content; there is no diffing.
#[cfg_attr(test, mockall::automock)]
pub trait DisplaySurface {
    fn clear(&mut self);

    fn set_html(&mut self, html: &str);

    /// Show text verbatim: markup is escaped and newlines become `<br>`
    fn set_text(&mut self, text: &str);

    fn append_html(&mut self, html: &str);

    fn scroll_to_bottom(&mut self);

    fn html(&self) -> String;
}

/// Escape text for display the way a text-only assignment would
pub fn text_to_html(text: &str) -> String {
    html_escape::encode_text(text).replace('\n', "<br>")
}

/// In-memory surface
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HtmlBuffer {
    content: String,
    scroll_offset: usize,
}

impl HtmlBuffer {
    pub const fn new() -> Self {
        Self {
            content: String::new(),
            scroll_offset: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub const fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub const fn is_scrolled_to_bottom(&self) -> bool {
        self.scroll_offset == usize::MAX
    }
}

impl DisplaySurface for HtmlBuffer {
    fn clear(&mut self) {
        self.content.clear();
        self.scroll_offset = 0;
    }

    fn set_html(&mut self, html: &str) {
        html.clone_into(&mut self.content);
    }

    fn set_text(&mut self, text: &str) {
        self.content = text_to_html(text);
    }

    fn append_html(&mut self, html: &str) {
        self.content.push_str(html);
    }

    fn scroll_to_bottom(&mut self) {
        // Viewers clamp this to the real maximum
        self.scroll_offset = usize::MAX;
    }

    fn html(&self) -> String {
        self.content.clone()
    }
}

/// Surface mirrored to an HTML file after every write, for live preview in a browser
#[derive(Debug)]
pub struct FileSurface {
    path: PathBuf,
    buffer: HtmlBuffer,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            buffer: HtmlBuffer::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        if let Err(e) = fs::write(&self.path, self.buffer.as_str()) {
            tracing::warn!(path = %self.path.display(), "failed to write response window: {e}");
        }
    }
}

impl DisplaySurface for FileSurface {
    fn clear(&mut self) {
        self.buffer.clear();
        self.flush();
    }

    fn set_html(&mut self, html: &str) {
        self.buffer.set_html(html);
        self.flush();
    }

    fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.flush();
    }

    fn append_html(&mut self, html: &str) {
        self.buffer.append_html(html);
        self.flush();
    }

    fn scroll_to_bottom(&mut self) {
        self.buffer.scroll_to_bottom();
    }

    fn html(&self) -> String {
        self.buffer.html()
    }
}

pub type BoxedSurface = Box<dyn DisplaySurface + Send>;

/// Surfaces addressable by id. Ids are stored without a leading `#`.
#[derive(Default)]
pub struct Surfaces {
    by_id: HashMap<String, BoxedSurface>,
}

impl Surfaces {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(id: &str) -> &str {
        id.strip_prefix('#').unwrap_or(id)
    }

    pub fn insert(&mut self, id: &str, surface: BoxedSurface) {
        self.by_id.insert(Self::key(id).to_string(), surface);
    }

    pub fn get(&self, id: &str) -> Option<&BoxedSurface> {
        self.by_id.get(Self::key(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut BoxedSurface> {
        self.by_id.get_mut(Self::key(id))
    }
}

impl std::fmt::Debug for Surfaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.by_id.keys()).finish()
    }
}
