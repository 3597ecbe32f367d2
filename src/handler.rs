// Submit handler: one streaming exchange rendered into the response window

use std::sync::Arc;

use futures::StreamExt;

use crate::api::{ApiError, ChatStream, ChatTransport};
use crate::decode::Utf8StreamDecoder;
use crate::models::{ChatRequest, ControlSignal, Submission};
use crate::render::{CmarkRenderer, MarkdownRenderer, SyntaxHighlighter};
use crate::surface::{DisplaySurface, Surfaces, RESPONSE_WINDOW_ID};

/// Inline message replacing the window when the server rejects the request
pub fn error_html(message: &str) -> String {
    format!(
        "<p style=\"color: red;\">Error: {}</p>",
        html_escape::encode_text(message)
    )
}

/// Annotation appended below partial output when the stream breaks
pub fn stream_error_html(error: &ApiError) -> String {
    format!(
        "<p style=\"color: red;\">\n\n[Error during streaming: {}]</p>",
        html_escape::encode_text(&error.to_string())
    )
}

/// Streams a prompt's answer into the response window.
///
/// Each call to [`handle`](Self::handle) is one exchange: guards, one POST,
/// then a read loop that re-renders the whole accumulated markdown after
/// every chunk. The returned [`ControlSignal`] tells the host whether the
/// submit control stays disabled.
pub struct StreamingResponseHandler<T> {
    transport: T,
    renderer: Option<Box<dyn MarkdownRenderer>>,
    highlighter: Option<Arc<dyn SyntaxHighlighter>>,
    surface_id: String,
}

impl<T: ChatTransport> StreamingResponseHandler<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            renderer: Some(Box::new(CmarkRenderer::new())),
            highlighter: None,
            surface_id: RESPONSE_WINDOW_ID.to_string(),
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn MarkdownRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Show responses as plain text
    #[must_use]
    pub fn without_renderer(mut self) -> Self {
        self.renderer = None;
        self
    }

    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Arc<dyn SyntaxHighlighter>) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn handle(
        &mut self,
        surfaces: &mut Surfaces,
        submission: &Submission,
    ) -> ControlSignal {
        // Session state can arrive after the first click; hold the control until it does
        if submission.awaiting_session() {
            tracing::warn!(
                "agent mode selected but no session id is available yet, try again in a moment"
            );
            return ControlSignal::KeepDisabled;
        }

        if !submission.is_triggered() {
            return ControlSignal::Enable;
        }

        let Some(prompt) = submission.prompt() else {
            tracing::debug!("empty prompt, nothing to send");
            return ControlSignal::Enable;
        };

        let Some(surface) = surfaces.get_mut(&self.surface_id) else {
            tracing::error!(surface = %self.surface_id, "response window not found");
            return ControlSignal::KeepDisabled;
        };
        let surface = &mut **surface;

        surface.clear();
        self.configure_renderer();

        let request = ChatRequest::new(prompt)
            .with_mode(submission.mode)
            .with_session(submission.session_id().map(ToString::to_string));

        let stream = match self.transport.open(&request).await {
            Ok(stream) => stream,
            Err(ApiError::Status { status, message }) => {
                tracing::error!(status, "server error: {message}");
                surface.set_html(&error_html(&message));
                return ControlSignal::Enable;
            }
            Err(e) => {
                tracing::error!("streaming error: {e}");
                surface.append_html(&stream_error_html(&e));
                surface.scroll_to_bottom();
                return ControlSignal::Enable;
            }
        };

        self.consume(stream, surface).await;
        ControlSignal::Enable
    }

    fn configure_renderer(&mut self) {
        match (self.renderer.as_mut(), &self.highlighter) {
            (Some(renderer), Some(highlighter)) => {
                renderer.set_highlighter(Arc::clone(highlighter));
            }
            (None, _) => tracing::warn!("no markdown renderer installed, showing plain text"),
            (Some(_), None) => {}
        }
    }

    async fn consume(&self, mut stream: ChatStream, surface: &mut (dyn DisplaySurface + Send)) {
        let mut decoder = Utf8StreamDecoder::new();
        let mut accumulated = String::new();
        let mut chunks = 0usize;

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    chunks += 1;
                    accumulated.push_str(&decoder.decode(&bytes));
                    self.show(surface, &accumulated);
                }
                Err(e) => {
                    tracing::error!(chunks, "streaming error: {e}");
                    surface.append_html(&stream_error_html(&e));
                    surface.scroll_to_bottom();
                    return;
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            tracing::warn!("stream ended inside a multi-byte character");
            accumulated.push_str(&tail);
            self.show(surface, &accumulated);
        }

        tracing::debug!(chunks, bytes = accumulated.len(), "stream finished");
    }

    fn show(&self, surface: &mut (dyn DisplaySurface + Send), markdown: &str) {
        match &self.renderer {
            Some(renderer) => match renderer.render(markdown) {
                Ok(html) => surface.set_html(&html),
                Err(e) => {
                    tracing::error!("markdown rendering failed, showing raw text: {e}");
                    surface.set_text(markdown);
                }
            },
            None => surface.set_text(markdown),
        }
        surface.scroll_to_bottom();
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for StreamingResponseHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponseHandler")
            .field("transport", &self.transport)
            .field("renderer", &self.renderer.is_some())
            .field("highlighter", &self.highlighter.is_some())
            .field("surface_id", &self.surface_id)
            .finish()
    }
}
