//! Streaming chat client: posts a prompt, reads the answer as it is produced
//! and keeps a response window showing the markdown rendered so far.

pub mod api;
pub mod config;
pub mod control;
pub mod decode;
pub mod handler;
pub mod logging;
pub mod models;
pub mod render;
pub mod surface;

pub use api::{ApiError, ChatStream, ChatTransport, StreamingChatClient};
pub use control::SubmitControl;
pub use handler::StreamingResponseHandler;
pub use models::{AppConfig, ChatMode, ChatRequest, ControlSignal, Submission};
pub use render::{
    CmarkRenderer, MarkdownRenderer, PlainHighlighter, SyntaxHighlighter, SyntectHighlighter,
};
pub use surface::{DisplaySurface, FileSurface, HtmlBuffer, Surfaces, RESPONSE_WINDOW_ID};
