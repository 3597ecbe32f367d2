use serde::{Deserialize, Serialize};

/// Which backend pipeline answers the prompt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Chat,
    Agent,
}

/// JSON body posted to the streaming endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ChatMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            mode: None,
            session_id: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Option<ChatMode>) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }
}

/// One submit action as seen by the handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    /// Click counter of the triggering control; `None` when the host fired without a click
    pub n_clicks: Option<u64>,
    pub prompt: Option<String>,
    pub mode: Option<ChatMode>,
    pub session_id: Option<String>,
}

impl Submission {
    pub fn new(n_clicks: Option<u64>, prompt: impl Into<String>) -> Self {
        Self {
            n_clicks,
            prompt: Some(prompt.into()),
            mode: None,
            session_id: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ChatMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn is_triggered(&self) -> bool {
        self.n_clicks.is_some_and(|clicks| clicks > 0)
    }

    /// The prompt, if present and non-empty
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|prompt| !prompt.is_empty())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Agent mode cannot run until the host has a session id
    pub fn awaiting_session(&self) -> bool {
        self.mode == Some(ChatMode::Agent) && self.session_id().is_none()
    }
}

/// Whether the triggering control stays disabled after the handler returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    KeepDisabled,
    Enable,
}

impl ControlSignal {
    pub const fn disabled(self) -> bool {
        matches!(self, Self::KeepDisabled)
    }
}

impl From<ControlSignal> for bool {
    fn from(signal: ControlSignal) -> Self {
        signal.disabled()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Seconds; unset leaves the HTTP client's own default
    #[serde(default)]
    pub request_timeout: Option<u64>,
    #[serde(default = "default_highlight")]
    pub highlight: bool,
}

fn default_endpoint() -> String {
    "/streaming-chat".to_string()
}

const fn default_highlight() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8050".to_string(),
            endpoint: default_endpoint(),
            request_timeout: None,
            highlight: default_highlight(),
        }
    }
}
