// Submit control: prompt input, click counter and disabled flag

use crate::models::{ControlSignal, Submission};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    input: String,
    n_clicks: u64,
    disabled: bool,
}

impl SubmitControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub const fn n_clicks(&self) -> u64 {
        self.n_clicks
    }

    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Press the control. The input is cleared and the control disabled until
    /// the handler's signal comes back; a press while disabled does nothing.
    pub fn click(&mut self) -> Option<Submission> {
        if self.disabled {
            return None;
        }

        self.n_clicks += 1;
        self.disabled = true;
        let prompt = std::mem::take(&mut self.input);

        Some(Submission::new(Some(self.n_clicks), prompt))
    }

    pub fn apply(&mut self, signal: ControlSignal) {
        self.disabled = signal.disabled();
    }
}
