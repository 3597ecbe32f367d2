use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use streamchat::{
    config, logging, ChatMode, FileSurface, HtmlBuffer, PlainHighlighter, StreamingChatClient,
    StreamingResponseHandler, SubmitControl, Surfaces, SyntaxHighlighter, SyntectHighlighter,
    RESPONSE_WINDOW_ID,
};

/// Send prompts to a streaming chat endpoint and render the answers as HTML
#[derive(Debug, Parser)]
#[command(name = "streamchat", version, about)]
struct Cli {
    /// Prompt to send; prompts are read from stdin, one per line, when omitted
    prompt: Option<String>,

    /// Backend pipeline to use
    #[arg(short, long, value_enum)]
    mode: Option<ChatMode>,

    /// Session id passed through to the backend in agent mode
    #[arg(long, conflicts_with = "new_session")]
    session_id: Option<String>,

    /// Start a fresh session with a random id
    #[arg(long)]
    new_session: bool,

    /// Override the configured server address
    #[arg(long)]
    base_url: Option<String>,

    /// Mirror the response window to this HTML file instead of printing it
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Leave code blocks unhighlighted
    #[arg(long)]
    no_highlight: bool,

    /// Verbosity level (use -v, -vv, -vvv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct Session {
    handler: StreamingResponseHandler<StreamingChatClient>,
    surfaces: Surfaces,
    control: SubmitControl,
    mode: Option<ChatMode>,
    session_id: Option<String>,
    print_window: bool,
}

impl Session {
    async fn submit(&mut self, prompt: String) {
        self.control.set_input(prompt);

        let Some(mut submission) = self.control.click() else {
            tracing::warn!("submit is disabled, ignoring prompt");
            return;
        };
        submission.mode = self.mode;
        submission.session_id.clone_from(&self.session_id);

        let signal = self
            .handler
            .handle(&mut self.surfaces, &submission)
            .await;
        self.control.apply(signal);

        if self.print_window {
            if let Some(window) = self.surfaces.get(RESPONSE_WINDOW_ID) {
                println!("{}", window.html());
            }
        }
    }
}

/// Pick the session id for this run. Nothing can supply one later, so agent
/// mode without a session is rejected up front.
fn resolve_session(
    mode: Option<ChatMode>,
    session_id: Option<String>,
    new_session: bool,
) -> Result<Option<String>> {
    let session_id = if new_session {
        Some(Uuid::new_v4().to_string())
    } else {
        session_id.filter(|id| !id.is_empty())
    };

    if mode == Some(ChatMode::Agent) && session_id.is_none() {
        anyhow::bail!("agent mode needs --session-id or --new-session");
    }

    Ok(session_id)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let mut app_config = config::load_config()?;
    if let Some(base_url) = cli.base_url {
        app_config.base_url = base_url;
    }
    if cli.no_highlight {
        app_config.highlight = false;
    }

    let session_id = resolve_session(cli.mode, cli.session_id, cli.new_session)?;
    if let Some(id) = &session_id {
        tracing::info!(session_id = %id, "using session");
    }

    let client = StreamingChatClient::from_config(&app_config)?;
    tracing::info!(url = %client.url(), "streaming endpoint");

    let highlighter: Arc<dyn SyntaxHighlighter> = if app_config.highlight {
        Arc::new(SyntectHighlighter::new())
    } else {
        Arc::new(PlainHighlighter)
    };
    let handler = StreamingResponseHandler::new(client).with_highlighter(highlighter);

    let mut surfaces = Surfaces::new();
    match &cli.out {
        Some(path) => surfaces.insert(RESPONSE_WINDOW_ID, Box::new(FileSurface::new(path))),
        None => surfaces.insert(RESPONSE_WINDOW_ID, Box::new(HtmlBuffer::new())),
    }

    let mut session = Session {
        handler,
        surfaces,
        control: SubmitControl::new(),
        mode: cli.mode,
        session_id,
        print_window: cli.out.is_none(),
    };

    if let Some(prompt) = cli.prompt {
        session.submit(prompt).await;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        session.submit(line.trim().to_string()).await;
    }

    Ok(())
}
