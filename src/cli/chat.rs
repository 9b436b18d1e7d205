use crate::client::{ChatClient, ChatReply, ChatSession};
use crate::error::ChatError;
use crate::ui::{LiveView, style};
use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

const HELP: &str = "/regenerate  ask the last question again\n/clear       forget the conversation\n/model ID    switch catalog model\n/quit        leave";

enum Input {
    Ask(String),
    Regenerate,
    Clear,
    Model(String),
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let input = match line.split_once(' ') {
        Some(("/model", id)) => Input::Model(id.trim().to_string()),
        _ => match line {
            "/regenerate" | "/r" => Input::Regenerate,
            "/clear" => Input::Clear,
            "/help" | "/?" => Input::Help,
            "/quit" | "/exit" => Input::Quit,
            _ => Input::Ask(line.to_string()),
        },
    };
    Some(input)
}

/// Cancellation token that fires on Ctrl-C for the lifetime of one reply.
struct AbortOnCtrlC {
    token: CancellationToken,
    watcher: tokio::task::JoinHandle<()>,
}

impl AbortOnCtrlC {
    fn arm() -> Self {
        let token = CancellationToken::new();
        let abort = token.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                abort.cancel();
            }
        });
        Self { token, watcher }
    }
}

impl Drop for AbortOnCtrlC {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

fn report(view: &mut LiveView, outcome: Result<ChatReply, ChatError>) {
    if let Err(error) = view.reset() {
        tracing::debug!(%error, "Terminal reset failed");
    }
    match outcome {
        Ok(reply) if reply.cancelled => println!("{}", style::dim("[aborted]")),
        Ok(_) => {}
        Err(ChatError::Cancelled) => println!("{}", style::dim("[aborted before any output]")),
        Err(error) => println!("{}", style::error(format!("Error: {error}"))),
    }
}

async fn ask(session: &mut ChatSession, view: &mut LiveView, input: Input) {
    let abort = AbortOnCtrlC::arm();
    let on_payload = |payload: &str| {
        if let Err(error) = view.push(payload) {
            tracing::debug!(%error, "Terminal write failed");
        }
    };
    let outcome = match input {
        Input::Regenerate => session.regenerate(abort.token.clone(), on_payload).await,
        Input::Ask(message) => session.submit(&message, abort.token.clone(), on_payload).await,
        _ => return,
    };
    report(view, outcome);
}

pub async fn run(
    client: ChatClient,
    model: Option<String>,
    tools: bool,
    message: Option<String>,
) -> Result<()> {
    let mut session = ChatSession::new(client).with_tools(tools);
    if let Some(model) = model {
        session.set_model(model);
    }
    let mut view = LiveView::new();

    if let Some(message) = message {
        ask(&mut session, &mut view, Input::Ask(message)).await;
        return Ok(());
    }

    println!(
        "{} {}",
        style::header("streamchat"),
        style::dim("(type /help for commands, Ctrl-C aborts a reply)")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style::value(">"));
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_input(&line) {
            None => {}
            Some(Input::Quit) => break,
            Some(Input::Help) => println!("{}", style::dim(HELP)),
            Some(Input::Clear) => {
                session.clear();
                println!("{}", style::dim("Conversation cleared."));
            }
            Some(Input::Model(id)) => {
                println!("{} {}", style::dim("Using model"), style::value(&id));
                session.set_model(id);
            }
            Some(input) => ask(&mut session, &mut view, input).await,
        }
    }
    Ok(())
}
