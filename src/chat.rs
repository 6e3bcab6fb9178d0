//! Line-based terminal chat against a running gateway

use haven_client::{ChatTransport, ClientError, HttpTransport, Reconciler};
use haven_core::{Mode, SessionState};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  /mode <friend|romantic|explicit>  request a mode change
  /yes, /no                         answer the pending question
  /model <id>                       use a different reply model
  /state                            show the session state
  /help                             this text
  /quit                             leave";

#[derive(Debug, PartialEq)]
enum Command {
    Say(String),
    Mode(Mode),
    Answer(bool),
    Model(Option<String>),
    State,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if !line.starts_with('/') {
            return Command::Say(line.to_string());
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };
        match name {
            "/quit" | "/exit" => Command::Quit,
            "/yes" => Command::Answer(true),
            "/no" => Command::Answer(false),
            "/state" => Command::State,
            "/help" => Command::Help,
            "/model" => Command::Model(Some(arg.to_string()).filter(|m| !m.is_empty())),
            "/mode" => match Mode::parse(arg) {
                Some(mode) => Command::Mode(mode),
                None => Command::Unknown(format!("unknown mode: {:?}", arg)),
            },
            other => Command::Unknown(format!("unknown command: {}", other)),
        }
    }
}

fn prompt(state: &SessionState) -> String {
    match state.pending_consent {
        Some(kind) => format!("[{} | {}?]> ", state.mode, kind),
        None => format!("[{}]> ", state.mode),
    }
}

fn print_outcome(client: &Reconciler<HttpTransport>, outcome: Result<String, ClientError>) {
    match outcome {
        Ok(reply) => {
            println!("haven: {}", reply);
            if client.pending_consent().is_some() {
                println!("       (answer with /yes or /no)");
            }
        }
        // the reconciler already appended a notice for failed exchanges
        Err(e) if e.is_exchange_failure() => {
            if let Some(notice) = client.history().last() {
                println!("{}", notice.message.content);
            }
        }
        Err(e) => println!("{}", e),
    }
}

pub async fn run(
    url: &str,
    model: Option<String>,
    companion: Option<String>,
    timeout: Duration,
) -> anyhow::Result<()> {
    let transport = HttpTransport::new(url).with_timeout(timeout);
    println!("Connected to {} (type /help for commands)", transport.endpoint());

    let mut client = Reconciler::new(transport);
    client.set_model(model);
    client.set_companion(companion);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", prompt(client.displayed_state()));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let outcome = match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::State => {
                println!("{}", serde_json::to_string_pretty(client.authoritative_state())?);
                continue;
            }
            Command::Model(model) => {
                client.set_model(model);
                continue;
            }
            Command::Unknown(message) => {
                println!("{}", message);
                continue;
            }
            Command::Mode(mode) => match client.begin_mode_request(mode) {
                Ok(request) => {
                    println!("       switching to {}...", client.displayed_state().mode);
                    let result = client.transport().exchange(&request).await;
                    client.complete(result)
                }
                Err(e) => Err(e),
            },
            Command::Answer(accept) => client.answer_consent(accept).await,
            Command::Say(text) => client.send(&text).await,
        };
        print_outcome(&client, outcome);
    }

    Ok(())
}
