//! banter client - terminal chat client
//!
//! Entry point: wires CLI arguments and the config file into a session
//! controller, then bridges stdin lines and session state changes to the
//! terminal.

use tokio::io::{AsyncBufReadExt, BufReader};

use banter_client::cli::Args;
use banter_client::{ChatSession, ClientConfig, SessionState};
use banter_protocol::{ChatMessage, MessageKind};
use banter_utils::{init_logging_with_config, BanterError, LogConfig, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    // Log to file; stdout belongs to the chat
    init_logging_with_config(LogConfig::client())?;
    tracing::info!("banter client starting");
    tracing::debug!("CLI args: {:?}", args);

    match run(args).await {
        Ok(()) => {
            tracing::info!("banter client exiting normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("banter client error: {}", e);
            eprintln!("Error: {}", e);
            Err(e)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.apply_to(ClientConfig::load());
    let name = match config.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(BanterError::config(
                "no display name: pass one as an argument or set `name` in the config file",
            ));
        }
    };

    let session = ChatSession::spawn(config.session_config());
    let mut states = session.subscribe();
    session.login(&name);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    // Messages already printed; Active snapshots carry the full log
    let mut printed = 0usize;
    let mut joined = false;

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                match state {
                    SessionState::Connecting => println!("* logging in as {}...", name),
                    SessionState::Authenticating => println!("* connected, authenticating..."),
                    SessionState::Active { user, messages, online } => {
                        if !joined {
                            println!("* joined as {} ({} online)", user.name, online.len());
                            joined = true;
                        }
                        for message in &messages[printed.min(messages.len())..] {
                            print_message(message);
                        }
                        printed = messages.len();
                    }
                    SessionState::Errored { reason } => {
                        return Err(BanterError::transport(reason));
                    }
                    SessionState::Closed => {
                        println!("* logged out");
                        break;
                    }
                    SessionState::Unauthenticated => {}
                }
            }
            line = stdin.next_line() => {
                match line? {
                    Some(line) if line.trim() == "/quit" => session.logout(),
                    Some(line) => {
                        if let Err(e) = session.submit(&line) {
                            match e {
                                BanterError::EmptyMessage => {}
                                other => eprintln!("! {}", other),
                            }
                        }
                    }
                    // stdin closed
                    None => session.logout(),
                }
            }
        }
    }

    Ok(())
}

fn print_message(message: &ChatMessage) {
    match message.kind {
        MessageKind::User => println!("<{}> {}", message.sender_name, message.text),
        MessageKind::System => println!("* {}", message.text),
    }
}
