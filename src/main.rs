//! Console shell over the tray runtime, for development without a desktop
//! session.

use anyhow::Result;
use log::info;
use ollama_tray_hero::{
    commands::{
        chat::{clear_history, get_history, send_message},
        settings::{get_available_models, get_settings, save_setting},
    },
    history::Role,
    logging, RuntimeConfig, TrayRuntime,
};
use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, PartialEq)]
enum ShellCommand {
    Send(String),
    Models,
    Settings,
    Set { key: String, value: Value },
    History,
    Clear,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ShellCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ShellCommand::Send(line.to_string());
        };

        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((command, ""));

        match name {
            "models" => ShellCommand::Models,
            "settings" => ShellCommand::Settings,
            "history" => ShellCommand::History,
            "clear" => ShellCommand::Clear,
            "help" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            "set" => match rest.split_once(char::is_whitespace) {
                Some((key, raw)) => ShellCommand::Set {
                    key: key.to_string(),
                    value: parse_value(raw.trim()),
                },
                None => ShellCommand::Unknown(line.to_string()),
            },
            _ => ShellCommand::Unknown(line.to_string()),
        }
    }
}

/// JSON literals are stored as parsed; anything else as a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

const HELP: &str = "\
Type a message to chat. Commands:
  /models              list installed models
  /settings            show current settings
  /set <key> <value>   change one setting
  /history             show the conversation
  /clear               clear the conversation
  /quit                exit";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let runtime = TrayRuntime::initialize(RuntimeConfig::from_env()?).await?;
    runtime
        .events()
        .subscribe(|event| eprintln!("(event: {})", event.name()));

    if runtime.settings().is_first_run().await {
        println!("Welcome to Ollama Tray Hero.");
        println!("{HELP}");
    }

    let settings = get_settings(&runtime).await;
    info!(
        "[tray] Console shell started against {} with model {}",
        settings.api_url, settings.selected_model
    );
    println!(
        "Chatting with {} at {} (/help for commands)",
        settings.selected_model, settings.api_url
    );

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ShellCommand::parse(&line) {
            ShellCommand::Send(text) => println!("{}", send_message(&runtime, &text).await),
            ShellCommand::Models => {
                let models = get_available_models(&runtime).await;
                if models.is_empty() {
                    println!("No models available.");
                }
                for model in models {
                    println!("  {model}");
                }
            }
            ShellCommand::Settings => {
                let settings = get_settings(&runtime).await;
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            ShellCommand::Set { key, value } => {
                save_setting(&runtime, &key, value).await;
            }
            ShellCommand::History => {
                for turn in get_history(&runtime).await.turns() {
                    let speaker = match turn.role {
                        Role::User => "you",
                        Role::Assistant => "model",
                    };
                    println!("{speaker}: {}", turn.content);
                }
            }
            ShellCommand::Clear => {
                clear_history(&runtime).await;
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::Empty => {}
            ShellCommand::Unknown(line) => println!("Unknown command: {line}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_is_sent() {
        assert_eq!(
            ShellCommand::parse("  why is the sky blue?  "),
            ShellCommand::Send("why is the sky blue?".into())
        );
        assert_eq!(ShellCommand::parse("   "), ShellCommand::Empty);
    }

    #[test]
    fn set_parses_json_or_falls_back_to_string() {
        assert_eq!(
            ShellCommand::parse("/set apiUrl http://host:1234"),
            ShellCommand::Set {
                key: "apiUrl".into(),
                value: json!("http://host:1234"),
            }
        );
        assert_eq!(
            ShellCommand::parse("/set windowWidth 640"),
            ShellCommand::Set {
                key: "windowWidth".into(),
                value: json!(640),
            }
        );
        assert_eq!(
            ShellCommand::parse("/set shortcut Alt+Space"),
            ShellCommand::Set {
                key: "shortcut".into(),
                value: json!("Alt+Space"),
            }
        );
    }

    #[test]
    fn incomplete_or_unknown_commands() {
        assert_eq!(
            ShellCommand::parse("/set apiUrl"),
            ShellCommand::Unknown("/set apiUrl".into())
        );
        assert_eq!(
            ShellCommand::parse("/bogus"),
            ShellCommand::Unknown("/bogus".into())
        );
        assert_eq!(ShellCommand::parse("/exit"), ShellCommand::Quit);
    }
}
