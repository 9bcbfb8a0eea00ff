use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use cosmos_core::{
    ApiClient, ConfigManager, ConsoleCommand, ConsoleEvent, Language, SessionConsole, ShowUpdate,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Session console for scheduling shows, assigning participants, triggering
/// playback, and running photo-capture sessions.
#[derive(Parser, Debug)]
#[command(name = "cosmos")]
#[command(about = "Cosmos show session console")]
struct Args {
    /// API base URL (overrides COSMOS_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Playback language: "en" or "es" (default from the config file)
    #[arg(long)]
    language: Option<String>,

    /// Path to the config file (default: config.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let args = Args::parse();

    let mut config = ConfigManager::new(args.config);
    let settings = config.load().context("failed to load configuration")?;
    let base_url = config.resolve_base_url(args.api_url.as_deref());
    let language: Language = args
        .language
        .as_deref()
        .unwrap_or(&settings.language)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    println!("Cosmos show console");
    println!("Backend: {}", base_url);
    println!("Language: {}", language);
    println!("Type 'help' for commands.");

    let api = Arc::new(ApiClient::new(base_url));
    let (mut console, mut events) = SessionConsole::new(
        api,
        language,
        Duration::from_secs(settings.photo_poll_interval_secs),
        settings.countdown_secs,
    );

    log::info!(
        "console ready (poll every {}s, overlay {}s)",
        settings.photo_poll_interval_secs,
        settings.countdown_secs
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => {
                        console.shutdown().await;
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match parse_command(line) {
                    Ok(Some(command)) => {
                        let summary = summarize(&command);
                        let keep_going = console.execute(command).await;
                        render_outcome(&console, summary);
                        if !keep_going {
                            break;
                        }
                    }
                    Ok(None) => print_help(),
                    Err(msg) => println!("error: {}", msg),
                }
            }
            Some(event) = events.recv() => render_event(&event),
        }
    }

    Ok(())
}

/// What to print after a command, beyond the banners.
enum Rendered {
    Shows,
    Users,
    Selection,
    Nothing,
}

fn summarize(command: &ConsoleCommand) -> Rendered {
    match command {
        ConsoleCommand::RefreshShows => Rendered::Shows,
        ConsoleCommand::RefreshUsers => Rendered::Users,
        ConsoleCommand::ToggleUser { .. } | ConsoleCommand::SelectShow { .. } => {
            Rendered::Selection
        }
        _ => Rendered::Nothing,
    }
}

fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();

    let arg = |idx: usize, what: &str| -> Result<String, String> {
        rest.get(idx)
            .map(|s| s.to_string())
            .ok_or_else(|| format!("usage: {} <{}>", verb, what))
    };

    let command = match verb {
        "help" => return Ok(None),
        "shows" => ConsoleCommand::RefreshShows,
        "users" => ConsoleCommand::RefreshUsers,
        "schedule" => {
            let start_time = parse_time(&arg(0, "start-time (RFC 3339)")?)?;
            ConsoleCommand::ScheduleShow { start_time }
        }
        "select" => ConsoleCommand::ToggleUser {
            user_id: arg(0, "user-id")?,
        },
        "show" => ConsoleCommand::SelectShow {
            show_id: arg(0, "show-id")?,
        },
        "assign" => ConsoleCommand::AssignSelected,
        "play" => ConsoleCommand::Play {
            show_id: arg(0, "show-id")?,
        },
        "standby" => ConsoleCommand::Standby {
            show_id: arg(0, "show-id")?,
        },
        "status" => ConsoleCommand::UpdateStatus {
            show_id: arg(0, "show-id")?,
            status: {
                let status = rest[1..].join(" ");
                if status.is_empty() {
                    return Err("usage: status <show-id> <status text>".to_string());
                }
                status
            },
        },
        "edit" => {
            let show_id = arg(0, "show-id")?;
            let mut update = ShowUpdate::default();
            for pair in rest[1..].chunks(2) {
                match *pair {
                    ["start", value] => update.start_time = Some(parse_time(value)?),
                    ["duration", value] => {
                        update.duration = Some(
                            value
                                .parse()
                                .map_err(|_| format!("invalid duration: {}", value))?,
                        )
                    }
                    _ => {
                        return Err(
                            "usage: edit <show-id> [start <RFC 3339>] [duration <minutes>]"
                                .to_string(),
                        )
                    }
                }
            }
            ConsoleCommand::UpdateShow { show_id, update }
        }
        "remove" => ConsoleCommand::RemoveUser {
            show_id: arg(0, "show-id")?,
            user_id: arg(1, "user-id")?,
        },
        "delete" => ConsoleCommand::DeleteShow {
            show_id: arg(0, "show-id")?,
        },
        "capture" => ConsoleCommand::Capture {
            show_id: arg(0, "show-id")?,
        },
        "photo" => ConsoleCommand::SelectPhoto {
            photo_id: arg(0, "photo-id")?,
        },
        "approve" => ConsoleCommand::ApprovePhoto,
        "quit" | "exit" => ConsoleCommand::Shutdown,
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };
    Ok(Some(command))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|_| format!("invalid start time (expected RFC 3339): {}", value))
}

fn render_outcome(console: &SessionConsole, rendered: Rendered) {
    if let Some(error) = console.error() {
        println!("!! {}", error);
        return;
    }
    if let Some(success) = console.success() {
        println!("ok {}", success);
    }

    match rendered {
        Rendered::Shows => {
            if console.shows().is_empty() {
                println!("no shows available");
            }
            for show in console.shows() {
                println!(
                    "  {}  {}  [{}/4]  {}",
                    show.id,
                    show.start_time.to_rfc3339(),
                    show.participants.len(),
                    show.status
                );
                for participant in &show.participants {
                    println!("      - {}  {}", participant.id, participant.name);
                }
            }
        }
        Rendered::Users => {
            if console.waiting_users().is_empty() {
                println!("no users waiting");
            }
            for user in console.waiting_users() {
                println!("  {}  {}  ({})", user.id, user.name, user.status);
            }
        }
        Rendered::Selection => {
            let names: Vec<&str> = console
                .selected_users()
                .iter()
                .map(|u| u.name.as_str())
                .collect();
            println!("selected {}/4: {}", names.len(), names.join(", "));
            if let Some(show) = console.target_show() {
                println!(
                    "target show: {} ({} assigned)",
                    show.id,
                    show.participants.len()
                );
            }
        }
        Rendered::Nothing => {}
    }
}

fn render_event(event: &ConsoleEvent) {
    match event {
        ConsoleEvent::CaptureUpdated(session) => {
            match session.session_id() {
                Some(id) => println!(
                    "capture session {}  attempts {}/3",
                    id,
                    session.attempts()
                ),
                None => println!("capture session closed"),
            }
            for photo in session.photos() {
                let marker = if session.selected_photo() == Some(photo.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("  {} {}  {}", marker, photo.id, photo.url);
            }
        }
        ConsoleEvent::CaptureError(message) => println!("!! {}", message),
        ConsoleEvent::CountdownTick(remaining) => {
            if remaining % 30 == 0 || *remaining < 5 {
                println!("overlay: {}s remaining", remaining);
            }
        }
        ConsoleEvent::CountdownFinished => println!("overlay closed"),
    }
}

fn print_help() {
    println!("commands:");
    println!("  shows                        list available shows");
    println!("  users                        list waiting users");
    println!("  schedule <start-time>        schedule a show (RFC 3339 start)");
    println!("  select <user-id>             toggle a user in the selection");
    println!("  show <show-id>               choose the target show");
    println!("  assign                       assign the selection to the target show");
    println!("  play <show-id>               run the play sequence");
    println!("  standby <show-id>            send the standby signal");
    println!("  status <show-id> <text>      update a show's status");
    println!("  edit <show-id> [start <t>] [duration <m>]");
    println!("  remove <show-id> <user-id>   remove a user from a show");
    println!("  delete <show-id>             delete a show");
    println!("  capture <show-id>            capture a photo for a show");
    println!("  photo <photo-id>             select a photo for approval");
    println!("  approve                      approve the selected photo");
    println!("  quit                         exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_playback_commands() {
        match parse_command("play show-1").unwrap().unwrap() {
            ConsoleCommand::Play { show_id } => assert_eq!(show_id, "show-1"),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(parse_command("play").is_err());
    }

    #[test]
    fn parses_status_with_spaces() {
        match parse_command("status show-1 ha sido reproducido").unwrap().unwrap() {
            ConsoleCommand::UpdateStatus { show_id, status } => {
                assert_eq!(show_id, "show-1");
                assert_eq!(status, "ha sido reproducido");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_edit_fields() {
        match parse_command("edit show-1 duration 30").unwrap().unwrap() {
            ConsoleCommand::UpdateShow { show_id, update } => {
                assert_eq!(show_id, "show-1");
                assert_eq!(update.duration, Some(30));
                assert!(update.start_time.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_verbs_and_bad_times() {
        assert!(parse_command("dance").is_err());
        assert!(parse_command("schedule not-a-time").is_err());
    }
}
