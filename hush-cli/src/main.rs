use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use hush_client::{
    ClientConfig, ConnectionFactory, DEFAULT_SERVER_URL, Participant, ParticipantEvent,
    RtcConnectionFactory, SessionState, create_room, room_exists,
};
use hush_core::RoomCode;
use hush_server::{DEFAULT_PORT, ServerConfig};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod audio;

use audio::MicCapture;

#[derive(Parser)]
#[command(name = "hush")]
#[command(about = "Mesh audio rooms with a signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay.
    Serve {
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Join a room and chat; `/audio` starts sending audio to everyone.
    Join {
        #[arg(short, long, env = "HUSH_SERVER", default_value = DEFAULT_SERVER_URL)]
        server: String,

        /// Room code. The relay issues a new one when omitted.
        #[arg(short, long)]
        room: Option<String>,

        #[arg(short, long, env = "HUSH_NAME")]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { port } => serve(port).await,
        Commands::Join { server, room, name } => join(server, room, name).await,
    }
}

async fn serve(port: u16) -> Result<()> {
    let config = ServerConfig {
        bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
        ..Default::default()
    };
    println!("{}", format!("🔊 Hush relay on port {port}").green().bold());
    hush_server::run(config).await
}

async fn join(server: String, room: Option<String>, name: Option<String>) -> Result<()> {
    let room = match room {
        Some(code) => {
            let code = code
                .parse::<RoomCode>()
                .with_context(|| format!("Invalid room code {code:?}"))?;
            if !room_exists(&server, &code).await.unwrap_or(true) {
                println!(
                    "{}",
                    format!("Room {code} was not issued by this relay, joining anyway").yellow()
                );
            }
            code
        }
        None => {
            let code = create_room(&server)
                .await
                .with_context(|| format!("Failed to create a room on {server}"))?;
            println!("{} {}", "New room:".cyan(), code.as_str().bold());
            code
        }
    };
    let name = match name {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Display name")
            .interact_text()
            .context("Failed to read display name")?,
    };

    let config = ClientConfig::new(server, room, name);
    let (mut participant, mut events) = Participant::join(config, |transport| {
        Ok(Arc::new(RtcConnectionFactory::new(transport)) as Arc<dyn ConnectionFactory>)
    })
    .await?;

    println!(
        "{} {}",
        "✨ Joined room".green().bold(),
        participant.room().as_str().bold()
    );
    println!(
        "{}",
        "Type to chat. /audio starts audio, /peers lists sessions, /quit leaves.".dimmed()
    );

    let mut mic: Option<MicCapture> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match line.trim() {
                    "" => {}
                    "/quit" => break,
                    "/audio" if mic.is_some() => println!("{}", "Microphone already on".dimmed()),
                    "/audio" => {
                        let media = participant.start_audio()?;
                        match MicCapture::start(media) {
                            Ok(capture) => {
                                mic = Some(capture);
                                println!("{}", "🎙  Microphone on".cyan());
                            }
                            Err(e) => println!(
                                "{} {:#}",
                                "Peers get an audio track but no sound:".yellow(),
                                e
                            ),
                        }
                    }
                    "/peers" => {
                        for session in participant.sessions().await? {
                            println!(
                                "   {} {:?} {}",
                                session.peer_id.short(),
                                session.role,
                                session.state
                            );
                        }
                    }
                    text => participant.send_text(text)?,
                }
            }
            event = events.recv() => match event {
                Some(ParticipantEvent::Disconnected) | None => {
                    println!("{}", "Relay connection lost".red().bold());
                    break;
                }
                Some(event) => print_event(&event),
            },
        }
    }

    participant.leave();
    Ok(())
}

fn print_event(event: &ParticipantEvent) {
    match event {
        ParticipantEvent::Roster(snapshot) => {
            let names: Vec<&str> = snapshot
                .participants
                .iter()
                .map(|p| p.display_name.as_str())
                .collect();
            println!("{} {}", "👥".normal(), names.join(", ").yellow());
        }
        ParticipantEvent::Chat { author_name, text } => {
            println!("{}: {}", author_name.bold(), text);
        }
        ParticipantEvent::Session(update) => {
            let line = format!("   {} {}", update.peer_id.short(), update.state);
            match update.state {
                SessionState::Connected => println!("{}", line.green()),
                SessionState::Closed => println!("{}", line.red()),
                _ => println!("{}", line.dimmed()),
            }
        }
        ParticipantEvent::Disconnected => {}
    }
}
