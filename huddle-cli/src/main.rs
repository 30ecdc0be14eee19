mod api;
mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Input, Password};
use huddle_client::{ClientConfig, MeetingSession};
use huddle_core::{CreateMeetingRequest, MeetingId, ParticipantId};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::api::{DEFAULT_API_URL, MeetingApi};
use crate::console::ConsoleBehavior;

#[derive(Parser)]
#[command(name = "huddle", version, about = "Peer-to-peer mesh meetings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a meeting on the rendezvous server.
    Create {
        #[arg(long, env = "HUDDLE_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        max_participants: Option<u32>,

        /// RFC 3339 start time; defaults to now.
        #[arg(long)]
        start_time: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Do not prompt for missing values.
        #[arg(long)]
        no_input: bool,
    },

    /// Join a meeting and stay until Ctrl-C. Lines typed on stdin are sent as chat.
    Join {
        meeting_id: String,

        /// Requested participant id; empty lets the server assign one.
        #[arg(long, default_value = "")]
        participant_id: String,

        #[arg(long, env = "HUDDLE_SIGNALING_URL")]
        signaling_url: Option<String>,

        /// Participants to call once joined.
        #[arg(long = "call")]
        call: Vec<String>,

        #[arg(long)]
        no_audio: bool,

        #[arg(long)]
        no_video: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Create {
            api_url,
            name,
            max_participants,
            start_time,
            password,
            no_input,
        } => {
            let request = build_request(name, max_participants, start_time, password, no_input)?;

            println!("{}", "🚀 Creating meeting...".green().bold());
            let response = MeetingApi::new(api_url).create_meeting(&request).await?;

            println!("{}", "✨ Meeting created!".green().bold());
            println!("   🆔 Meeting:     {}", response.id.to_string().bold());
            println!("   👤 Your client: {}", response.client_id);
            println!(
                "   {} huddle join {} --participant-id {}",
                "▶".cyan(),
                response.id,
                response.client_id
            );
        }

        Commands::Join {
            meeting_id,
            participant_id,
            signaling_url,
            call,
            no_audio,
            no_video,
        } => {
            let mut config = ClientConfig::from_env().context("Invalid HUDDLE_* configuration")?;
            if let Some(url) = signaling_url {
                config.signaling_url = url;
            }
            if no_audio {
                config.media.audio = false;
            }
            if no_video {
                config.media.video = false;
            }
            if !config.media.audio && !config.media.video {
                anyhow::bail!("Nothing to send: both audio and video are disabled");
            }

            join(config, MeetingId::from(meeting_id), participant_id.into(), call).await?;
        }
    }

    Ok(())
}

fn build_request(
    name: Option<String>,
    max_participants: Option<u32>,
    start_time: Option<String>,
    password: Option<String>,
    no_input: bool,
) -> Result<CreateMeetingRequest> {
    let client_name = match name {
        Some(name) => name,
        None if no_input => anyhow::bail!("--name is required with --no-input"),
        None => Input::<String>::new()
            .with_prompt("Your name")
            .interact_text()
            .context("Failed to read name")?,
    };

    let max_participants = match max_participants {
        Some(max) => max,
        None if no_input => 0,
        None => Input::<u32>::new()
            .with_prompt("Maximum participants (0 for no limit)")
            .default(0)
            .interact_text()
            .context("Failed to read participant limit")?,
    };

    let password = match password {
        Some(password) => Some(password),
        None if no_input => None,
        None => {
            let entered = Password::new()
                .with_prompt("Password (empty for none)")
                .allow_empty_password(true)
                .interact()
                .context("Failed to read password")?;
            (!entered.is_empty()).then_some(entered)
        }
    };

    Ok(CreateMeetingRequest {
        client_name,
        max_participants,
        start_time: start_time.unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
        password,
    })
}

async fn join(
    config: ClientConfig,
    meeting_id: MeetingId,
    participant_id: ParticipantId,
    call: Vec<String>,
) -> Result<()> {
    tracing::debug!("Client configuration: {:?}", config);

    let behavior = Arc::new(ConsoleBehavior);
    let mut session = MeetingSession::from_config(&config, behavior.clone(), behavior);

    println!(
        "{} {} {}",
        "🔌 Connecting to".cyan(),
        config.signaling_url,
        format!("(meeting {meeting_id})").dimmed()
    );
    session
        .join(meeting_id, participant_id)
        .await
        .context("Failed to join the meeting")?;

    let handle = session.handle();
    let event_loop = tokio::spawn(session.run());

    for peer in call {
        if let Err(e) = handle.start_call(ParticipantId::from(peer.as_str())).await {
            eprintln!("{} {}: {}", "❌ Could not call".red(), peer.bold(), e);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            line = lines.next_line() => match line {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    if let Err(e) = handle.send_message(text).await {
                        eprintln!("{} {}", "❌ Message not sent:".red(), e);
                        break;
                    }
                }
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => {
                    // stdin closed; stay in the meeting until Ctrl-C.
                    tokio::signal::ctrl_c().await.context("Failed to wait for Ctrl-C")?;
                    break;
                }
            },
        }
    }

    println!("{}", "👋 Leaving meeting...".yellow());
    handle.leave().await?;
    event_loop.await.context("Meeting event loop panicked")?;
    println!("{}", "✨ Left the meeting.".green());
    Ok(())
}
