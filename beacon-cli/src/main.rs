use anyhow::{Context, Result};
use beacon_core::IceServerConfig;
use beacon_engine::{
    CaptureConstraints, EngineConfig, EngineEvent, EngineHandle, LocalRole, NegotiationEngine,
    RetryPolicy, SyntheticCapture, TokioDelay, TransportConfig, WebRtcTransportFactory,
    WsSignaling,
};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Select};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beacon", about = "Host or watch a peer-to-peer live stream")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a room and broadcast into it.
    Host {
        #[command(flatten)]
        common: CommonArgs,

        /// Start streaming as soon as the room exists.
        #[arg(long)]
        start: bool,
    },
    /// Join a room and watch its host.
    View {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    #[arg(long, default_value = "ws://localhost:8080")]
    server: String,

    #[arg(long)]
    room: Option<String>,

    /// STUN/TURN url; repeat for several. Defaults to public STUN servers.
    #[arg(long = "ice-server")]
    ice_servers: Vec<String>,

    #[arg(long)]
    turn_username: Option<String>,

    #[arg(long)]
    turn_credential: Option<String>,

    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,
}

impl CommonArgs {
    fn engine_config(&self) -> EngineConfig {
        let transport = if self.ice_servers.is_empty() {
            TransportConfig::default()
        } else {
            TransportConfig {
                ice_servers: vec![IceServerConfig {
                    urls: self.ice_servers.clone(),
                    username: self.turn_username.clone(),
                    credential: self.turn_credential.clone(),
                }],
            }
        };

        EngineConfig {
            transport,
            retry: RetryPolicy {
                max_attempts: self.max_attempts.max(1),
                delay: Duration::from_millis(self.retry_delay_ms),
            },
            capture: CaptureConstraints::default(),
            ..EngineConfig::default()
        }
    }

    fn room(&self) -> Result<String> {
        if let Some(room) = &self.room {
            return Ok(room.clone());
        }
        let room: String = Input::new()
            .with_prompt("Room id")
            .interact_text()
            .context("Failed to read room id")?;
        Ok(room)
    }
}

/// What the host can do from the terminal once live.
enum HostAction {
    SwitchCamera,
    EndStream,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Host { common, start } => run(common, LocalRole::Host, start).await,
        Commands::View { common } => run(common, LocalRole::Viewer, false).await,
    }
}

async fn run(args: CommonArgs, role: LocalRole, auto_start: bool) -> Result<()> {
    let room = args.room()?;
    let config = args.engine_config();
    info!(
        "Room {}, {} ICE server entries, up to {} offer attempts",
        room,
        config.transport.ice_servers.len(),
        config.retry.max_attempts
    );

    println!("{}", "📡 Connecting to signaling server...".cyan());

    let signaling = WsSignaling::new(args.server.clone());
    let factory = Arc::new(WebRtcTransportFactory::new(config.transport.clone()));
    let (engine, handle, mut events) = NegotiationEngine::new(
        config,
        factory,
        signaling.clone(),
        Arc::new(SyntheticCapture::new("beacon")),
        Arc::new(TokioDelay),
    );
    let engine_task = tokio::spawn(engine.run());

    signaling
        .start(handle.clone())
        .await
        .with_context(|| format!("Failed to connect to {}", args.server))?;

    match role {
        LocalRole::Host => handle.create_room(&room).await?,
        LocalRole::Viewer => handle.join_room(&room).await?,
    }

    let (action_tx, mut action_rx) = mpsc::unbounded_channel();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "👋 Leaving...".yellow());
                match role {
                    LocalRole::Host => handle.end_stream().await?,
                    LocalRole::Viewer => handle.leave_room().await?,
                }
                break;
            }

            Some(action) = action_rx.recv() => {
                match action {
                    HostAction::SwitchCamera => handle.switch_camera().await?,
                    HostAction::EndStream => {
                        handle.end_stream().await?;
                        break;
                    }
                }
            }

            event = events.recv() => {
                let Some(event) = event else { break };
                if !on_event(event, &handle, auto_start, &action_tx).await? {
                    break;
                }
            }
        }
    }

    handle.shutdown().await.ok();
    engine_task.await.ok();
    println!("{}", "✨ Done".green().bold());
    Ok(())
}

/// Print an engine event. Returns `false` once the session is over.
async fn on_event(
    event: EngineEvent,
    handle: &EngineHandle,
    auto_start: bool,
    actions: &mpsc::UnboundedSender<HostAction>,
) -> Result<bool> {
    match event {
        EngineEvent::RoleAssigned { room, role } => {
            println!(
                "{} {} as {:?}",
                "✅ Entered room".green().bold(),
                room.to_string().bold(),
                role
            );
            if role == LocalRole::Host {
                let start = auto_start || confirm("Start streaming now?").await?;
                if start {
                    handle.start_stream().await?;
                }
            }
        }
        EngineEvent::StreamStarted => {
            println!("{}", "🔴 Live".red().bold());
            spawn_host_menu(actions.clone());
        }
        EngineEvent::StreamEnded => {
            println!("{}", "⏹  Stream ended".yellow());
            return Ok(false);
        }
        EngineEvent::RoomRejected(reason) => {
            println!("{} {:?}", "❌ Room request rejected:".red().bold(), reason);
            return Ok(false);
        }
        EngineEvent::RoomError(message) => {
            println!("{} {}", "⚠️  Server:".yellow(), message);
        }
        EngineEvent::CaptureUnavailable(e) => {
            println!("{} {}", "❌ Camera unavailable:".red().bold(), e);
        }
        EngineEvent::CameraSwitched(facing) => {
            println!("{} {:?}", "🔄 Camera:".cyan(), facing);
        }
        EngineEvent::HostStreaming => println!("{}", "🔴 Host is live".red()),
        EngineEvent::HostLeft => {
            println!("{}", "👋 Host left".yellow());
            return Ok(false);
        }
        EngineEvent::RoomClosed => {
            println!("{}", "🚪 Room closed".yellow());
            return Ok(false);
        }
        EngineEvent::SessionState {
            peer_id,
            role,
            state,
        } => {
            println!(
                "   {} {} {}",
                role.remote_label().dimmed(),
                peer_id.to_string().bold(),
                state.to_string().cyan()
            );
        }
        EngineEvent::OfferAttemptFailed {
            peer_id,
            attempt,
            reason,
        } => {
            println!(
                "   {} {} (attempt {}): {}",
                "retrying".yellow(),
                peer_id,
                attempt,
                reason.dimmed()
            );
        }
        EngineEvent::PeerFailed(e) => println!("{} {}", "❌".red(), e),
        EngineEvent::PeerLeft(peer_id) => println!("   {} {}", "left".dimmed(), peer_id),
        EngineEvent::RemoteMedia { peer_id, media } => {
            println!(
                "{} {} ({} tracks)",
                "📺 Receiving from".green(),
                peer_id,
                media.tracks.len()
            );
        }
        EngineEvent::SignalingLost => println!("{}", "📡 Signaling lost, reconnecting...".yellow()),
        EngineEvent::SignalingRestored => println!("{}", "📡 Signaling restored".green()),
    }
    Ok(true)
}

async fn confirm(prompt: &'static str) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
    })
    .await
    .context("Prompt task failed")??;
    Ok(answer)
}

fn spawn_host_menu(actions: mpsc::UnboundedSender<HostAction>) {
    tokio::task::spawn_blocking(move || {
        let items = ["Switch camera", "End stream"];
        loop {
            let Ok(choice) = Select::new().items(&items).default(0).interact() else {
                break;
            };
            let action = match choice {
                0 => HostAction::SwitchCamera,
                _ => HostAction::EndStream,
            };
            let done = matches!(action, HostAction::EndStream);
            if actions.send(action).is_err() || done {
                break;
            }
        }
    });
}
