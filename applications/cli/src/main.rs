/// Cadence - terminal music player
use anyhow::Context;
use cadence_cli::{
    catalog,
    commands::{ReplCommand, HELP},
    CliConfig, LoggingReporter,
};
use cadence_core::{PlaylistSnapshot, SessionIdentity};
use cadence_playback::{
    format_time, PersistenceBridge, PlaybackCommand, PlaybackController, PlaybackEvent,
    PlaybackSession, PlayerHandle, PlayerService, SharedResource, SimulatedResource,
};
use cadence_storage::SqliteSessionStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence terminal music player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CADENCE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Play {
        /// Playlist JSON file to load
        playlist: Option<PathBuf>,

        /// Start the playlist in shuffle mode
        #[arg(long)]
        shuffle: bool,

        /// Listen as a guest
        #[arg(long)]
        guest: bool,
    },
    /// Show the saved session
    Status,
    /// Forget the saved session
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info,cadence_playback=info,cadence_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let store = SqliteSessionStore::connect(&config.storage.database_url)
        .await
        .with_context(|| format!("opening {}", config.storage.database_url))?;
    let bridge = PersistenceBridge::new(Arc::new(store), config.playback.session_key.clone());

    match cli.command.unwrap_or(Commands::Play {
        playlist: None,
        shuffle: false,
        guest: false,
    }) {
        Commands::Play {
            playlist,
            shuffle,
            guest,
        } => play(config, bridge, playlist, shuffle, guest).await?,
        Commands::Status => {
            let session = bridge.restore(&config.playback).await;
            print_status(&session);
        }
        Commands::Reset => {
            bridge.clear().await;
            println!("Saved session cleared");
        }
    }

    Ok(())
}

async fn play(
    config: CliConfig,
    bridge: PersistenceBridge,
    playlist: Option<PathBuf>,
    shuffle: bool,
    guest: bool,
) -> anyhow::Result<()> {
    let session = bridge.restore(&config.playback).await;
    let resumable = session.current_track.is_some();

    let playlist = match playlist {
        Some(path) => Some(
            catalog::load_playlist(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
        ),
        None if resumable => None,
        None => Some(catalog::demo_playlist()),
    };

    let resource = SimulatedResource::new(config.simulation.to_simulated());
    let identity = if guest {
        SessionIdentity::guest()
    } else {
        SessionIdentity::authenticated()
    };
    let mut controller = PlaybackController::with_session(
        &SharedResource::new(resource),
        Arc::new(LoggingReporter),
        config.playback.clone(),
        session,
    )?
    .with_identity(identity);

    let (observer, writer) = bridge.attach();
    controller.subscribe(observer);

    if resumable {
        if let Err(err) = controller.restore_current_track() {
            tracing::warn!(error = %err, "Could not restore the last track");
        }
    }

    let (handle, task) = PlayerService::spawn(controller);
    let printer = tokio::spawn(print_events(handle.subscribe()));

    if let Some(snapshot) = playlist.clone() {
        println!("Loaded {} tracks. Type 'help' for commands.", snapshot.len());
        if shuffle {
            handle.shuffle_play(snapshot)?;
        } else {
            handle.play_all(snapshot, 0)?;
        }
    } else {
        println!("Resuming saved session. Type 'play' to continue.");
    }

    repl(&handle, playlist).await?;

    handle.shutdown()?;
    let controller = task.await.context("player service panicked")?;
    let session = controller.session().clone();
    // Dropping the controller closes the observer; the writer flushes and exits
    drop(controller);
    writer.await.context("session writer panicked")?;
    bridge.save(&session).await;
    printer.abort();

    tracing::info!(current_time = session.current_time, "Session saved");
    Ok(())
}

async fn repl(handle: &PlayerHandle, mut playlist: Option<PlaylistSnapshot>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match ReplCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        if playlist.is_none() {
            playlist = Some(handle.session().await?.playlist);
        }
        let snapshot = playlist.clone().unwrap_or_default();

        match command {
            ReplCommand::Toggle => handle.toggle_play()?,
            ReplCommand::Pause => handle.pause()?,
            ReplCommand::Next => handle.next()?,
            ReplCommand::Previous => handle.previous()?,
            ReplCommand::Seek(seconds) => handle.seek(seconds)?,
            ReplCommand::SeekPercent(percent) => {
                handle.send(PlaybackCommand::SeekByClick(percent / 100.0))?;
            }
            ReplCommand::Volume(level) => handle.set_volume(level)?,
            ReplCommand::Mute => handle.toggle_mute()?,
            ReplCommand::Mode(None) => handle.toggle_mode()?,
            ReplCommand::Mode(Some(mode)) => handle.send(PlaybackCommand::SetMode(mode))?,
            ReplCommand::PlayAll(index) => handle.play_all(snapshot, index)?,
            ReplCommand::Shuffle => handle.shuffle_play(snapshot)?,
            ReplCommand::Pick(index) => match snapshot.get(index).cloned() {
                Some(track) => handle.send(PlaybackCommand::SelectFromList {
                    track,
                    index,
                    snapshot,
                })?,
                None => println!("No track at position {index}"),
            },
            ReplCommand::Clear => {
                handle.send(PlaybackCommand::ClearPlaylist)?;
                playlist = Some(PlaylistSnapshot::default());
            }
            ReplCommand::Status => print_status(&handle.session().await?),
            ReplCommand::List => print_playlist(&snapshot),
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => break,
        }
    }

    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<PlaybackEvent>) {
    loop {
        match events.recv().await {
            Ok(PlaybackEvent::TrackChanged {
                track_id: Some(id), ..
            }) => println!("> now: {id}"),
            Ok(PlaybackEvent::StateChanged { state }) => println!("> {state:?}"),
            Ok(PlaybackEvent::ModeChanged { mode }) => println!("> mode: {}", mode.display_name()),
            Ok(PlaybackEvent::VolumeChanged { level }) => println!("> volume: {level}"),
            Ok(PlaybackEvent::MuteChanged { is_muted }) => {
                println!("> {}", if is_muted { "muted" } else { "unmuted" });
            }
            Ok(PlaybackEvent::Notice { message }) => println!("> {message}"),
            Ok(PlaybackEvent::Error { message }) => println!("! {message}"),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_status(session: &PlaybackSession) {
    let Some(track) = &session.current_track else {
        println!("Nothing selected");
        return;
    };
    println!(
        "{} {} [{} / {}] {:.0}%  mode: {}  volume: {}{}",
        if session.is_playing { "playing" } else { "paused" },
        track.name,
        format_time(session.current_time),
        format_time(session.duration),
        session.progress_percent,
        session.play_mode.display_name(),
        session.volume.level(),
        if session.is_muted() { " (muted)" } else { "" },
    );
}

fn print_playlist(snapshot: &PlaylistSnapshot) {
    if snapshot.is_empty() {
        println!("Playlist is empty");
        return;
    }
    for (index, track) in snapshot.tracks.iter().enumerate() {
        match &track.artist {
            Some(artist) => println!("{index:>3}  {} - {artist}", track.name),
            None => println!("{index:>3}  {}", track.name),
        }
    }
}
