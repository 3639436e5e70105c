//! Subcommand definitions and execution.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::config::Config;
use crate::panel::{ApiClient, ReqwestTransport, SqliteTokenStore};
use crate::worker::{
  EventOutcome, FetchRequest, HttpFetcher, OfflineCacheWorker, SqliteCacheStore, WorkerEvent,
};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Log in to the panel (password from SBX_PASSWORD)
  Login { username: String },
  /// Log out and clear the stored session
  Logout,
  /// Show the currently logged-in user
  Whoami,
  /// Host system metrics
  #[command(subcommand)]
  System(SystemCommand),
  /// Docker container control
  #[command(subcommand)]
  Docker(DockerCommand),
  #[command(subcommand)]
  Radarr(RadarrCommand),
  #[command(subcommand)]
  Sonarr(SonarrCommand),
  #[command(subcommand)]
  Overseerr(OverseerrCommand),
  #[command(subcommand)]
  Plex(PlexCommand),
  #[command(subcommand)]
  Tautulli(TautulliCommand),
  #[command(subcommand)]
  Utorrent(UtorrentCommand),
  #[command(subcommand)]
  Rutorrent(RutorrentCommand),
  /// Offline shell cache maintenance
  #[command(subcommand)]
  Shell(ShellCommand),
}

#[derive(Subcommand, Debug)]
pub enum SystemCommand {
  Stats,
  History {
    #[arg(long, default_value_t = 24)]
    hours: u32,
  },
}

#[derive(Subcommand, Debug)]
pub enum DockerCommand {
  Status,
  /// List containers
  Ps,
  Inspect {
    id: String,
  },
  Start {
    id: String,
  },
  Stop {
    id: String,
  },
  Restart {
    id: String,
  },
  Logs {
    id: String,
    #[arg(long, default_value_t = 100)]
    tail: u32,
  },
}

#[derive(Subcommand, Debug)]
pub enum RadarrCommand {
  Health,
  Movies,
  Stats,
  Queue,
}

#[derive(Subcommand, Debug)]
pub enum SonarrCommand {
  Health,
  Series,
  Stats,
  Queue,
}

#[derive(Subcommand, Debug)]
pub enum OverseerrCommand {
  Health,
  Requests {
    #[arg(long, default_value = "all")]
    status: String,
  },
  Approve {
    request_id: u64,
  },
  Decline {
    request_id: u64,
  },
}

#[derive(Subcommand, Debug)]
pub enum PlexCommand {
  Health,
  Status,
  Libraries,
  Sessions,
  Streams {
    #[arg(long, default_value_t = 10)]
    count: u32,
  },
  Restart,
  Optimize,
  Scan {
    library_key: String,
  },
}

#[derive(Subcommand, Debug)]
pub enum TautulliCommand {
  Health,
  Status,
  Activity,
  Stats,
  Users,
  Libraries,
  History {
    #[arg(long, default_value_t = 50)]
    count: u32,
  },
  ServerInfo,
  Restart,
}

#[derive(Subcommand, Debug)]
pub enum UtorrentCommand {
  Health,
  Status,
  Torrents,
  Stats,
  Bandwidth,
  Start {
    hash: String,
  },
  Stop {
    hash: String,
  },
  Pause {
    hash: String,
  },
  Resume {
    hash: String,
  },
  Remove {
    hash: String,
    #[arg(long)]
    delete_files: bool,
  },
  AddUrl {
    url: String,
  },
}

#[derive(Subcommand, Debug)]
pub enum RutorrentCommand {
  Health,
  Status,
  Torrents,
  Stats,
  Bandwidth,
  Start {
    hash: String,
  },
  Stop {
    hash: String,
  },
  Pause {
    hash: String,
  },
  Resume {
    hash: String,
  },
  Remove {
    hash: String,
    #[arg(long)]
    delete_files: bool,
  },
  Restart,
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
  /// Warm the shell cache (install)
  Warm,
  /// Evict stale cache generations (activate)
  Gc,
  /// Serve one URL through the offline strategies
  Fetch {
    url: String,
    /// Negotiate for HTML (network-first strategy)
    #[arg(long)]
    html: bool,
  },
  /// Run the app-state background sync once
  Sync,
  /// Preview the notification built for a push payload
  Notify {
    message: Option<String>,
  },
}

type Client = ApiClient<ReqwestTransport, SqliteTokenStore>;

fn build_client(config: &Config) -> Result<Client> {
  let tokens = SqliteTokenStore::open(&Config::data_dir()?.join("tokens.db"))?;

  Ok(ApiClient::new(
    config.panel.api_base(),
    ReqwestTransport::new(),
    Arc::new(tokens),
  ))
}

fn print_json(value: &Value) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

pub async fn run(command: Command, config: &Config) -> Result<()> {
  let command = match command {
    Command::Shell(cmd) => return run_shell(cmd, config).await,
    other => other,
  };

  let client = build_client(config)?;

  let value = match command {
    Command::Login { username } => {
      let password = Config::get_password()?;
      let payload = client.login(&username, &password).await?;
      println!("Logged in as {}", username);
      return print_json(&payload.user);
    }
    Command::Logout => {
      client.logout().await?;
      println!("Logged out");
      return Ok(());
    }
    Command::Whoami => client.current_user().await?,

    Command::System(cmd) => match cmd {
      SystemCommand::Stats => client.system_stats().await?,
      SystemCommand::History { hours } => client.system_history(hours).await?,
    },

    Command::Docker(cmd) => match cmd {
      DockerCommand::Status => client.docker_status().await?,
      DockerCommand::Ps => client.containers().await?,
      DockerCommand::Inspect { id } => client.container(&id).await?,
      DockerCommand::Start { id } => client.start_container(&id).await?,
      DockerCommand::Stop { id } => client.stop_container(&id).await?,
      DockerCommand::Restart { id } => client.restart_container(&id).await?,
      DockerCommand::Logs { id, tail } => client.container_logs(&id, tail).await?,
    },

    Command::Radarr(cmd) => match cmd {
      RadarrCommand::Health => client.radarr_health().await?,
      RadarrCommand::Movies => client.radarr_movies().await?,
      RadarrCommand::Stats => client.radarr_stats().await?,
      RadarrCommand::Queue => client.radarr_queue().await?,
    },

    Command::Sonarr(cmd) => match cmd {
      SonarrCommand::Health => client.sonarr_health().await?,
      SonarrCommand::Series => client.sonarr_series().await?,
      SonarrCommand::Stats => client.sonarr_stats().await?,
      SonarrCommand::Queue => client.sonarr_queue().await?,
    },

    Command::Overseerr(cmd) => match cmd {
      OverseerrCommand::Health => client.overseerr_health().await?,
      OverseerrCommand::Requests { status } => client.overseerr_requests(&status).await?,
      OverseerrCommand::Approve { request_id } => client.approve_request(request_id).await?,
      OverseerrCommand::Decline { request_id } => client.decline_request(request_id).await?,
    },

    Command::Plex(cmd) => match cmd {
      PlexCommand::Health => client.plex_health().await?,
      PlexCommand::Status => client.plex_status().await?,
      PlexCommand::Libraries => client.plex_libraries().await?,
      PlexCommand::Sessions => client.plex_sessions().await?,
      PlexCommand::Streams { count } => client.plex_streams(count).await?,
      PlexCommand::Restart => client.restart_plex().await?,
      PlexCommand::Optimize => client.optimize_plex_database().await?,
      PlexCommand::Scan { library_key } => client.scan_plex_library(&library_key).await?,
    },

    Command::Tautulli(cmd) => match cmd {
      TautulliCommand::Health => client.tautulli_health().await?,
      TautulliCommand::Status => client.tautulli_status().await?,
      TautulliCommand::Activity => client.tautulli_activity().await?,
      TautulliCommand::Stats => client.tautulli_stats().await?,
      TautulliCommand::Users => client.tautulli_users().await?,
      TautulliCommand::Libraries => client.tautulli_libraries().await?,
      TautulliCommand::History { count } => client.tautulli_history(count).await?,
      TautulliCommand::ServerInfo => client.tautulli_server_info().await?,
      TautulliCommand::Restart => client.restart_tautulli().await?,
    },

    Command::Utorrent(cmd) => match cmd {
      UtorrentCommand::Health => client.utorrent_health().await?,
      UtorrentCommand::Status => client.utorrent_status().await?,
      UtorrentCommand::Torrents => client.utorrent_torrents().await?,
      UtorrentCommand::Stats => client.utorrent_stats().await?,
      UtorrentCommand::Bandwidth => client.utorrent_bandwidth().await?,
      UtorrentCommand::Start { hash } => client.start_utorrent(&hash).await?,
      UtorrentCommand::Stop { hash } => client.stop_utorrent(&hash).await?,
      UtorrentCommand::Pause { hash } => client.pause_utorrent(&hash).await?,
      UtorrentCommand::Resume { hash } => client.resume_utorrent(&hash).await?,
      UtorrentCommand::Remove { hash, delete_files } => {
        client.remove_utorrent(&hash, delete_files).await?
      }
      UtorrentCommand::AddUrl { url } => client.add_utorrent_url(&url).await?,
    },

    Command::Rutorrent(cmd) => match cmd {
      RutorrentCommand::Health => client.rutorrent_health().await?,
      RutorrentCommand::Status => client.rutorrent_status().await?,
      RutorrentCommand::Torrents => client.rutorrent_torrents().await?,
      RutorrentCommand::Stats => client.rutorrent_stats().await?,
      RutorrentCommand::Bandwidth => client.rutorrent_bandwidth().await?,
      RutorrentCommand::Start { hash } => client.start_rutorrent(&hash).await?,
      RutorrentCommand::Stop { hash } => client.stop_rutorrent(&hash).await?,
      RutorrentCommand::Pause { hash } => client.pause_rutorrent(&hash).await?,
      RutorrentCommand::Resume { hash } => client.resume_rutorrent(&hash).await?,
      RutorrentCommand::Remove { hash, delete_files } => {
        client.remove_rutorrent(&hash, delete_files).await?
      }
      RutorrentCommand::Restart => client.restart_rutorrent().await?,
    },

    Command::Shell(_) => unreachable!("handled above"),
  };

  print_json(&value)
}

async fn run_shell(command: ShellCommand, config: &Config) -> Result<()> {
  let origin = Url::parse(&config.panel.url)
    .map_err(|e| eyre!("Invalid panel URL {}: {}", config.panel.url, e))?;
  let store = Arc::new(SqliteCacheStore::open(
    &Config::data_dir()?.join("shell-cache.db"),
  )?);

  match command {
    ShellCommand::Warm => {
      let mut worker =
        OfflineCacheWorker::new(origin, config.worker.clone(), store, HttpFetcher::new());
      match worker.handle_event(WorkerEvent::Install).await {
        EventOutcome::Installed { assets_cached } => {
          println!("Cached {} shell assets", assets_cached);
        }
        outcome => println!("Unexpected outcome: {:?}", outcome),
      }
      Ok(())
    }
    ShellCommand::Gc => {
      let mut worker =
        OfflineCacheWorker::new(origin, config.worker.clone(), store, HttpFetcher::new());
      match worker.handle_event(WorkerEvent::Activate).await {
        EventOutcome::Activated { claim_clients } => {
          println!("Active generation: {}", config.worker.generation);
          if claim_clients {
            println!("Open pages would now be claimed by this generation");
          }
        }
        outcome => println!("Unexpected outcome: {:?}", outcome),
      }
      Ok(())
    }
    ShellCommand::Fetch { url, html } => {
      let target = origin
        .join(&url)
        .map_err(|e| eyre!("Invalid URL {}: {}", url, e))?;
      let mut request = FetchRequest::get(target);
      if html {
        request = request.with_accept("text/html");
      }

      let mut worker =
        OfflineCacheWorker::activated(origin, config.worker.clone(), store, HttpFetcher::new());
      match worker.handle_event(WorkerEvent::Fetch(request)).await {
        EventOutcome::Response(response) => {
          eprintln!(
            "HTTP {} ({})",
            response.status,
            response.content_type.as_deref().unwrap_or("unknown")
          );
          println!("{}", String::from_utf8_lossy(&response.body));
        }
        EventOutcome::PassThrough => {
          println!("Cross-origin request, not intercepted");
        }
        outcome => println!("Unexpected outcome: {:?}", outcome),
      }
      Ok(())
    }
    ShellCommand::Sync => {
      let mut worker =
        OfflineCacheWorker::activated(origin, config.worker.clone(), store, HttpFetcher::new());
      let tag = config.worker.sync_tag.clone();
      match worker.handle_event(WorkerEvent::Sync { tag }).await {
        EventOutcome::Synced { ok: true } => println!("Synced"),
        EventOutcome::Synced { ok: false } => println!("Sync failed (will retry via host)"),
        outcome => println!("Unexpected outcome: {:?}", outcome),
      }
      Ok(())
    }
    ShellCommand::Notify { message } => {
      let mut worker =
        OfflineCacheWorker::activated(origin, config.worker.clone(), store, HttpFetcher::new());
      match worker.handle_event(WorkerEvent::Push { payload: message }).await {
        EventOutcome::ShowNotification(n) => {
          println!("{}: {}", n.title, n.body);
          println!("tag: {}, require_interaction: {}", n.tag, n.require_interaction);
          println!("icon: {}", n.icon);
          println!("badge: {}", n.badge);
        }
        outcome => println!("Unexpected outcome: {:?}", outcome),
      }
      Ok(())
    }
  }
}
