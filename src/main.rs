use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use vinylspin::{cli, config, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Backend URL used by client commands, defaults to VINYLSPIN_BACKEND_URL
    #[clap(long, global = true)]
    backend: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the backend server
    Serve(ServeOptions),

    /// Authorize the session with Spotify
    Login,

    /// Show whether the session is authenticated
    Status,

    /// Search for artists
    Search(SearchOptions),

    /// Play a random top track of an artist
    PlayRandom(PlayRandomOptions),

    /// Pause or resume playback
    Toggle(DeviceOptions),

    /// Show the current track
    NowPlaying,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Address to bind, overrides SERVER_ADDRESS
    #[clap(long)]
    pub addr: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    pub query: String,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayRandomOptions {
    /// Artist name to search for, or an artist id with --id
    pub artist: String,

    /// Treat ARTIST as a Spotify artist id
    #[clap(long)]
    pub id: bool,

    #[clap(flatten)]
    pub device: DeviceOptions,
}

#[derive(Parser, Debug, Clone)]
pub struct DeviceOptions {
    /// Spotify device to control
    #[clap(long)]
    pub device_id: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    let backend = cli.backend.unwrap_or_else(config::backend_url);

    match cli.command {
        Command::Serve(opt) => cli::serve(opt.addr).await,
        Command::Login => cli::login(&backend).await,
        Command::Status => cli::status(&backend).await,
        Command::Search(opt) => cli::search(&backend, &opt.query).await,
        Command::PlayRandom(opt) => {
            cli::play_random(&backend, &opt.artist, opt.id, opt.device.device_id).await
        }
        Command::Toggle(opt) => cli::toggle(&backend, opt.device_id).await,
        Command::NowPlaying => cli::now_playing(&backend).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
