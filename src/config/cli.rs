use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// RAWG API key for catalog reads
    #[clap(long, env = "RAWG_API_KEY")]
    pub rawg_api_key: Option<String>,

    /// Maximum number of redirects followed by `fetch`
    #[arg(long, default_value_t = 7)]
    pub max_redirect_depth: u32,

    /// User-Agent sent by the web downloader
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Accept header sent by the web downloader
    #[arg(long)]
    pub accept: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a single game by slug or id
    Game { slug_or_id: String },
    /// Search the RAWG catalog
    Search { query: String },
    /// List a user's library, or the logged in user's with --token
    Library {
        username: Option<String>,
        #[arg(long, env = "RAWG_TOKEN")]
        token: Option<String>,
    },
    /// List a user's collections, or the logged in user's with --token
    Collections {
        username: Option<String>,
        #[arg(long, env = "RAWG_TOKEN")]
        token: Option<String>,
    },
    /// List the games in a collection
    CollectionGames {
        collection: String,
        #[arg(long, env = "RAWG_TOKEN")]
        token: Option<String>,
    },
    /// Log in and print the account token
    Login { email: String, password: String },
    /// Add a game to the logged in user's library
    AddToLibrary {
        game_id: u64,
        #[arg(long, default_value = "owned")]
        status: String,
        #[arg(long, env = "RAWG_TOKEN")]
        token: String,
    },
    /// Download a page as text, following redirects
    Fetch {
        url: String,
        #[arg(long)]
        referer: Option<String>,
        /// Keep going on 4xx/5xx responses
        #[arg(long)]
        allow_error_status: bool,
        /// Also follow <meta http-equiv="refresh"> and script redirects
        #[arg(long)]
        follow_content_redirects: bool,
    },
    /// Download a file into a directory
    Download {
        url: String,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}
