use gamefetch::config::cli::Command;
use gamefetch::config::Config;
use gamefetch::domain::CompletionStatus;
use gamefetch::error::{Error, Result};
use gamefetch::infrastructure::scrapers::{content_redirect, script_cookies};
use gamefetch::infrastructure::DownloadStringOptions;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::new()?;

    let level = config.args.log_level.parse().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    run(&config).await
}

async fn run(config: &Config) -> Result<()> {
    match &config.args.command {
        Command::Game { slug_or_id } => {
            let game = config.rawg_client()?.get_game(slug_or_id).await?;
            print_json(&game)
        }
        Command::Search { query } => {
            let results = config.rawg_client()?.search_games(query).await?;
            print_json(&results.map(|r| r.results).unwrap_or_default())
        }
        Command::Library { username, token } => {
            let client = config.rawg_client()?;
            let games = match (token, username) {
                (Some(token), _) => client.get_current_user_library(token).await?,
                (None, Some(username)) => client.get_user_library(username).await?,
                (None, None) => return Err(Error::Other("Pass a username or --token".into())),
            };
            info!("Fetched {} library games", games.len());
            print_json(&games)
        }
        Command::Collections { username, token } => {
            let client = config.rawg_client()?;
            let collections = match (token, username) {
                (Some(token), _) => client.get_current_user_collections(token).await?,
                (None, Some(username)) => client.get_collections(username).await?,
                (None, None) => return Err(Error::Other("Pass a username or --token".into())),
            };
            print_json(&collections)
        }
        Command::CollectionGames { collection, token } => {
            let client = config.rawg_client()?;
            let games = match token {
                Some(token) => {
                    client
                        .get_current_user_collection_games(collection, token)
                        .await?
                }
                None => client.get_collection_games(collection).await?,
            };
            print_json(&games)
        }
        Command::Login { email, password } => {
            match config.rawg_client()?.login(email, password).await? {
                Some(token) => println!("{token}"),
                None => warn!("Login did not return a token"),
            }
            Ok(())
        }
        Command::AddToLibrary {
            game_id,
            status,
            token,
        } => {
            let status: CompletionStatus = status.parse()?;
            let added = config
                .rawg_client()?
                .add_game_to_library(token, *game_id, status)
                .await;
            println!("{added}");
            Ok(())
        }
        Command::Fetch {
            url,
            referer,
            allow_error_status,
            follow_content_redirects,
        } => {
            let mut downloader = config.web_downloader()?;
            let redirect_extractor = content_redirect;
            let cookie_extractor = script_cookies;
            let mut options = DownloadStringOptions::default();
            if let Some(referer) = referer {
                options = options.referer(referer.clone());
            }
            if *allow_error_status {
                options = options.allow_error_status();
            }
            if *follow_content_redirects {
                options = options
                    .redirect_url_extractor(&redirect_extractor)
                    .js_cookie_extractor(&cookie_extractor);
            }

            match downloader.download_string(url, &options).await? {
                Some(response) => {
                    info!(
                        url = %response.response_url,
                        status = %response.status_code,
                        cookies = downloader.cookies().len(),
                        "Fetched"
                    );
                    println!("{}", response.response_content);
                }
                None => warn!("Gave up on {url}: too many redirects"),
            }
            Ok(())
        }
        Command::Download { url, dir } => {
            let mut downloader = config.web_downloader()?;
            tokio::fs::create_dir_all(dir).await?;

            let cancel = Arc::new(AtomicBool::new(false));
            let on_ctrl_c = Arc::clone(&cancel);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.store(true, Ordering::SeqCst);
                }
            });

            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} {msg}")
                    .map_err(|e| Error::Other(e.to_string()))?,
            );
            let report = |written: u64, total: Option<u64>| {
                if let Some(total) = total {
                    pb.set_length(total);
                }
                pb.set_position(written);
            };

            match downloader
                .download_file(url, dir, &cancel, Some(&report))
                .await?
            {
                Some(path) => {
                    pb.finish_with_message("Done");
                    println!("{}", path.display());
                }
                None => pb.abandon_with_message("Cancelled"),
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
