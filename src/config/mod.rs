use crate::config::cli::Args;
use crate::error::{Error, Result};
use crate::infrastructure::{RawgApiClient, WebDownloader};
use clap::Parser;
use tracing::info;

pub mod cli;
pub mod viveport;

pub const DEFAULT_MAX_REDIRECT_DEPTH: u32 = 7;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:94.0) Gecko/20100101 Firefox/94.0";
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";

/// Header and redirect settings for a [`WebDownloader`] session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderSettings {
    pub max_redirect_depth: u32,
    pub user_agent: Option<String>,
    pub accept: Option<String>,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            max_redirect_depth: DEFAULT_MAX_REDIRECT_DEPTH,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            accept: Some(DEFAULT_ACCEPT.to_string()),
        }
    }
}

impl DownloaderSettings {
    pub fn with_max_redirect_depth(mut self, depth: u32) -> Self {
        self.max_redirect_depth = depth;
        self
    }
}

pub struct Config {
    pub args: Args,
    pub downloader: DownloaderSettings,
}

impl Config {
    pub fn new() -> Result<Self> {
        Ok(Self::from_args(Args::parse()))
    }

    pub fn from_args(args: Args) -> Self {
        let defaults = DownloaderSettings::default();
        let downloader = DownloaderSettings {
            max_redirect_depth: args.max_redirect_depth,
            user_agent: args.user_agent.clone().or(defaults.user_agent),
            accept: args.accept.clone().or(defaults.accept),
        };

        Self { args, downloader }
    }

    pub fn web_downloader(&self) -> Result<WebDownloader> {
        info!(
            max_redirect_depth = self.downloader.max_redirect_depth,
            "Created new web downloader session"
        );
        WebDownloader::new(&self.downloader)
    }

    pub fn rawg_client(&self) -> Result<RawgApiClient> {
        let key = self
            .args
            .rawg_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::MissingApiKey)?;
        RawgApiClient::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_downloader_defaults() {
        let args = Args::parse_from([
            "gamefetch",
            "--max-redirect-depth",
            "3",
            "--user-agent",
            "test-agent",
            "fetch",
            "https://example.com",
        ]);
        let config = Config::from_args(args);

        assert_eq!(config.downloader.max_redirect_depth, 3);
        assert_eq!(config.downloader.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(config.downloader.accept.as_deref(), Some(DEFAULT_ACCEPT));
    }

    #[test]
    fn rawg_client_requires_key() {
        let mut args = Args::parse_from(["gamefetch", "search", "doom"]);
        args.rawg_api_key = Some("  ".to_string());
        let config = Config::from_args(args);

        assert!(matches!(config.rawg_client(), Err(Error::MissingApiKey)));
    }

    #[test]
    fn default_settings() {
        let settings = DownloaderSettings::default();
        assert_eq!(settings.max_redirect_depth, 7);
        assert!(settings
            .user_agent
            .as_deref()
            .is_some_and(|ua| ua.contains("Firefox/94.0")));
    }
}
