use crate::domain::{
    CompletionStatus, RawgCollection, RawgGameBase, RawgGameDetails, RawgResult, RawgUser,
};
use crate::error::Result;
use reqwest::multipart::Form;
use reqwest::{Client, Method};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, trace, warn};
use url::Url;

/// Prefix of the `next` cursors RAWG hands out.
pub const RAWG_API_BASE: &str = "https://api.rawg.io/api/";
const DEFAULT_BASE_URL: &str = "https://rawg.io/api/";
const ALREADY_IN_LIBRARY: &str = "This game is already in this profile";
pub const DEFAULT_MAX_PAGES: usize = 500;

/// How a library write (add, status update, rating) turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Success,
    AlreadyExists,
    Error(String),
}

/// RAWG reports the echoed game id on success and a list of messages on
/// failure, both under `game`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GameField {
    Id(u64),
    Messages(Vec<String>),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct LibraryWriteResponse {
    game: Option<GameField>,
}

impl WriteOutcome {
    fn from_response(content: &str, game_id: u64) -> Result<Self> {
        let response: LibraryWriteResponse = serde_json::from_str(content)?;
        let outcome = match response.game {
            Some(GameField::Id(id)) if id == game_id => WriteOutcome::Success,
            Some(GameField::Messages(messages)) => {
                let message = messages.join(", ");
                if message == ALREADY_IN_LIBRARY {
                    WriteOutcome::AlreadyExists
                } else {
                    WriteOutcome::Error(message)
                }
            }
            _ => WriteOutcome::Error(format!("Unexpected response: {content}")),
        };
        Ok(outcome)
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    key: Option<String>,
}

#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(&'static str, String)>),
}

#[derive(Debug, Clone)]
struct RawgRequest {
    method: Method,
    resource: String,
    token: Option<String>,
    body: RequestBody,
}

impl RawgRequest {
    fn get(resource: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            resource: resource.into(),
            token: None,
            body: RequestBody::Empty,
        }
    }

    fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    fn with_form(mut self, fields: Vec<(&'static str, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }
}

pub struct RawgApiClient {
    client: Client,
    base_url: Url,
    key: String,
    max_pages: usize,
}

impl RawgApiClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Self::with_client(client, api_key)
    }

    pub fn with_client(client: Client, api_key: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            key: urlencoding::encode(api_key).into_owned(),
            max_pages: DEFAULT_MAX_PAGES,
        })
    }

    /// Points the client at another API root, e.g. a mirror or a test server.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.base_url = Url::parse(&base)?;
        Ok(self)
    }

    /// Upper bound on pages fetched by one listing call.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn get_game(&self, slug_or_id: &str) -> Result<Option<RawgGameDetails>> {
        let resource = format!("games/{}?key={}", segment(slug_or_id), self.key);
        self.get(&RawgRequest::get(resource)).await
    }

    /// First page of catalog search results.
    pub async fn search_games(&self, query: &str) -> Result<Option<RawgResult<RawgGameBase>>> {
        let resource = format!(
            "games?key={}&search={}",
            self.key,
            urlencoding::encode(query)
        );
        self.get(&RawgRequest::get(resource)).await
    }

    pub async fn get_collections(&self, username: &str) -> Result<Vec<RawgCollection>> {
        let resource = format!("users/{}/collections?key={}", segment(username), self.key);
        self.get_all_pages(RawgRequest::get(resource)).await
    }

    pub async fn get_collection_games(
        &self,
        collection_slug_or_id: &str,
    ) -> Result<Vec<RawgGameDetails>> {
        let resource = format!(
            "collections/{}/games?key={}",
            segment(collection_slug_or_id),
            self.key
        );
        self.get_all_pages(RawgRequest::get(resource)).await
    }

    pub async fn get_user_library(&self, username: &str) -> Result<Vec<RawgGameDetails>> {
        let resource = format!("users/{}/games?key={}", segment(username), self.key);
        self.get_all_pages(RawgRequest::get(resource)).await
    }

    /// Exchanges credentials for an account token. `None` when RAWG does not
    /// return one.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<String>> {
        let request = RawgRequest::get("auth/login")
            .with_method(Method::POST)
            .with_form(vec![
                ("email", email.to_string()),
                ("password", password.to_string()),
            ]);
        let response: Option<LoginResponse> = self.get(&request).await?;
        Ok(response.and_then(|r| r.key))
    }

    pub async fn get_current_user(&self, token: &str) -> Result<Option<RawgUser>> {
        let request = RawgRequest::get("users/current").with_token(token);
        self.get(&request).await
    }

    pub async fn get_current_user_collections(&self, token: &str) -> Result<Vec<RawgCollection>> {
        let request = RawgRequest::get("users/current/collections").with_token(token);
        self.get_all_pages(request).await
    }

    pub async fn get_current_user_collection_games(
        &self,
        collection_slug_or_id: &str,
        token: &str,
    ) -> Result<Vec<RawgGameDetails>> {
        let resource = format!("collections/{}/games", segment(collection_slug_or_id));
        let request = RawgRequest::get(resource).with_token(token);
        self.get_all_pages(request).await
    }

    pub async fn get_current_user_library(&self, token: &str) -> Result<Vec<RawgGameDetails>> {
        let request = RawgRequest::get("users/current/games").with_token(token);
        self.get_all_pages(request).await
    }

    pub async fn add_game_to_library_outcome(
        &self,
        token: &str,
        game_id: u64,
        status: CompletionStatus,
    ) -> Result<WriteOutcome> {
        let request = RawgRequest::get("users/current/games")
            .with_method(Method::POST)
            .with_token(token)
            .with_json(json!({ "game": game_id, "status": status }));
        let content = self.execute(&request).await?;
        WriteOutcome::from_response(&content, game_id)
    }

    /// `true` only when RAWG confirms the game was added. A game that is
    /// already in the library yields `false` without an error log.
    pub async fn add_game_to_library(
        &self,
        token: &str,
        game_id: u64,
        status: CompletionStatus,
    ) -> bool {
        let outcome = self
            .add_game_to_library_outcome(token, game_id, status)
            .await;
        settle("adding game to library", game_id, outcome)
    }

    pub async fn update_completion_status_outcome(
        &self,
        token: &str,
        game_id: u64,
        status: CompletionStatus,
    ) -> Result<WriteOutcome> {
        let request = RawgRequest::get(format!("users/current/games/{game_id}"))
            .with_method(Method::PATCH)
            .with_token(token)
            .with_json(json!({ "status": status }));
        let content = self.execute(&request).await?;
        WriteOutcome::from_response(&content, game_id)
    }

    pub async fn update_completion_status(
        &self,
        token: &str,
        game_id: u64,
        status: CompletionStatus,
    ) -> bool {
        let outcome = self
            .update_completion_status_outcome(token, game_id, status)
            .await;
        settle("updating completion status", game_id, outcome)
    }

    pub async fn rate_game_outcome(
        &self,
        token: &str,
        game_id: u64,
        rating: u8,
        add_to_library: bool,
    ) -> Result<WriteOutcome> {
        let request = RawgRequest::get("reviews")
            .with_method(Method::POST)
            .with_token(token)
            .with_json(json!({
                "game": game_id,
                "rating": rating,
                "add_to_library": add_to_library,
            }));
        let content = self.execute(&request).await?;
        WriteOutcome::from_response(&content, game_id)
    }

    pub async fn rate_game(
        &self,
        token: &str,
        game_id: u64,
        rating: u8,
        add_to_library: bool,
    ) -> bool {
        let outcome = self
            .rate_game_outcome(token, game_id, rating, add_to_library)
            .await;
        settle("rating game", game_id, outcome)
    }

    async fn execute(&self, request: &RawgRequest) -> Result<String> {
        let url = self.base_url.join(&request.resource)?;
        let mut builder = self.client.request(request.method.clone(), url);

        if let Some(token) = &request.token {
            builder = builder.header("token", format!("Token {token}"));
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Form(fields) => {
                let form = fields
                    .iter()
                    .fold(Form::new(), |form, (name, value)| form.text(*name, value.clone()));
                builder.multipart(form)
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let response_url = response.url().to_string();
        let content = response.text().await?;

        if !status.is_success() {
            debug!(url = %response_url, status = %status, "RAWG returned non-success status");
        }
        trace!(url = %response_url, "{content}");

        Ok(content)
    }

    async fn get<T: DeserializeOwned>(&self, request: &RawgRequest) -> Result<Option<T>> {
        let content = self.execute(request).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn get_all_pages<T: DeserializeOwned>(&self, mut request: RawgRequest) -> Result<Vec<T>> {
        let mut output = Vec::new();

        for _ in 0..self.max_pages {
            let content = self.execute(&request).await?;
            // An unreadable envelope ends the listing instead of failing it.
            let envelope = match serde_json::from_str::<Option<RawgResult<T>>>(&content) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(resource = %request.resource, error = %e, "Could not read page envelope");
                    None
                }
            };

            let Some(envelope) = envelope else {
                return Ok(output);
            };
            output.extend(envelope.results);

            match envelope.next {
                Some(next) => request.resource = self.cursor_resource(&next),
                None => return Ok(output),
            }
        }

        warn!(
            max_pages = self.max_pages,
            resource = %request.resource,
            "Page limit reached, stopping"
        );
        Ok(output)
    }

    fn cursor_resource(&self, next: &str) -> String {
        next.strip_prefix(RAWG_API_BASE)
            .or_else(|| next.strip_prefix(self.base_url.as_str()))
            .unwrap_or(next)
            .to_string()
    }
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn settle(action: &str, game_id: u64, outcome: Result<WriteOutcome>) -> bool {
    match outcome {
        Ok(WriteOutcome::Success) => true,
        Ok(WriteOutcome::AlreadyExists) => {
            warn!(game_id, "{action}: {ALREADY_IN_LIBRARY}");
            false
        }
        Ok(WriteOutcome::Error(message)) => {
            error!(game_id, "Error {action}: {message}");
            false
        }
        Err(e) => {
            error!(game_id, error = %e, "Error {action}");
            false
        }
    }
}
