use serde::{Deserialize, Serialize};

/// List envelope returned by every paginated RAWG endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawgResult<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawgGameBase {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    pub released: Option<String>,
    pub background_image: Option<String>,
    pub rating: Option<f32>,
    pub rating_top: Option<u32>,
    pub metacritic: Option<u32>,
    pub playtime: Option<u32>,
    #[serde(default)]
    pub platforms: Option<Vec<RawgPlatform>>,
    #[serde(default)]
    pub genres: Option<Vec<RawgNamedItem>>,
    #[serde(default)]
    pub tags: Option<Vec<RawgNamedItem>>,
    #[serde(default)]
    pub stores: Option<Vec<RawgStore>>,
    /// Present on library listings: the user's completion status.
    pub user_game: Option<RawgUserGame>,
    /// Present on library listings: the user's own rating.
    pub user_rating: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawgGameDetails {
    #[serde(flatten)]
    pub base: RawgGameBase,
    pub description_raw: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub reddit_url: Option<String>,
    pub metacritic_url: Option<String>,
    #[serde(default)]
    pub developers: Option<Vec<RawgNamedItem>>,
    #[serde(default)]
    pub publishers: Option<Vec<RawgNamedItem>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawgPlatform {
    pub platform: RawgNamedItem,
    pub released_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawgStore {
    pub store: RawgNamedItem,
}

/// The `{id, name, slug}` triple RAWG uses for platforms, genres, tags,
/// stores, developers and publishers.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawgNamedItem {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawgUserGame {
    pub status: Option<String>,
    pub added: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawgCollection {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub games_count: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawgUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub slug: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub games_count: u64,
    #[serde(default)]
    pub collections_count: u64,
}

/// Library status values accepted by RAWG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Owned,
    Playing,
    Beaten,
    Dropped,
    Yet,
    Toplay,
}

impl std::str::FromStr for CompletionStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owned" => Ok(CompletionStatus::Owned),
            "playing" => Ok(CompletionStatus::Playing),
            "beaten" => Ok(CompletionStatus::Beaten),
            "dropped" => Ok(CompletionStatus::Dropped),
            "yet" => Ok(CompletionStatus::Yet),
            "toplay" => Ok(CompletionStatus::Toplay),
            other => Err(crate::error::Error::Other(format!(
                "Unknown completion status: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_flatten_base_fields() {
        let json = r#"{
            "id": 3498,
            "slug": "grand-theft-auto-v",
            "name": "Grand Theft Auto V",
            "released": "2013-09-17",
            "website": "http://www.rockstargames.com/V/",
            "reddit_url": "https://www.reddit.com/r/GrandTheftAutoV/",
            "platforms": [
                {"platform": {"id": 4, "name": "PC", "slug": "pc"}, "released_at": "2013-09-17"}
            ]
        }"#;

        let game: RawgGameDetails = serde_json::from_str(json).unwrap();
        assert_eq!(game.base.id, 3498);
        assert_eq!(game.base.released.as_deref(), Some("2013-09-17"));
        assert_eq!(game.base.platforms.as_ref().unwrap()[0].platform.slug, "pc");
        assert_eq!(game.website.as_deref(), Some("http://www.rockstargames.com/V/"));
    }

    #[test]
    fn envelope_tolerates_missing_fields() {
        let page: RawgResult<RawgCollection> = serde_json::from_str(r#"{"count": 0}"#).unwrap();
        assert!(page.next.is_none());
        assert!(page.results.is_empty());
    }

    #[test]
    fn completion_status_round_trips_through_str() {
        let status: CompletionStatus = "Beaten".parse().unwrap();
        assert_eq!(status, CompletionStatus::Beaten);
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""beaten""#);
        assert!("finished".parse::<CompletionStatus>().is_err());
    }
}
