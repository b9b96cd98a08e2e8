//! Maps RAWG vocabulary onto library metadata: platform spec ids, partial
//! release dates, user scores and links.

use crate::domain::{
    LibraryGame, Link, MetadataProperty, RawgGameBase, RawgGameDetails, RawgPlatform, ReleaseDate,
};
use crate::error::Result;
use crate::infrastructure::RawgApiClient;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

static YEAR_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r" \([0-9]{4}\)$").unwrap());

/// Removes a trailing ` (YYYY)` from a game name.
pub fn strip_year(game_name: &str) -> String {
    YEAR_SUFFIX.replace(game_name, "").into_owned()
}

/// Lowercase, alphanumerics only, accents folded. Used to compare titles
/// coming from different sources.
pub fn normalize_name_for_comparison(game_name: &str) -> String {
    strip_year(game_name)
        .nfkd()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn get_platform(platform: &RawgPlatform) -> MetadataProperty {
    let slug = platform.platform.slug.as_str();
    let spec = |id: &str| MetadataProperty::Spec(id.to_string());

    match slug {
        // DOS games are listed as "pc" too; there is rarely enough data to tell them apart.
        "pc" => spec("pc_windows"),
        "linux" => spec("pc_linux"),

        "xbox-old" => spec("xbox"),
        "xbox360" => spec("xbox360"),
        "xbox-one" => spec("xbox_one"),
        "xbox-series-x" => spec("xbox_series"),

        "playstation1" | "playstation2" | "playstation3" | "playstation4" | "playstation5"
        | "psp" => spec(&format!("sony_{slug}")),
        "ps-vita" => spec("sony_vita"),

        "nes" => spec("nintendo_nes"),
        "snes" => spec("nintendo_super_nes"),
        "nintendo-ds" => spec("nintendo_ds"),
        "nintendo-3ds" => spec("nintendo_3ds"),
        "nintendo-switch" => spec("nintendo_switch"),
        "nintendo-64" => spec("nintendo_64"),
        "gamecube" => spec("nintendo_gamecube"),
        "wii" => spec("nintendo_wii"),
        "wii-u" => spec("nintendo_wiiu"),
        "game-boy" | "game-boy-color" | "game-boy-advance" => {
            spec(&format!("nintendo_{}", slug.replace('-', "")))
        }

        "macintosh" => spec("macintosh"),
        "apple-ii" => spec("apple_2"),

        "jaguar" => spec("atari_jaguar"),
        "commodore-amiga" | "atari-2600" | "atari-5200" | "atari-7800" | "atari-8-bit"
        | "atari-st" | "atari-lynx" | "sega-saturn" | "sega-cd" | "sega-32x" => {
            spec(&slug.replace('-', "_"))
        }

        "genesis" => spec("sega_genesis"),
        "sega-master-system" => spec("sega_mastersystem"),
        "dreamcast" => spec("sega_dreamcast"),
        "game-gear" => spec("sega_gamegear"),
        "3do" => spec("3do"),

        _ => MetadataProperty::Name(platform.platform.name.clone()),
    }
}

/// Parses RAWG's `released` field: `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
pub fn parse_release_date(game: &RawgGameBase) -> Option<ReleaseDate> {
    let released = game.released.as_deref()?.trim();
    if released.is_empty() {
        return None;
    }

    let numbers: std::result::Result<Vec<u32>, _> =
        released.split('-').map(str::parse::<u32>).collect();
    let numbers = match numbers {
        Ok(numbers) => numbers,
        Err(e) => {
            warn!(error = %e, "Could not parse release date <{released}> for {}", game.name);
            return None;
        }
    };

    match numbers.as_slice() {
        [year] => Some(ReleaseDate::year(*year as i32)),
        [year, month] => Some(ReleaseDate::year_month(*year as i32, *month)),
        [year, month, day] => Some(ReleaseDate::full(*year as i32, *month, *day)),
        _ => {
            warn!("Could not parse release date <{released}> for {}", game.name);
            None
        }
    }
}

/// RAWG rates 0–5; the library uses 0–100. Unrated (0) maps to `None`.
pub fn parse_user_score(user_score: Option<f32>) -> Option<i32> {
    match user_score {
        Some(score) if score != 0.0 => Some((score * 20.0).round() as i32),
        _ => None,
    }
}

pub fn get_rawg_link(game: &RawgGameBase) -> Link {
    Link::new("RAWG", format!("https://rawg.io/games/{}", game.id))
}

pub fn get_links(game: &RawgGameDetails) -> Vec<Link> {
    let mut links = vec![get_rawg_link(&game.base)];

    if let Some(website) = game.website.as_deref().filter(|w| !w.trim().is_empty()) {
        links.push(Link::new("Website", website));
    }
    if let Some(reddit) = game.reddit_url.as_deref().filter(|r| !r.trim().is_empty()) {
        links.push(Link::new("Reddit", reddit));
    }

    links
}

/// Searches RAWG for `game` and returns the first result whose normalized name
/// equals the game's. On a match the RAWG link is appended to the game.
pub async fn get_exact_title_match(
    game: &mut LibraryGame,
    client: &RawgApiClient,
) -> Result<Option<RawgGameBase>> {
    if game.name.trim().is_empty() {
        return Ok(None);
    }

    let search = match game.release_year {
        Some(year) => format!("{} {}", game.name, year),
        None => game.name.clone(),
    };
    let Some(result) = client.search_games(&search).await? else {
        return Ok(None);
    };

    let wanted = normalize_name_for_comparison(&game.name);
    let found = result
        .results
        .into_iter()
        .find(|candidate| normalize_name_for_comparison(&candidate.name) == wanted);

    if let Some(candidate) = &found {
        debug!(game = %game.name, rawg_id = candidate.id, "Exact RAWG title match");
        game.links.push(get_rawg_link(candidate));
    }

    Ok(found)
}
