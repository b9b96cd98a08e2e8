mod metadata;
mod rawg;

pub use metadata::{LibraryGame, Link, MetadataProperty, ReleaseDate};
pub use rawg::{
    CompletionStatus, RawgCollection, RawgGameBase, RawgGameDetails, RawgNamedItem, RawgPlatform,
    RawgResult, RawgStore, RawgUser, RawgUserGame,
};
