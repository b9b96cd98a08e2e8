use serde::{Deserialize, Serialize};

/// Options for the Viveport library importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ViveportLibrarySettings {
    pub use_covers: bool,
    pub import_headsets_as_platforms: bool,
}

impl Default for ViveportLibrarySettings {
    fn default() -> Self {
        Self {
            use_covers: false,
            import_headsets_as_platforms: true,
        }
    }
}
