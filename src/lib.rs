//! Mod list browser core: manifest loading, item classification, the
//! category tree, preview rows and mod pack summaries.

pub mod archive;
pub mod error;
pub mod item;
pub mod labels;
pub mod logging;
pub mod mod_model;
pub mod modding;
pub mod notify;
pub mod preview;
pub mod settings;
pub mod summary;
pub mod thumbnail;
pub mod tree;
pub mod utils;
pub mod view_model;

pub use error::{ArchiveError, ClassificationError, DecodeError, ManifestError, ServiceError};
pub use mod_model::{Manifest, ModEntry, ModPack};
pub use tree::{build_tree, CategoryTree, FilterMode, SortMode};
pub use view_model::ModListViewModel;
