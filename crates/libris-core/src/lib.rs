pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod storage;

pub use catalog::{Catalog, CatalogStats, CategoryGroups};
pub use config::AppConfig;
pub use error::{ExitCode, LibrisError, Result};
pub use models::*;

pub use search::FuzzySearcher;
pub use storage::json_store::JsonStore;
pub use storage::migrations::CURRENT_VERSION;
