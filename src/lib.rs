pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod export;
pub mod utils;

pub use adapters::{HttpTransport, LocalStorage, RetryPolicy};
pub use app::{CatalogDump, DumpSettings, ExportRequest, SearchExport};
pub use config::ApiConfig;
pub use crate::core::client::{ClientSettings, DcClient};
pub use crate::core::engine::ExportEngine;
pub use crate::core::params::SearchParams;
pub use crate::core::walk::{WalkOptions, WalkStatus, Walked};
pub use domain::model::{OutputFormat, ResponseFormat};
pub use utils::error::{NuldcError, Result};
