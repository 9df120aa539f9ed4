pub mod dump;
pub mod search_export;

pub use dump::{CatalogDump, DumpSettings, DumpSummary};
pub use search_export::{ExportRequest, SearchExport};
