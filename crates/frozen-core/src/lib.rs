// Inventory rules for frozen food - the part that actually has opinions
pub mod category;
pub mod clock;
pub mod config;
pub mod error;
pub mod expiration;
pub mod export;
pub mod import;
pub mod models;
pub mod query;

pub use category::CategoryDurationTable;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::Error;
pub use expiration::{ExpirationCalculator, ExpirationStatus, ExpirationThresholds, NEVER_EXPIRES};
pub use export::{ExportFormat, Exporter};
pub use import::Importer;
pub use models::{Expiry, InventoryItem, NewItem, Tags};
pub use query::{InventorySummary, ItemQuery, SortOrder};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
