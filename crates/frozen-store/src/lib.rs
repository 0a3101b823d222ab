// SQLite-backed item store
// The rules engine never touches disk; this crate does the persisting

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::ItemStore;
