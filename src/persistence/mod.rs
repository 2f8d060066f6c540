//! Persistence layer: the line-oriented training and query stores.

pub mod format;
pub mod row_store;

pub use row_store::RowStore;
