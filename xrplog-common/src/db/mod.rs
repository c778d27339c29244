//! Log store: SQLite-backed persistence for classified records

pub mod init;
pub mod store;

pub use init::*;
pub use store::*;
