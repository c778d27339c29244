//! xrplog-mon library - ledger monitor wiring
//!
//! The binary glues these together; the modules are exposed so integration
//! tests can drive the coordinator and transport directly.

pub mod coordinator;
pub mod transport;
