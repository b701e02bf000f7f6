//! Ledger module
//!
//! Persistence-backed services owning account rows and the operation
//! history. Mutations invoked by operation processors run on the
//! processor's transaction; the ledger itself never opens one for them.

mod accounts;
mod operations;

pub use accounts::{AccountLedger, AccountService};
pub use operations::OperationStore;
