pub mod error;
pub mod types;

pub use error::{DbError, Result, TransactionConflict};
pub use types::IsolationLevel;
