#[allow(clippy::module_inception)]
mod result;

pub use result::{CommandOutput, NO_RECORD};
