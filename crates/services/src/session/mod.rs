pub mod buffer;
pub mod finalize;

pub use buffer::{UtteranceBuffer, VerdictCache};
pub use finalize::{FinalizeError, FinalizeOutcome, SessionFinalizer};
