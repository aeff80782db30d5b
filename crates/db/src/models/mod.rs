mod call_summary;
mod session;
mod user;
mod utterance;
mod verdict;

pub use call_summary::{CallDuration, CallSummary, Experience};
pub use session::{SessionRecord, TranscriptEntry};
pub use user::User;
pub use utterance::{Speaker, Utterance};
pub use verdict::Verdict;
