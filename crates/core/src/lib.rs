#![forbid(unsafe_code)]

pub mod fingerprint;
pub mod grading;
pub mod model;
pub mod presentation;
pub mod results;
pub mod session;
pub mod time;

pub use time::Clock;

pub use fingerprint::bank_fingerprint;
pub use grading::{correct_ids, grade_question};
pub use presentation::{PresentationMode, presentation_order};
pub use results::{AnswerRecord, QuizResult, summarize};
pub use session::{AdvanceOutcome, QuestionStatus, QuizPhase, SessionProgress, SessionState};
