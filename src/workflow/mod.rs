pub mod countdown;
pub mod exam_phase;
pub mod exam_session;

pub use countdown::Countdown;
pub use exam_phase::{transition, ExamPhase, SessionEvent, SessionState, TransitionError};
pub use exam_session::ExamSession;
