pub mod alert;
pub mod exam_service;
pub mod history;
pub mod question_source;

pub use alert::{AlertSink, SilentAlert, TerminalBell};
pub use exam_service::{DeleteReport, ExamService};
pub use history::{HistoryFilter, HistoryView, SortOrder};
pub use question_source::{QuestionSource, RandomQuestionSource, SequenceQuestionSource};
