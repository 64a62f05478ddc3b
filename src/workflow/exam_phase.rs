//! 考试流程状态机
//!
//! 纯函数实现，不做任何 IO：
//!
//! ```text
//! WaitingForStudent --draw--> QuestionDrawn --start--> Examining
//!        ^    |skip                                   |timeout
//!        |    v                                       v
//!        +---------- save(next) ------------------ Grading
//!                         |
//!                   save(none left)
//!                         v
//!               AllStudentsGraded --finish--> Finished
//! ```

use thiserror::Error;

use crate::models::{Exam, Grade, StudentGrading};

/// 当前流程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    WaitingForStudent,
    QuestionDrawn,
    Examining,
    Grading,
    AllStudentsGraded,
    Finished,
}

impl std::fmt::Display for ExamPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExamPhase::WaitingForStudent => "等待考生",
            ExamPhase::QuestionDrawn => "已抽题",
            ExamPhase::Examining => "考试中",
            ExamPhase::Grading => "评分中",
            ExamPhase::AllStudentsGraded => "全部评分完成",
            ExamPhase::Finished => "已归档",
        };
        f.write_str(name)
    }
}

/// 触发状态变化的事件
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// 抽到题号
    DrawQuestion { question_no: u32 },
    /// 开始计时
    StartExamination,
    /// 倒计时一秒
    Tick,
    /// 修改笔记
    EditNotes(String),
    /// 选择成绩
    SelectGrade(Grade),
    /// 停止计时并记录用时（保存前）
    FreezeTimer,
    /// 评分已保存；`next_student` 为下一个未评分考生的位置
    GradeSaved { next_student: Option<usize> },
    /// 跳过当前考生
    SkipStudent,
    /// 考试已归档
    ExamFinished,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::DrawQuestion { .. } => "draw",
            SessionEvent::StartExamination => "start",
            SessionEvent::Tick => "tick",
            SessionEvent::EditNotes(_) => "notes",
            SessionEvent::SelectGrade(_) => "grade",
            SessionEvent::FreezeTimer => "freeze",
            SessionEvent::GradeSaved { .. } => "save",
            SessionEvent::SkipStudent => "skip",
            SessionEvent::ExamFinished => "finish",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("阶段 {phase} 不允许操作 '{event}'")]
    InvalidTransition { phase: ExamPhase, event: &'static str },
    #[error("题号 {question_no} 超出范围 [1, {max}]")]
    QuestionOutOfRange { question_no: u32, max: u32 },
    #[error("后面没有可以切换的考生")]
    NoNextStudent,
    #[error("考生位置 {index} 超出范围 (共 {count} 名)")]
    StudentOutOfRange { index: usize, count: usize },
    #[error("尚未抽题")]
    QuestionNotDrawn,
    #[error("尚未选择成绩")]
    GradeNotSelected,
}

/// 一场考试的流程状态
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: ExamPhase,
    pub current_student_index: usize,
    pub drawn_question: Option<u32>,
    /// 剩余秒数
    pub remaining_seconds: u32,
    pub timer_running: bool,
    /// 已用秒数（计时停止时记录）
    pub time_used: u32,
    pub notes: String,
    pub grade: Option<Grade>,
    student_count: usize,
    number_of_questions: u32,
    total_seconds: u32,
}

impl SessionState {
    /// 根据考试数据计算初始状态
    ///
    /// 从第一个未评分的考生开始；所有考生都已评分时直接进入
    /// `AllStudentsGraded`；没有考生时停在第 0 位等待。
    pub fn for_exam(exam: &Exam) -> Self {
        let first_ungraded = exam.first_ungraded_index();
        let phase = if first_ungraded.is_none() && !exam.students.is_empty() {
            ExamPhase::AllStudentsGraded
        } else {
            ExamPhase::WaitingForStudent
        };

        Self {
            phase,
            current_student_index: first_ungraded.unwrap_or(0),
            drawn_question: None,
            remaining_seconds: exam.duration_seconds(),
            timer_running: false,
            time_used: 0,
            notes: String::new(),
            grade: None,
            student_count: exam.students.len(),
            number_of_questions: exam.number_of_questions,
            total_seconds: exam.duration_seconds(),
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn student_count(&self) -> usize {
        self.student_count
    }

    /// 是否可以跳过当前考生（后面还有考生）
    pub fn can_skip(&self) -> bool {
        self.phase == ExamPhase::WaitingForStudent
            && self.current_student_index + 1 < self.student_count
    }

    /// 生成要保存的评分数据；需要已抽题并已选择成绩
    pub fn grading_record(&self) -> Result<StudentGrading, TransitionError> {
        let question_no = self.drawn_question.ok_or(TransitionError::QuestionNotDrawn)?;
        let grade = self.grade.ok_or(TransitionError::GradeNotSelected)?;

        Ok(StudentGrading {
            question_no,
            actual_exam_duration: rounded_minutes(self.time_used),
            notes: self.notes.clone(),
            grade: grade.label().to_string(),
        })
    }

    fn reset_for_student(&mut self, index: usize) {
        self.current_student_index = index;
        self.drawn_question = None;
        self.notes.clear();
        self.grade = None;
        self.remaining_seconds = self.total_seconds;
        self.timer_running = false;
        self.time_used = 0;
        self.phase = ExamPhase::WaitingForStudent;
    }

    fn expire(&mut self) {
        self.remaining_seconds = 0;
        self.timer_running = false;
        self.time_used = self.total_seconds;
        self.phase = ExamPhase::Grading;
    }
}

/// 秒数换算成分钟（四舍五入，.5 进位）
fn rounded_minutes(seconds: u32) -> u32 {
    seconds.saturating_add(30) / 60
}

/// 状态转换
///
/// 不合法的事件返回错误，原状态保持不变；计时未运行时的 Tick 直接忽略。
pub fn transition(
    state: &SessionState,
    event: SessionEvent,
) -> Result<SessionState, TransitionError> {
    use ExamPhase::*;

    let invalid = |event: &SessionEvent| TransitionError::InvalidTransition {
        phase: state.phase,
        event: event.name(),
    };

    let mut next = state.clone();

    match (state.phase, event) {
        (WaitingForStudent, SessionEvent::DrawQuestion { question_no }) => {
            if question_no < 1 || question_no > state.number_of_questions {
                return Err(TransitionError::QuestionOutOfRange {
                    question_no,
                    max: state.number_of_questions,
                });
            }
            if state.current_student_index >= state.student_count {
                return Err(TransitionError::StudentOutOfRange {
                    index: state.current_student_index,
                    count: state.student_count,
                });
            }
            next.drawn_question = Some(question_no);
            next.phase = QuestionDrawn;
        }

        (QuestionDrawn, SessionEvent::StartExamination) => {
            next.remaining_seconds = state.total_seconds;
            next.time_used = 0;
            if state.total_seconds == 0 {
                next.expire();
            } else {
                next.timer_running = true;
                next.phase = Examining;
            }
        }

        (Examining, SessionEvent::Tick) if state.timer_running => {
            next.remaining_seconds = state.remaining_seconds.saturating_sub(1);
            if next.remaining_seconds == 0 {
                next.expire();
            }
        }
        (_, SessionEvent::Tick) => {}

        (QuestionDrawn | Examining | Grading, SessionEvent::EditNotes(notes)) => {
            next.notes = notes;
        }

        (Examining | Grading, SessionEvent::SelectGrade(grade)) => {
            next.grade = Some(grade);
        }

        (Examining | Grading, SessionEvent::FreezeTimer) => {
            if state.timer_running {
                next.timer_running = false;
                next.time_used = state.total_seconds.saturating_sub(state.remaining_seconds);
            }
        }

        (Examining | Grading, SessionEvent::GradeSaved { next_student }) => {
            if state.timer_running {
                // 必须先 FreezeTimer 再保存
                return Err(invalid(&SessionEvent::GradeSaved { next_student }));
            }
            match next_student {
                Some(index) if index < state.student_count => next.reset_for_student(index),
                Some(index) => {
                    return Err(TransitionError::StudentOutOfRange {
                        index,
                        count: state.student_count,
                    })
                }
                None => next.phase = AllStudentsGraded,
            }
        }

        (WaitingForStudent, SessionEvent::SkipStudent) => {
            if !state.can_skip() {
                return Err(TransitionError::NoNextStudent);
            }
            next.reset_for_student(state.current_student_index + 1);
        }

        (AllStudentsGraded, SessionEvent::ExamFinished) => {
            next.phase = Finished;
        }

        (_, event) => return Err(invalid(&event)),
    }

    Ok(next)
}
