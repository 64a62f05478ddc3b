//! 考试流程驱动 - 流程层
//!
//! 核心职责：把监考员的操作变成状态机事件，并在需要时调用后端
//!
//! 所有写操作都是"先保存，成功后再改本地状态"；保存失败时状态机不动，
//! 只记录页面错误信息。

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{AppError, AppResult, BusinessError};
use crate::models::{Exam, ExamStatus, Grade, Student};
use crate::services::{AlertSink, ExamService, QuestionSource};
use crate::utils::logging::format_countdown;
use crate::workflow::countdown::Countdown;
use crate::workflow::exam_phase::{transition, ExamPhase, SessionEvent, SessionState};

/// 一场正在进行的考试
pub struct ExamSession {
    service: ExamService,
    exam: Exam,
    state: SessionState,
    questions: Box<dyn QuestionSource>,
    alert: Arc<dyn AlertSink>,
    countdown: Option<Countdown>,
    error: Option<String>,
}

impl ExamSession {
    /// 加载考试并定位到第一个未评分的考生
    ///
    /// 考生按 order 排序后参与考试
    pub async fn load(
        service: ExamService,
        exam_id: &str,
        questions: Box<dyn QuestionSource>,
        alert: Arc<dyn AlertSink>,
    ) -> AppResult<Self> {
        let mut exam = service.get_exam_by_id(exam_id).await.map_err(|e| {
            error!("[考试 {}] ❌ 无法加载考试: {}", exam_id, e);
            e
        })?;
        exam.students.sort_by_key(|s| s.order);

        let state = SessionState::for_exam(&exam);
        info!(
            "[考试 {}] 📋 {} ({}) - {} 名考生，当前阶段: {}",
            exam.id,
            exam.course_name,
            exam.examtermin,
            exam.students.len(),
            state.phase
        );

        Ok(Self {
            service,
            exam,
            state,
            questions,
            alert,
            countdown: None,
            error: None,
        })
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> ExamPhase {
        self.state.phase
    }

    /// 页面上显示的错误
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_student(&self) -> Option<&Student> {
        self.exam.students.get(self.state.current_student_index)
    }

    pub fn countdown_running(&self) -> bool {
        self.countdown.is_some()
    }

    /// 抽题
    pub fn draw_question(&mut self) -> AppResult<u32> {
        if self.exam.number_of_questions == 0 {
            return Err(BusinessError::NoQuestions {
                exam_id: self.exam.id.clone(),
            }
            .into());
        }

        let question_no = self.questions.draw(self.exam.number_of_questions);
        self.apply(SessionEvent::DrawQuestion { question_no })?;
        info!("{} 🎲 抽到第 {} 题", self.label(), question_no);
        Ok(question_no)
    }

    /// 开始考试并启动倒计时
    pub fn start_examination(&mut self) -> AppResult<()> {
        self.apply(SessionEvent::StartExamination)?;

        match self.state.phase {
            ExamPhase::Examining => {
                self.countdown = Some(Countdown::start());
                info!(
                    "{} ⏱️ 开始计时 {}",
                    self.label(),
                    format_countdown(self.state.remaining_seconds)
                );
            }
            ExamPhase::Grading => self.notify_time_up(),
            _ => {}
        }
        Ok(())
    }

    /// 等待倒计时的下一拍；没有倒计时时永远不会完成
    pub async fn next_tick(&mut self) {
        match self.countdown.as_mut() {
            Some(countdown) => {
                if countdown.tick().await.is_none() {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// 倒计时走一秒；归零时自动进入评分并提醒
    pub fn tick(&mut self) -> ExamPhase {
        let before = self.state.phase;
        // Tick 不会失败：计时未运行时直接忽略
        if let Ok(next) = transition(&self.state, SessionEvent::Tick) {
            self.state = next;
        }

        if before == ExamPhase::Examining && self.state.phase == ExamPhase::Grading {
            self.countdown = None;
            self.notify_time_up();
        }
        self.state.phase
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> AppResult<()> {
        self.apply(SessionEvent::EditNotes(notes.into()))
    }

    pub fn select_grade(&mut self, grade: Grade) -> AppResult<()> {
        self.apply(SessionEvent::SelectGrade(grade))
    }

    /// 保存当前考生的评分并切换到下一个未评分的考生
    ///
    /// 需要已抽题并已选择成绩。计时仍在运行时先停止计时并记录用时。
    pub async fn save_and_next(&mut self) -> AppResult<ExamPhase> {
        self.state.grading_record()?;

        self.apply(SessionEvent::FreezeTimer)?;
        self.countdown = None;
        let grading = self.state.grading_record()?;

        let index = self.state.current_student_index;
        let student_id = match self.exam.students.get(index) {
            Some(student) => student.id.clone(),
            None => {
                return Err(BusinessError::StudentNotFound {
                    student_id: index.to_string(),
                }
                .into())
            }
        };

        if let Err(e) = self.service.update_student(&student_id, &grading).await {
            error!("{} ❌ 保存评分失败: {}", self.label(), e);
            self.error = Some(e.user_message());
            return Err(e);
        }

        info!(
            "{} ✓ 已保存: 第 {} 题, 成绩 {}, 用时 {} 分钟",
            self.label(),
            grading.question_no,
            grading.grade,
            grading.actual_exam_duration
        );

        self.exam.students[index].apply_grading(&grading);
        let next_student = self.exam.first_ungraded_index();
        self.apply(SessionEvent::GradeSaved { next_student })?;

        if self.state.phase == ExamPhase::AllStudentsGraded {
            info!("[考试 {}] 🎉 所有考生都已评分", self.exam.id);
        }
        Ok(self.state.phase)
    }

    /// 跳过当前考生（不保存任何内容）
    pub fn skip_student(&mut self) -> AppResult<()> {
        let skipped = self.label();
        self.apply(SessionEvent::SkipStudent)?;
        info!("{} ⏭️ 已跳过，下一位: {}", skipped, self.label());
        Ok(())
    }

    /// 归档考试
    pub async fn finish_exam(&mut self) -> AppResult<()> {
        let next = transition(&self.state, SessionEvent::ExamFinished)?;

        if let Err(e) = self.service.finish_exam(&self.exam.id).await {
            error!("[考试 {}] ❌ 归档考试失败: {}", self.exam.id, e);
            self.error = Some("归档考试时出错".to_string());
            return Err(e);
        }

        self.state = next;
        self.exam.status = Some(ExamStatus::Finished);
        self.error = None;
        info!("[考试 {}] 📦 考试已归档", self.exam.id);
        Ok(())
    }

    fn apply(&mut self, event: SessionEvent) -> AppResult<()> {
        match transition(&self.state, event) {
            Ok(next) => {
                self.state = next;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!("{} ⚠️ {}", self.label(), e);
                Err(AppError::Session(e))
            }
        }
    }

    fn notify_time_up(&self) {
        let name = self
            .current_student()
            .map(|s| s.name.as_str())
            .unwrap_or("考生");
        self.alert.time_up(name);
    }

    fn label(&self) -> String {
        match self.current_student() {
            Some(student) => format!(
                "[考试 {} 考生#{} {}]",
                self.exam.id,
                self.state.current_student_index + 1,
                student.name
            ),
            None => format!("[考试 {}]", self.exam.id),
        }
    }
}
