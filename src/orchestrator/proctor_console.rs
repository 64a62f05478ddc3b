//! 监考控制台 - 编排层
//!
//! 逐行读取监考员命令，与倒计时节拍交替驱动 `ExamSession`。
//!
//! 命令：`draw` `start` `note <文本>` `grade <成绩>` `save` `skip`
//! `finish` `status` `help` `quit`

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::error::{AppResult, BusinessError};
use crate::models::Grade;
use crate::utils::logging::{format_countdown, truncate_text};
use crate::workflow::{ExamPhase, ExamSession};

/// 控制台结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOutcome {
    /// 考试已归档
    Finished,
    /// 监考员主动退出或输入结束
    Quit,
}

/// 控制台命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Draw,
    Start,
    Note(String),
    Grade(Grade),
    Save,
    Skip,
    Finish,
    Status,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// 解析一行输入；空行返回 None
    pub fn parse(line: &str) -> Option<Result<Self, BusinessError>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head.to_lowercase().as_str() {
            "draw" | "d" => Ok(ConsoleCommand::Draw),
            "start" | "s" => Ok(ConsoleCommand::Start),
            "note" | "n" => Ok(ConsoleCommand::Note(rest.to_string())),
            "grade" | "g" => Grade::from_label(rest)
                .map(ConsoleCommand::Grade)
                .ok_or_else(|| BusinessError::InvalidField {
                    field: "grade",
                    value: rest.to_string(),
                }),
            "save" => Ok(ConsoleCommand::Save),
            "skip" => Ok(ConsoleCommand::Skip),
            "finish" => Ok(ConsoleCommand::Finish),
            "status" | "?" => Ok(ConsoleCommand::Status),
            "help" | "h" => Ok(ConsoleCommand::Help),
            "quit" | "q" | "exit" => Ok(ConsoleCommand::Quit),
            other => Err(BusinessError::InvalidField {
                field: "command",
                value: other.to_string(),
            }),
        };
        Some(command)
    }
}

/// 监考控制台
pub struct ProctorConsole {
    session: ExamSession,
    finish_delay: Duration,
}

impl ProctorConsole {
    pub fn new(session: ExamSession, finish_delay: Duration) -> Self {
        Self {
            session,
            finish_delay,
        }
    }

    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    /// 运行控制台直到考试归档、退出或输入结束
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> AppResult<ConsoleOutcome> {
        let mut lines = input.lines();
        self.print_status();
        print_help();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        return Ok(ConsoleOutcome::Quit);
                    };
                    let Some(command) = ConsoleCommand::parse(&line) else {
                        continue;
                    };
                    match command {
                        Ok(ConsoleCommand::Quit) => return Ok(ConsoleOutcome::Quit),
                        Ok(command) => {
                            if self.execute(command).await {
                                info!("⏳ {} 毫秒后返回考试列表", self.finish_delay.as_millis());
                                tokio::time::sleep(self.finish_delay).await;
                                return Ok(ConsoleOutcome::Finished);
                            }
                        }
                        Err(e) => warn!("⚠️ {}", e),
                    }
                }
                _ = self.session.next_tick() => {
                    self.on_tick();
                }
            }
        }
    }

    /// 执行一条命令；返回考试是否已归档
    ///
    /// 命令失败只记录日志，控制台继续运行
    pub async fn execute(&mut self, command: ConsoleCommand) -> bool {
        let result = match command {
            ConsoleCommand::Draw => self.session.draw_question().map(|_| ()),
            ConsoleCommand::Start => self.session.start_examination(),
            ConsoleCommand::Note(text) => self.session.set_notes(text),
            ConsoleCommand::Grade(grade) => self.session.select_grade(grade),
            ConsoleCommand::Save => self.session.save_and_next().await.map(|_| ()),
            ConsoleCommand::Skip => self.session.skip_student(),
            ConsoleCommand::Finish => self.session.finish_exam().await,
            ConsoleCommand::Status => {
                self.print_status();
                Ok(())
            }
            ConsoleCommand::Help => {
                print_help();
                Ok(())
            }
            ConsoleCommand::Quit => Ok(()),
        };

        if let Err(e) = result {
            warn!("⚠️ {}", e.user_message());
            return false;
        }

        if matches!(
            self.session.phase(),
            ExamPhase::WaitingForStudent | ExamPhase::AllStudentsGraded
        ) {
            self.print_status();
        }
        self.session.phase() == ExamPhase::Finished
    }

    fn on_tick(&mut self) {
        let phase = self.session.tick();
        let remaining = self.session.state().remaining_seconds;

        if phase == ExamPhase::Grading {
            info!("📝 请选择成绩并保存 (grade <成绩>, save)");
        } else if remaining % 60 == 0 || remaining <= 10 {
            info!("⏱️ 剩余 {}", format_countdown(remaining));
        }
    }

    fn print_status(&self) {
        let session = &self.session;
        let state = session.state();
        let exam = session.exam();

        info!("{}", "─".repeat(60));
        info!(
            "📚 {} | {} | {} {}",
            exam.course_name, exam.examtermin, exam.date, exam.start_time
        );
        info!("📍 阶段: {}", state.phase);

        match state.phase {
            ExamPhase::AllStudentsGraded => info!("🎉 所有考生都已评分，输入 finish 归档考试"),
            ExamPhase::Finished => info!("📦 考试已归档"),
            _ => match session.current_student() {
                Some(student) => {
                    info!(
                        "👤 考生 {}/{}: {} ({})",
                        state.current_student_index + 1,
                        exam.students.len(),
                        student.name,
                        student.student_no
                    );
                    if let Some(q) = state.drawn_question {
                        info!("❓ 题号: {}", q);
                    }
                    info!("⏱️ 剩余: {}", format_countdown(state.remaining_seconds));
                    if !state.notes.is_empty() {
                        info!("🗒️ 笔记: {}", truncate_text(&state.notes, 60));
                    }
                    if let Some(grade) = state.grade {
                        info!("🏷️ 成绩: {}", grade);
                    }
                    if state.can_skip() {
                        info!("⏭️ 可输入 skip 跳过该考生");
                    }
                }
                None => info!("👤 该考试还没有考生"),
            },
        }

        if let Some(error) = session.last_error() {
            warn!("❌ {}", error);
        }
        info!("{}", "─".repeat(60));
    }
}

fn print_help() {
    let grades: Vec<&str> = Grade::ALL.iter().map(|g| g.label()).collect();
    info!("命令: draw | start | note <文本> | grade <成绩> | save | skip | finish | status | quit");
    info!("可选成绩: {}", grades.join(" "));
}
