use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use tokio::io::BufReader;
use tracing::{error, info, warn};

use crate::clients::ExamApiClient;
use crate::config::Config;
use crate::error::BusinessError;
use crate::models::{load_all_rosters, Exam, NewExam};
use crate::orchestrator::{ConsoleOutcome, ExamStore, MoveDirection, ProctorConsole, StudentReorder};
use crate::services::history::{average_grade, result_rows};
use crate::services::{ExamService, HistoryFilter, HistoryView, RandomQuestionSource, SortOrder, TerminalBell};
use crate::utils::logging::log_startup;
use crate::workflow::ExamSession;

/// 命令行子命令
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 列出即将进行的考试
    List,
    /// 列出已完成的考试
    History {
        #[arg(long, default_value = "")]
        course: String,
        #[arg(long, default_value = "")]
        term: String,
        /// 按日期升序（默认降序）
        #[arg(long, default_value_t = false)]
        asc: bool,
        /// 显示条数（默认取配置）
        #[arg(long)]
        limit: Option<usize>,
    },
    /// 显示一场考试的成绩单
    Results { exam_id: String },
    /// 显示一场考试的考生（按顺序）
    Students { exam_id: String },
    /// 创建考试
    Create {
        #[arg(long)]
        term: String,
        #[arg(long)]
        course: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long, default_value = "09:00")]
        start_time: String,
        #[arg(long, default_value_t = 10)]
        questions: u32,
        /// 每名考生的考试时长（分钟）
        #[arg(long, default_value_t = 20)]
        duration: u32,
    },
    /// 修改考试
    Edit {
        exam_id: String,
        #[arg(long)]
        term: Option<String>,
        #[arg(long)]
        course: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        start_time: Option<String>,
        #[arg(long)]
        questions: Option<u32>,
        #[arg(long)]
        duration: Option<u32>,
    },
    /// 删除考试及其全部考生
    Delete { exam_id: String },
    /// 添加考生
    AddStudent {
        exam_id: String,
        #[arg(long)]
        student_no: String,
        #[arg(long)]
        name: String,
    },
    /// 删除考生
    RemoveStudent { exam_id: String, student_id: String },
    /// 调整考生顺序，例如 `--move 3:up --move 1:down`（位置从 1 开始）
    Reorder {
        exam_id: String,
        #[arg(long = "move", value_parser = parse_move, required = true)]
        moves: Vec<(usize, MoveDirection)>,
    },
    /// 从 TOML 名单批量导入考试
    Import {
        #[arg(default_value = "rosters")]
        folder: String,
    },
    /// 开始监考一场考试
    Proctor { exam_id: String },
}

/// 解析 `位置:方向`（位置从 1 开始）
pub fn parse_move(s: &str) -> Result<(usize, MoveDirection), String> {
    let (position, direction) = s
        .split_once(':')
        .ok_or_else(|| format!("格式应为 位置:up|down，实际为 '{}'", s))?;
    let position: usize = position
        .trim()
        .parse()
        .map_err(|_| format!("无效的位置: '{}'", position))?;
    if position == 0 {
        return Err("位置从 1 开始".to_string());
    }
    let direction: MoveDirection = direction.parse().map_err(|e: BusinessError| e.to_string())?;
    Ok((position - 1, direction))
}

/// 应用主结构
pub struct App {
    config: Config,
    store: ExamStore,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        log_startup(&config.api_base_url);

        let client = ExamApiClient::new(&config)?;
        let service = ExamService::new(Arc::new(client));

        Ok(Self {
            config,
            store: ExamStore::new(service),
        })
    }

    /// 使用已有的服务（测试中注入内存后端）
    pub fn with_service(config: Config, service: ExamService) -> Self {
        Self {
            config,
            store: ExamStore::new(service),
        }
    }

    pub fn store(&self) -> &ExamStore {
        &self.store
    }

    /// 运行一条命令
    pub async fn run(&mut self, command: Command) -> Result<()> {
        let count = self.store.load().await.context("加载考试列表失败")?;
        info!("📋 已加载 {} 场考试", count);

        match command {
            Command::List => self.list_upcoming(),
            Command::History {
                course,
                term,
                asc,
                limit,
            } => {
                let filter = HistoryFilter {
                    course,
                    term,
                    sort_order: if asc { SortOrder::Asc } else { SortOrder::Desc },
                };
                self.list_history(filter, limit.unwrap_or(self.config.history_page_size));
            }
            Command::Results { exam_id } => {
                let exam = self.loaded_exam(&exam_id)?;
                print_results(exam);
            }
            Command::Students { exam_id } => {
                let exam = self.loaded_exam(&exam_id)?;
                print_students(exam);
            }
            Command::Create {
                term,
                course,
                date,
                start_time,
                questions,
                duration,
            } => {
                let new_exam = NewExam {
                    examtermin: term,
                    course_name: course,
                    date,
                    number_of_questions: questions,
                    exam_duration_minutes: duration,
                    start_time,
                };
                let created = self.store.create(new_exam).await?;
                info!("✅ 已创建考试 {} ({})", created.course_name, created.id);
            }
            Command::Edit {
                exam_id,
                term,
                course,
                date,
                start_time,
                questions,
                duration,
            } => {
                let mut exam = self.loaded_exam(&exam_id)?.clone();
                exam.examtermin = term.unwrap_or(exam.examtermin);
                exam.course_name = course.unwrap_or(exam.course_name);
                exam.date = date.unwrap_or(exam.date);
                exam.start_time = start_time.unwrap_or(exam.start_time);
                exam.number_of_questions = questions.unwrap_or(exam.number_of_questions);
                exam.exam_duration_minutes = duration.unwrap_or(exam.exam_duration_minutes);
                self.store.update(exam).await?;
            }
            Command::Delete { exam_id } => {
                let report = self.store.delete(&exam_id).await?;
                info!(
                    "🗑️ 已删除考试 {} (考生删除 {} 成功, {} 失败)",
                    exam_id, report.students_deleted, report.students_failed
                );
            }
            Command::AddStudent {
                exam_id,
                student_no,
                name,
            } => {
                self.store.add_student(&exam_id, &student_no, &name).await?;
            }
            Command::RemoveStudent {
                exam_id,
                student_id,
            } => {
                self.store.delete_student(&exam_id, &student_id).await?;
                info!("🗑️ 已删除考生 {}", student_id);
            }
            Command::Reorder { exam_id, moves } => self.reorder(&exam_id, &moves).await?,
            Command::Import { folder } => self.import(&folder).await?,
            Command::Proctor { exam_id } => self.proctor(&exam_id).await?,
        }

        Ok(())
    }

    fn loaded_exam(&self, exam_id: &str) -> Result<&Exam> {
        self.store.exam(exam_id).ok_or_else(|| {
            BusinessError::ExamNotLoaded {
                exam_id: exam_id.to_string(),
            }
            .into()
        })
    }

    fn list_upcoming(&self) {
        let upcoming = self.store.upcoming();
        if upcoming.is_empty() {
            info!("📭 没有即将进行的考试");
            return;
        }

        for exam in upcoming {
            let progress = match exam.first_ungraded_index() {
                Some(_) if exam.has_graded_students() => "进行中",
                Some(_) => "未开始",
                None if exam.students.is_empty() => "无考生",
                None => "待归档",
            };
            info!(
                "📚 [{}] {} | {} | {} {} | {} 题 / {} 分钟 | {} 名考生 | {}",
                exam.id,
                exam.course_name,
                exam.examtermin,
                exam.date,
                exam.start_time,
                exam.number_of_questions,
                exam.exam_duration_minutes,
                exam.students.len(),
                progress
            );
        }
    }

    fn list_history(&self, filter: HistoryFilter, display_count: usize) {
        let view = HistoryView::new(self.store.exams(), display_count).with_filter(filter);
        info!(
            "🗂️ 共 {} 场已完成考试 | 课程: {} | 学期: {}",
            view.total(),
            view.unique_courses().join(", "),
            view.unique_terms().join(", ")
        );

        let rows = view.processed();
        if rows.is_empty() {
            info!("📭 没有符合条件的考试");
            return;
        }
        for exam in &rows {
            info!(
                "📚 [{}] {} | {} | {} | {} 名考生 | 平均成绩 {}",
                exam.id,
                exam.course_name,
                exam.examtermin,
                exam.date,
                exam.students.len(),
                average_grade(exam)
            );
        }
        if rows.len() < view.total() {
            info!("… 使用 --limit 显示更多");
        }
    }

    async fn reorder(&mut self, exam_id: &str, moves: &[(usize, MoveDirection)]) -> Result<()> {
        let mut reorder = StudentReorder::new(self.loaded_exam(exam_id)?);
        for (index, direction) in moves {
            reorder.move_student(*index, *direction)?;
        }

        let updated = reorder.save(self.store.service()).await?;
        self.store.apply_students_change(updated)?;
        if let Some(exam) = self.store.exam(exam_id) {
            print_students(exam);
        }
        Ok(())
    }

    async fn import(&mut self, folder: &str) -> Result<()> {
        let rosters = load_all_rosters(folder).await?;
        if rosters.is_empty() {
            warn!("⚠️ 没有找到名单文件: {}", folder);
            return Ok(());
        }

        let mut failed_students = 0;
        for roster in rosters {
            let created = match self.store.create(roster.new_exam()).await {
                Ok(exam) => exam,
                Err(e) => {
                    error!(
                        "❌ 导入失败 {}: {}",
                        roster.file_path.as_deref().unwrap_or("-"),
                        e
                    );
                    continue;
                }
            };

            for student in &roster.students {
                if let Err(e) = self
                    .store
                    .add_student(&created.id, &student.student_no, &student.name)
                    .await
                {
                    warn!("⚠️ 考生 {} 导入失败: {}", student.student_no, e);
                    failed_students += 1;
                }
            }
            info!(
                "✅ 已导入 {} ({}) - {} 名考生",
                created.course_name,
                created.id,
                roster.students.len()
            );
        }

        if failed_students > 0 {
            warn!("⚠️ 共有 {} 名考生导入失败", failed_students);
        }
        Ok(())
    }

    async fn proctor(&mut self, exam_id: &str) -> Result<()> {
        let session = ExamSession::load(
            self.store.service().clone(),
            exam_id,
            Box::new(RandomQuestionSource),
            Arc::new(TerminalBell::new(self.config.alert_enabled)),
        )
        .await?;

        let mut console = ProctorConsole::new(session, self.config.finish_redirect_delay());
        let outcome = console.run(BufReader::new(tokio::io::stdin())).await?;

        if outcome == ConsoleOutcome::Finished {
            self.store.load().await?;
            self.list_upcoming();
        }
        Ok(())
    }
}

fn print_students(exam: &Exam) {
    info!("👥 {} ({}) 的考生:", exam.course_name, exam.id);
    for (position, student) in exam.students_in_order().iter().enumerate() {
        info!(
            "  {:>2}. [{}] {} ({}){}",
            position + 1,
            student.id,
            student.name,
            student.student_no,
            student
                .grade
                .as_deref()
                .filter(|g| !g.is_empty())
                .map(|g| format!(" - 成绩 {}", g))
                .unwrap_or_default()
        );
    }
}

fn print_results(exam: &Exam) {
    info!(
        "📊 {} | {} | {} | 平均成绩 {}",
        exam.course_name,
        exam.examtermin,
        exam.date,
        average_grade(exam)
    );
    let rows = result_rows(exam);
    if rows.is_empty() {
        info!("📭 还没有已评分的考生");
        return;
    }
    info!("  {:<24} {:<12} {:<6} {}", "姓名", "学号", "题号", "成绩");
    for row in rows {
        info!(
            "  {:<24} {:<12} {:<6} {}",
            row.name, row.student_no, row.question, row.grade
        );
    }
}
