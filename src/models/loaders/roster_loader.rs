use crate::models::exam::NewExam;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 考试名单文件（一场考试及其考生）
///
/// ```toml
/// [exam]
/// examtermin = "sommer 25"
/// course_name = "Matematik A"
/// date = "2025-06-12"
/// start_time = "09:00"
/// number_of_questions = 12
/// exam_duration_minutes = 20
///
/// [[students]]
/// student_no = "s220011"
/// name = "Freja Jensen"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ExamRoster {
    pub exam: RosterExam,
    #[serde(default)]
    pub students: Vec<RosterStudent>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterExam {
    pub examtermin: String,
    pub course_name: String,
    pub date: String,
    #[serde(default = "default_start_time")]
    pub start_time: String,
    #[serde(default = "default_number_of_questions")]
    pub number_of_questions: u32,
    #[serde(default = "default_exam_duration_minutes")]
    pub exam_duration_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterStudent {
    pub student_no: String,
    pub name: String,
}

fn default_start_time() -> String {
    NewExam::default().start_time
}

fn default_number_of_questions() -> u32 {
    NewExam::default().number_of_questions
}

fn default_exam_duration_minutes() -> u32 {
    NewExam::default().exam_duration_minutes
}

impl ExamRoster {
    /// 转换成新建考试表单
    pub fn new_exam(&self) -> NewExam {
        NewExam {
            examtermin: self.exam.examtermin.clone(),
            course_name: self.exam.course_name.clone(),
            date: self.exam.date.clone(),
            number_of_questions: self.exam.number_of_questions,
            exam_duration_minutes: self.exam.exam_duration_minutes,
            start_time: self.exam.start_time.clone(),
        }
    }
}

/// 解析名单内容
pub fn parse_roster(content: &str) -> Result<ExamRoster> {
    let roster: ExamRoster = toml::from_str(content).context("名单格式不正确")?;
    roster.new_exam().validate()?;
    Ok(roster)
}

/// 从 TOML 文件加载考试名单
pub async fn load_roster(toml_file_path: &Path) -> Result<ExamRoster> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let mut roster = parse_roster(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    roster.file_path = Some(toml_file_path.to_string_lossy().to_string());

    Ok(roster)
}

/// 从文件夹中加载所有考试名单
///
/// 无法解析的文件只记录警告并跳过
pub async fn load_all_rosters(folder_path: &str) -> Result<Vec<ExamRoster>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut rosters = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_roster(&path).await {
            Ok(roster) => {
                tracing::info!("成功加载 {} 名考生", roster.students.len());
                rosters.push(roster);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(rosters)
}
