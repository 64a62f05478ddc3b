use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BusinessError;
use crate::models::deserialize_id;
use crate::models::student::Student;

/// 单个考生的最长考试时长（分钟）
pub const MAX_EXAM_DURATION_MINUTES: u32 = 24 * 60;

/// 考试状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Upcoming,
    Finished,
}

/// 口试考试
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub examtermin: String,
    pub course_name: String,
    /// ISO 日期 (YYYY-MM-DD)
    pub date: String,
    pub number_of_questions: u32,
    pub exam_duration_minutes: u32,
    pub start_time: String,
    #[serde(default)]
    pub students: Vec<Student>,
    /// 缺省视为 upcoming
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExamStatus>,
}

impl Exam {
    pub fn is_finished(&self) -> bool {
        self.status == Some(ExamStatus::Finished)
    }

    /// 是否有任何考生已评分
    pub fn has_graded_students(&self) -> bool {
        self.students.iter().any(Student::is_graded)
    }

    /// 第一个未评分考生的位置
    pub fn first_ungraded_index(&self) -> Option<usize> {
        self.students.iter().position(|s| !s.is_graded())
    }

    /// 考试总时长（秒），后端数据超出范围时饱和而不是溢出
    pub fn duration_seconds(&self) -> u32 {
        self.exam_duration_minutes.saturating_mul(60)
    }

    /// 解析考试日期
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_iso_date(&self.date)
    }

    /// 按 order 排序后的考生列表
    pub fn students_in_order(&self) -> Vec<Student> {
        let mut students = self.students.clone();
        students.sort_by_key(|s| s.order);
        students
    }
}

/// 新建考试表单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExam {
    pub examtermin: String,
    pub course_name: String,
    pub date: String,
    pub number_of_questions: u32,
    pub exam_duration_minutes: u32,
    pub start_time: String,
}

impl Default for NewExam {
    fn default() -> Self {
        Self {
            examtermin: String::new(),
            course_name: String::new(),
            date: String::new(),
            number_of_questions: 10,
            exam_duration_minutes: 20,
            start_time: "09:00".to_string(),
        }
    }
}

impl From<&Exam> for NewExam {
    fn from(exam: &Exam) -> Self {
        Self {
            examtermin: exam.examtermin.clone(),
            course_name: exam.course_name.clone(),
            date: exam.date.clone(),
            number_of_questions: exam.number_of_questions,
            exam_duration_minutes: exam.exam_duration_minutes,
            start_time: exam.start_time.clone(),
        }
    }
}

impl NewExam {
    /// 在发送请求前校验表单
    pub fn validate(&self) -> Result<(), BusinessError> {
        if self.course_name.trim().is_empty() {
            return Err(BusinessError::MissingField { field: "courseName" });
        }
        if self.examtermin.trim().is_empty() {
            return Err(BusinessError::MissingField { field: "examtermin" });
        }
        validate_schedule(&self.date, &self.start_time)?;
        if self.number_of_questions < 1 {
            return Err(BusinessError::InvalidField {
                field: "numberOfQuestions",
                value: self.number_of_questions.to_string(),
            });
        }
        if !(1..=MAX_EXAM_DURATION_MINUTES).contains(&self.exam_duration_minutes) {
            return Err(BusinessError::InvalidField {
                field: "examDurationMinutes",
                value: self.exam_duration_minutes.to_string(),
            });
        }
        Ok(())
    }
}

/// 创建考试时的请求体（附带初始状态）
#[derive(Debug, Serialize)]
pub(crate) struct CreateExamBody<'a> {
    #[serde(flatten)]
    pub exam: &'a NewExam,
    pub status: ExamStatus,
}

/// 校验日期和开始时间
pub fn validate_schedule(date: &str, start_time: &str) -> Result<(), BusinessError> {
    if parse_iso_date(date).is_none() {
        return Err(BusinessError::InvalidField {
            field: "date",
            value: date.to_string(),
        });
    }
    if !start_time_pattern().is_match(start_time) {
        return Err(BusinessError::InvalidField {
            field: "startTime",
            value: start_time.to_string(),
        });
    }
    Ok(())
}

fn parse_iso_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

fn start_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap_or_else(|e| panic!("无效的时间正则: {e}"))
    })
}
