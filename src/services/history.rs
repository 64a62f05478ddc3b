//! 历史视图 - 业务能力层
//!
//! 负责"哪些考试算即将进行 / 已完成"，以及历史页的筛选、排序和统计

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::models::{Exam, Student};

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// 历史页筛选条件（空字符串表示不筛选）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub course: String,
    pub term: String,
    pub sort_order: SortOrder,
}

/// 即将进行：未完成的考试
pub fn is_upcoming(exam: &Exam) -> bool {
    !exam.is_finished()
}

/// 已完成：已归档，或至少有一名考生已评分
pub fn is_history(exam: &Exam) -> bool {
    exam.is_finished() || exam.has_graded_students()
}

pub fn upcoming_exams(exams: &[Exam]) -> Vec<&Exam> {
    exams.iter().filter(|e| is_upcoming(e)).collect()
}

pub fn history_exams(exams: &[Exam]) -> Vec<&Exam> {
    exams.iter().filter(|e| is_history(e)).collect()
}

/// 历史页状态
#[derive(Debug, Clone)]
pub struct HistoryView {
    exams: Vec<Exam>,
    pub filter: HistoryFilter,
    pub display_count: usize,
}

impl HistoryView {
    /// 从全部考试中挑出已完成的
    pub fn new(all_exams: &[Exam], display_count: usize) -> Self {
        Self {
            exams: all_exams.iter().filter(|e| is_history(e)).cloned().collect(),
            filter: HistoryFilter::default(),
            display_count,
        }
    }

    pub fn with_filter(mut self, filter: HistoryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// 显示更多
    pub fn show_more(&mut self, step: usize) {
        self.display_count += step;
    }

    pub fn total(&self) -> usize {
        self.exams.len()
    }

    /// 去重后的课程名（按首次出现顺序）
    pub fn unique_courses(&self) -> Vec<String> {
        unique_by(&self.exams, |e| &e.course_name)
    }

    /// 去重后的考试学期
    pub fn unique_terms(&self) -> Vec<String> {
        unique_by(&self.exams, |e| &e.examtermin)
    }

    /// 按条件筛选、按日期排序并截取前 display_count 条
    pub fn processed(&self) -> Vec<&Exam> {
        let mut filtered: Vec<&Exam> = self
            .exams
            .iter()
            .filter(|e| self.filter.course.is_empty() || e.course_name == self.filter.course)
            .filter(|e| self.filter.term.is_empty() || e.examtermin == self.filter.term)
            .collect();

        // 无法解析的日期排在最早
        let date = |e: &Exam| e.parsed_date().unwrap_or(NaiveDate::MIN);
        match self.filter.sort_order {
            SortOrder::Asc => filtered.sort_by_key(|e| date(*e)),
            // 同一天的考试保持原有顺序
            SortOrder::Desc => filtered.sort_by(|a, b| date(*b).cmp(&date(*a))),
        }

        filtered.truncate(self.display_count);
        filtered
    }
}

fn unique_by<'a>(exams: &'a [Exam], key: impl Fn(&'a Exam) -> &'a String) -> Vec<String> {
    let mut seen = HashSet::new();
    exams
        .iter()
        .map(key)
        .filter(|k| seen.insert(k.as_str()))
        .cloned()
        .collect()
}

/// 平均成绩（保留两位小数），没有可计算的成绩时为 "N/A"
pub fn average_grade(exam: &Exam) -> String {
    let grades: Vec<i32> = exam
        .students
        .iter()
        .filter(|s| s.is_graded())
        .filter_map(Student::numeric_grade)
        .collect();

    if grades.is_empty() {
        return "N/A".to_string();
    }

    let total: i32 = grades.iter().sum();
    format!("{:.2}", total as f64 / grades.len() as f64)
}

/// 成绩单中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub name: String,
    pub student_no: String,
    pub question: String,
    pub grade: String,
}

/// 只包含已评分考生的成绩单
pub fn result_rows(exam: &Exam) -> Vec<ResultRow> {
    exam.students
        .iter()
        .filter(|s| s.is_graded())
        .map(|s| ResultRow {
            name: s.name.clone(),
            student_no: s.student_no.clone(),
            question: s
                .question_no
                .map(|q| q.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            grade: s.grade.clone().unwrap_or_default(),
        })
        .collect()
}
