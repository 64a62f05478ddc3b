use serde::{Deserialize, Serialize};

use crate::error::BusinessError;
use crate::models::grade::Grade;
use crate::models::deserialize_id;

/// 考生
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub exam_id: String,
    pub student_no: String,
    pub name: String,
    /// 考试顺序（从 0 开始）
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_no: Option<u32>,
    /// 实际用时（分钟）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_exam_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

impl Student {
    /// 是否已评分（grade 存在且非空）
    pub fn is_graded(&self) -> bool {
        self.grade.as_deref().is_some_and(|g| !g.is_empty())
    }

    /// 按 7 级评分制解析成绩
    pub fn parsed_grade(&self) -> Option<Grade> {
        self.grade.as_deref().and_then(Grade::from_label)
    }

    /// 成绩的整数值（无法解析时为 None）
    pub fn numeric_grade(&self) -> Option<i32> {
        self.grade
            .as_deref()
            .filter(|g| !g.is_empty())
            .and_then(|g| g.trim().parse::<i32>().ok())
    }

    /// 写入评分结果（本地）
    pub fn apply_grading(&mut self, grading: &StudentGrading) {
        self.question_no = Some(grading.question_no);
        self.actual_exam_duration = Some(grading.actual_exam_duration);
        self.notes = Some(grading.notes.clone());
        self.grade = Some(grading.grade.clone());
    }
}

/// 新增考生请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub exam_id: String,
    pub student_no: String,
    pub name: String,
    pub order: u32,
}

impl NewStudent {
    pub fn new(
        exam_id: impl Into<String>,
        student_no: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            exam_id: exam_id.into(),
            student_no: student_no.into().trim().to_string(),
            name: name.into().trim().to_string(),
            order: 0,
        }
    }

    /// 学号和姓名都必须填写
    pub fn validate(&self) -> Result<(), BusinessError> {
        if self.student_no.trim().is_empty() {
            return Err(BusinessError::MissingField { field: "studentNo" });
        }
        if self.name.trim().is_empty() {
            return Err(BusinessError::MissingField { field: "name" });
        }
        Ok(())
    }
}

/// 调整顺序时发送的数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentOrder {
    pub id: String,
    pub order: u32,
}

/// 评分时 PATCH 的字段
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGrading {
    pub question_no: u32,
    /// 实际用时（分钟，四舍五入）
    pub actual_exam_duration: u32,
    pub notes: String,
    pub grade: String,
}
