//! 考试列表状态 - 编排层
//!
//! ## 职责
//!
//! 持有当前进程中唯一的考试列表，并与后端保持一致：
//!
//! 1. **先保存，后修改**：每个写操作先调用后端，成功后才修改本地列表
//! 2. **失败不改动**：失败时本地列表保持原样，只记录页面错误信息
//! 3. **本地替换**：`apply_students_change` 只替换某场考试的考生，不调用后端
//!    （添加/删除/排序考生时，远程调用已由调用方完成）

use tracing::{error, info};

use crate::error::{AppError, AppResult, BusinessError};
use crate::models::{Exam, NewExam, NewStudent, Student};
use crate::services::history::{history_exams, upcoming_exams};
use crate::services::{DeleteReport, ExamService};

/// 考试列表状态
pub struct ExamStore {
    service: ExamService,
    exams: Vec<Exam>,
    error: Option<String>,
}

impl ExamStore {
    pub fn new(service: ExamService) -> Self {
        Self {
            service,
            exams: Vec::new(),
            error: None,
        }
    }

    pub fn service(&self) -> &ExamService {
        &self.service
    }

    /// 全部考试（按插入顺序）
    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    pub fn exam(&self, exam_id: &str) -> Option<&Exam> {
        self.exams.iter().find(|e| e.id == exam_id)
    }

    /// 即将进行的考试
    pub fn upcoming(&self) -> Vec<&Exam> {
        upcoming_exams(&self.exams)
    }

    /// 已完成的考试
    pub fn history(&self) -> Vec<&Exam> {
        history_exams(&self.exams)
    }

    /// 页面上显示的错误
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 从后端重新加载全部考试
    pub async fn load(&mut self) -> AppResult<usize> {
        let result = self.service.get_exams().await;
        let exams = self.track(result)?;
        self.exams = exams;
        Ok(self.exams.len())
    }

    /// 创建考试，成功后追加到列表末尾
    pub async fn create(&mut self, exam: NewExam) -> AppResult<Exam> {
        let result = self.service.create_exam(&exam).await;
        let created = self.track(result)?;
        self.exams.push(created.clone());
        Ok(created)
    }

    /// 更新考试，成功后原位替换
    ///
    /// 后端响应不包含考生时保留本地已知的考生
    pub async fn update(&mut self, exam: Exam) -> AppResult<Exam> {
        let position = self.position(&exam.id)?;
        let result = self.service.update_exam(&exam).await;
        let mut returned = self.track(result)?;
        if returned.students.is_empty() {
            returned.students = exam.students;
        }
        self.exams[position] = returned.clone();
        info!("✓ 考试已更新: {} ({})", returned.course_name, returned.id);
        Ok(returned)
    }

    /// 删除考试（含考生），成功后从列表移除
    pub async fn delete(&mut self, exam_id: &str) -> AppResult<DeleteReport> {
        let result = self.service.delete_exam(exam_id).await;
        let report = self.track(result)?;
        self.exams.retain(|e| e.id != exam_id);
        Ok(report)
    }

    /// 只在本地替换某场考试的考生
    pub fn apply_students_change(&mut self, updated: Exam) -> AppResult<()> {
        let position = self.position(&updated.id)?;
        self.exams[position].students = updated.students;
        Ok(())
    }

    /// 添加考生，order 取现有最大 order + 1（删除考生后仍不重复）
    pub async fn add_student(
        &mut self,
        exam_id: &str,
        student_no: &str,
        name: &str,
    ) -> AppResult<Student> {
        let position = self.position(exam_id)?;
        let mut new_student = NewStudent::new(exam_id, student_no, name);
        new_student.order = self.exams[position]
            .students
            .iter()
            .map(|s| s.order.saturating_add(1))
            .max()
            .unwrap_or(0);

        let result = self.service.add_student(&new_student).await;
        let created = self.track(result)?;
        self.exams[position].students.push(created.clone());
        info!("✓ 已添加考生 {} ({})", created.name, created.student_no);
        Ok(created)
    }

    /// 删除考生，成功后从本地移除
    pub async fn delete_student(&mut self, exam_id: &str, student_id: &str) -> AppResult<()> {
        let position = self.position(exam_id)?;
        if !self.exams[position]
            .students
            .iter()
            .any(|s| s.id == student_id)
        {
            return Err(BusinessError::StudentNotFound {
                student_id: student_id.to_string(),
            }
            .into());
        }

        let result = self.service.delete_student(student_id).await;
        self.track(result)?;
        self.exams[position].students.retain(|s| s.id != student_id);
        Ok(())
    }

    fn position(&self, exam_id: &str) -> AppResult<usize> {
        self.exams
            .iter()
            .position(|e| e.id == exam_id)
            .ok_or_else(|| {
                AppError::Business(BusinessError::ExamNotLoaded {
                    exam_id: exam_id.to_string(),
                })
            })
    }

    /// 记录远程调用结果：失败时保存错误信息，成功时清除
    fn track<T>(&mut self, result: AppResult<T>) -> AppResult<T> {
        match result {
            Ok(value) => {
                self.error = None;
                Ok(value)
            }
            Err(e) => {
                error!("❌ {}", e);
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }
}
