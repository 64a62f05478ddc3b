//! 考试服务 - 业务能力层
//!
//! 对外提供"我能对考试/考生做什么"，包括两个由多个请求组成的操作：
//! - 级联删除考试（先删全部考生，再删考试）
//! - 批量保存考生顺序
//!
//! 两者都不是事务：已经成功的请求不会回滚。

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::clients::ExamBackend;
use crate::error::{AppResult, BusinessError};
use crate::models::{Exam, NewExam, NewStudent, Student, StudentGrading, StudentOrder};

/// 级联删除的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub students_deleted: usize,
    pub students_failed: usize,
}

/// 考试服务
#[derive(Clone)]
pub struct ExamService {
    backend: Arc<dyn ExamBackend>,
}

impl ExamService {
    pub fn new(backend: Arc<dyn ExamBackend>) -> Self {
        Self { backend }
    }

    pub async fn get_exams(&self) -> AppResult<Vec<Exam>> {
        self.backend.list_exams().await
    }

    pub async fn get_exam_by_id(&self, exam_id: &str) -> AppResult<Exam> {
        self.backend.get_exam(exam_id).await
    }

    /// 创建考试（先校验表单）
    pub async fn create_exam(&self, exam: &NewExam) -> AppResult<Exam> {
        exam.validate()?;
        let created = self.backend.create_exam(exam).await?;
        info!("✓ 考试已创建: {} ({})", created.course_name, created.id);
        Ok(created)
    }

    /// 更新考试（与创建使用相同的校验）
    pub async fn update_exam(&self, exam: &Exam) -> AppResult<Exam> {
        NewExam::from(exam).validate()?;
        self.backend.update_exam(exam).await
    }

    /// 删除考试及其全部考生
    ///
    /// 1. 获取该考试的全部考生
    /// 2. 并发删除每个考生，等待全部完成
    /// 3. 无论考生是否都删除成功，都删除考试本身
    ///
    /// # 返回
    /// 考生删除的统计；只有获取考生列表或删除考试本身失败时才返回错误
    pub async fn delete_exam(&self, exam_id: &str) -> AppResult<DeleteReport> {
        let students = self.backend.list_students(exam_id).await?;
        debug!("考试 {} 有 {} 名考生待删除", exam_id, students.len());

        let results = join_all(
            students
                .iter()
                .map(|student| self.backend.delete_student(&student.id)),
        )
        .await;

        let mut report = DeleteReport::default();
        for (student, result) in students.iter().zip(results) {
            match result {
                Ok(()) => report.students_deleted += 1,
                Err(e) => {
                    warn!("⚠️ 删除考生 {} 失败: {}", student.id, e);
                    report.students_failed += 1;
                }
            }
        }

        self.backend.delete_exam_record(exam_id).await?;

        if report.students_failed > 0 {
            warn!(
                "⚠️ 考试 {} 已删除，但有 {} 名考生未能删除",
                exam_id, report.students_failed
            );
        } else {
            info!("✓ 考试 {} 及 {} 名考生已删除", exam_id, report.students_deleted);
        }

        Ok(report)
    }

    /// 添加考生（先校验表单）
    pub async fn add_student(&self, student: &NewStudent) -> AppResult<Student> {
        student.validate()?;
        self.backend.add_student(student).await
    }

    pub async fn delete_student(&self, student_id: &str) -> AppResult<()> {
        self.backend.delete_student(student_id).await
    }

    /// 批量保存考生顺序
    ///
    /// 每名考生一个 PATCH 请求，全部并发发送并等待完成。任何一个失败
    /// 都返回错误，但已成功的更新不会撤销。
    pub async fn update_student_order(&self, orders: &[StudentOrder]) -> AppResult<()> {
        let results = join_all(
            orders
                .iter()
                .map(|order| self.backend.patch_student_order(order)),
        )
        .await;

        let mut first_error = None;
        let mut failed = 0;
        for (order, result) in orders.iter().zip(results) {
            if let Err(e) = result {
                warn!("⚠️ 更新考生 {} 的顺序失败: {}", order.id, e);
                failed += 1;
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            None => Ok(()),
            Some(e) if failed == orders.len() => Err(e),
            Some(_) => Err(BusinessError::PartialFailure {
                failed,
                total: orders.len(),
            }
            .into()),
        }
    }

    /// 保存考生的评分结果
    pub async fn update_student(
        &self,
        student_id: &str,
        grading: &StudentGrading,
    ) -> AppResult<Student> {
        self.backend.grade_student(student_id, grading).await
    }

    /// 把考试标记为已完成
    pub async fn finish_exam(&self, exam_id: &str) -> AppResult<Exam> {
        self.backend.finish_exam(exam_id).await
    }
}
