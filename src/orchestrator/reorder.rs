//! 考生排序 - 编排层
//!
//! 在一份本地副本上调整考生顺序，保存时把每个考生的当前位置
//! （从 0 开始）作为新的 order 发送给后端。

use tracing::info;

use crate::error::{AppResult, BusinessError};
use crate::models::{Exam, Student, StudentOrder};
use crate::services::ExamService;

/// 移动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl std::str::FromStr for MoveDirection {
    type Err = BusinessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "u" => Ok(MoveDirection::Up),
            "down" | "d" => Ok(MoveDirection::Down),
            other => Err(BusinessError::InvalidField {
                field: "direction",
                value: other.to_string(),
            }),
        }
    }
}

/// 排序草稿
#[derive(Debug, Clone)]
pub struct StudentReorder {
    exam: Exam,
    students: Vec<Student>,
}

impl StudentReorder {
    /// 以当前 order 排序作为初始顺序
    pub fn new(exam: &Exam) -> Self {
        Self {
            exam: exam.clone(),
            students: exam.students_in_order(),
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// 该位置能否朝指定方向移动（第一个不能上移，最后一个不能下移）
    pub fn can_move(&self, index: usize, direction: MoveDirection) -> bool {
        match direction {
            MoveDirection::Up => index > 0 && index < self.students.len(),
            MoveDirection::Down => index + 1 < self.students.len(),
        }
    }

    /// 与相邻考生交换位置
    pub fn move_student(&mut self, index: usize, direction: MoveDirection) -> Result<(), BusinessError> {
        if !self.can_move(index, direction) {
            return Err(BusinessError::MoveOutOfRange {
                index,
                len: self.students.len(),
            });
        }

        let target = match direction {
            MoveDirection::Up => index - 1,
            MoveDirection::Down => index + 1,
        };
        self.students.swap(index, target);
        Ok(())
    }

    /// 要发送的顺序：0..n-1，与当前显示顺序一致
    pub fn order_payload(&self) -> Vec<StudentOrder> {
        self.students
            .iter()
            .enumerate()
            .map(|(index, student)| StudentOrder {
                id: student.id.clone(),
                order: index as u32,
            })
            .collect()
    }

    /// 保存顺序并返回更新后的考试（供列表状态在本地替换）
    pub async fn save(self, service: &ExamService) -> AppResult<Exam> {
        let payload = self.order_payload();
        service.update_student_order(&payload).await?;

        let mut exam = self.exam;
        exam.students = self
            .students
            .into_iter()
            .zip(payload)
            .map(|(mut student, order)| {
                student.order = order.order;
                student
            })
            .collect();

        info!(
            "✓ 已保存 {} 的考生顺序 ({} 名)",
            exam.course_name,
            exam.students.len()
        );
        Ok(exam)
    }
}
