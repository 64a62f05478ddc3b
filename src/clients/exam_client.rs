/// 考试后端 API 客户端
///
/// 封装所有与 REST 后端（exams / students 两个集合）相关的调用
use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::HttpExecutor;
use crate::models::exam::{CreateExamBody, ExamStatus};
use crate::models::{Exam, NewExam, NewStudent, Student, StudentGrading, StudentOrder};

/// 考试后端
///
/// 每个方法对应一个 REST 请求，不做组合。组合操作（级联删除、
/// 批量排序）在 `services::ExamService` 中完成。
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// GET /exams?_embed=students
    async fn list_exams(&self) -> AppResult<Vec<Exam>>;

    /// GET /exams/{id}?_embed=students
    async fn get_exam(&self, exam_id: &str) -> AppResult<Exam>;

    /// POST /exams
    async fn create_exam(&self, exam: &NewExam) -> AppResult<Exam>;

    /// PUT /exams/{id}
    async fn update_exam(&self, exam: &Exam) -> AppResult<Exam>;

    /// DELETE /exams/{id}（不处理考生）
    async fn delete_exam_record(&self, exam_id: &str) -> AppResult<()>;

    /// PATCH /exams/{id} {status: "finished"}
    async fn finish_exam(&self, exam_id: &str) -> AppResult<Exam>;

    /// GET /students?examId={id}
    async fn list_students(&self, exam_id: &str) -> AppResult<Vec<Student>>;

    /// POST /students
    async fn add_student(&self, student: &NewStudent) -> AppResult<Student>;

    /// DELETE /students/{id}
    async fn delete_student(&self, student_id: &str) -> AppResult<()>;

    /// PATCH /students/{id} {order}
    async fn patch_student_order(&self, order: &StudentOrder) -> AppResult<Student>;

    /// PATCH /students/{id} {questionNo, actualExamDuration, notes, grade}
    async fn grade_student(&self, student_id: &str, grading: &StudentGrading) -> AppResult<Student>;
}

/// 基于 HTTP 的后端客户端
pub struct ExamApiClient {
    executor: HttpExecutor,
}

impl ExamApiClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            executor: HttpExecutor::new(config)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.executor.base_url()
    }
}

#[async_trait]
impl ExamBackend for ExamApiClient {
    async fn list_exams(&self) -> AppResult<Vec<Exam>> {
        let exams: Vec<Exam> = self
            .executor
            .get_as("exams?_embed=students", "无法从服务器获取考试列表")
            .await?;
        debug!("获取到 {} 场考试", exams.len());
        Ok(exams)
    }

    async fn get_exam(&self, exam_id: &str) -> AppResult<Exam> {
        self.executor
            .get_as(
                &format!("exams/{}?_embed=students", exam_id),
                &format!("找不到 id 为 {} 的考试", exam_id),
            )
            .await
    }

    async fn create_exam(&self, exam: &NewExam) -> AppResult<Exam> {
        let body = CreateExamBody {
            exam,
            status: ExamStatus::Upcoming,
        };
        let mut created: Exam = self
            .executor
            .send_as(Method::POST, "exams", Some(&body), "无法创建考试")
            .await?;
        created.students = Vec::new();
        Ok(created)
    }

    async fn update_exam(&self, exam: &Exam) -> AppResult<Exam> {
        self.executor
            .send_as(
                Method::PUT,
                &format!("exams/{}", exam.id),
                Some(exam),
                "无法更新考试",
            )
            .await
    }

    async fn delete_exam_record(&self, exam_id: &str) -> AppResult<()> {
        self.executor
            .delete(&format!("exams/{}", exam_id), "无法删除考试")
            .await
    }

    async fn finish_exam(&self, exam_id: &str) -> AppResult<Exam> {
        self.executor
            .send_as(
                Method::PATCH,
                &format!("exams/{}", exam_id),
                Some(&json!({ "status": ExamStatus::Finished })),
                "归档考试失败",
            )
            .await
    }

    async fn list_students(&self, exam_id: &str) -> AppResult<Vec<Student>> {
        self.executor
            .get_as(
                &format!("students?examId={}", exam_id),
                "无法获取该考试的考生",
            )
            .await
    }

    async fn add_student(&self, student: &NewStudent) -> AppResult<Student> {
        self.executor
            .send_as(Method::POST, "students", Some(student), "无法添加考生")
            .await
    }

    async fn delete_student(&self, student_id: &str) -> AppResult<()> {
        self.executor
            .delete(&format!("students/{}", student_id), "无法删除考生")
            .await
    }

    async fn patch_student_order(&self, order: &StudentOrder) -> AppResult<Student> {
        self.executor
            .send_as(
                Method::PATCH,
                &format!("students/{}", order.id),
                Some(&json!({ "order": order.order })),
                "无法更新考生顺序",
            )
            .await
    }

    async fn grade_student(&self, student_id: &str, grading: &StudentGrading) -> AppResult<Student> {
        self.executor
            .send_as(
                Method::PATCH,
                &format!("students/{}", student_id),
                Some(grading),
                "无法保存考生数据，请重试",
            )
            .await
    }
}
