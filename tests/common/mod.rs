//! 测试用的内存后端：记录每个请求，可按请求注入失败

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use exam_proctor::error::{ApiError, AppError, AppResult};
use exam_proctor::models::{
    Exam, ExamStatus, NewExam, NewStudent, Student, StudentGrading, StudentOrder,
};
use exam_proctor::services::ExamService;
use exam_proctor::ExamBackend;

#[derive(Default)]
struct BackendState {
    exams: Vec<Exam>,
    students: Vec<Student>,
    next_id: u32,
    requests: Vec<String>,
    bodies: Vec<(String, Value)>,
    failures: HashSet<String>,
}

impl BackendState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn embedded(&self, exam: &Exam) -> Exam {
        let mut exam = exam.clone();
        exam.students = self
            .students
            .iter()
            .filter(|s| s.exam_id == exam.id)
            .cloned()
            .collect();
        exam
    }
}

/// 内存中的 json-server
#[derive(Default)]
pub struct RecordingBackend {
    state: Mutex<BackendState>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    /// 直接写入一场考试及其考生（不记录请求）
    pub fn seed_exam(&self, mut exam: Exam) -> Exam {
        let mut state = self.lock();
        let students = std::mem::take(&mut exam.students);
        state.students.extend(students);
        state.exams.push(exam.clone());
        state.embedded(&exam)
    }

    /// 让某个请求（例如 `DELETE /students/s2`）返回 500
    pub fn fail_on(&self, request: &str) {
        self.lock().failures.insert(request.to_string());
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    pub fn clear_requests(&self) {
        let mut state = self.lock();
        state.requests.clear();
        state.bodies.clear();
    }

    /// 某个请求发送的 JSON 请求体
    pub fn body_of(&self, request: &str) -> Option<Value> {
        self.lock()
            .bodies
            .iter()
            .rev()
            .find(|(r, _)| r == request)
            .map(|(_, body)| body.clone())
    }

    pub fn stored_exam(&self, exam_id: &str) -> Option<Exam> {
        let state = self.lock();
        state
            .exams
            .iter()
            .find(|e| e.id == exam_id)
            .map(|e| state.embedded(e))
    }

    pub fn stored_student(&self, student_id: &str) -> Option<Student> {
        self.lock()
            .students
            .iter()
            .find(|s| s.id == student_id)
            .cloned()
    }

    /// 记录请求；被注入失败时返回 500
    fn record(&self, request: String, body: Option<Value>) -> AppResult<()> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        if let Some(body) = body {
            state.bodies.push((request.clone(), body));
        }
        if state.failures.contains(&request) {
            return Err(AppError::bad_response(request, 500, "服务器内部错误"));
        }
        Ok(())
    }
}

fn not_found(endpoint: String) -> AppError {
    AppError::Api(ApiError::NotFound {
        endpoint,
        message: "资源不存在".to_string(),
    })
}

#[async_trait]
impl ExamBackend for RecordingBackend {
    async fn list_exams(&self) -> AppResult<Vec<Exam>> {
        self.record("GET /exams?_embed=students".to_string(), None)?;
        let state = self.lock();
        Ok(state.exams.iter().map(|e| state.embedded(e)).collect())
    }

    async fn get_exam(&self, exam_id: &str) -> AppResult<Exam> {
        let request = format!("GET /exams/{}?_embed=students", exam_id);
        self.record(request.clone(), None)?;
        let state = self.lock();
        state
            .exams
            .iter()
            .find(|e| e.id == exam_id)
            .map(|e| state.embedded(e))
            .ok_or_else(|| not_found(request))
    }

    async fn create_exam(&self, exam: &NewExam) -> AppResult<Exam> {
        self.record(
            "POST /exams".to_string(),
            Some(serde_json::to_value(exam).unwrap()),
        )?;
        let mut state = self.lock();
        let created = Exam {
            id: state.next_id("e"),
            examtermin: exam.examtermin.clone(),
            course_name: exam.course_name.clone(),
            date: exam.date.clone(),
            number_of_questions: exam.number_of_questions,
            exam_duration_minutes: exam.exam_duration_minutes,
            start_time: exam.start_time.clone(),
            students: Vec::new(),
            status: Some(ExamStatus::Upcoming),
        };
        state.exams.push(created.clone());
        Ok(created)
    }

    async fn update_exam(&self, exam: &Exam) -> AppResult<Exam> {
        let request = format!("PUT /exams/{}", exam.id);
        self.record(request.clone(), Some(serde_json::to_value(exam).unwrap()))?;
        let mut state = self.lock();
        let stored = state
            .exams
            .iter_mut()
            .find(|e| e.id == exam.id)
            .ok_or_else(|| not_found(request))?;
        *stored = Exam {
            students: Vec::new(),
            ..exam.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_exam_record(&self, exam_id: &str) -> AppResult<()> {
        self.record(format!("DELETE /exams/{}", exam_id), None)?;
        self.lock().exams.retain(|e| e.id != exam_id);
        Ok(())
    }

    async fn finish_exam(&self, exam_id: &str) -> AppResult<Exam> {
        let request = format!("PATCH /exams/{}", exam_id);
        self.record(request.clone(), Some(json!({ "status": "finished" })))?;
        let mut state = self.lock();
        let stored = state
            .exams
            .iter_mut()
            .find(|e| e.id == exam_id)
            .ok_or_else(|| not_found(request))?;
        stored.status = Some(ExamStatus::Finished);
        Ok(stored.clone())
    }

    async fn list_students(&self, exam_id: &str) -> AppResult<Vec<Student>> {
        self.record(format!("GET /students?examId={}", exam_id), None)?;
        Ok(self
            .lock()
            .students
            .iter()
            .filter(|s| s.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn add_student(&self, student: &NewStudent) -> AppResult<Student> {
        self.record(
            "POST /students".to_string(),
            Some(serde_json::to_value(student).unwrap()),
        )?;
        let mut state = self.lock();
        let created = Student {
            id: state.next_id("s"),
            exam_id: student.exam_id.clone(),
            student_no: student.student_no.clone(),
            name: student.name.clone(),
            order: student.order,
            question_no: None,
            actual_exam_duration: None,
            notes: None,
            grade: None,
        };
        state.students.push(created.clone());
        Ok(created)
    }

    async fn delete_student(&self, student_id: &str) -> AppResult<()> {
        self.record(format!("DELETE /students/{}", student_id), None)?;
        self.lock().students.retain(|s| s.id != student_id);
        Ok(())
    }

    async fn patch_student_order(&self, order: &StudentOrder) -> AppResult<Student> {
        let request = format!("PATCH /students/{}", order.id);
        self.record(request.clone(), Some(json!({ "order": order.order })))?;
        let mut state = self.lock();
        let stored = state
            .students
            .iter_mut()
            .find(|s| s.id == order.id)
            .ok_or_else(|| not_found(request))?;
        stored.order = order.order;
        Ok(stored.clone())
    }

    async fn grade_student(
        &self,
        student_id: &str,
        grading: &StudentGrading,
    ) -> AppResult<Student> {
        let request = format!("PATCH /students/{}", student_id);
        self.record(request.clone(), Some(serde_json::to_value(grading).unwrap()))?;
        let mut state = self.lock();
        let stored = state
            .students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| not_found(request))?;
        stored.apply_grading(grading);
        Ok(stored.clone())
    }
}

pub fn service(backend: &Arc<RecordingBackend>) -> ExamService {
    ExamService::new(backend.clone())
}

/// 一场考试：`students` 为 (id, 姓名)，order 按给定顺序从 0 开始
pub fn exam_fixture(id: &str, questions: u32, minutes: u32, students: &[(&str, &str)]) -> Exam {
    Exam {
        id: id.to_string(),
        examtermin: "sommer 25".to_string(),
        course_name: "Matematik A".to_string(),
        date: "2025-06-12".to_string(),
        number_of_questions: questions,
        exam_duration_minutes: minutes,
        start_time: "09:00".to_string(),
        students: students
            .iter()
            .enumerate()
            .map(|(order, (student_id, name))| Student {
                id: student_id.to_string(),
                exam_id: id.to_string(),
                student_no: format!("no-{}", student_id),
                name: name.to_string(),
                order: order as u32,
                question_no: None,
                actual_exam_duration: None,
                notes: None,
                grade: None,
            })
            .collect(),
        status: Some(ExamStatus::Upcoming),
    }
}

pub fn new_exam(course: &str) -> NewExam {
    NewExam {
        examtermin: "vinter 25".to_string(),
        course_name: course.to_string(),
        date: "2025-12-18".to_string(),
        start_time: "10:30".to_string(),
        ..NewExam::default()
    }
}
