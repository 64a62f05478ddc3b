// tests/http_client_test.rs
//
// 在随机端口上启动一个模拟 json-server，检查客户端发出的请求

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use exam_proctor::config::Config;
use exam_proctor::models::{NewExam, NewStudent, StudentGrading, StudentOrder};
use exam_proctor::services::ExamService;
use exam_proctor::{ExamApiClient, ExamBackend};

/// 收到的请求：(方法, 路径和查询串, 请求体)
type RequestLog = Arc<Mutex<Vec<(String, String, Value)>>>;

fn student_json(id: Value, exam_id: &str, order: u32) -> Value {
    json!({
        "id": id,
        "examId": exam_id,
        "studentNo": format!("no{}", order),
        "name": format!("Student {}", order),
        "order": order
    })
}

fn exam_json(id: Value) -> Value {
    json!({
        "id": id,
        "examtermin": "sommer 25",
        "courseName": "Matematik A",
        "date": "2025-06-12",
        "numberOfQuestions": 12,
        "examDurationMinutes": 20,
        "startTime": "09:00",
        "status": "upcoming"
    })
}

async fn mock_backend(
    State(log): State<RequestLog>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    log.lock()
        .unwrap()
        .push((method.to_string(), path.clone(), body.clone()));

    let merge = |mut base: Value, patch: &Value| {
        if let (Some(base), Some(patch)) = (base.as_object_mut(), patch.as_object()) {
            for (k, v) in patch {
                base.insert(k.clone(), v.clone());
            }
        }
        base
    };

    match (method.as_str(), path.as_str()) {
        (_, p) if p.starts_with("/exams/missing") => StatusCode::NOT_FOUND.into_response(),
        (_, p) if p.starts_with("/exams/boom") => {
            (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
        }
        ("GET", "/exams?_embed=students") => {
            let mut exam = exam_json(json!(1));
            exam["students"] = json!([student_json(json!(10), "1", 0)]);
            Json(json!([exam])).into_response()
        }
        ("GET", p) if p.starts_with("/exams/") => {
            let mut exam = exam_json(json!("a1"));
            exam["students"] = json!([
                student_json(json!("s2"), "a1", 1),
                student_json(json!("s1"), "a1", 0)
            ]);
            Json(exam).into_response()
        }
        ("POST", "/exams") => {
            (StatusCode::CREATED, Json(merge(json!({ "id": "new1" }), &body))).into_response()
        }
        ("PUT", _) => Json(body).into_response(),
        ("PATCH", p) if p.starts_with("/exams/") => {
            Json(merge(exam_json(json!("a1")), &body)).into_response()
        }
        ("GET", p) if p.starts_with("/students?examId=") => Json(json!([
            student_json(json!("s1"), "a1", 0),
            student_json(json!("s2"), "a1", 1)
        ]))
        .into_response(),
        ("POST", "/students") => {
            (StatusCode::CREATED, Json(merge(json!({ "id": 77 }), &body))).into_response()
        }
        ("PATCH", p) if p.starts_with("/students/") => {
            let id = p.trim_start_matches("/students/").to_string();
            Json(merge(student_json(json!(id), "a1", 0), &body)).into_response()
        }
        ("DELETE", _) => Json(json!({})).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// 启动模拟后端，返回客户端和请求日志
async fn spawn_backend() -> (ExamApiClient, RequestLog) {
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .fallback(mock_backend)
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config {
        api_base_url: format!("http://127.0.0.1:{}/", port),
        ..Config::default()
    };
    (ExamApiClient::new(&config).unwrap(), log)
}

fn requests(log: &RequestLog) -> Vec<(String, String)> {
    log.lock()
        .unwrap()
        .iter()
        .map(|(m, p, _)| (m.clone(), p.clone()))
        .collect()
}

fn last_body(log: &RequestLog) -> Value {
    log.lock().unwrap().last().map(|(_, _, b)| b.clone()).unwrap()
}

#[tokio::test]
async fn test_list_exams_embeds_students_and_accepts_numeric_ids() {
    let (client, log) = spawn_backend().await;

    let exams = client.list_exams().await.unwrap();

    assert_eq!(
        requests(&log),
        vec![("GET".to_string(), "/exams?_embed=students".to_string())]
    );
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].id, "1");
    assert_eq!(exams[0].students[0].id, "10");
    assert_eq!(exams[0].students[0].exam_id, "1");
}

#[tokio::test]
async fn test_get_exam_by_id_and_not_found() {
    let (client, log) = spawn_backend().await;

    let exam = client.get_exam("a1").await.unwrap();
    assert_eq!(exam.students.len(), 2);

    let missing = client.get_exam("missing").await.unwrap_err();
    assert!(missing.is_not_found());

    assert_eq!(requests(&log)[0].1, "/exams/a1?_embed=students");
}

#[tokio::test]
async fn test_create_exam_sends_upcoming_status() {
    let (client, log) = spawn_backend().await;

    let new_exam = NewExam {
        examtermin: "vinter 25".to_string(),
        course_name: "Fysik B".to_string(),
        date: "2025-12-18".to_string(),
        ..NewExam::default()
    };
    let created = client.create_exam(&new_exam).await.unwrap();

    assert_eq!(created.id, "new1");
    assert!(created.students.is_empty());
    assert_eq!(
        last_body(&log),
        json!({
            "examtermin": "vinter 25",
            "courseName": "Fysik B",
            "date": "2025-12-18",
            "numberOfQuestions": 10,
            "examDurationMinutes": 20,
            "startTime": "09:00",
            "status": "upcoming"
        })
    );
}

#[tokio::test]
async fn test_update_and_finish_exam() {
    let (client, log) = spawn_backend().await;

    let mut exam = client.get_exam("a1").await.unwrap();
    exam.course_name = "Matematik B".to_string();
    let updated = client.update_exam(&exam).await.unwrap();
    assert_eq!(updated.course_name, "Matematik B");
    assert_eq!(requests(&log)[1], ("PUT".to_string(), "/exams/a1".to_string()));

    let finished = client.finish_exam("a1").await.unwrap();
    assert!(finished.is_finished());
    assert_eq!(last_body(&log), json!({ "status": "finished" }));
    assert_eq!(requests(&log)[2], ("PATCH".to_string(), "/exams/a1".to_string()));
}

#[tokio::test]
async fn test_student_endpoints() {
    let (client, log) = spawn_backend().await;

    let students = client.list_students("a1").await.unwrap();
    assert_eq!(students.len(), 2);

    let mut new_student = NewStudent::new("a1", "s220011", "Freja Jensen");
    new_student.order = 2;
    let created = client.add_student(&new_student).await.unwrap();
    assert_eq!(created.id, "77");
    assert_eq!(
        last_body(&log),
        json!({ "examId": "a1", "studentNo": "s220011", "name": "Freja Jensen", "order": 2 })
    );

    client
        .patch_student_order(&StudentOrder { id: "s2".to_string(), order: 0 })
        .await
        .unwrap();
    assert_eq!(last_body(&log), json!({ "order": 0 }));

    let grading = StudentGrading {
        question_no: 3,
        actual_exam_duration: 18,
        notes: "".to_string(),
        grade: "-3".to_string(),
    };
    let graded = client.grade_student("s1", &grading).await.unwrap();
    assert_eq!(graded.grade.as_deref(), Some("-3"));

    client.delete_student("s1").await.unwrap();

    assert_eq!(
        requests(&log),
        vec![
            ("GET".to_string(), "/students?examId=a1".to_string()),
            ("POST".to_string(), "/students".to_string()),
            ("PATCH".to_string(), "/students/s2".to_string()),
            ("PATCH".to_string(), "/students/s1".to_string()),
            ("DELETE".to_string(), "/students/s1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_server_error_carries_user_message() {
    let (client, _log) = spawn_backend().await;

    let error = client.delete_exam_record("boom").await.unwrap_err();

    assert!(!error.is_not_found());
    assert_eq!(error.user_message(), "无法删除考试");
}

#[tokio::test]
async fn test_cascade_delete_over_http() {
    let (client, log) = spawn_backend().await;
    let service = ExamService::new(Arc::new(client));

    let report = service.delete_exam("a1").await.unwrap();

    assert_eq!(report.students_deleted, 2);
    let mut paths: Vec<(String, String)> = requests(&log);
    assert_eq!(paths.remove(0).1, "/students?examId=a1");
    assert_eq!(paths.pop().unwrap(), ("DELETE".to_string(), "/exams/a1".to_string()));
    paths.sort();
    assert_eq!(
        paths,
        vec![
            ("DELETE".to_string(), "/students/s1".to_string()),
            ("DELETE".to_string(), "/students/s2".to_string()),
        ]
    );
}

#[tokio::test]
#[ignore] // 需要本地运行 json-server：cargo test -- --ignored
async fn test_live_backend_lists_exams() {
    exam_proctor::utils::logging::init(true);

    let config = Config::from_env();
    let client = ExamApiClient::new(&config).expect("创建客户端失败");

    let exams = client.list_exams().await.expect("获取考试列表失败");
    println!("找到 {} 场考试", exams.len());
}
