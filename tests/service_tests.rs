mod common;

use common::{exam_fixture, service, RecordingBackend};
use exam_proctor::error::{AppError, BusinessError};
use exam_proctor::models::{StudentGrading, StudentOrder};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_cascade_delete_removes_students_then_exam() {
    let backend = RecordingBackend::new();
    backend.seed_exam(exam_fixture(
        "e1",
        5,
        10,
        &[("s1", "Freja"), ("s2", "Mads"), ("s3", "Ida")],
    ));
    backend.seed_exam(exam_fixture("e2", 5, 10, &[("s9", "Emil")]));

    let report = service(&backend).delete_exam("e1").await.unwrap();

    assert_eq!(report.students_deleted, 3);
    assert_eq!(report.students_failed, 0);

    let requests = backend.requests();
    assert_eq!(requests.first().map(String::as_str), Some("GET /students?examId=e1"));
    assert_eq!(requests.last().map(String::as_str), Some("DELETE /exams/e1"));
    let mut student_deletes: Vec<&str> = requests
        .iter()
        .map(String::as_str)
        .filter(|r| r.starts_with("DELETE /students/"))
        .collect();
    student_deletes.sort();
    assert_eq!(
        student_deletes,
        vec!["DELETE /students/s1", "DELETE /students/s2", "DELETE /students/s3"]
    );

    assert!(backend.stored_exam("e1").is_none());
    assert!(backend.stored_student("s9").is_some());
}

#[tokio::test]
async fn test_cascade_delete_still_removes_exam_when_a_student_fails() {
    let backend = RecordingBackend::new();
    backend.seed_exam(exam_fixture(
        "e1",
        5,
        10,
        &[("s1", "Freja"), ("s2", "Mads"), ("s3", "Ida")],
    ));
    backend.fail_on("DELETE /students/s2");

    let report = service(&backend).delete_exam("e1").await.unwrap();

    assert_eq!(report.students_deleted, 2);
    assert_eq!(report.students_failed, 1);
    assert!(backend.requests().contains(&"DELETE /exams/e1".to_string()));
    assert!(backend.stored_exam("e1").is_none());
    // 删除失败的考生成为孤儿记录
    assert!(backend.stored_student("s2").is_some());
}

#[tokio::test]
async fn test_cascade_delete_without_students() {
    let backend = RecordingBackend::new();
    backend.seed_exam(exam_fixture("e1", 5, 10, &[]));

    let report = assert_ok!(service(&backend).delete_exam("e1").await);

    assert_eq!(report.students_deleted, 0);
    assert_eq!(
        backend.requests(),
        vec!["GET /students?examId=e1", "DELETE /exams/e1"]
    );
}

#[tokio::test]
async fn test_cascade_delete_fails_when_listing_fails() {
    let backend = RecordingBackend::new();
    backend.seed_exam(exam_fixture("e1", 5, 10, &[("s1", "Freja")]));
    backend.fail_on("GET /students?examId=e1");

    assert_err!(service(&backend).delete_exam("e1").await);
    assert_eq!(backend.requests(), vec!["GET /students?examId=e1"]);
    assert!(backend.stored_exam("e1").is_some());
}

#[tokio::test]
async fn test_order_update_sends_one_patch_per_student() {
    let backend = RecordingBackend::new();
    backend.seed_exam(exam_fixture("e1", 5, 10, &[("s1", "Freja"), ("s2", "Mads")]));

    let orders = vec![
        StudentOrder { id: "s2".to_string(), order: 0 },
        StudentOrder { id: "s1".to_string(), order: 1 },
    ];
    assert_ok!(service(&backend).update_student_order(&orders).await);

    assert_eq!(backend.requests().len(), 2);
    assert_eq!(
        backend.body_of("PATCH /students/s2").unwrap(),
        serde_json::json!({ "order": 0 })
    );
    assert_eq!(backend.stored_student("s1").unwrap().order, 1);
}

#[tokio::test]
async fn test_order_update_partial_failure_keeps_successful_patches() {
    let backend = RecordingBackend::new();
    backend.seed_exam(exam_fixture(
        "e1",
        5,
        10,
        &[("s1", "Freja"), ("s2", "Mads"), ("s3", "Ida")],
    ));
    backend.fail_on("PATCH /students/s3");

    let orders = vec![
        StudentOrder { id: "s3".to_string(), order: 0 },
        StudentOrder { id: "s1".to_string(), order: 1 },
        StudentOrder { id: "s2".to_string(), order: 2 },
    ];
    let result = service(&backend).update_student_order(&orders).await;

    assert!(matches!(
        result,
        Err(AppError::Business(BusinessError::PartialFailure { failed: 1, total: 3 }))
    ));
    assert_eq!(backend.requests().len(), 3);
    assert_eq!(backend.stored_student("s1").unwrap().order, 1);
    assert_eq!(backend.stored_student("s3").unwrap().order, 2);
}

#[tokio::test]
async fn test_order_update_all_failed_returns_backend_error() {
    let backend = RecordingBackend::new();
    backend.seed_exam(exam_fixture("e1", 5, 10, &[("s1", "Freja")]));
    backend.fail_on("PATCH /students/s1");

    let orders = vec![StudentOrder { id: "s1".to_string(), order: 0 }];
    let result = service(&backend).update_student_order(&orders).await;

    assert!(matches!(result, Err(AppError::Api(_))));
}

#[tokio::test]
async fn test_update_student_writes_grading_fields() {
    let backend = RecordingBackend::new();
    backend.seed_exam(exam_fixture("e1", 5, 10, &[("s1", "Freja")]));

    let grading = StudentGrading {
        question_no: 4,
        actual_exam_duration: 9,
        notes: "Sikker".to_string(),
        grade: "00".to_string(),
    };
    let updated = service(&backend).update_student("s1", &grading).await.unwrap();

    assert_eq!(updated.grade.as_deref(), Some("00"));
    assert!(updated.is_graded());
    assert_eq!(updated.numeric_grade(), Some(0));
    assert_eq!(
        backend.body_of("PATCH /students/s1").unwrap(),
        serde_json::json!({
            "questionNo": 4,
            "actualExamDuration": 9,
            "notes": "Sikker",
            "grade": "00"
        })
    );
}

#[tokio::test]
async fn test_update_exam_validates_before_request() {
    let backend = RecordingBackend::new();
    let mut exam = backend.seed_exam(exam_fixture("e1", 5, 10, &[]));
    exam.date = "12/06/2025".to_string();

    let result = service(&backend).update_exam(&exam).await;

    assert!(matches!(
        result,
        Err(AppError::Business(BusinessError::InvalidField { field: "date", .. }))
    ));
    assert!(backend.requests().is_empty());
}
