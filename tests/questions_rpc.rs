//! Questions routes: the gate in front of them, subject propagation into the
//! RPC message, and the HTTP client against a live RPC server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use parking_lot::Mutex;
use serde_json::json;

use common::*;
use pocketbook::questions::rpc::{rpc_router, HttpQuestionClient};
use pocketbook::questions::{
    ListQuestionsRequest, ListQuestionsResponse, QuestionBank, QuestionService, RpcResult, SubmitAnswersRequest,
    SubmitAnswersResponse,
};
use pocketbook::users::UserRepository;

/// Records the subject of every call and answers with empty results.
#[derive(Default)]
struct RecordingService {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl QuestionService for RecordingService {
    async fn list_questions(&self, req: ListQuestionsRequest) -> RpcResult<ListQuestionsResponse> {
        self.seen.lock().push(req.user_id().to_string());
        Ok(ListQuestionsResponse { questions: vec![] })
    }

    async fn submit_answers(&self, req: SubmitAnswersRequest) -> RpcResult<SubmitAnswersResponse> {
        self.seen.lock().push(req.user_id().to_string());
        Ok(SubmitAnswersResponse { answers: req.payload().answers.clone() })
    }
}

async fn spawn_rpc_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, rpc_router(Arc::new(QuestionBank::new()))).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn questions_require_authentication() {
    let recorder = Arc::new(RecordingService::default());
    let app = test_app_with_questions(Scheme::Signed, recorder.clone());

    let resp = send(&app, get_with_cookie("/api/v1/questions", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = send(&app, json_request("POST", "/api/v1/questions/answers", json!({"answers": []}))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(recorder.seen.lock().is_empty());
}

#[tokio::test]
async fn calls_carry_the_authenticated_subject_id() {
    let recorder = Arc::new(RecordingService::default());
    let app = test_app_with_questions(Scheme::Signed, recorder.clone());
    let alice = sign_up(&app, "alice", "correct-horse").await;
    let bob = sign_up(&app, "bob", "correct-horse").await;

    send(&app, get_with_cookie("/api/v1/questions", Some(&alice))).await;
    let body = json!({"answers": [{"question_id": "goals-primary", "answer": "house"}]});
    send(&app, with_cookie(json_request("POST", "/api/v1/questions/answers", body), &bob)).await;

    let alice_id = app.users.find_by_username("alice").await.unwrap().id.to_string();
    let bob_id = app.users.find_by_username("bob").await.unwrap().id.to_string();
    assert_eq!(*recorder.seen.lock(), vec![alice_id, bob_id]);
}

#[tokio::test]
async fn answers_are_kept_per_user() {
    let app = test_app(Scheme::Signed);
    let alice = sign_up(&app, "alice", "correct-horse").await;
    let bob = sign_up(&app, "bob", "correct-horse").await;

    let body = json!({"answers": [{"question_id": "income-frequency", "answer": "monthly"}]});
    let resp = send(&app, with_cookie(json_request("POST", "/api/v1/questions/answers", body), &alice)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, get_with_cookie("/api/v1/questions?topic=income", Some(&alice))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = read_json(resp).await;
    let questions = listed["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    let frequency = questions.iter().find(|q| q["id"] == "income-frequency").unwrap();
    assert_eq!(frequency["answer"], "monthly");

    let resp = send(&app, get_with_cookie("/api/v1/questions?topic=income", Some(&bob))).await;
    let listed = read_json(resp).await;
    assert!(listed["questions"].as_array().unwrap().iter().all(|q| q["answer"].is_null()));
}

#[tokio::test]
async fn service_errors_map_to_http_statuses() {
    let app = test_app(Scheme::Signed);
    let alice = sign_up(&app, "alice", "correct-horse").await;

    let bad_option = json!({"answers": [{"question_id": "goals-horizon", "answer": "tomorrow"}]});
    let resp = send(&app, with_cookie(json_request("POST", "/api/v1/questions/answers", bad_option), &alice)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let unknown = json!({"answers": [{"question_id": "no-such-question", "answer": "x"}]});
    let resp = send(&app, with_cookie(json_request("POST", "/api/v1/questions/answers", unknown), &alice)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn answers_body_of_the_wrong_shape_is_a_validation_error() {
    let app = test_app(Scheme::Signed);
    let alice = sign_up(&app, "alice", "correct-horse").await;

    let body = json!({"answers": "monthly"});
    let resp = send(&app, with_cookie(json_request("POST", "/api/v1/questions/answers", body), &alice)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await["code"], "validation_error");
}

#[tokio::test]
async fn http_client_round_trips_through_the_rpc_server() {
    let base = spawn_rpc_server().await;
    let client = HttpQuestionClient::new(&base, Duration::from_secs(5)).unwrap();
    let app = test_app_with_questions(Scheme::Signed, Arc::new(client));
    let alice = sign_up(&app, "alice", "correct-horse").await;

    let body = json!({"answers": [{"question_id": "spending-largest", "answer": "  groceries "}]});
    let resp = send(&app, with_cookie(json_request("POST", "/api/v1/questions/answers", body), &alice)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        read_json(resp).await["answers"],
        json!([{"question_id": "spending-largest", "answer": "groceries"}])
    );

    let bad = json!({"answers": [{"question_id": "spending-tracking", "answer": "abacus"}]});
    let resp = send(&app, with_cookie(json_request("POST", "/api/v1/questions/answers", bad), &alice)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rpc_server_rejects_calls_without_a_subject() {
    let base = spawn_rpc_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/rpc/questions.QuestionService/ListQuestions"))
        .json(&json!({"user_id": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let status: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(status["code"], "invalid_argument");
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let client = HttpQuestionClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    let app = test_app_with_questions(Scheme::Signed, Arc::new(client));
    let alice = sign_up(&app, "alice", "correct-horse").await;

    let resp = send(&app, get_with_cookie("/api/v1/questions", Some(&alice))).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(read_json(resp).await["code"], "upstream_error");
}
