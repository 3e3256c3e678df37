//! JSON-over-HTTP wire form of the questions RPC.
//!
//! Each method is a `POST /rpc/questions.QuestionService/<Method>` whose body
//! is the request message; failures come back as an [`RpcStatus`] body with a
//! matching HTTP status. No authentication header is sent or checked here:
//! the `user_id` field of the message is the caller's identity.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    ListQuestionsRequest, ListQuestionsResponse, QuestionService, RpcError, RpcResult, SubmitAnswersRequest,
    SubmitAnswersResponse,
};

pub const LIST_QUESTIONS_PATH: &str = "/rpc/questions.QuestionService/ListQuestions";
pub const SUBMIT_ANSWERS_PATH: &str = "/rpc/questions.QuestionService/SubmitAnswers";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcStatus {
    pub code: String,
    pub message: String,
}

impl RpcError {
    pub fn code(&self) -> &'static str {
        match self {
            RpcError::InvalidArgument(_) => "invalid_argument",
            RpcError::NotFound(_) => "not_found",
            RpcError::Unavailable(_) => "unavailable",
            RpcError::Internal(_) => "internal",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            RpcError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            RpcError::NotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RpcError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            RpcError::InvalidArgument(m) | RpcError::NotFound(m) | RpcError::Unavailable(m) | RpcError::Internal(m) => {
                m.clone()
            }
        }
    }

    pub fn from_status(status: RpcStatus) -> Self {
        match status.code.as_str() {
            "invalid_argument" => RpcError::InvalidArgument(status.message),
            "not_found" => RpcError::NotFound(status.message),
            "unavailable" => RpcError::Unavailable(status.message),
            _ => RpcError::Internal(status.message),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = RpcStatus { code: self.code().to_string(), message: self.message() };
        (self.http_status(), Json(status)).into_response()
    }
}

async fn list_questions(
    State(service): State<Arc<dyn QuestionService>>,
    Json(req): Json<ListQuestionsRequest>,
) -> Result<Json<ListQuestionsResponse>, RpcError> {
    tracing::debug!(user_id = req.user_id(), "rpc ListQuestions");
    service.list_questions(req).await.map(Json)
}

async fn submit_answers(
    State(service): State<Arc<dyn QuestionService>>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<Json<SubmitAnswersResponse>, RpcError> {
    tracing::debug!(user_id = req.user_id(), count = req.payload().answers.len(), "rpc SubmitAnswers");
    service.submit_answers(req).await.map(Json)
}

/// Serve `service` on the RPC paths.
pub fn rpc_router(service: Arc<dyn QuestionService>) -> Router {
    Router::new()
        .route(LIST_QUESTIONS_PATH, post(list_questions))
        .route(SUBMIT_ANSWERS_PATH, post(submit_answers))
        .route("/health", axum::routing::get(|| async { "ok" }))
        .with_state(service)
}

/// Remote [`QuestionService`] reached over HTTP.
#[derive(Clone)]
pub struct HttpQuestionClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpQuestionClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    async fn call<Req, Resp>(&self, path: &str, req: &Req) -> RpcResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(req)
            .send()
            .await
            .map_err(|e| RpcError::Unavailable(format!("{path}: {e}")))?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<Resp>()
                .await
                .map_err(|e| RpcError::Internal(format!("{path}: undecodable response: {e}")));
        }
        match response.json::<RpcStatus>().await {
            Ok(body) => Err(RpcError::from_status(body)),
            Err(_) if status == StatusCode::SERVICE_UNAVAILABLE => {
                Err(RpcError::Unavailable(format!("{path}: upstream returned {status}")))
            }
            Err(_) => Err(RpcError::Internal(format!("{path}: upstream returned {status}"))),
        }
    }
}

#[async_trait]
impl QuestionService for HttpQuestionClient {
    async fn list_questions(&self, req: ListQuestionsRequest) -> RpcResult<ListQuestionsResponse> {
        self.call(LIST_QUESTIONS_PATH, &req).await
    }

    async fn submit_answers(&self, req: SubmitAnswersRequest) -> RpcResult<SubmitAnswersResponse> {
        self.call(SUBMIT_ANSWERS_PATH, &req).await
    }
}
