use axum::extract::{Query, State};
use axum::Json;
use tracing::warn;

use super::AppState;
use crate::error::{api_bad_gateway, api_not_found, api_validation_error, ApiError, ApiJson};
use crate::identity::{Authenticated, SubjectCall};
use crate::observability::CurrentRequestId;
use crate::questions::{ListQuestions, ListQuestionsResponse, RpcError, SubmitAnswers, SubmitAnswersResponse};

fn from_rpc(err: RpcError, subject_id: &str) -> ApiError {
    match err {
        RpcError::InvalidArgument(m) => api_validation_error(&m),
        RpcError::NotFound(m) => api_not_found(&m),
        RpcError::Unavailable(_) | RpcError::Internal(_) => {
            warn!(user_id = %subject_id, error = %err, "questions service call failed");
            api_bad_gateway("questions service unavailable")
        }
    }
}

pub(crate) async fn list_questions(
    State(state): State<AppState>,
    auth: Authenticated,
    CurrentRequestId(rid): CurrentRequestId,
    Query(query): Query<ListQuestions>,
) -> Result<Json<ListQuestionsResponse>, ApiError> {
    let call = SubjectCall::propagate(&auth, query);
    state
        .questions
        .list_questions(call)
        .await
        .map(Json)
        .map_err(|e| from_rpc(e, auth.subject_id()).with_request_id(rid))
}

pub(crate) async fn submit_answers(
    State(state): State<AppState>,
    auth: Authenticated,
    CurrentRequestId(rid): CurrentRequestId,
    ApiJson(body): ApiJson<SubmitAnswers>,
) -> Result<Json<SubmitAnswersResponse>, ApiError> {
    let call = SubjectCall::propagate(&auth, body);
    state
        .questions
        .submit_answers(call)
        .await
        .map(Json)
        .map_err(|e| from_rpc(e, auth.subject_id()).with_request_id(rid))
}
