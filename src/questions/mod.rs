//! Onboarding survey questions, served by a separate service over RPC.
//!
//! The gateway only depends on [`QuestionService`]; whether the implementation
//! is the remote [`rpc::HttpQuestionClient`] or an in-process [`QuestionBank`]
//! is a deployment choice. Either way every call is scoped by the
//! `user_id` carried in [`SubjectCall`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::SubjectCall;

mod bank;
pub mod rpc;

pub use bank::QuestionBank;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub topic: String,
    pub prompt: String,
    /// Allowed answers; empty means free text.
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListQuestions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnsweredQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListQuestionsResponse {
    pub questions: Vec<AnsweredQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitAnswers {
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitAnswersResponse {
    /// Everything the user has answered so far, after applying this call.
    pub answers: Vec<Answer>,
}

pub type ListQuestionsRequest = SubjectCall<ListQuestions>;
pub type SubmitAnswersRequest = SubjectCall<SubmitAnswers>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub type RpcResult<T> = Result<T, RpcError>;

/// RPC contract of the questions service.
#[async_trait]
pub trait QuestionService: Send + Sync {
    async fn list_questions(&self, req: ListQuestionsRequest) -> RpcResult<ListQuestionsResponse>;
    async fn submit_answers(&self, req: SubmitAnswersRequest) -> RpcResult<SubmitAnswersResponse>;
}
