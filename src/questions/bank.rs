use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    Answer, AnsweredQuestion, ListQuestions, ListQuestionsRequest, ListQuestionsResponse, Question, QuestionService,
    RpcError, RpcResult, SubmitAnswers, SubmitAnswersRequest, SubmitAnswersResponse,
};

pub const MAX_ANSWER_LEN: usize = 500;

fn q(id: &str, topic: &str, prompt: &str, options: &[&str]) -> Question {
    Question {
        id: id.to_string(),
        topic: topic.to_string(),
        prompt: prompt.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

fn onboarding_survey() -> Vec<Question> {
    vec![
        q("income-frequency", "income", "How often are you paid?", &["weekly", "biweekly", "monthly", "irregular"]),
        q("income-monthly", "income", "Roughly how much do you take home per month?", &[]),
        q("spending-tracking", "spending", "How do you track your spending today?", &["app", "spreadsheet", "not at all"]),
        q("spending-largest", "spending", "Which category do you spend the most on?", &[]),
        q("goals-primary", "goals", "What is your main savings goal?", &["emergency fund", "house", "travel", "retirement", "other"]),
        q("goals-horizon", "goals", "When do you want to reach it?", &["under 1 year", "1-5 years", "over 5 years"]),
    ]
}

/// Questions service state: a fixed question set plus answers per user.
///
/// Every operation is a function of `(user_id, payload)` only; the bank
/// performs no authentication of its own.
pub struct QuestionBank {
    questions: Vec<Question>,
    answers: RwLock<HashMap<String, BTreeMap<String, String>>>,
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::with_questions(onboarding_survey())
    }
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self { questions, answers: RwLock::new(HashMap::new()) }
    }

    fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn list_for(&self, user_id: &str, req: &ListQuestions) -> RpcResult<ListQuestionsResponse> {
        require_user(user_id)?;
        let answers = self.answers.read();
        let mine = answers.get(user_id);
        let questions = self
            .questions
            .iter()
            .filter(|q| req.topic.as_deref().map_or(true, |t| q.topic.eq_ignore_ascii_case(t)))
            .map(|q| AnsweredQuestion {
                question: q.clone(),
                answer: mine.and_then(|m| m.get(&q.id)).cloned(),
            })
            .collect();
        Ok(ListQuestionsResponse { questions })
    }

    /// Validate every answer first; nothing is stored unless all are valid.
    pub fn submit_for(&self, user_id: &str, req: &SubmitAnswers) -> RpcResult<SubmitAnswersResponse> {
        require_user(user_id)?;
        if req.answers.is_empty() {
            return Err(RpcError::InvalidArgument("no answers submitted".to_string()));
        }
        let mut accepted = Vec::with_capacity(req.answers.len());
        for a in &req.answers {
            let question = self
                .question(&a.question_id)
                .ok_or_else(|| RpcError::NotFound(format!("question '{}'", a.question_id)))?;
            let value = a.answer.trim();
            if value.is_empty() {
                return Err(RpcError::InvalidArgument(format!("empty answer for '{}'", a.question_id)));
            }
            if value.chars().count() > MAX_ANSWER_LEN {
                return Err(RpcError::InvalidArgument(format!("answer for '{}' is too long", a.question_id)));
            }
            if !question.options.is_empty() && !question.options.iter().any(|o| o == value) {
                return Err(RpcError::InvalidArgument(format!(
                    "'{}' is not an option for '{}'",
                    value, a.question_id
                )));
            }
            accepted.push((a.question_id.clone(), value.to_string()));
        }

        let mut answers = self.answers.write();
        let mine = answers.entry(user_id.to_string()).or_default();
        mine.extend(accepted);
        let answers = mine
            .iter()
            .map(|(question_id, answer)| Answer { question_id: question_id.clone(), answer: answer.clone() })
            .collect();
        Ok(SubmitAnswersResponse { answers })
    }
}

fn require_user(user_id: &str) -> RpcResult<()> {
    if user_id.trim().is_empty() {
        return Err(RpcError::InvalidArgument("user_id is required".to_string()));
    }
    Ok(())
}

#[async_trait]
impl QuestionService for QuestionBank {
    async fn list_questions(&self, req: ListQuestionsRequest) -> RpcResult<ListQuestionsResponse> {
        self.list_for(req.user_id(), req.payload())
    }

    async fn submit_answers(&self, req: SubmitAnswersRequest) -> RpcResult<SubmitAnswersResponse> {
        self.submit_for(req.user_id(), req.payload())
    }
}
