use serde::{Deserialize, Serialize};

/// Who a request is, once a credential has been resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectIdentity {
    pub id: String,
    pub username: String,
}

impl SubjectIdentity {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self { id: id.into(), username: username.into() }
    }
}

/// An identity bound by the authentication middleware for the current request.
///
/// Only the gateway can construct one, so holding an `Authenticated` proves the
/// credential was resolved (and the account checked) earlier in this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    identity: SubjectIdentity,
}

impl Authenticated {
    pub(crate) fn bind(identity: SubjectIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &SubjectIdentity {
        &self.identity
    }

    pub fn subject_id(&self) -> &str {
        &self.identity.id
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }
}
