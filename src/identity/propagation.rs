//! Carrying the caller's identity across the RPC boundary.
//!
//! Remote services never see the inbound cookie and never re-authenticate;
//! they trust the `user_id` field of the message. That field is therefore only
//! ever filled from an [`Authenticated`] bound by the gate in this request.

use serde::{Deserialize, Serialize};

use super::principal::Authenticated;

/// An outbound RPC message: the subject id plus the method's own payload,
/// flattened into one JSON object on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectCall<P> {
    user_id: String,
    #[serde(flatten)]
    payload: P,
}

impl<P> SubjectCall<P> {
    /// Copy only the subject id (as a string) from the bound identity.
    pub fn propagate(auth: &Authenticated, payload: P) -> Self {
        Self { user_id: auth.subject_id().to_string(), payload }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_parts(self) -> (String, P) {
        (self.user_id, self.payload)
    }
}
