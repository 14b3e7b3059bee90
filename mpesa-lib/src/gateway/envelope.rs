use serde::{Deserialize, Serialize};

use crate::{MpesaError, Result};

/// `output_ResponseCode` value signalling success.
pub const SUCCESS_CODE: &str = "INS-0";

/// Response body returned by every OpenAPI call.
///
/// Only the code and description are interpreted; all other fields are kept
/// verbatim in [`extra`](Self::extra).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// `output_ResponseCode`
    #[serde(
        rename = "output_ResponseCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_code: Option<String>,

    /// `output_ResponseDesc`
    #[serde(
        rename = "output_ResponseDesc",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub response_desc: Option<String>,

    /// Remaining fields (`output_ConversationID`, `output_TransactionID`, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResponseEnvelope {
    /// Whether the gateway reported success.
    pub fn is_success(&self) -> bool {
        self.response_code.as_deref() == Some(SUCCESS_CODE)
    }

    /// Return `self` on success, or the gateway's own description as an error.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(MpesaError::api(self.response_code, self.response_desc))
        }
    }

    /// A string field from the remaining body, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(serde_json::Value::as_str)
    }

    /// `output_ConversationID`
    pub fn conversation_id(&self) -> Option<&str> {
        self.field("output_ConversationID")
    }

    /// `output_TransactionID`
    pub fn transaction_id(&self) -> Option<&str> {
        self.field("output_TransactionID")
    }

    /// `output_ThirdPartyConversationID`
    pub fn third_party_conversation_id(&self) -> Option<&str> {
        self.field("output_ThirdPartyConversationID")
    }
}
