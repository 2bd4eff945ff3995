use crate::error::{Result, SessionError};
use serde::Deserialize;
use serde_json::Value;

pub const CODE_GOOD: &str = "PAYMENT_DATA_CODE_GOOD";
pub const TWO_FA_GOOD: &str = "PAYMENT_DATA_2FA_GOOD";
pub const AUTH_GOOD: &str = "PAYMENT_DATA_AUTH_GOOD";
pub const TAN_GOOD: &str = "PAYMENT_DATA_TAN_GOOD";
pub const SECRET_GOOD: &str = "PAYMENT_DATA_SECRET_GOOD";
pub const SUPPORT: &str = "PAYMENT_DATA_SUPPORT";
pub const BAD: &str = "PAYMENT_DATA_BAD";

/// The verification step a server-side "good" outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStep {
    Code,
    TwoFactor,
    Auth,
    Tan,
    Secret,
}

impl VerificationStep {
    pub const ALL: [VerificationStep; 5] = [
        VerificationStep::Code,
        VerificationStep::TwoFactor,
        VerificationStep::Auth,
        VerificationStep::Tan,
        VerificationStep::Secret,
    ];

    pub fn event_name(&self) -> &'static str {
        match self {
            VerificationStep::Code => CODE_GOOD,
            VerificationStep::TwoFactor => TWO_FA_GOOD,
            VerificationStep::Auth => AUTH_GOOD,
            VerificationStep::Tan => TAN_GOOD,
            VerificationStep::Secret => SECRET_GOOD,
        }
    }
}

/// An outcome pushed by the server for a pending submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationEvent {
    Good { step: VerificationStep, kind: String },
    SupportRequested,
    Bad,
}

#[derive(Deserialize)]
struct GoodPayload {
    #[serde(rename = "type")]
    kind: String,
}

impl VerificationEvent {
    /// Decodes an event from its wire name and optional JSON payload.
    pub fn from_wire(name: &str, payload: Option<&Value>) -> Result<Self> {
        match name {
            SUPPORT => return Ok(VerificationEvent::SupportRequested),
            BAD => return Ok(VerificationEvent::Bad),
            _ => {}
        }

        let step = VerificationStep::ALL
            .into_iter()
            .find(|step| step.event_name() == name)
            .ok_or_else(|| SessionError::UnknownEvent(name.to_string()))?;

        let payload = payload.cloned().unwrap_or(Value::Null);
        let GoodPayload { kind } = serde_json::from_value(payload)?;
        Ok(VerificationEvent::Good { step, kind })
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            VerificationEvent::Good { step, .. } => step.event_name(),
            VerificationEvent::SupportRequested => SUPPORT,
            VerificationEvent::Bad => BAD,
        }
    }

    pub fn payload(&self) -> Option<Value> {
        match self {
            VerificationEvent::Good { kind, .. } => Some(serde_json::json!({ "type": kind })),
            _ => None,
        }
    }
}
