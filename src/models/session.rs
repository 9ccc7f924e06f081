use serde::{Deserialize, Serialize};

/// Durable record of a login waiting for the user's MFA code. This is the
/// hand-off between the begin and verify endpoints; a checkpoint exists for
/// an identity iff a login is awaiting MFA completion, and it is consumed
/// and deleted exactly once when verification succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    pub transaction_id: String,
    pub csrf_token: String,
    pub code_verifier: String,
    pub verification_type: MfaMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_phone: Option<String>,
}

/// MFA channel the provider is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MfaMethod {
    Email,
    Phone,
    Otp,
    Unsupported,
}

impl MfaMethod {
    /// Display-control identifier used in the provider's SendCode and
    /// VerifyCode URLs. OTP has no display control; the code goes straight
    /// to the confirmation post.
    pub fn verification_control(&self) -> Option<&'static str> {
        match self {
            MfaMethod::Email => Some("emailVerificationControl-RO"),
            MfaMethod::Phone => Some("phoneVerificationControl-readOnly"),
            MfaMethod::Otp | MfaMethod::Unsupported => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MfaMethod::Email => "email",
            MfaMethod::Phone => "phone",
            MfaMethod::Otp => "otp",
            MfaMethod::Unsupported => "unsupported",
        }
    }
}
