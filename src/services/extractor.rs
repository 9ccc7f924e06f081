use regex::Regex;
use std::sync::OnceLock;

use crate::models::MfaMethod;

/// CSRF token and transaction id pulled out of a provider page.
///
/// Both fields are extracted independently and either may be missing;
/// callers must check both before proceeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub csrf_token: Option<String>,
    pub trans_id: Option<String>,
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack).map(|c| c[1].to_string())
}

/// Extract the CSRF token and transaction id embedded in a provider response.
///
/// The upstream payload is a script blob with no guaranteed schema, so this
/// is pattern extraction over semi-structured text, not a JSON parse.
pub fn extract_auth_state(body: &str) -> AuthState {
    static CSRF: OnceLock<Regex> = OnceLock::new();
    static TRANS: OnceLock<Regex> = OnceLock::new();

    let csrf = CSRF.get_or_init(|| Regex::new(r#""csrf":"([^"]+)""#).expect("static pattern"));
    let trans = TRANS.get_or_init(|| Regex::new(r#""transId":"([^"]+)""#).expect("static pattern"));

    AuthState {
        csrf_token: capture(csrf, body),
        trans_id: capture(trans, body),
    }
}

/// Masked phone number shown on the phone-MFA page, e.g. `XXXX-XXX-1234`.
pub fn extract_masked_phone(body: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(XXXX-XXX-\d{4})").expect("static pattern"));
    capture(re, body)
}

/// Authorization code carried in the redirect `Location` header.
pub fn extract_auth_code(location: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"code=(.*)").expect("static pattern"));
    capture(re, location)
}

/// Classify which MFA challenge the provider is presenting. First marker
/// wins, in phone -> email -> otp order; only one method is ever acted on.
pub fn classify_mfa(body: &str) -> MfaMethod {
    if body.contains("phoneVerificationControl") {
        MfaMethod::Phone
    } else if body.contains("emailVerificationControl") {
        MfaMethod::Email
    } else if body.contains("otpCode") {
        MfaMethod::Otp
    } else {
        MfaMethod::Unsupported
    }
}
