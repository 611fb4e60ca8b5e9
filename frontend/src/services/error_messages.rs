use super::data_service::{ErrorCode, ServiceError};

/// Fallback text for codes with no dedicated message
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

const AUTH_ERROR_MESSAGES: &[(&str, &str)] = &[
    ("auth/wrong-password", "Your login and password do not match."),
    ("auth/invalid-credential", "Your login and password do not match."),
    ("auth/user-not-found", "No user found with the specified credentials."),
    ("auth/popup-closed-by-user", "Login process terminated. Please try again."),
    ("auth/too-many-requests", "Request timeout encountered. Please wait and try again later."),
    ("auth/email-already-in-use", "An account with this email already exists."),
    ("auth/operation-not-allowed", "This sign-in method is not available."),
];

/// User-facing text for a failed data service call.
///
/// Unmapped codes fall back to the generic message with the raw code
/// appended so the failure can still be traced.
pub fn message_for(error: &ServiceError) -> String {
    match &error.code {
        ErrorCode::Conflict => "That name has already been used. Please enter another one.".to_string(),
        ErrorCode::PasswordMismatch => "The values of the passwords don't match.".to_string(),
        ErrorCode::NotFound => "The requested item no longer exists.".to_string(),
        ErrorCode::Unauthenticated => "Please sign in to continue.".to_string(),
        ErrorCode::Network => "Unable to reach the server. Please try again later.".to_string(),
        ErrorCode::Auth(code) => AUTH_ERROR_MESSAGES
            .iter()
            .find(|(known, _)| *known == code.as_str())
            .map(|(_, message)| message.to_string())
            .unwrap_or_else(|| fallback_message(code)),
        ErrorCode::Other(code) => fallback_message(code),
    }
}

/// Name collision message for an entity kind ("category", "ledger")
pub fn conflict_message(noun: &str) -> String {
    format!("The {} name has been used. Please enter another one", noun)
}

fn fallback_message(code: &str) -> String {
    format!("{} ({})", GENERIC_ERROR_MESSAGE, code)
}
