//! Wire types for the auth surface.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public view of an account. The password hash never leaves the store layer.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A user-correctable input problem, suitable for display next to a form field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Discriminated response body: exactly one of `user` or `errors` is ever
/// present on the wire.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum UserResponse {
    User { user: Account },
    Errors { errors: Vec<FieldError> },
}

impl UserResponse {
    #[must_use]
    pub fn user(account: Account) -> Self {
        Self::User { user: account }
    }

    #[must_use]
    pub fn errors(errors: Vec<FieldError>) -> Self {
        Self::Errors { errors }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[schema(value_type = String)]
    pub password: SecretString,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    #[schema(value_type = String)]
    pub password: SecretString,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub token: String,
    #[schema(value_type = String)]
    pub new_password: SecretString,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn account() -> Account {
        Account {
            id: 1,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            created_at: "2024-01-01 00:00:00+00".to_string(),
            updated_at: "2024-01-01 00:00:00+00".to_string(),
        }
    }

    #[test]
    fn user_response_serializes_only_user() {
        let value = serde_json::to_value(UserResponse::user(account())).unwrap();
        assert!(value.get("user").is_some());
        assert!(value.get("errors").is_none());
        assert_eq!(value["user"]["username"], "alice");
    }

    #[test]
    fn user_response_serializes_only_errors() {
        let response = UserResponse::errors(vec![FieldError::new("username", "username taken")]);
        let value = serde_json::to_value(response).unwrap();
        assert!(value.get("user").is_none());
        assert_eq!(value["errors"][0]["field"], "username");
        assert_eq!(value["errors"][0]["message"], "username taken");
    }

    #[test]
    fn register_request_uses_camel_case_and_redacts_password() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"username":"alice","email":"a@x.com","password":"secret1"}"#,
        )
        .unwrap();
        assert_eq!(request.username, "alice");
        assert_eq!(request.password.expose_secret(), "secret1");
        // Debug output must not leak the plaintext password.
        assert!(!format!("{request:?}").contains("secret1"));
    }

    #[test]
    fn change_password_request_uses_camel_case() {
        let request: ChangePasswordRequest =
            serde_json::from_str(r#"{"token":"t","newPassword":"abcdefg"}"#).unwrap();
        assert_eq!(request.token, "t");
        assert_eq!(request.new_password.expose_secret(), "abcdefg");
    }
}
