use serde::{Deserialize, Serialize};

use crate::errors::StorefrontError;
use crate::models::{Role, User};

use super::{ApiClient, ApiEnvelope};

/// `POST /auth/login` answers bare, not enveloped.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    role: Role,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerDetails {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub address: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<ManagerDetails>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self { lat: 0.0, lng: 0.0 }
    }
}

/// Registration either yields the created account or the server's reason.
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    Created(User),
    Rejected(String),
}

impl ApiClient {
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<LoginResponse, StorefrontError> {
        self.post_bare(
            "/auth/login",
            &LoginRequest {
                email,
                password,
                role,
            },
        )
        .await
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<RegisterOutcome, StorefrontError> {
        let response = self
            .request(reqwest::Method::POST, "/auth/register")?
            .json(input)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(super::api_error(status, &body));
        }

        let envelope: ApiEnvelope<User> = serde_json::from_str(&body)?;
        if envelope.success {
            let user = envelope.data.ok_or_else(|| StorefrontError::Api {
                status: status.as_u16(),
                message: "registration response missing account data".to_string(),
            })?;
            Ok(RegisterOutcome::Created(user))
        } else {
            Ok(RegisterOutcome::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "registration rejected".to_string()),
            ))
        }
    }
}
