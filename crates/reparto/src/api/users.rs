//! Users service: sign-in and the current profile.

use serde::{Deserialize, Serialize};

use super::client::{ApiClient, RequestOptions, Service};
use crate::error::ApiError;

/// Which dashboard a user gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Vendor,
    Supervisor,
    Warehouse,
    Driver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Sign in and store the token in the shared session.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let response: LoginResponse = self
            .client
            .request(
                reqwest::Method::POST,
                Service::Users,
                "/auth/login",
                Some(credentials),
                RequestOptions::anonymous(),
            )
            .await?;
        self.client.session().set_token(response.token);
        tracing::info!(user = %response.user.id, role = ?response.user.role, "signed in");
        Ok(response.user)
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.client.get(Service::Users, "/users/me").await
    }

    pub fn sign_out(&self) {
        self.client.session().sign_out();
    }
}
