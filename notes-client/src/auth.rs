use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    gateway::{self, error_for_status},
    session::Session,
    Error, Result,
};

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(Error::validation("Please fill in all fields"));
        }
        if !self.email.contains('@') {
            return Err(Error::validation("Please enter a valid email address"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

/// Login and registration against the users API. Both hand back a fresh
/// [`Session`] on success.
#[derive(Clone)]
pub struct HttpAuthProvider {
    client: Client,
    users_url: String,
}

impl HttpAuthProvider {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(gateway::Error::from)?;

        Ok(Self {
            client,
            users_url: format!("{}/api/users", api_url.trim_end_matches('/')),
        })
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        credentials.validate()?;
        tracing::debug!("logging in");

        self.request_token("login", credentials).await.map_err(|error| match error {
            Error::Unauthorized => Error::validation("Invalid email or password"),
            error => error.not_found_message("User does not exist"),
        })
    }

    pub async fn register(&self, credentials: &Credentials, confirm_password: &str) -> Result<Session> {
        credentials.validate()?;
        if credentials.password != confirm_password {
            return Err(Error::validation("Passwords do not match"));
        }
        tracing::debug!("registering");

        self.request_token("register", credentials).await
    }

    async fn request_token(&self, action: &str, credentials: &Credentials) -> Result<Session> {
        let response = self
            .client
            .post(format!("{}/{action}", self.users_url))
            .json(credentials)
            .send()
            .await
            .map_err(gateway::Error::from)?;
        let response = error_for_status(response).await?;

        let TokenResponse { token } = response.json::<TokenResponse>().await.map_err(gateway::Error::from)?;
        token
            .filter(|t| !t.is_empty())
            .map(Session::new)
            .ok_or_else(|| Error::Unexpected("No token received from server".into()))
    }
}
