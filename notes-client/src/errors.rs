use crate::gateway;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    // validation
    #[error("validation: {0}")]
    Validation(String),

    #[error("not_found: {0}")]
    NotFound(String),

    // auth
    #[error("unauthorized")]
    Unauthorized,

    #[error("fetch: {message}")]
    Fetch { status: Option<u16>, message: String },

    #[error("invalid_transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Config(#[from] envy::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),

    // other
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn not_found_message(self, message: impl Into<String>) -> Self {
        if matches!(self, Self::NotFound(_)) {
            return Self::NotFound(message.into());
        }
        self
    }
}

impl From<gateway::Error> for Error {
    fn from(error: gateway::Error) -> Self {
        match error {
            gateway::Error::Status { status: 401 | 403, .. } => Self::Unauthorized,
            gateway::Error::Status { status: 404, response } => {
                Self::NotFound(response.and_then(|r| r.message).unwrap_or_else(|| "Not found".into()))
            }
            gateway::Error::Status { status, response } => Self::Fetch {
                status: Some(status),
                message: response
                    .and_then(|r| r.message.or(r.error))
                    .unwrap_or_else(|| format!("gateway responded with status {status}")),
            },
            gateway::Error::Reqwest(error) => Self::Fetch {
                status: error.status().map(|s| s.as_u16()),
                message: error.to_string(),
            },
            gateway::Error::EmptyBody(what) => Self::Fetch {
                status: None,
                message: format!("gateway returned no {what}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ErrorResponse;

    fn status(status: u16, message: Option<&str>) -> gateway::Error {
        gateway::Error::Status {
            status,
            response: message.map(|m| ErrorResponse {
                message: Some(m.into()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn auth_statuses_map_to_unauthorized() {
        assert!(Error::from(status(401, None)).is_unauthorized());
        assert!(Error::from(status(403, Some("forbidden"))).is_unauthorized());
    }

    #[test]
    fn not_found_keeps_gateway_message() {
        let error = Error::from(status(404, Some("Note 7 not found")));
        assert!(matches!(error, Error::NotFound(ref m) if m == "Note 7 not found"));

        let error = Error::from(status(404, None)).not_found_message("Note not found");
        assert!(matches!(error, Error::NotFound(ref m) if m == "Note not found"));
    }

    #[test]
    fn other_statuses_are_fetch_errors() {
        let error = Error::from(status(500, None));
        assert!(matches!(error, Error::Fetch { status: Some(500), .. }));

        let error = Error::from(status(400, Some("title is required")));
        assert!(matches!(error, Error::Fetch { ref message, .. } if message == "title is required"));
    }
}
