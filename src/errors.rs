use serde::Serialize;

/// Errors surfaced by the wizard core and its collaborators.
///
/// Most of these never reach the end user. Transport failures are logged
/// and dropped and malformed persisted state is treated as absent. Only
/// document and authoring problems stop the process.
#[derive(Debug)]
pub enum WizardError {
    Document(String),
    Authoring(Vec<String>),
    InvalidSelection(String),
    /// A collaborator request that cannot be served as sent.
    BadRequest(String),
    NotFound(String),
    Transport(String),
    Io(std::io::Error),
}

impl WizardError {
    pub fn kind(&self) -> &'static str {
        match self {
            WizardError::Document(_) => "document",
            WizardError::Authoring(_) => "authoring",
            WizardError::InvalidSelection(_) => "invalid_selection",
            WizardError::BadRequest(_) => "bad_request",
            WizardError::NotFound(_) => "not_found",
            WizardError::Transport(_) => "transport",
            WizardError::Io(_) => "io",
        }
    }
}

impl std::fmt::Display for WizardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardError::Document(msg) => write!(f, "wizard document error: {}", msg),
            WizardError::Authoring(problems) => {
                write!(f, "wizard document rejected: {}", problems.join("; "))
            }
            WizardError::InvalidSelection(msg) => write!(f, "invalid selection: {}", msg),
            WizardError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            WizardError::NotFound(msg) => write!(f, "not found: {}", msg),
            WizardError::Transport(msg) => write!(f, "transport error: {}", msg),
            WizardError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for WizardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WizardError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WizardError {
    fn from(e: std::io::Error) -> Self {
        WizardError::Io(e)
    }
}

impl From<serde_yaml::Error> for WizardError {
    fn from(e: serde_yaml::Error) -> Self {
        WizardError::Document(e.to_string())
    }
}

impl From<reqwest::Error> for WizardError {
    fn from(e: reqwest::Error) -> Self {
        WizardError::Transport(e.to_string())
    }
}

/// The data of a failed collaborator response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl From<&WizardError> for ErrorBody {
    fn from(e: &WizardError) -> Self {
        ErrorBody {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authoring_error_lists_every_problem() {
        let error = WizardError::Authoring(vec![
            "step 'size' option 'small' has no recommendations".to_string(),
            "step 'color' has no title".to_string(),
        ]);
        let text = format!("{}", error);
        assert!(text.contains("'size'"));
        assert!(text.contains("'color'"));
        assert_eq!(error.kind(), "authoring");
    }

    #[test]
    fn test_error_body() {
        let error = WizardError::NotFound("content 42".to_string());
        let json = serde_json::to_value(ErrorBody::from(&error)).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["message"], "not found: content 42");
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error;
        let error = WizardError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(error.source().is_some());
        assert_eq!(error.kind(), "io");
    }
}
