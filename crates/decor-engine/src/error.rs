use decor_contracts::access::AccessDenied;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    AccessDenied(#[from] AccessDenied),

    #[error("image conversion failed: {0}")]
    ImageConversion(String),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("image API request failed ({}): {body}", status_label(.status))]
    Api { status: Option<u16>, body: String },

    #[error("image API response did not match the expected schema: {0}")]
    Decoding(String),

    #[error("invalid generation parameters: {0}")]
    InvalidParameters(String),

    #[error("generation cancelled by caller")]
    Cancelled,
}

impl GenerationError {
    /// Stable tag used in session events.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::AccessDenied(_) => "access_denied",
            GenerationError::ImageConversion(_) => "image_conversion",
            GenerationError::InvalidUrl(_) => "invalid_url",
            GenerationError::Api { .. } => "api_error",
            GenerationError::Decoding(_) => "decoding",
            GenerationError::InvalidParameters(_) => "invalid_parameters",
            GenerationError::Cancelled => "cancelled",
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            GenerationError::Api { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    status
        .map(|code| code.to_string())
        .unwrap_or_else(|| "transport".to_string())
}

#[cfg(test)]
mod tests {
    use decor_contracts::access::AccessDenied;

    use super::GenerationError;

    #[test]
    fn access_denied_converts_and_keeps_subscribe_message() {
        let err = GenerationError::from(AccessDenied);
        assert_eq!(err.kind(), "access_denied");
        assert!(err.to_string().contains("subscribe"));
    }

    #[test]
    fn api_error_display_names_status_or_transport() {
        let http = GenerationError::Api {
            status: Some(429),
            body: "rate limited".to_string(),
        };
        assert_eq!(http.to_string(), "image API request failed (429): rate limited");
        assert_eq!(http.status_code(), Some(429));

        let transport = GenerationError::Api {
            status: None,
            body: "connection refused".to_string(),
        };
        assert_eq!(
            transport.to_string(),
            "image API request failed (transport): connection refused"
        );
    }
}
