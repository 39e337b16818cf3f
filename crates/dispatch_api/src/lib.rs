use std::error;
use std::fmt;
use std::sync::Arc;

use tracking::FetchError;

pub mod client;
pub mod orders;
pub mod tracking_source;

#[derive(Debug, Clone)]
pub enum ApiError {
    RequestError(Arc<reqwest::Error>),
    JsonError(Arc<serde_json::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
    Cancelled,
    Other(String),
}

impl error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            ApiError::JsonError(e) => write!(f, "JSON parse error: {}", e),
            ApiError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => {
                    write!(f, "Invalid Response ({}) {}: {}", status_code, text, url)
                }
                None => write!(f, "Invalid Response ({}) {}", status_code, url),
            },
            ApiError::Cancelled => write!(f, "request cancelled"),
            ApiError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::RequestError(Arc::new(e))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::JsonError(Arc::new(e))
    }
}

impl From<ApiError> for FetchError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::RequestError(why) => {
                if why.is_decode() {
                    FetchError::Parse(why.to_string())
                } else {
                    FetchError::Network(why.to_string())
                }
            }
            ApiError::JsonError(why) => FetchError::Parse(why.to_string()),
            ApiError::InvalidResponse { status_code, .. } => FetchError::Http {
                status: status_code.as_u16(),
            },
            ApiError::Cancelled => FetchError::Cancelled,
            ApiError::Other(why) => FetchError::Network(why),
        }
    }
}
