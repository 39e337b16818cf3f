use std::error;
use std::fmt;

pub mod mock;
pub mod render;
pub mod session;
pub mod source;

/// Why one poll failed. Every variant is recoverable: the session logs
/// it and retries on the next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No response reached the server.
    Network(String),
    /// The server answered with a non-2xx status.
    Http { status: u16 },
    /// The response body could not be decoded.
    Parse(String),
    /// The session was stopped while the request was in flight.
    /// Expected during teardown, never user-visible.
    Cancelled,
}

impl error::Error for FetchError {}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Network(why) => write!(f, "network error: {}", why),
            FetchError::Http { status } => {
                write!(f, "tracking endpoint answered {}", status)
            }
            FetchError::Parse(why) => write!(f, "unreadable response: {}", why),
            FetchError::Cancelled => write!(f, "request cancelled"),
        }
    }
}
