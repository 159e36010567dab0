//! Transient-vs-fatal failure classification.

use crate::gremlin::{ErrorKind, GremlinError};

/// Marker looked for in error text when no structured kind applies.
const CLOSED_BY_SERVER: &str = "closed by server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Remote side dropped the connection; reconnect and retry.
    Transient,
    /// Everything else; surface immediately.
    Fatal,
}

pub fn classify(err: &GremlinError) -> FailureClass {
    if err.kind() == ErrorKind::ConnectionClosed {
        return FailureClass::Transient;
    }
    if err.to_string().to_ascii_lowercase().contains(CLOSED_BY_SERVER) {
        return FailureClass::Transient;
    }
    FailureClass::Fatal
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_structured_close_is_transient() {
        assert_eq!(classify(&GremlinError::closed(None)), FailureClass::Transient);
        assert_eq!(classify(&GremlinError::ClosedLocally), FailureClass::Transient);
    }

    #[test]
    fn test_message_fallback() {
        let err = GremlinError::Transport("Connection was Closed By Server.".into());
        assert_eq!(classify(&err), FailureClass::Transient);
    }

    #[test]
    fn test_other_failures_are_fatal() {
        let malformed = GremlinError::Server {
            code: 597,
            message: "malformed query".into(),
        };
        assert_eq!(classify(&malformed), FailureClass::Fatal);
        assert_eq!(classify(&GremlinError::Timeout(Duration::from_secs(1))), FailureClass::Fatal);
        assert_eq!(classify(&GremlinError::Auth("denied".into())), FailureClass::Fatal);
        assert_eq!(
            classify(&GremlinError::Connect {
                endpoint: "wss://x".into(),
                message: "refused".into()
            }),
            FailureClass::Fatal
        );
    }
}
