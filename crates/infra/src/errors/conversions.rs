//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use smsdesk_domain::SmsDeskError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SmsDeskError);

impl From<InfraError> for SmsDeskError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SmsDeskError> for InfraError {
    fn from(value: SmsDeskError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SmsDeskError */
/* -------------------------------------------------------------------------- */

// Request failures never reach this conversion: the transport turns them into
// `TransportError`. What remains is client construction.
impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(SmsDeskError::Config(format!("invalid HTTP client configuration: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::Client;

    use super::*;

    #[test]
    fn client_builder_failure_maps_to_config_error() {
        let error = Client::builder().user_agent("bad\nagent").build().unwrap_err();

        let mapped: SmsDeskError = InfraError::from(error).into();
        match mapped {
            SmsDeskError::Config(msg) => assert!(msg.starts_with("invalid HTTP client")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn domain_errors_pass_through_unchanged() {
        let original = SmsDeskError::Internal("boom".into());
        let round: SmsDeskError = InfraError::from(original.clone()).into();
        assert_eq!(round, original);
    }
}
