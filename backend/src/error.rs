use reqwest::{Response, StatusCode};
use thiserror::Error;

/// Failure talking to a remote service, worded for the person using the map.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No internet connection. Please check your network and try again.")]
    Network(#[source] reqwest::Error),
    #[error("Sorry, {service} is experiencing technical difficulties. Please try again later.")]
    Server { service: &'static str },
    #[error("Something went wrong while fetching data from {service}. Please try again later.")]
    Unexpected {
        service: &'static str,
        status: StatusCode,
    },
    #[error("{service} returned a malformed response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    pub(crate) fn from_request(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode {
                service,
                source: err,
            };
        }
        match err.status() {
            Some(status) => Self::from_status(service, status),
            None => Self::Network(err),
        }
    }

    fn from_status(service: &'static str, status: StatusCode) -> Self {
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            Self::Server { service }
        } else {
            Self::Unexpected { service, status }
        }
    }

    /// Passes successful responses through and classifies the rest.
    pub(crate) fn check(service: &'static str, response: Response) -> Result<Response, Self> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            tracing::warn!("{service} answered {status}");
            Err(Self::from_status(service, status))
        }
    }
}
