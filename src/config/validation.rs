//! Configuration validation.
//!
//! # Responsibilities
//! - Check the bind address parses as a socket address
//! - Check both upstream bases are scheme + authority only, so that
//!   appending the inbound path and query yields a well-formed target
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: ProxyConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use axum::http::Uri;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    BindAddress(String),

    #[error("{field}: `{value}` is not an absolute URL")]
    NotAbsolute { field: &'static str, value: String },

    #[error("{field}: scheme must be one of {expected:?}, got `{value}`")]
    Scheme {
        field: &'static str,
        value: String,
        expected: &'static [&'static str],
    },

    #[error("{field}: `{value}` must not carry a path, query or trailing slash")]
    HasPath { field: &'static str, value: String },
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    check_base(
        "upstream.http_base",
        &config.upstream.http_base,
        &["http", "https"],
        &mut errors,
    );
    check_base(
        "upstream.ws_base",
        &config.upstream.ws_base,
        &["ws", "wss"],
        &mut errors,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base(
    field: &'static str,
    value: &str,
    expected: &'static [&'static str],
    errors: &mut Vec<ValidationError>,
) {
    let uri = match value.parse::<Uri>() {
        Ok(uri) if uri.scheme().is_some() && uri.authority().is_some() => uri,
        _ => {
            errors.push(ValidationError::NotAbsolute {
                field,
                value: value.to_string(),
            });
            return;
        }
    };

    let scheme = uri.scheme_str().unwrap_or_default();
    if !expected.contains(&scheme) {
        errors.push(ValidationError::Scheme {
            field,
            value: value.to_string(),
            expected,
        });
    }

    if value.ends_with('/') || uri.path() != "/" || uri.query().is_some() {
        errors.push(ValidationError::HasPath {
            field,
            value: value.to_string(),
        });
    }
}
