//! Protocol header validation.
//!
//! Inbound requests and outbound responses both carry `{os, version, port,
//! magic}`. The rules differ slightly: a request must name its `magic` and
//! `version`, a response must additionally carry a usable `port`.

use serde::Serialize;
use shared_types::entities::{HEADER_MAGIC, HEADER_OS, HEADER_PORT, HEADER_VERSION};

use super::config::{MAX_MAGIC_LEN, MAX_OS_LEN, MAX_VERSION_LEN};

/// Protocol headers exactly as received, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeaders {
    pub os: Option<String>,
    pub version: Option<String>,
    pub port: Option<String>,
    pub magic: Option<String>,
}

impl RawHeaders {
    /// Collect the protocol headers through a case-insensitive lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            os: lookup(HEADER_OS),
            version: lookup(HEADER_VERSION),
            port: lookup(HEADER_PORT),
            magic: lookup(HEADER_MAGIC),
        }
    }

    /// Integer value of the `port` header when it lies in 1-65535.
    pub fn valid_port(&self) -> Option<u16> {
        parse_port(self.port.as_deref())
    }

    /// `port` header for log lines, `unknown` when not an integer.
    pub fn port_label(&self) -> String {
        self.port
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .map_or_else(|| "unknown".to_string(), |p| p.to_string())
    }
}

/// One schema violation found in a header set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderIssue {
    pub field: &'static str,
    pub message: String,
}

impl HeaderIssue {
    fn missing(field: &'static str) -> Self {
        Self {
            field,
            message: format!("Missing required property: {}", field),
        }
    }

    fn too_long(field: &'static str, max: usize) -> Self {
        Self {
            field,
            message: format!("String is too long (maximum {} characters)", max),
        }
    }
}

/// Headers of an inbound request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    pub os: Option<String>,
    pub version: String,
    pub magic: String,
    /// Advertised listening port, when it is a valid port number.
    pub port: Option<u16>,
}

/// Headers of an outbound response that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisedHeaders {
    pub os: Option<String>,
    pub version: String,
    pub magic: String,
    pub port: u16,
}

/// Validate the headers of an inbound request.
///
/// `os` ≤ 64 (optional), `magic` ≤ 8 and `version` ≤ 11 (both required).
pub fn validate_request_headers(raw: &RawHeaders) -> Result<RequestHeaders, Vec<HeaderIssue>> {
    let mut issues = Vec::new();

    check_optional(&mut issues, HEADER_OS, raw.os.as_deref(), MAX_OS_LEN);
    let magic = check_required(&mut issues, HEADER_MAGIC, raw.magic.as_deref(), MAX_MAGIC_LEN);
    let version = check_required(
        &mut issues,
        HEADER_VERSION,
        raw.version.as_deref(),
        MAX_VERSION_LEN,
    );

    match (magic, version) {
        (Some(magic), Some(version)) if issues.is_empty() => Ok(RequestHeaders {
            os: raw.os.clone(),
            version,
            magic,
            port: raw.valid_port(),
        }),
        _ => Err(issues),
    }
}

/// Validate the headers of a peer's response.
///
/// Same bounds as requests, plus a required `port` in 1-65535.
pub fn validate_response_headers(
    raw: &RawHeaders,
) -> Result<AdvertisedHeaders, Vec<HeaderIssue>> {
    let mut issues = Vec::new();

    check_optional(&mut issues, HEADER_OS, raw.os.as_deref(), MAX_OS_LEN);
    let port = match raw.port.as_deref() {
        None => {
            issues.push(HeaderIssue::missing(HEADER_PORT));
            None
        }
        Some(value) => {
            let port = parse_port(Some(value));
            if port.is_none() {
                issues.push(HeaderIssue {
                    field: HEADER_PORT,
                    message: format!("Expected integer between 1 and 65535, got {:?}", value),
                });
            }
            port
        }
    };
    let magic = check_required(&mut issues, HEADER_MAGIC, raw.magic.as_deref(), MAX_MAGIC_LEN);
    let version = check_required(
        &mut issues,
        HEADER_VERSION,
        raw.version.as_deref(),
        MAX_VERSION_LEN,
    );

    match (port, magic, version) {
        (Some(port), Some(magic), Some(version)) if issues.is_empty() => Ok(AdvertisedHeaders {
            os: raw.os.clone(),
            version,
            magic,
            port,
        }),
        _ => Err(issues),
    }
}

/// Whether a caller port may be written to the Peer Directory.
pub fn is_valid_port(port: i64) -> bool {
    (1..=65535).contains(&port)
}

fn parse_port(value: Option<&str>) -> Option<u16> {
    let port = value?.trim().parse::<i64>().ok()?;
    if is_valid_port(port) {
        u16::try_from(port).ok()
    } else {
        None
    }
}

fn check_optional(issues: &mut Vec<HeaderIssue>, field: &'static str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        if value.chars().count() > max {
            issues.push(HeaderIssue::too_long(field, max));
        }
    }
}

fn check_required(
    issues: &mut Vec<HeaderIssue>,
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    match value {
        None => {
            issues.push(HeaderIssue::missing(field));
            None
        }
        Some(value) if value.chars().count() > max => {
            issues.push(HeaderIssue::too_long(field, max));
            None
        }
        Some(value) => Some(value.to_string()),
    }
}
