//! Error types for the SMM bookmark client

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;

/// Errors that can occur when using the SMM bookmark client
#[derive(Error, Debug)]
pub enum SmmError {
    /// HTTP request failed, or the bookmark site rejected the token request
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A credential required for an authenticated call has not been set
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    /// Bookmarking or removing a bookmark was answered with a non-200 status
    #[error("Error during bookmark operation with \"{code}\": HTTP {}", .response.status)]
    Bookmark {
        /// The level code the operation was performed on
        code: String,
        /// The response returned by the bookmark site
        response: Box<RawResponse>,
    },

    /// `require_stats` found no statistics for the course
    #[error("Course with id \"{code}\" not found")]
    CourseNotFound {
        /// The course id that was looked up
        code: String,
    },

    /// Statistics XML is not well-formed
    #[error("Failed to parse statistics XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Statistics XML ended early, has no single document element, or has text outside it
    #[error("Malformed statistics XML: {0}")]
    MalformedXml(String),

    /// Statistics XML lacks a required element
    #[error("Statistics XML is missing element `{0}`")]
    MissingField(&'static str),

    /// A CDATA section in the statistics XML is not valid UTF-8
    #[error("Statistics XML contains CDATA that is not valid UTF-8")]
    Encoding,

    /// A credential contains bytes that cannot be sent in an HTTP header
    #[error("Invalid {0} header value")]
    InvalidHeader(&'static str),

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),
}

/// Snapshot of an HTTP response kept for error reporting
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Status code of the response
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body, empty if it could not be decoded
    pub body: String,
}

impl RawResponse {
    /// Consume a blocking response, keeping status, headers and body
    pub(crate) fn capture(response: reqwest::blocking::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().unwrap_or_default();
        Self {
            status,
            headers,
            body,
        }
    }
}
