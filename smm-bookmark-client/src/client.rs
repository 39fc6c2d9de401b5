//! SMM bookmark client implementation

use crate::course::{Course, CourseStats};
use crate::error::{RawResponse, SmmError};
use crate::parser::ResponseParser;
use reqwest::StatusCode;
use reqwest::header::HeaderValue;
use std::fmt;
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

/// Name of the bookmark site's session cookie
const SESSION_COOKIE: &str = "_supermariomakerbookmark_session";

/// Header carrying the anti-forgery token on state-changing requests
const CSRF_HEADER: &str = "X-CSRF-Token";

const DEFAULT_BASE_URL: &str = "https://supermariomakerbookmark.nintendo.net/";
const DEFAULT_STATS_URL: &str = "http://www.blar.de/smm/fetch";

/// Credentials for the bookmark site
///
/// Both values are wiped from memory when dropped and never printed by `Debug`.
#[derive(Clone, Default)]
pub struct Credentials {
    csrf_token: Option<Zeroizing<String>>,
    session: Option<Zeroizing<String>>,
}

impl Credentials {
    /// Create credentials from an anti-forgery token and a session id
    pub fn new(csrf_token: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            csrf_token: Some(Zeroizing::new(csrf_token.into())),
            session: Some(Zeroizing::new(session.into())),
        }
    }

    /// The anti-forgery token, if set
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref().map(String::as_str)
    }

    /// The session id, if set
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref().map(String::as_str)
    }

    /// Whether both values are present
    pub fn is_complete(&self) -> bool {
        self.csrf_token.is_some() && self.session.is_some()
    }

    /// Both values, or the name of the first missing one
    fn require(&self) -> Result<(&str, &str), SmmError> {
        let session = self
            .session()
            .ok_or(SmmError::MissingCredential("session"))?;
        let csrf_token = self
            .csrf_token()
            .ok_or(SmmError::MissingCredential("csrf_token"))?;
        Ok((csrf_token, session))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "<redacted>"))
            .field("session", &self.session.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The main SMM bookmark client
///
/// Fetches course statistics from the statistics service and bookmarks courses
/// on the Super Mario Maker Bookmark site. Bookmarking needs a session id and the
/// CSRF token belonging to it; the token can be fetched with
/// [`SmmClient::token_for_session`] or [`SmmClient::with_session`].
///
/// # Example
///
/// ```no_run
/// use smm_bookmark_client::SmmClient;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SmmClient::new()?.with_session("your_session_cookie")?;
///
/// if let Some(course) = client.get_stats("1A2B-3C4D-5E6F-7G8H")? {
///     println!("{} ({} stars)", course.title, course.stars);
/// }
///
/// client.bookmark("1A2B-3C4D-5E6F-7G8H")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SmmClient {
    client: reqwest::blocking::Client,
    base_url: reqwest::Url,
    stats_url: reqwest::Url,
    credentials: Credentials,
    parser: ResponseParser,
}

impl SmmClient {
    /// Create a new client with default settings and no credentials
    ///
    /// # Errors
    ///
    /// Returns `SmmError::ClientInit` if the HTTP client cannot be initialized.
    ///
    /// # Example
    ///
    /// ```
    /// use smm_bookmark_client::SmmClient;
    ///
    /// let client = SmmClient::new().expect("Failed to create client");
    /// assert!(!client.has_credentials());
    /// ```
    pub fn new() -> Result<Self, SmmError> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use smm_bookmark_client::SmmClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = SmmClient::builder()
    ///     .base_url("http://localhost:1234")?
    ///     .stats_url("http://localhost:1234/smm/fetch")?
    ///     .csrf_token("token")
    ///     .session("session")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> SmmClientBuilder {
        SmmClientBuilder::new()
    }

    /// The credentials this client sends with authenticated requests
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether both the CSRF token and the session id are set
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_complete()
    }

    /// Replace the credentials of this client
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    /// Create a sensitive cookie header value from a session id
    ///
    /// The temporary cookie string is zeroized after use.
    fn create_cookie_header(session: &str) -> Result<HeaderValue, SmmError> {
        let mut cookie_string = format!("{}={}", SESSION_COOKIE, session);
        let header_value = HeaderValue::from_bytes(cookie_string.as_bytes());
        cookie_string.zeroize();

        let mut sensitive_header =
            header_value.map_err(|_| SmmError::InvalidHeader("session cookie"))?;
        sensitive_header.set_sensitive(true);
        Ok(sensitive_header)
    }

    /// Create a sensitive CSRF header value
    fn create_csrf_header(token: &str) -> Result<HeaderValue, SmmError> {
        let mut header_value =
            HeaderValue::from_str(token).map_err(|_| SmmError::InvalidHeader(CSRF_HEADER))?;
        header_value.set_sensitive(true);
        Ok(header_value)
    }

    /// Build `{base_url}/{segments...}`
    fn site_url(&self, segments: &[&str]) -> Result<reqwest::Url, SmmError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SmmError::ClientInit("Cannot modify base URL path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch the CSRF token belonging to a session
    ///
    /// Loads the bookmark site's front page with the session cookie and reads the
    /// token from its `csrf-token` meta tag.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(token))` - The page carried a token
    /// * `Ok(None)` - The page had no `csrf-token` meta tag
    ///
    /// # Errors
    ///
    /// * `SmmError::Request` - Network error, a non-2xx status, or the body could not be read
    ///
    /// # Example
    ///
    /// ```no_run
    /// use smm_bookmark_client::SmmClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = SmmClient::new()?;
    /// match client.token_for_session("your_session_cookie")? {
    ///     Some(token) => println!("Token: {}", token),
    ///     None => println!("No token on the page, is the session valid?"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn token_for_session(&self, session: &str) -> Result<Option<String>, SmmError> {
        let cookie_header = Self::create_cookie_header(session)?;

        debug!(url = %self.base_url, "fetching csrf token");
        let response = self
            .client
            .get(self.base_url.clone())
            .header(reqwest::header::COOKIE, cookie_header)
            .send()?
            .error_for_status()?;

        let html = response.text()?;
        let token = self.parser.extract_csrf_token(&html);
        if token.is_none() {
            warn!("bookmark site page has no csrf-token meta tag");
        }
        Ok(token)
    }

    /// Fetch the CSRF token for a session and use both as this client's credentials
    ///
    /// # Errors
    ///
    /// * `SmmError::MissingCredential` - The site returned no token for the session
    /// * Any error of [`SmmClient::token_for_session`]
    pub fn with_session(mut self, session: impl Into<String>) -> Result<Self, SmmError> {
        let session = Zeroizing::new(session.into());
        let token = self
            .token_for_session(&session)?
            .ok_or(SmmError::MissingCredential("csrf_token"))?;

        self.credentials = Credentials {
            csrf_token: Some(Zeroizing::new(token)),
            session: Some(session),
        };
        Ok(self)
    }

    /// Fetch statistics for a course
    ///
    /// # Arguments
    ///
    /// * `course_id` - The course code, format `xxxx-xxxx-xxxx-xxxx`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(course))` - Statistics of the course
    /// * `Ok(None)` - The statistics service answered with a status other than 200
    ///
    /// # Errors
    ///
    /// * `SmmError::Request` - Network error, or the body could not be read
    /// * `SmmError::Xml`, `SmmError::MalformedXml`, `SmmError::MissingField` - The
    ///   statistics document could not be parsed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use smm_bookmark_client::SmmClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = SmmClient::new()?;
    /// match client.get_stats("1A2B-3C4D-5E6F-7G8H")? {
    ///     Some(course) => println!("{}: {} clears", course.title, course.clears),
    ///     None => println!("No statistics available"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_stats(&self, course_id: &str) -> Result<Option<Course<'_>>, SmmError> {
        let stats = self.fetch_stats(course_id)?;
        Ok(stats.map(|stats| Course::new(self, stats)))
    }

    /// Fetch statistics for a course, treating missing data as an error
    ///
    /// # Errors
    ///
    /// * `SmmError::CourseNotFound` - The statistics service has no data for the course
    /// * Any error of [`SmmClient::get_stats`]
    pub fn require_stats(&self, course_id: &str) -> Result<Course<'_>, SmmError> {
        self.get_stats(course_id)?
            .ok_or_else(|| SmmError::CourseNotFound {
                code: course_id.to_string(),
            })
    }

    fn fetch_stats(&self, course_id: &str) -> Result<Option<CourseStats>, SmmError> {
        let mut url = self.stats_url.clone();
        url.query_pairs_mut().append_pair("code", course_id);

        debug!(%url, "fetching course statistics");
        let response = self.client.get(url).send()?;

        // Any status other than 200 means the service has no data for the course
        if response.status() != StatusCode::OK {
            warn!(course_id, status = %response.status(), "no course statistics");
            return Ok(None);
        }

        let xml = response.text()?;
        let stats = self.parser.parse_course_stats(&xml)?;
        debug!(course_id, title = %stats.title, "parsed course statistics");
        Ok(Some(stats))
    }

    /// Bookmark a course
    ///
    /// Bookmarking an already bookmarked course succeeds without changes.
    ///
    /// # Errors
    ///
    /// * `SmmError::MissingCredential` - Token or session not set; no request is sent
    /// * `SmmError::Bookmark` - The site answered with a status other than 200
    /// * `SmmError::Request` - Network error
    pub fn bookmark(&self, level_code: &str) -> Result<(), SmmError> {
        let url = self.site_url(&["courses", level_code, "play_at_later"])?;
        self.send_authenticated(reqwest::Method::POST, url, level_code)
    }

    /// Remove the bookmark of a course
    ///
    /// Removing a bookmark that does not exist succeeds without changes.
    ///
    /// # Errors
    ///
    /// Same as [`SmmClient::bookmark`].
    pub fn remove_bookmark(&self, level_code: &str) -> Result<(), SmmError> {
        let url = self.site_url(&["bookmarks", level_code])?;
        self.send_authenticated(reqwest::Method::DELETE, url, level_code)
    }

    fn send_authenticated(
        &self,
        method: reqwest::Method,
        url: reqwest::Url,
        level_code: &str,
    ) -> Result<(), SmmError> {
        let (csrf_token, session) = self.credentials.require()?;
        let cookie_header = Self::create_cookie_header(session)?;
        let csrf_header = Self::create_csrf_header(csrf_token)?;

        debug!(%method, %url, level_code, "sending bookmark request");
        let response = self
            .client
            .request(method, url)
            .header(reqwest::header::COOKIE, cookie_header)
            .header(CSRF_HEADER, csrf_header)
            .send()?;

        if response.status() != StatusCode::OK {
            warn!(level_code, status = %response.status(), "bookmark request rejected");
            return Err(SmmError::Bookmark {
                code: level_code.to_string(),
                response: Box::new(RawResponse::capture(response)),
            });
        }

        Ok(())
    }
}

/// Builder for configuring an SMM bookmark client
///
/// # Example
///
/// ```no_run
/// use smm_bookmark_client::SmmClient;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Default client, no credentials
/// let client = SmmClient::builder().build()?;
///
/// // Mock server for testing
/// let client = SmmClient::builder()
///     .base_url("http://localhost:1234")?
///     .stats_url("http://localhost:1234/smm/fetch")?
///     .build()?;
///
/// // Credentials and a custom timeout
/// let client = SmmClient::builder()
///     .csrf_token("token")
///     .session("session")
///     .client_builder(
///         reqwest::blocking::Client::builder()
///             .timeout(Duration::from_secs(10))
///     )
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SmmClientBuilder {
    base_url: Option<reqwest::Url>,
    stats_url: Option<reqwest::Url>,
    credentials: Credentials,
    client_builder: Option<reqwest::blocking::ClientBuilder>,
}

impl SmmClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bookmark site URL
    ///
    /// Defaults to `https://supermariomakerbookmark.nintendo.net/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn base_url(mut self, url: impl reqwest::IntoUrl) -> Result<Self, SmmError> {
        self.base_url = Some(url.into_url()?);
        Ok(self)
    }

    /// Set the statistics endpoint URL; the course id is appended as `code` query parameter
    ///
    /// Defaults to `http://www.blar.de/smm/fetch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn stats_url(mut self, url: impl reqwest::IntoUrl) -> Result<Self, SmmError> {
        self.stats_url = Some(url.into_url()?);
        Ok(self)
    }

    /// Set the anti-forgery token sent in the `X-CSRF-Token` header
    pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
        self.credentials.csrf_token = Some(Zeroizing::new(token.into()));
        self
    }

    /// Set the session id sent in the bookmark site's session cookie
    pub fn session(mut self, session: impl Into<String>) -> Self {
        self.credentials.session = Some(Zeroizing::new(session.into()));
        self
    }

    /// Set both credentials at once
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set a custom HTTP client builder (timeouts, proxies, etc.)
    pub fn client_builder(mut self, builder: reqwest::blocking::ClientBuilder) -> Self {
        self.client_builder = Some(builder);
        self
    }

    /// Build the client with the configured settings
    ///
    /// # Errors
    ///
    /// Returns `SmmError::ClientInit` if the HTTP client cannot be initialized.
    pub fn build(self) -> Result<SmmClient, SmmError> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => reqwest::Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| SmmError::ClientInit(e.to_string()))?,
        };
        let stats_url = match self.stats_url {
            Some(url) => url,
            None => reqwest::Url::parse(DEFAULT_STATS_URL)
                .map_err(|e| SmmError::ClientInit(e.to_string()))?,
        };

        let builder = self
            .client_builder
            .unwrap_or_else(|| reqwest::blocking::Client::builder().use_rustls_tls());
        let client = builder
            .build()
            .map_err(|e| SmmError::ClientInit(e.to_string()))?;

        Ok(SmmClient {
            client,
            base_url,
            stats_url,
            credentials: self.credentials,
            parser: ResponseParser::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use proptest::prelude::*;

    const STATS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<level xmlns="http://namespaces.blar.de/mariomaker">
  <title>Test Level</title>
  <code>1A2B-3C4D-5E6F-7G8H</code>
  <type>SMW</type>
  <created>2016-01-01</created>
  <creator><user><name>Alice</name></user></creator>
  <statistics>
    <solved>10</solved>
    <tried>20</tried>
    <played>50</played>
    <rated>3</rated>
  </statistics>
</level>"#;

    fn mock_client(server: &mockito::Server) -> SmmClientBuilder {
        SmmClient::builder()
            .base_url(server.url())
            .unwrap()
            .stats_url(format!("{}/smm/fetch", server.url()))
            .unwrap()
    }

    #[test]
    fn test_default_urls() {
        let client = SmmClient::new().unwrap();
        assert_eq!(
            client.base_url.as_str(),
            "https://supermariomakerbookmark.nintendo.net/"
        );
        assert_eq!(client.stats_url.as_str(), "http://www.blar.de/smm/fetch");
        assert!(!client.has_credentials());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(SmmClient::builder().base_url("not a valid url").is_err());
        assert!(SmmClient::builder().stats_url("not a valid url").is_err());
    }

    #[test]
    fn test_site_url_construction() {
        let client = SmmClient::new().unwrap();
        let url = client
            .site_url(&["courses", "1A2B-3C4D-5E6F-7G8H", "play_at_later"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://supermariomakerbookmark.nintendo.net/courses/1A2B-3C4D-5E6F-7G8H/play_at_later"
        );

        let prefixed = SmmClient::builder()
            .base_url("http://localhost:1234/smm/")
            .unwrap()
            .build()
            .unwrap();
        let url = prefixed.site_url(&["bookmarks", "0000-0000-0000-0001"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:1234/smm/bookmarks/0000-0000-0000-0001"
        );
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials::new("secret-token", "secret-session");
        let printed = format!("{:?}", credentials);
        assert!(!printed.contains("secret-token"));
        assert!(!printed.contains("secret-session"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_token_for_session() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/")
            .match_header(
                "cookie",
                "_supermariomakerbookmark_session=my-session",
            )
            .with_status(200)
            .with_body(r#"<html><head><meta name="csrf-token" content="abc123" /></head></html>"#)
            .expect(1)
            .create();

        let client = mock_client(&server).build().unwrap();
        let token = client.token_for_session("my-session").unwrap();
        assert_eq!(token, Some("abc123".to_string()));
        mock.assert();
    }

    #[test]
    fn test_token_for_session_without_meta_tag() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html><head><title>Sign in</title></head></html>")
            .expect(1)
            .create();

        let client = mock_client(&server).build().unwrap();
        assert_eq!(client.token_for_session("my-session").unwrap(), None);
        mock.assert();
    }

    #[test]
    fn test_with_session_sets_credentials() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"<meta name="csrf-token" content="t0k+en/=" />"#)
            .expect(1)
            .create();

        let client = mock_client(&server)
            .build()
            .unwrap()
            .with_session("my-session")
            .unwrap();
        assert!(client.has_credentials());
        assert_eq!(client.credentials().csrf_token(), Some("t0k+en/="));
        assert_eq!(client.credentials().session(), Some("my-session"));
        mock.assert();
    }

    #[test]
    fn test_with_session_without_token() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/").with_status(200).create();

        let result = mock_client(&server).build().unwrap().with_session("s");
        assert!(matches!(
            result,
            Err(SmmError::MissingCredential("csrf_token"))
        ));
    }

    #[test]
    fn test_get_stats() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/smm/fetch")
            .match_query(Matcher::UrlEncoded(
                "code".into(),
                "1A2B-3C4D-5E6F-7G8H".into(),
            ))
            .with_status(200)
            .with_body(STATS_XML)
            .expect(1)
            .create();

        let client = mock_client(&server).build().unwrap();
        let course = client.get_stats("1A2B-3C4D-5E6F-7G8H").unwrap().unwrap();
        assert_eq!(course.title, "Test Level");
        assert_eq!(course.clear_rate, "0");
        assert_eq!(course.creator.as_deref(), Some("Alice"));
        assert_eq!(course.first_clear, None);
        mock.assert();
    }

    #[test]
    fn test_get_stats_malformed_xml() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/smm/fetch")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<level><title>Broken</level>")
            .create();

        let client = mock_client(&server).build().unwrap();
        assert!(matches!(
            client.get_stats("1A2B-3C4D-5E6F-7G8H"),
            Err(SmmError::Xml(_))
        ));
    }

    /// Serve one response that announces a longer body than it sends
    fn truncated_body_server() -> (String, std::thread::JoinHandle<()>) {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n<level>");
        });
        (url, handle)
    }

    #[test]
    fn test_get_stats_truncated_body_is_transport_error() {
        let (url, handle) = truncated_body_server();
        let client = SmmClient::builder()
            .stats_url(format!("{}/smm/fetch", url))
            .unwrap()
            .build()
            .unwrap();

        let result = client.get_stats("1A2B-3C4D-5E6F-7G8H");
        assert!(
            matches!(result, Err(SmmError::Request(_))),
            "Expected SmmError::Request, got {:?}",
            result
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_token_for_session_truncated_body_is_transport_error() {
        let (url, handle) = truncated_body_server();
        let client = SmmClient::builder().base_url(url).unwrap().build().unwrap();

        let result = client.token_for_session("my-session");
        assert!(
            matches!(result, Err(SmmError::Request(_))),
            "Expected SmmError::Request, got {:?}",
            result
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_require_stats_not_found() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/smm/fetch")
            .match_query(Matcher::Any)
            .with_status(404)
            .create();

        let client = mock_client(&server).build().unwrap();
        match client.require_stats("0000-0000-0000-0000") {
            Err(SmmError::CourseNotFound { code }) => assert_eq!(code, "0000-0000-0000-0000"),
            other => panic!("Expected CourseNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_bookmark_sends_credentials() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/courses/1A2B-3C4D-5E6F-7G8H/play_at_later")
            .match_header("x-csrf-token", "token")
            .match_header("cookie", "_supermariomakerbookmark_session=session")
            .with_status(200)
            .expect(1)
            .create();

        let client = mock_client(&server)
            .csrf_token("token")
            .session("session")
            .build()
            .unwrap();
        client.bookmark("1A2B-3C4D-5E6F-7G8H").unwrap();
        mock.assert();
    }

    #[test]
    fn test_remove_bookmark_sends_credentials() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("DELETE", "/bookmarks/1A2B-3C4D-5E6F-7G8H")
            .match_header("x-csrf-token", "token")
            .match_header("cookie", "_supermariomakerbookmark_session=session")
            .with_status(200)
            .expect(1)
            .create();

        let client = mock_client(&server)
            .credentials(Credentials::new("token", "session"))
            .build()
            .unwrap();
        client.remove_bookmark("1A2B-3C4D-5E6F-7G8H").unwrap();
        mock.assert();
    }

    #[test]
    fn test_no_credentials_never_touch_network() {
        let mut server = mockito::Server::new();
        let post_mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .expect(0)
            .create();
        let delete_mock = server
            .mock("DELETE", Matcher::Any)
            .with_status(200)
            .expect(0)
            .create();

        let client = mock_client(&server).build().unwrap();
        assert!(!client.has_credentials());
        assert!(matches!(
            client.bookmark("1A2B-3C4D-5E6F-7G8H"),
            Err(SmmError::MissingCredential(_))
        ));
        assert!(matches!(
            client.remove_bookmark("1A2B-3C4D-5E6F-7G8H"),
            Err(SmmError::MissingCredential(_))
        ));
        post_mock.assert();
        delete_mock.assert();
    }

    #[test]
    fn test_invalid_credential_header() {
        let client = SmmClient::builder()
            .csrf_token("bad\ntoken")
            .session("session")
            .build()
            .unwrap();
        assert!(matches!(
            client.bookmark("1A2B-3C4D-5E6F-7G8H"),
            Err(SmmError::InvalidHeader(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        #[test]
        fn prop_stats_non_200_is_no_data(
            course_id in "[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}",
            status_code in prop::sample::select(vec![201, 301, 400, 403, 404, 500, 502, 503]),
        ) {
            let mut server = mockito::Server::new();
            let mock = server.mock("GET", "/smm/fetch")
                .match_query(Matcher::UrlEncoded("code".into(), course_id.clone()))
                .with_status(status_code)
                .with_body("<html>not xml</html")
                .expect(1)
                .create();

            let client = mock_client(&server).build().unwrap();
            let result = client.get_stats(&course_id);
            prop_assert!(result.is_ok(), "non-200 must not be an error");
            prop_assert!(result.unwrap().is_none());
            mock.assert();
        }

        #[test]
        fn prop_missing_credentials_never_touch_network(
            level_code in "[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}",
            has_token in prop::bool::ANY,
            remove in prop::bool::ANY,
        ) {
            let mut server = mockito::Server::new();
            let post_mock = server.mock("POST", Matcher::Any)
                .with_status(200)
                .expect(0)
                .create();
            let delete_mock = server.mock("DELETE", Matcher::Any)
                .with_status(200)
                .expect(0)
                .create();

            // At most one of the two credentials is set
            let builder = mock_client(&server);
            let builder = if has_token {
                builder.csrf_token("token")
            } else {
                builder.session("session")
            };
            let client = builder.build().unwrap();

            let result = if remove {
                client.remove_bookmark(&level_code)
            } else {
                client.bookmark(&level_code)
            };
            prop_assert!(matches!(result, Err(SmmError::MissingCredential(_))));
            post_mock.assert();
            delete_mock.assert();
        }

        #[test]
        fn prop_bookmark_non_200_carries_level_code(
            level_code in "[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}",
            status_code in prop::sample::select(vec![201, 302, 400, 401, 403, 404, 422, 500, 503]),
        ) {
            let mut server = mockito::Server::new();
            let path = format!("/courses/{}/play_at_later", level_code);
            let mock = server.mock("POST", path.as_str())
                .with_status(status_code)
                .with_body("rejected")
                .expect(1)
                .create();

            let client = mock_client(&server)
                .csrf_token("token")
                .session("session")
                .build()
                .unwrap();

            match client.bookmark(&level_code) {
                Err(SmmError::Bookmark { code, response }) => {
                    prop_assert_eq!(code, level_code);
                    prop_assert_eq!(response.status.as_u16(), status_code as u16);
                }
                other => prop_assert!(false, "Expected SmmError::Bookmark, got {:?}", other),
            }
            mock.assert();
        }
    }
}
