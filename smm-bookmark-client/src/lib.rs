//! SMM Bookmark Client Library
//!
//! This library provides a blocking client for the Super Mario Maker Bookmark
//! site and the course statistics service at blar.de.
//!
//! # Features
//!
//! - Course statistics fetching, parsed into a typed record
//! - Bookmarking and removing bookmarks of courses
//! - CSRF token lookup for a session cookie
//! - Secure TLS using rustls (no OpenSSL dependencies)
//! - Credentials zeroized on drop and sent as sensitive headers
//! - Well-typed errors using thiserror
//!
//! # Example
//!
//! ```no_run
//! use smm_bookmark_client::{SmmClient, SmmError};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Your session cookie from supermariomakerbookmark.nintendo.net
//! let session = "your_session_cookie_here";
//!
//! // Look up the CSRF token and keep both as credentials
//! let client = SmmClient::new()?.with_session(session)?;
//!
//! // Fetch statistics
//! match client.get_stats("1A2B-3C4D-5E6F-7G8H")? {
//!     Some(course) => {
//!         println!("{} ({}): {}/{} cleared", course.title, course.course_type, course.clears, course.tries);
//!         course.bookmark()?;
//!     }
//!     None => println!("Course not found"),
//! }
//!
//! // Remove a bookmark
//! match client.remove_bookmark("1A2B-3C4D-5E6F-7G8H") {
//!     Ok(()) => println!("Removed"),
//!     Err(SmmError::Bookmark { code, response }) => {
//!         println!("Could not remove {}: HTTP {}", code, response.status);
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod course;
mod error;
mod parser;

pub use client::{Credentials, SmmClient, SmmClientBuilder};
pub use course::{Course, CourseStats, CourseStyle};
pub use error::{RawResponse, SmmError};
