//! Basic usage example for the SMM bookmark client
//!
//! This example demonstrates how to:
//! - Create a client with default settings
//! - Look up the CSRF token for a session cookie
//! - Fetch course statistics
//! - Bookmark a course and remove the bookmark again
//!
//! Note: This example requires a valid bookmark site session cookie in `SMM_SESSION`
//! and a course code as first argument.

use smm_bookmark_client::{SmmClient, SmmError};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let session = std::env::var("SMM_SESSION")
        .expect("SMM_SESSION environment variable not set");
    let code = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "1A2B-3C4D-5E6F-7G8H".to_string());

    println!("=== Creating client ===");
    let client = SmmClient::builder()
        .client_builder(
            reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(30))
                .use_rustls_tls(),
        )
        .build()?;
    println!("✓ Client created with custom timeout (30s)");

    println!("\nLooking up CSRF token...");
    let client = match client.with_session(session) {
        Ok(client) => {
            println!("✓ Session is valid");
            client
        }
        Err(SmmError::MissingCredential(_)) => {
            println!("✗ No CSRF token for this session");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("\nFetching statistics for {}...", code);
    let Some(course) = client.get_stats(&code)? else {
        println!("✗ No statistics available");
        return Ok(());
    };
    println!("✓ {} [{}] created {}", course.title, course.course_type, course.created);
    println!("  Clears: {} / {} tries ({})", course.clears, course.tries, course.clear_rate);
    println!("  Players: {}, stars: {}", course.plays, course.stars);
    if let Some(creator) = &course.creator {
        println!("  Creator: {}", creator);
    }
    if let Some(first) = &course.first_clear {
        println!("  First clear: {}", first);
    }

    println!("\nBookmarking...");
    match course.bookmark() {
        Ok(()) => println!("✓ Bookmarked"),
        Err(e) => println!("✗ Failed to bookmark: {}", e),
    }

    println!("\nRemoving bookmark...");
    match course.remove_bookmark() {
        Ok(()) => println!("✓ Bookmark removed"),
        Err(e) => println!("✗ Failed to remove bookmark: {}", e),
    }

    Ok(())
}
