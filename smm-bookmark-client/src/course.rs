//! Course statistics records

use crate::client::SmmClient;
use crate::error::SmmError;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Statistics of a single course as reported by the statistics service
///
/// Values are kept as the strings the service returned. Use the typed
/// accessors to parse the numeric ones. A required element that is present
/// but empty, such as `<title/>`, yields an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseStats {
    /// Course title
    pub title: String,
    /// Course code, format `xxxx-xxxx-xxxx-xxxx`
    pub code: String,
    /// Game style name (the `type` element), e.g. `SMW`
    pub course_type: String,
    /// Number of times the course was cleared
    pub clears: String,
    /// Number of attempts, clears included
    pub tries: String,
    /// Number of players who played the course
    pub plays: String,
    /// Clears divided by tries, `"0"` when the service reports none
    pub clear_rate: String,
    /// Number of stars
    pub stars: String,
    /// Creation date
    pub created: String,
    /// Name of the creator
    pub creator: Option<String>,
    /// Name of the first player to clear the course
    pub first_clear: Option<String>,
}

impl CourseStats {
    /// Clears as a number
    pub fn clears_count(&self) -> Option<u64> {
        self.clears.trim().parse().ok()
    }

    /// Tries as a number
    pub fn tries_count(&self) -> Option<u64> {
        self.tries.trim().parse().ok()
    }

    /// Plays as a number
    pub fn plays_count(&self) -> Option<u64> {
        self.plays.trim().parse().ok()
    }

    /// Stars as a number
    pub fn stars_count(&self) -> Option<u64> {
        self.stars.trim().parse().ok()
    }

    /// Clear rate as a number
    ///
    /// The service reports the rate either as a fraction or as a percentage
    /// with a trailing `%`; the latter is returned without conversion.
    pub fn clear_rate_value(&self) -> Option<f64> {
        self.clear_rate.trim().trim_end_matches('%').parse().ok()
    }

    /// Parsed game style, `None` for styles this crate does not know
    pub fn style(&self) -> Option<CourseStyle> {
        self.course_type.parse().ok()
    }
}

/// Game style a course was built in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseStyle {
    /// Super Mario Bros.
    Smb,
    /// Super Mario Bros. 3
    Smb3,
    /// Super Mario World
    Smw,
    /// New Super Mario Bros. U
    Nsmbu,
}

impl CourseStyle {
    /// Style name as used by the statistics service
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStyle::Smb => "SMB",
            CourseStyle::Smb3 => "SMB3",
            CourseStyle::Smw => "SMW",
            CourseStyle::Nsmbu => "NSMBU",
        }
    }
}

impl FromStr for CourseStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SMB" => Ok(CourseStyle::Smb),
            "SMB3" => Ok(CourseStyle::Smb3),
            "SMW" => Ok(CourseStyle::Smw),
            "NSMBU" => Ok(CourseStyle::Nsmbu),
            other => Err(format!("Unknown course style: {}", other)),
        }
    }
}

impl fmt::Display for CourseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A course fetched through an [`SmmClient`]
///
/// Keeps a reference to the client so the course can be bookmarked directly.
/// Field access goes through [`Deref`] to [`CourseStats`].
///
/// # Example
///
/// ```no_run
/// use smm_bookmark_client::SmmClient;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SmmClient::builder()
///     .csrf_token("token")
///     .session("session")
///     .build()?;
///
/// if let Some(course) = client.get_stats("1A2B-3C4D-5E6F-7G8H")? {
///     println!("{} by {:?}", course.title, course.creator);
///     course.bookmark()?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Course<'a> {
    client: &'a SmmClient,
    stats: CourseStats,
}

impl<'a> Course<'a> {
    pub(crate) fn new(client: &'a SmmClient, stats: CourseStats) -> Self {
        Self { client, stats }
    }

    /// The parsed statistics
    pub fn stats(&self) -> &CourseStats {
        &self.stats
    }

    /// Drop the client reference and keep the statistics
    pub fn into_stats(self) -> CourseStats {
        self.stats
    }

    /// Bookmark this course
    ///
    /// Bookmarking an already bookmarked course does nothing.
    pub fn bookmark(&self) -> Result<(), SmmError> {
        self.client.bookmark(&self.stats.code)
    }

    /// Remove the bookmark of this course
    ///
    /// Removing a bookmark that does not exist does nothing.
    pub fn remove_bookmark(&self) -> Result<(), SmmError> {
        self.client.remove_bookmark(&self.stats.code)
    }
}

impl Deref for Course<'_> {
    type Target = CourseStats;

    fn deref(&self) -> &Self::Target {
        &self.stats
    }
}
