//! Response parsing utilities for the bookmark site and the statistics service

use crate::course::CourseStats;
use crate::error::SmmError;
use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use regex::Regex;
use std::sync::OnceLock;

/// Namespace of every element in a statistics document
const STATS_NAMESPACE: &[u8] = b"http://namespaces.blar.de/mariomaker";

/// Element paths below the document root, in `CourseStats` field order
const FIELDS: [&str; 11] = [
    "title",
    "code",
    "type",
    "statistics/solved",
    "statistics/tried",
    "statistics/played",
    "statistics/clear-rate",
    "statistics/rated",
    "created",
    "creator/user/name",
    "first/user/name",
];

const TITLE: usize = 0;
const CODE: usize = 1;
const TYPE: usize = 2;
const SOLVED: usize = 3;
const TRIED: usize = 4;
const PLAYED: usize = 5;
const CLEAR_RATE: usize = 6;
const RATED: usize = 7;
const CREATED: usize = 8;
const CREATOR: usize = 9;
const FIRST_CLEAR: usize = 10;

/// Parser for bookmark site pages and statistics documents with a cached token regex
#[derive(Clone, Debug)]
pub(crate) struct ResponseParser {
    csrf_regex: OnceLock<Regex>,
}

/// Text being collected for one field element
struct Capture {
    slot: usize,
    depth: usize,
    text: String,
    child_started: bool,
}

impl ResponseParser {
    /// Create a new parser with an uninitialized cache
    pub fn new() -> Self {
        Self {
            csrf_regex: OnceLock::new(),
        }
    }

    /// Get or compile the CSRF meta tag regex
    fn csrf_regex(&self) -> &Regex {
        self.csrf_regex.get_or_init(|| {
            Regex::new(r#"<meta name="csrf-token" content="(?P<token>[a-zA-Z0-9/=+]+)" />"#)
                .unwrap()
        })
    }

    /// Extract the CSRF token from a bookmark site page
    pub fn extract_csrf_token(&self, html: &str) -> Option<String> {
        let captures = self.csrf_regex().captures(html)?;
        captures.name("token").map(|m| m.as_str().to_string())
    }

    /// Parse a statistics document into a record
    ///
    /// Fields are looked up as direct children along their path, the first
    /// matching element wins. Only elements in the statistics namespace count.
    pub fn parse_course_stats(&self, xml: &str) -> Result<CourseStats, SmmError> {
        let mut reader = NsReader::from_str(xml);
        let mut stack: Vec<Option<String>> = Vec::new();
        let mut values: [Option<String>; FIELDS.len()] = Default::default();
        let mut capture: Option<Capture> = None;
        let mut seen_root = false;

        loop {
            let (ns, event) = reader.read_resolved_event()?;
            match event {
                Event::Start(e) => {
                    open_element(&stack, &mut seen_root)?;
                    if let Some(c) = capture.as_mut() {
                        c.child_started = true;
                    }
                    stack.push(stats_element(&ns, e.local_name().as_ref()));

                    if capture.is_none()
                        && let Some(slot) = field_slot(&stack).filter(|&s| values[s].is_none())
                    {
                        capture = Some(Capture {
                            slot,
                            depth: stack.len(),
                            text: String::new(),
                            child_started: false,
                        });
                    }
                }
                Event::Empty(e) => {
                    open_element(&stack, &mut seen_root)?;
                    if let Some(c) = capture.as_mut() {
                        c.child_started = true;
                    }
                    stack.push(stats_element(&ns, e.local_name().as_ref()));

                    if capture.is_none()
                        && let Some(slot) = field_slot(&stack).filter(|&s| values[s].is_none())
                    {
                        values[slot] = Some(String::new());
                    }
                    stack.pop();
                }
                Event::Text(t) => {
                    if stack.is_empty() && !t.iter().all(u8::is_ascii_whitespace) {
                        return Err(SmmError::MalformedXml(
                            "text outside the root element".to_string(),
                        ));
                    }
                    if let Some(c) = capture.as_mut()
                        && c.depth == stack.len()
                        && !c.child_started
                    {
                        c.text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(t) => {
                    if stack.is_empty() {
                        return Err(SmmError::MalformedXml(
                            "CDATA outside the root element".to_string(),
                        ));
                    }
                    if let Some(c) = capture.as_mut()
                        && c.depth == stack.len()
                        && !c.child_started
                    {
                        c.text
                            .push_str(std::str::from_utf8(&t).map_err(|_| SmmError::Encoding)?);
                    }
                }
                Event::End(_) => {
                    let depth = stack.len();
                    if let Some(c) = capture.take_if(|c| c.depth == depth) {
                        values[c.slot] = Some(c.text);
                    }
                    stack.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(Some(open)) = stack.last() {
            return Err(SmmError::MalformedXml(format!(
                "document ended inside <{}>",
                open
            )));
        }
        if !stack.is_empty() {
            return Err(SmmError::MalformedXml(
                "document ended inside an open element".to_string(),
            ));
        }
        if !seen_root {
            return Err(SmmError::MalformedXml("no root element".to_string()));
        }

        // Empty elements count as absent for optional fields
        let clear_rate = values[CLEAR_RATE]
            .take()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "0".to_string());
        let creator = values[CREATOR].take().filter(|s| !s.is_empty());
        let first_clear = values[FIRST_CLEAR].take().filter(|s| !s.is_empty());

        Ok(CourseStats {
            title: required(&mut values, TITLE)?,
            code: required(&mut values, CODE)?,
            course_type: required(&mut values, TYPE)?,
            clears: required(&mut values, SOLVED)?,
            tries: required(&mut values, TRIED)?,
            plays: required(&mut values, PLAYED)?,
            clear_rate,
            stars: required(&mut values, RATED)?,
            created: required(&mut values, CREATED)?,
            creator,
            first_clear,
        })
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject a second document element
fn open_element(stack: &[Option<String>], seen_root: &mut bool) -> Result<(), SmmError> {
    if stack.is_empty() {
        if *seen_root {
            return Err(SmmError::MalformedXml(
                "more than one root element".to_string(),
            ));
        }
        *seen_root = true;
    }
    Ok(())
}

/// Local name of an element in the statistics namespace, `None` for foreign elements
fn stats_element(ns: &ResolveResult, local_name: &[u8]) -> Option<String> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) if *uri == STATS_NAMESPACE => {
            Some(String::from_utf8_lossy(local_name).into_owned())
        }
        _ => None,
    }
}

/// Index into `FIELDS` for the element on top of the stack
fn field_slot(stack: &[Option<String>]) -> Option<usize> {
    let mut segments = Vec::with_capacity(stack.len());
    for segment in stack.get(1..)? {
        segments.push(segment.as_deref()?);
    }
    let path = segments.join("/");
    FIELDS.iter().position(|field| *field == path)
}

fn required(values: &mut [Option<String>], slot: usize) -> Result<String, SmmError> {
    values[slot].take().ok_or(SmmError::MissingField(FIELDS[slot]))
}
