use std::collections::{HashMap, HashSet};

use piggyback_common::ProfileRef;
use regex::Regex;
use tracing::debug;

/// Header variants the profiles worksheet has been seen with. The first
/// non-empty cell among the variants wins.
const LINK_COLUMNS: [&str; 3] = ["X(link)", "X link", "link"];
const HANDLE_COLUMNS: [&str; 4] = ["X(handle)", "X handle", "handle", "Handle"];

/// Link-cell tokens that mean "no value was provided".
const EMPTY_TOKENS: [&str; 3] = ["n/a", "na", "(full link not provided)"];

/// Handle-cell values that are stray domains or scheme fragments rather
/// than account names.
const JUNK_HANDLES: [&str; 6] = ["n/a", "na", "https:", "http:", "x.com", "twitter.com"];

/// Column consulted when none of the recognized headers yields anything.
const FALLBACK_COLUMN: usize = 4;

/// Canonical scrape targets plus the count of candidates dropped by final
/// validation and first-seen dedup. Cleaning-stage drops (sentinels, junk,
/// schemeless fragments) are silent and not counted.
#[derive(Debug, Default)]
pub struct ResolvedProfiles {
    pub profiles: Vec<ProfileRef>,
    pub rejected: usize,
}

/// Turns hand-maintained profile-sheet cells into `https://x.com/<handle>`
/// targets. Cells mix full links and bare handles, several separator
/// conventions, stray `@` prefixes and annotations like `(founder)`.
pub struct ProfileResolver {
    link_split: Regex,
    handle_split: Regex,
    handle_shape: Regex,
    parenthetical: Regex,
}

impl ProfileResolver {
    pub fn new() -> Self {
        Self {
            link_split: Regex::new(r"[\s,|]+").expect("valid link split pattern"),
            handle_split: Regex::new(r"[\n,|/]+").expect("valid handle split pattern"),
            handle_shape: Regex::new(r"^[A-Za-z0-9_]+$").expect("valid handle pattern"),
            parenthetical: Regex::new(r"\s*\([^)]*\)\s*").expect("valid parenthetical pattern"),
        }
    }

    /// Resolve header-keyed records into canonical profile URLs. `raw_rows`
    /// is the same worksheet as a plain grid; it is only consulted when the
    /// recognized header columns produce zero candidates.
    pub fn resolve(
        &self,
        records: &[HashMap<String, String>],
        raw_rows: &[Vec<String>],
    ) -> ResolvedProfiles {
        let mut candidates: Vec<String> = Vec::new();

        for record in records {
            if let Some(cell) = first_cell(record, &LINK_COLUMNS) {
                candidates.extend(self.links_from_cell(cell));
            }
            if let Some(cell) = first_cell(record, &HANDLE_COLUMNS) {
                candidates.extend(self.handles_from_cell(cell));
            }
        }

        // Sheets missing the recognized headers usually still carry a URL in
        // the fifth column.
        if candidates.is_empty() {
            for row in raw_rows.iter().skip(1) {
                if let Some(cell) = row.get(FALLBACK_COLUMN) {
                    if !cell.trim().is_empty() {
                        candidates.extend(self.links_from_cell(cell));
                    }
                }
            }
        }

        let total = candidates.len();
        let mut seen = HashSet::new();
        let mut profiles = Vec::new();
        for candidate in candidates {
            let Some(url) = canonicalize(&candidate) else {
                continue;
            };
            if seen.insert(url.clone()) {
                profiles.push(ProfileRef {
                    handle: handle_from_url(&url),
                    profile_url: url,
                });
            }
        }

        let rejected = total - profiles.len();
        if rejected > 0 {
            debug!(rejected, "Dropped invalid or duplicate profile URLs");
        }

        ResolvedProfiles { profiles, rejected }
    }

    /// Split a link cell into URL candidates. Tokens are de-quoted, empty
    /// markers skipped, `twitter.com` rewritten to `x.com` and schemeless
    /// `x.com/...` forms given an `https://` prefix. Anything that still
    /// does not start with `http` is discarded.
    fn links_from_cell(&self, cell: &str) -> Vec<String> {
        let mut links = Vec::new();
        for token in self.link_split.split(cell) {
            let token = token.replace('\u{a0}', " ");
            let token = token.trim().trim_matches('"').trim_matches('\'');
            if token.is_empty() || EMPTY_TOKENS.contains(&token.to_lowercase().as_str()) {
                continue;
            }
            let token = token.replace("twitter.com", "x.com");
            let token = if token.starts_with("x.com/") || token.starts_with("www.x.com/") {
                format!("https://{token}")
            } else {
                token
            };
            if token.starts_with("http") {
                links.push(token);
            }
        }
        links
    }

    /// Split a handle cell into URL candidates. Handles lose their `@` and
    /// any parenthetical note; what remains must be purely alphanumeric or
    /// underscore to become a profile URL.
    fn handles_from_cell(&self, cell: &str) -> Vec<String> {
        let mut links = Vec::new();
        for token in self.handle_split.split(cell) {
            let token = token.trim().trim_start_matches('@');
            let token = self.parenthetical.replace_all(token, "");
            let token = token.trim();
            if token.is_empty() || JUNK_HANDLES.contains(&token.to_lowercase().as_str()) {
                continue;
            }
            if self.handle_shape.is_match(token) {
                links.push(format!("https://x.com/{token}"));
            }
        }
        links
    }
}

impl Default for ProfileResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn first_cell<'a>(record: &'a HashMap<String, String>, columns: &[&str]) -> Option<&'a str> {
    columns
        .iter()
        .find_map(|c| record.get(*c).map(|v| v.trim()).filter(|v| !v.is_empty()))
}

/// Final gate: non-breaking spaces stripped, `http://` upgraded, and the
/// result must be an `https://` URL on an `x.com` path with no embedded
/// spaces. Returns the canonical form.
fn canonicalize(candidate: &str) -> Option<String> {
    let cleaned = candidate.replace('\u{a0}', " ");
    let cleaned = cleaned.trim();
    if !cleaned.contains("x.com/") {
        return None;
    }
    let cleaned = match cleaned.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => cleaned.to_string(),
    };
    if cleaned.starts_with("https://") && !cleaned.contains(' ') {
        Some(cleaned)
    } else {
        None
    }
}

/// Last path segment of a profile URL: `https://x.com/@nasa/?lang=en`
/// becomes `nasa`.
fn handle_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let last = last.trim_start_matches('@');
    let last = last.split('?').next().unwrap_or(last);
    last.to_string()
}
