//! Version string arithmetic
//!
//! A version is split into up to three numeric components followed by a
//! free-text qualifier:
//! - `1.2.3` -> major `1`, minor `2`, micro `3`, no qualifier
//! - `1.2.beta2` -> major `1`, minor `2`, qualifier `beta2`
//! - `1.2.1.Final-jboss-8` -> qualifier `Final-jboss-8`, build number `8`
//!
//! Components that are absent default to `0` when the version is rendered in
//! its OSGi form (`major.minor.micro.qualifier`).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

const SNAPSHOT: &str = "SNAPSHOT";

/// Up to three numeric groups separated by runs of non-alphanumerics, then the rest.
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:[^A-Za-z0-9]+(\d+)(?:[^A-Za-z0-9]+(\d+))?)?(.*)$")
        .expect("version pattern is valid")
});

/// Trailing numeric run of a qualifier, optionally preceded by `.` or `-`.
static BUILD_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(.*)[.\-])?(\d+)$").expect("build number pattern is valid"));

static OSGI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.\d+(?:\.\d+(?:\.[A-Za-z0-9_\-]+)?)?)?$").expect("OSGi pattern is valid")
});

/// A parsed version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    raw: String,
    major: Option<String>,
    minor: Option<String>,
    micro: Option<String>,
    qualifier: String,
}

impl Version {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();

        let (major, minor, micro, rest) = match VERSION_RE.captures(&raw) {
            Some(caps) => {
                let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
                let rest = caps.get(4).map_or("", |m| m.as_str());
                (group(1), group(2), group(3), rest)
            }
            None => (None, None, None, raw.as_str()),
        };
        let qualifier = rest.trim_start_matches(is_separator).to_string();

        Self {
            major,
            minor,
            micro,
            qualifier,
            raw,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> &str {
        self.major.as_deref().unwrap_or("0")
    }

    pub fn minor(&self) -> &str {
        self.minor.as_deref().unwrap_or("0")
    }

    pub fn micro(&self) -> &str {
        self.micro.as_deref().unwrap_or("0")
    }

    /// The full qualifier, including any snapshot marker.
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// Numeric components padded to three, for comparing versions written differently.
    pub fn numeric_components(&self) -> [u64; 3] {
        let parse = |s: &str| s.parse::<u64>().unwrap_or(u64::MAX);
        [parse(self.major()), parse(self.minor()), parse(self.micro())]
    }

    /// True when a qualifier other than the snapshot marker is present.
    pub fn has_qualifier(&self) -> bool {
        !self.release_qualifier().is_empty()
    }

    pub fn is_snapshot(&self) -> bool {
        strip_snapshot(&self.raw).len() != self.raw.len()
    }

    /// The trailing numeric run of the qualifier, if any.
    pub fn build_number(&self) -> Option<&str> {
        BUILD_NUMBER_RE
            .captures(self.release_qualifier())
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str())
    }

    pub fn build_number_value(&self) -> Option<u64> {
        self.build_number().and_then(|n| n.parse().ok())
    }

    /// The qualifier with the snapshot marker and build number removed.
    ///
    /// `Final-jboss-8` -> `Final-jboss`, `redhat-00001` -> `redhat`, `4` -> ``.
    pub fn qualifier_prefix(&self) -> &str {
        let qualifier = self.release_qualifier();
        match BUILD_NUMBER_RE.captures(qualifier) {
            Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
            None => qualifier,
        }
    }

    pub fn is_valid_osgi(&self) -> bool {
        OSGI_RE.is_match(&self.raw)
    }

    /// Render as `major.minor.micro.qualifier`.
    ///
    /// Without a qualifier only the components actually written are emitted,
    /// so `1` stays `1`. Characters OSGi does not allow in a qualifier become `-`.
    pub fn to_osgi_string(&self) -> String {
        if self.major.is_none() && self.qualifier.is_empty() {
            return self.raw.clone();
        }

        if self.qualifier.is_empty() {
            return [&self.major, &self.minor, &self.micro]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(".");
        }

        let qualifier: String = self
            .qualifier
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect();

        format!(
            "{}.{}.{}.{}",
            self.major(),
            self.minor(),
            self.micro(),
            qualifier
        )
    }

    /// Append an alignment suffix such as `redhat-1` to the qualifier.
    ///
    /// When the qualifier already ends with the suffix text the version is left
    /// alone, except that a build number carried by the suffix replaces the
    /// existing one. A snapshot marker stays at the end.
    pub fn append_qualifier_suffix(&mut self, suffix: &str) -> &mut Self {
        let suffix = suffix.trim_start_matches(is_separator);
        if suffix.is_empty() {
            return self;
        }

        let suffix_version = Version::new(format!("0.{suffix}"));
        let (suffix_base, suffix_build) = match suffix_version.build_number() {
            Some(build) => (suffix_version.qualifier_prefix(), Some(build)),
            None => (suffix, None),
        };

        let present = ends_with_segment(self.release_qualifier(), suffix_base)
            || ends_with_segment(self.qualifier_prefix(), suffix_base);
        if present {
            if let Some(build) = suffix_build {
                let build = build.to_string();
                self.set_build_number(&build);
            }
            return self;
        }

        let release = strip_snapshot(&self.raw);
        let marker = &self.raw[release.len()..];
        let appended = if self.has_qualifier() {
            format!("{release}-{suffix}{marker}")
        } else {
            format!(
                "{}.{}.{}.{suffix}{marker}",
                self.major(),
                self.minor(),
                self.micro()
            )
        };

        *self = Version::new(appended);
        self
    }

    /// Replace the trailing build number, or append one when there is none.
    ///
    /// Qualifier text before the number is preserved, as is zero padding:
    /// `redhat-00001` with `2` becomes `redhat-00002`.
    pub fn set_build_number(&mut self, build_number: &str) -> &mut Self {
        let release = strip_snapshot(&self.raw);
        let marker = &self.raw[release.len()..];

        let updated = match self.build_number() {
            Some(existing) => {
                let padded = pad_like(existing, build_number);
                format!(
                    "{}{padded}{marker}",
                    &release[..release.len() - existing.len()]
                )
            }
            None if self.has_qualifier() => format!("{release}-{build_number}{marker}"),
            None => format!(
                "{}.{}.{}.{build_number}{marker}",
                self.major(),
                self.minor(),
                self.micro()
            ),
        };

        *self = Version::new(updated);
        self
    }

    pub fn remove_snapshot(&mut self) -> &mut Self {
        if self.is_snapshot() {
            *self = Version::new(strip_snapshot(&self.raw).to_string());
        }
        self
    }

    /// Highest build number among `candidates` that share this version's
    /// numeric components and qualifier prefix.
    ///
    /// For `0.0.4.redhat-0` and candidates `0.0.1`, `0.0.4.redhat-2` this is `2`.
    pub fn find_highest_matching_build_number<I, S>(&self, candidates: I) -> Option<u64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let numbers = self.numeric_components();
        let prefix = self.qualifier_prefix();

        candidates
            .into_iter()
            .filter_map(|candidate| {
                let candidate = Version::new(candidate.as_ref());
                if candidate.numeric_components() != numbers || candidate.qualifier_prefix() != prefix
                {
                    return None;
                }
                candidate.build_number_value()
            })
            .max()
    }

    fn release_qualifier(&self) -> &str {
        strip_snapshot(&self.qualifier)
    }
}

impl From<&str> for Version {
    fn from(raw: &str) -> Self {
        Version::new(raw)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_separator(c: char) -> bool {
    !c.is_ascii_alphanumeric()
}

/// Strip a trailing `SNAPSHOT` marker (any case) and the separator before it.
fn strip_snapshot(value: &str) -> &str {
    let Some(start) = value.len().checked_sub(SNAPSHOT.len()) else {
        return value;
    };
    match value.get(start..) {
        Some(tail) if tail.eq_ignore_ascii_case(SNAPSHOT) => {
            let head = &value[..start];
            head.strip_suffix(is_separator).unwrap_or(head)
        }
        _ => value,
    }
}

/// `haystack` ends with `needle` on a segment boundary.
fn ends_with_segment(haystack: &str, needle: &str) -> bool {
    match haystack.strip_suffix(needle) {
        Some(head) => head.is_empty() || head.ends_with(is_separator),
        None => false,
    }
}

fn pad_like(existing: &str, replacement: &str) -> String {
    let zero_padded = existing.len() > 1 && existing.starts_with('0');
    if zero_padded && replacement.chars().all(|c| c.is_ascii_digit()) {
        format!("{replacement:0>width$}", width = existing.len())
    } else {
        replacement.to_string()
    }
}
