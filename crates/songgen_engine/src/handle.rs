use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

pub const HANDLE_PREFIX: &str = "generated-song-";
pub const HANDLE_EXTENSION: &str = "mp3";

const MAX_HANDLE_LEN: usize = 255;

/// Source of unix-epoch milliseconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("result handle is empty")]
    Empty,
    #[error("result handle is longer than {max} bytes")]
    TooLong { max: usize },
    #[error("result handle contains forbidden character {0:?}")]
    ForbiddenChar(char),
    #[error("result handle {0:?} is not a plain file name")]
    NotAFileName(String),
}

/// Opaque identifier of a generated artifact; always a safe plain file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultHandle(String);

impl ResultHandle {
    pub fn parse(raw: &str) -> Result<Self, HandleError> {
        if raw.is_empty() {
            return Err(HandleError::Empty);
        }
        if raw.len() > MAX_HANDLE_LEN {
            return Err(HandleError::TooLong {
                max: MAX_HANDLE_LEN,
            });
        }
        if let Some(c) = raw.chars().find(|c| is_forbidden(*c)) {
            return Err(HandleError::ForbiddenChar(c));
        }
        let stem = raw.split('.').next().unwrap_or(raw);
        if raw.trim_matches('.').is_empty() || raw.ends_with(['.', ' ']) || is_reserved_name(stem) {
            return Err(HandleError::NotAFileName(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResultHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Issues `generated-song-<millis>.mp3` handles, never the same one twice.
///
/// When the clock has not moved past the last issued value the next handle
/// uses last + 1, so two jobs finishing within the same millisecond (or a
/// clock stepping backwards) still get distinct names.
pub struct HandleFactory {
    clock: Clock,
    last: AtomicU64,
}

impl HandleFactory {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            last: AtomicU64::new(0),
        }
    }

    pub fn issue(&self) -> ResultHandle {
        let now = (self.clock)();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        let stamp = now.max(previous.saturating_add(1));
        ResultHandle(format!("{HANDLE_PREFIX}{stamp}.{HANDLE_EXTENSION}"))
    }
}

impl fmt::Debug for HandleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleFactory")
            .field("last", &self.last.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
