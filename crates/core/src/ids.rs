#![forbid(unsafe_code)]

use crate::hash::sha256_hex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Canonical session identifier: `<base>@<suffix>` where every segment is
/// restricted to `[A-Za-z0-9._-]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn base(&self) -> &str {
        self.0.split_once('@').map(|(base, _)| base).unwrap_or(&self.0)
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, SessionIdError> {
        let value = value.into();
        validate_session_id(&value)?;
        Ok(Self(value))
    }

    pub fn from_parts(base: &str, suffix: &str) -> Self {
        Self(format!(
            "{}@{}",
            sanitize_segment(base),
            sanitize_segment(suffix)
        ))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionIdError {
    Empty,
    TooLong,
    MissingSuffix,
    InvalidChar { ch: char, index: usize },
}

impl std::fmt::Display for SessionIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "session id must not be empty"),
            Self::TooLong => write!(f, "session id exceeds 128 chars"),
            Self::MissingSuffix => write!(f, "session id must be <base>@<suffix>"),
            Self::InvalidChar { ch, index } => {
                write!(f, "session id has invalid char {ch:?} at {index}")
            }
        }
    }
}

impl std::error::Error for SessionIdError {}

fn validate_session_id(value: &str) -> Result<(), SessionIdError> {
    if value.is_empty() {
        return Err(SessionIdError::Empty);
    }
    if value.len() > 128 {
        return Err(SessionIdError::TooLong);
    }
    let Some((base, suffix)) = value.split_once('@') else {
        return Err(SessionIdError::MissingSuffix);
    };
    if base.is_empty() || suffix.is_empty() || suffix.contains('@') {
        return Err(SessionIdError::MissingSuffix);
    }
    for (index, ch) in value.chars().enumerate() {
        if ch == '@' || ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            continue;
        }
        return Err(SessionIdError::InvalidChar { ch, index });
    }
    Ok(())
}

/// Collapse runs of characters outside `[A-Za-z0-9._-]` into single dashes.
/// Returns `"proj"` when nothing survives.
pub fn sanitize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "proj".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Deterministic task id: `T-` plus the lowercase slug of the title, at most
/// 12 slug chars.
pub fn task_id(title: &str) -> String {
    format!("T-{}", slug(title, 12))
}

/// Deterministic fact id: `F-` plus the first 16 hex chars of
/// `SHA256(key + "::" + scope)`.
pub fn fact_id(key: &str, scope: &str) -> String {
    let scope = if scope.is_empty() { "repo" } else { scope };
    let digest = sha256_hex(format!("{key}::{scope}").as_bytes());
    format!("F-{}", &digest[..16])
}

fn slug(raw: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out.truncate(max_len);
    if out.is_empty() {
        out.push('x');
    }
    out
}

static RID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Short random-enough id: `<prefix>-<6 base36 chars>`. Uniqueness within a
/// short window is all callers need; primary keys absorb the rest.
pub fn rid(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let count = RID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mixed = nanos
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(count)
        .wrapping_add(std::process::id() as u64);
    format!("{prefix}-{}", base36(mixed, 6))
}

fn base36(mut value: u64, width: usize) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut buf = vec![b'0'; width];
    for slot in buf.iter_mut().rev() {
        *slot = DIGITS[(value % 36) as usize];
        value /= 36;
    }
    String::from_utf8(buf).unwrap_or_else(|_| "000000".to_string())
}
