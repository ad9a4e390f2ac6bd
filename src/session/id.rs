//! Session identifiers and their generator.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::error::{Result, SessionError};

/// Characters allowed in a session id.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated ids (62^16 possible values).
pub const SESSION_ID_LEN: usize = 16;

/// Longest id accepted from outside the process.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// Random bytes at or above this value are rejected to keep the alphabet
/// uniformly distributed (248 = 4 * 62).
const REJECTION_THRESHOLD: u8 = (256 - 256 % ALPHABET.len()) as u8;

/// Opaque, URL-safe session token made of ASCII letters and digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate an externally supplied id.
    pub fn parse(raw: &str) -> Result<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_SESSION_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_alphanumeric());
        if !valid {
            return Err(SessionError::InvalidSessionId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Produces collision-resistant session ids from an injectable randomness source.
///
/// Production code uses [`IdentifierGenerator::new`] (OS randomness); tests can
/// pass a seeded generator to [`IdentifierGenerator::with_rng`]. Ids handed
/// out by one generator are never repeated.
pub struct IdentifierGenerator {
    rng: Box<dyn RngCore + Send>,
    issued: HashSet<SessionId>,
}

impl IdentifierGenerator {
    /// Create a generator backed by the operating system's secure RNG
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }

    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Box::new(rng),
            issued: HashSet::new(),
        }
    }

    /// Generate a fresh id.
    ///
    /// Fails with [`SessionError::Generation`] when the randomness source
    /// errors; there is no fallback to predictable input.
    pub fn generate(&mut self) -> Result<SessionId> {
        loop {
            let id = self.draw()?;
            if self.issued.insert(id.clone()) {
                return Ok(id);
            }
            tracing::warn!("Session id collision, drawing again");
        }
    }

    /// Mark an id obtained elsewhere (e.g. by joining) as taken.
    pub fn reserve(&mut self, id: &SessionId) {
        self.issued.insert(id.clone());
    }

    /// Number of ids issued or reserved so far.
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    fn draw(&mut self) -> Result<SessionId> {
        let mut out = String::with_capacity(SESSION_ID_LEN);
        let mut buf = [0u8; SESSION_ID_LEN * 2];

        while out.len() < SESSION_ID_LEN {
            self.rng
                .try_fill_bytes(&mut buf)
                .map_err(|e| SessionError::Generation(e.to_string()))?;

            for &b in buf.iter().filter(|&&b| b < REJECTION_THRESHOLD) {
                if out.len() == SESSION_ID_LEN {
                    break;
                }
                out.push(ALPHABET[b as usize % ALPHABET.len()] as char);
            }
        }

        Ok(SessionId(out))
    }
}

impl Default for IdentifierGenerator {
    fn default() -> Self {
        Self::new()
    }
}
