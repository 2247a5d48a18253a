//! Dotted numeric object identifiers.
//!
//! An [`Oid`] is the address of one managed value in the agent's
//! information tree. Its canonical text form always carries a leading dot
//! (`.1.3.6.1.2.1.1.1.0`); that form is used both as the cache key and as
//! the file name exposed through the mount.

use std::fmt;
use std::str::FromStr;

use crate::error::OidError;

/// A parsed object identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid {
    arcs: Vec<u32>,
}

impl Oid {
    /// Parses a dotted identifier, with or without the leading dot.
    pub fn parse(text: &str) -> Result<Self, OidError> {
        let trimmed = text.trim();
        let body = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(OidError::Empty);
        }

        let arcs = body
            .split('.')
            .map(|arc| {
                if arc.is_empty() {
                    return Err(OidError::EmptyArc(trimmed.to_string()));
                }
                arc.parse::<u32>().map_err(|_| OidError::InvalidArc {
                    oid: trimmed.to_string(),
                    arc: arc.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { arcs })
    }

    /// Builds an identifier from raw arcs.
    pub fn from_arcs(arcs: impl Into<Vec<u32>>) -> Result<Self, OidError> {
        let arcs = arcs.into();
        if arcs.is_empty() {
            return Err(OidError::Empty);
        }
        Ok(Self { arcs })
    }

    /// The `internet` subtree, `.1.3.6.1`.
    pub fn internet() -> Self {
        Self {
            arcs: vec![1, 3, 6, 1],
        }
    }

    /// Returns the numeric arcs.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Returns true if `self` lies inside the subtree rooted at `prefix`.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.starts_with(&prefix.arcs)
    }

    /// Returns the canonical dotted form with a leading dot.
    pub fn to_dotted(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for arc in &self.arcs {
            write!(f, ".{arc}")?;
        }
        Ok(())
    }
}

impl FromStr for Oid {
    type Err = OidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
