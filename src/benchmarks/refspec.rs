use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fetches every branch of the source into `origin` remote-tracking refs
pub const ALL_BRANCHES: &str = "+refs/heads/*:refs/remotes/origin/*";

/// A fetch ref-spec of the form `[+]<src>:<dst>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefSpec {
    force: bool,
    source: String,
    destination: String,
}

impl RefSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let trimmed = spec.trim();
        let (force, body) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (source, destination) = body
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("Ref-spec '{spec}' has no ':' separator"))?;

        if source.is_empty() || destination.is_empty() {
            anyhow::bail!("Ref-spec '{spec}' needs both a source and a destination");
        }
        if destination.contains(':') {
            anyhow::bail!("Ref-spec '{spec}' has more than one ':' separator");
        }
        if source.chars().any(char::is_whitespace) || destination.chars().any(char::is_whitespace)
        {
            anyhow::bail!("Ref-spec '{spec}' contains whitespace");
        }

        let src_globs = source.matches('*').count();
        let dst_globs = destination.matches('*').count();
        if src_globs > 1 || dst_globs > 1 || src_globs != dst_globs {
            anyhow::bail!("Ref-spec '{spec}' has unbalanced '*' patterns");
        }

        Ok(Self {
            force,
            source: source.to_string(),
            destination: destination.to_string(),
        })
    }

    /// `+refs/heads/*:refs/remotes/origin/*`
    pub fn all_branches() -> Self {
        Self {
            force: true,
            source: "refs/heads/*".to_string(),
            destination: "refs/remotes/origin/*".to_string(),
        }
    }

    pub fn is_force(&self) -> bool {
        self.force
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}

impl Default for RefSpec {
    fn default() -> Self {
        Self::all_branches()
    }
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.force {
            f.write_str("+")?;
        }
        write!(f, "{}:{}", self.source, self.destination)
    }
}

impl FromStr for RefSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RefSpec {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RefSpec> for String {
    fn from(spec: RefSpec) -> Self {
        spec.to_string()
    }
}
