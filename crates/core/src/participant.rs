// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Participant identity: the `provider:role` pairs that populate a task's
//! author/reviewer pool.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A CLI agent provider this workspace knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Claude,
    Codex,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Codex => "codex",
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "claude" => Ok(Provider::Claude),
            "codex" => Ok(Provider::Codex),
            "gemini" => Ok(Provider::Gemini),
            other => Err(format!("unsupported provider: {other}")),
        }
    }
}

/// Providers this build knows how to invoke, in registration order.
pub const SUPPORTED_PROVIDERS: &[Provider] = &[Provider::Claude, Provider::Codex, Provider::Gemini];

/// One member of a task's participant pool: a provider plus a role-scoped
/// identifier (`author`, `reviewer-1`, `reviewer-2`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub provider: Provider,
}

impl Participant {
    pub fn new(id: impl Into<String>, provider: Provider) -> Self {
        Self {
            id: id.into(),
            provider,
        }
    }

    pub fn is_author(&self) -> bool {
        self.id == "author"
    }
}

/// Parse a `provider#alias` or bare `provider` participant identifier.
///
/// `"claude#author"` -> `Participant { id: "author", provider: Claude }`.
/// A bare `"claude"` defaults the alias to `"author"`.
pub fn parse_participant_id(raw: &str) -> Result<Participant, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("participant id must not be empty".to_string());
    }
    let (provider_str, alias) = match raw.split_once('#') {
        Some((p, a)) if !a.is_empty() => (p, a),
        Some((p, _)) => (p, "author"),
        None => (raw, "author"),
    };
    let provider: Provider = provider_str.parse()?;
    Ok(Participant::new(alias, provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_and_alias() {
        let p = parse_participant_id("codex#reviewer-1").expect("parses");
        assert_eq!(p.id, "reviewer-1");
        assert_eq!(p.provider, Provider::Codex);
    }

    #[test]
    fn bare_provider_defaults_to_author() {
        let p = parse_participant_id("gemini").expect("parses");
        assert_eq!(p.id, "author");
        assert!(p.is_author());
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(parse_participant_id("chatgpt#author").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(parse_participant_id("  ").is_err());
    }
}
