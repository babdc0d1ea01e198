//! Type-safe value types for jarvis-setup
//!
//! Replaces string-typed choices and version strings with enums and ordered
//! tuples so comparisons and exhaustive matching are checked by the compiler.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// AI backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AiBackend {
    /// No AI packages; the assistant runs its rule-based fallback
    #[default]
    None,
    /// Ollama client plus web search
    Ollama,
    /// Fully local inference and speech recognition
    #[strum(serialize = "offline")]
    #[serde(rename = "offline")]
    #[value(name = "offline")]
    LocalOffline,
}

impl AiBackend {
    /// Human-readable label used in interactive prompts
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "No AI backend (rule-based fallback only)",
            Self::Ollama => "Ollama (local Ollama server + web search)",
            Self::LocalOffline => "Local offline (llama.cpp + Whisper voice)",
        }
    }

    /// Returns true if an AI group should be planned
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Python interpreter version as an ordered (major, minor, patch) tuple.
///
/// Field order matters: the derived `Ord` compares major, then minor, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PythonVersion {
    /// Oldest interpreter the assistant supports
    pub const MINIMUM: PythonVersion = PythonVersion::new(3, 8, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Returns true if this version satisfies `MINIMUM`
    pub fn is_supported(&self) -> bool {
        *self >= Self::MINIMUM
    }

    /// Parse the output of `python --version`.
    ///
    /// Accepts `Python 3.10.12`, bare `3.10.12`, two-component `3.12`, and
    /// pre-release suffixes (`3.13.0rc1` parses as 3.13.0).
    pub fn parse_version_output(output: &str) -> Option<Self> {
        output
            .split_whitespace()
            .find_map(|token| token.parse::<PythonVersion>().ok())
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error returned when a version string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid Python version: '{0}'")]
pub struct ParseVersionError(String);

impl FromStr for PythonVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError(s.to_string());
        let mut parts = s.trim().splitn(3, '.');

        let major = leading_number(parts.next().ok_or_else(err)?).ok_or_else(err)?;
        let minor = leading_number(parts.next().ok_or_else(err)?).ok_or_else(err)?;
        // Patch is optional and may carry a suffix ("0rc1", "0+")
        let patch = match parts.next() {
            Some(p) => leading_number(p).unwrap_or(0),
            None => 0,
        };

        Ok(Self::new(major, minor, patch))
    }
}

/// Parse the leading ASCII digits of `s`
fn leading_number(s: &str) -> Option<u32> {
    let digits: &str = s
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s, |end| &s[..end]);
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_version_ordering_is_tuple_ordering() {
        assert!(PythonVersion::new(3, 7, 99) < PythonVersion::new(3, 8, 0));
        assert!(PythonVersion::new(3, 10, 0) > PythonVersion::new(3, 9, 18));
        assert!(PythonVersion::new(2, 99, 99) < PythonVersion::MINIMUM);
    }

    #[test]
    fn test_parse_version_output() {
        assert_eq!(
            PythonVersion::parse_version_output("Python 3.10.12\n"),
            Some(PythonVersion::new(3, 10, 12))
        );
        assert_eq!(
            PythonVersion::parse_version_output("Python 3.13.0rc1"),
            Some(PythonVersion::new(3, 13, 0))
        );
        assert_eq!(
            PythonVersion::parse_version_output("Python 3.12"),
            Some(PythonVersion::new(3, 12, 0))
        );
        assert_eq!(PythonVersion::parse_version_output("command not found"), None);
        assert_eq!(PythonVersion::parse_version_output(""), None);
    }

    #[test]
    fn test_version_supported() {
        assert!(PythonVersion::new(3, 8, 0).is_supported());
        assert!(!PythonVersion::new(3, 7, 5).is_supported());
    }

    #[test]
    fn test_ai_backend_strings() {
        assert_eq!(AiBackend::LocalOffline.to_string(), "offline");
        assert_eq!("ollama".parse::<AiBackend>().unwrap(), AiBackend::Ollama);
        for backend in AiBackend::iter() {
            let parsed: AiBackend = backend.to_string().parse().unwrap();
            assert_eq!(parsed, backend);
        }
    }

    #[test]
    fn test_ai_backend_serde() {
        let json = serde_json::to_string(&AiBackend::LocalOffline).unwrap();
        assert_eq!(json, "\"offline\"");
        let back: AiBackend = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(back, AiBackend::None);
    }
}
