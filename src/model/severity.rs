//! Failure severity levels.

use serde::{Deserialize, Serialize};

/// Severity of a simulated failure event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Scalar written into embedding slot 23 at failure injection.
    pub fn failure_signal(self) -> f64 {
        match self {
            Severity::Low => 0.3,
            Severity::Medium => 0.5,
            Severity::High => 0.75,
            Severity::Critical => 1.0,
        }
    }

    /// Multiplier on the base recovery-time estimate.
    pub fn recovery_multiplier(self) -> f64 {
        match self {
            Severity::Low => 0.5,
            Severity::Medium => 1.0,
            Severity::High => 1.5,
            Severity::Critical => 2.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Lenient parse for caller-supplied strings; unknown values fall back
    /// to `Medium` rather than failing the prediction call.
    pub fn parse_lenient(s: &str) -> Severity {
        match s.to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Medium,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
