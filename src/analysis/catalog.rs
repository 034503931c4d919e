//! Fixed content shown by the mock analysis.

use crate::alerts::Severity;
use serde::Serialize;

/// A substance the mock analysis can "detect".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adulterant {
    pub name: &'static str,
    pub icon: &'static str,
    pub severity: Severity,
}

/// Everything the analysis can report.
pub static ADULTERANTS: [Adulterant; 6] = [
    Adulterant {
        name: "Water dilution",
        icon: "💧",
        severity: Severity::Medium,
    },
    Adulterant {
        name: "Chalk powder",
        icon: "🧱",
        severity: Severity::High,
    },
    Adulterant {
        name: "Detergent traces",
        icon: "🧴",
        severity: Severity::High,
    },
    Adulterant {
        name: "Artificial color",
        icon: "🎨",
        severity: Severity::Medium,
    },
    Adulterant {
        name: "Starch additives",
        icon: "🌾",
        severity: Severity::Low,
    },
    Adulterant {
        name: "Synthetic preservatives",
        icon: "⚗️",
        severity: Severity::Medium,
    },
];

/// Advice attached to every report.
pub static SAFETY_TIPS: [&str; 4] = [
    "Always buy from trusted vendors",
    "Check for proper packaging and labeling",
    "Perform simple home tests before consumption",
    "Report any suspicious products to local authorities",
];
