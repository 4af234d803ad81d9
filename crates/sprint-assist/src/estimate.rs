//! Pulls a story-point number and complexity hints out of free-form
//! estimation text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_POINTS: f64 = 3.0;
pub const MAX_POINTS: f64 = 100.0;

const COMPLEXITY_KEYWORDS: &[&str] = &[
    "complex",
    "dependency",
    "integration",
    "unknown",
    "risk",
    "technical",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub estimated_points: f64,
    pub reasoning: String,
    pub complexity_factors: Vec<String>,
}

impl Estimate {
    pub fn from_reply(reply: String) -> Self {
        Self {
            estimated_points: parse_points(&reply).unwrap_or(DEFAULT_POINTS),
            complexity_factors: complexity_factors(&reply),
            reasoning: reply,
        }
    }
}

static NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn number_re() -> &'static Regex {
    NUMBER_RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"))
}

/// First number on the first line mentioning "point" or "estimate" that
/// holds one. Zero and values above [`MAX_POINTS`] are rejected.
pub fn parse_points(text: &str) -> Option<f64> {
    text.lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("point") || lower.contains("estimate")
        })
        .find_map(|line| number_re().find(line))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|p| *p > 0.0 && *p <= MAX_POINTS)
}

/// Title-cased keywords found in `text`, or "Standard Complexity".
pub fn complexity_factors(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let found: Vec<String> = COMPLEXITY_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| title_case(k))
        .collect();
    if found.is_empty() {
        vec!["Standard Complexity".to_string()]
    } else {
        found
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_number_from_points_line() {
        let reply = "Sprint 12 looks busy.\n**Story Points: 8**\nReasoning: moderate.";
        assert_eq!(parse_points(reply), Some(8.0));
    }

    #[test]
    fn skips_point_lines_without_numbers() {
        let reply = "Key points to consider:\n- auth\nFinal estimate: 5.5";
        assert_eq!(parse_points(reply), Some(5.5));
    }

    #[test]
    fn out_of_range_defaults() {
        assert_eq!(parse_points("Estimate: 0 points"), None);
        assert_eq!(parse_points("Estimate: 400 points"), None);
        let e = Estimate::from_reply("I cannot say.".to_string());
        assert_eq!(e.estimated_points, DEFAULT_POINTS);
        assert_eq!(e.reasoning, "I cannot say.");
    }

    #[test]
    fn factors_in_keyword_order() {
        assert_eq!(
            complexity_factors("Technical RISK from the payment integration"),
            vec!["Integration", "Risk", "Technical"]
        );
        assert_eq!(complexity_factors("easy"), vec!["Standard Complexity"]);
    }
}
