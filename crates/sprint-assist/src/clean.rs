use regex::Regex;
use std::sync::OnceLock;

/// Openers small models use before "thinking out loud". Each is removed up
/// to the next blank line, the next line starting with a letter, or the
/// end of the text.
const META_OPENERS: &[&str] = &[
    "Let me think about this",
    "Okay, let's tackle this",
    "I need to analyze",
    "First, I'll",
    "Let me structure",
    "Wait,",
];

static THINK_RE: OnceLock<Regex> = OnceLock::new();
static META_RE: OnceLock<Regex> = OnceLock::new();
static BLANK_RUN_RE: OnceLock<Regex> = OnceLock::new();

fn think_re() -> &'static Regex {
    THINK_RE.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"))
}

fn meta_re() -> &'static Regex {
    META_RE.get_or_init(|| {
        let openers = META_OPENERS
            .iter()
            .map(|o| regex::escape(o))
            .collect::<Vec<_>>()
            .join("|");
        // The terminator is captured and written back in place of the match.
        Regex::new(&format!(r"(?is)(?:{openers}).*?(\n\n|\n[A-Z]|\z)")).expect("valid regex")
    })
}

fn blank_run_re() -> &'static Regex {
    BLANK_RUN_RE.get_or_init(|| Regex::new(r"\n\s*\n\s*\n").expect("valid regex"))
}

/// Best-effort removal of `<think>` blocks and meta-commentary from
/// generated text. Runs of three or more line breaks collapse to one blank
/// line and the result is trimmed.
pub fn strip_thinking(text: &str) -> String {
    let mut out = think_re().replace_all(text, "").into_owned();

    // A consumed terminator can hide an opener that starts right after it,
    // so repeat until nothing changes.
    loop {
        let next = meta_re().replace_all(&out, "$1").into_owned();
        if next == out {
            break;
        }
        out = next;
    }

    blank_run_re()
        .replace_all(&out, "\n\n")
        .trim()
        .to_string()
}
