//! Deterministic cleanup of vision-model transcriptions.
//!
//! Even with a strict prompt, vision models sometimes wrap their output in
//! code fences, answer with `\r\n` line endings, or emit zero-width
//! characters copied from the rendered page. These rules fix that without
//! touching the words themselves.
//!
//! Rules run in order: fences first, then line endings, so later rules only
//! ever see `\n`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to one page of OCR output.
///
/// Returns an empty string when nothing but whitespace survives, so the
/// caller's blank check treats "the model found nothing" correctly.
pub fn clean_ocr_text(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

/// Join cleaned per-page transcriptions in page order, skipping blank pages.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pages
        .into_iter()
        .filter(|p| !p.as_ref().trim().is_empty())
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\r?\n(.*?)\r?\n?```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip invisible Unicode ──────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse blank-line runs ─────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_with_and_without_language() {
        assert_eq!(strip_code_fences("```text\nClaim 42\n```"), "Claim 42");
        assert_eq!(strip_code_fences("```\nClaim 42\n```"), "Claim 42");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences("Claim 42"), "Claim 42");
    }

    #[test]
    fn normalises_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn removes_invisible() {
        assert_eq!(
            remove_invisible_chars("Policy\u{200B}No\u{FEFF}: 7\u{00AD}7"),
            "PolicyNo: 77"
        );
    }

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn whitespace_only_output_becomes_empty() {
        assert_eq!(clean_ocr_text("  \r\n\u{200B}\n\t "), "");
        assert_eq!(clean_ocr_text("```\n\n```"), "");
    }

    #[test]
    fn full_cleanup() {
        let raw = "```text\r\nCLAIM FORM   \r\n\r\n\r\n\r\nDate of loss: 03/04\r\n```";
        assert_eq!(clean_ocr_text(raw), "CLAIM FORM\n\nDate of loss: 03/04");
    }

    #[test]
    fn join_skips_blank_pages() {
        assert_eq!(join_pages(["page one", "  ", "page three"]), "page one\n\npage three");
        assert_eq!(join_pages(Vec::<String>::new()), "");
    }
}
