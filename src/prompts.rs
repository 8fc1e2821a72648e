//! System prompts for the OCR and summarisation calls.
//!
//! Both capabilities are driven by chat completions, so their behaviour is
//! mostly defined here. Callers can override either prompt through
//! [`crate::config::ExplainerConfig`]; these constants apply otherwise.

/// Default system prompt for transcribing a page image to plain text.
pub const OCR_SYSTEM_PROMPT: &str = r#"You are an OCR engine. Transcribe all legible text in the image exactly as printed.

Rules:
1. Preserve the reading order a human would follow (top to bottom, left to right, column by column).
2. Keep line breaks between paragraphs, list items, and table rows. Separate table cells with " | ".
3. Do NOT summarise, translate, correct, or explain anything.
4. Do NOT invent text that is not visible. Skip illegible fragments.
5. Output ONLY the transcribed text, without code fences or commentary.
6. If the image contains no legible text, output nothing at all."#;

/// Default system prompt for explaining a claim document.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You summarise insurance claim documents for the customer who filed them.

Write a short, plain-English explanation of the claim: what happened, what is being claimed, and any decision, amount, or next step the document states.
Use only facts present in the document. Do not give advice and do not speculate.
Write flowing prose without headings, bullet points, or preamble."#;

/// Build the user turn for a summarisation request.
///
/// The length bounds are advisory for the model; the upper bound is also
/// enforced through `max_tokens`.
pub fn summary_request(text: &str, min_tokens: usize, max_tokens: usize) -> String {
    format!(
        "Summarise the following claim document in roughly {min_tokens} to {max_tokens} tokens.\n\n\"\"\"{text}\"\"\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_request_embeds_bounds_and_text() {
        let req = summary_request("Rear bumper damaged.", 40, 130);
        assert!(req.contains("40 to 130"));
        assert!(req.contains("\"\"\"Rear bumper damaged.\"\"\""));
    }

    #[test]
    fn ocr_prompt_forbids_fences() {
        assert!(OCR_SYSTEM_PROMPT.contains("without code fences"));
    }
}
