//! CLI binary for claim-explainer.
//!
//! A thin shell over the library: maps flags to `ExplainerConfig`, loads the
//! models once, runs one request, and prints the summary or sentinel.

use anyhow::{Context, Result};
use clap::Parser;
use claim_explainer::models;
use claim_explainer::{
    ClaimExplainer, DocumentSource, ExplainProgress, ExplainerConfig, Models, Outcome,
    ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that follows the pipeline stage by stage.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Explaining");
        bar.set_message("Extracting and summarizing…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ExplainProgress for CliProgress {
    fn on_stage(&self, stage: Stage) {
        self.bar.set_message(stage.label());
    }

    fn on_ocr_fallback(&self, page_count: usize) {
        self.bar.println(format!(
            "  {} No text layer found; running OCR on {} page(s)",
            yellow("◆"),
            page_count
        ));
    }

    fn on_complete(&self, _outcome: &Outcome) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise a claim PDF (text layer, OCR fallback for scans)
  claim-explain claim.pdf

  # Summarise a photographed claim form
  claim-explain scan.jpg

  # Summarise pasted text
  claim-explain --text "Patient was involved in a minor collision on the highway..."

  # Read the claim from stdin
  cat claim.txt | claim-explain --stdin

  # Show the extracted text without summarising
  claim-explain --extract-only claim.pdf

  # Full JSON report (outcome, extraction method, timings)
  claim-explain --json claim.pdf

SUPPORTED FILES:
  .pdf  .jpg  .jpeg  .png  .txt   (extension is case-insensitive)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY           OpenAI API key
  ANTHROPIC_API_KEY        Anthropic API key
  GEMINI_API_KEY           Google Gemini API key
  CLAIM_EXPLAIN_PROVIDER   Override provider (openai, anthropic, gemini, ollama)
  CLAIM_EXPLAIN_MODEL      Override summary model ID
  PDFIUM_LIB_PATH          Path to libpdfium (file or directory)
"#;

/// Summarise insurance claim documents into plain English.
#[derive(Parser, Debug)]
#[command(
    name = "claim-explain",
    version,
    about = "Summarise insurance claim PDFs, images, and text into plain English",
    long_about = "Extract text from an insurance claim document (PDF text layer, OCR for scanned \
PDFs and images, or plain text) and summarise it into a short customer-friendly explanation \
using an LLM provider (OpenAI, Anthropic, Gemini, Ollama, …).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Claim document: .pdf, .jpg, .jpeg, .png or .txt.
    #[arg(conflicts_with_all = ["text", "stdin"])]
    input: Option<PathBuf>,

    /// Claim text entered directly instead of a file.
    #[arg(long, conflicts_with = "stdin")]
    text: Option<String>,

    /// Read claim text from standard input.
    #[arg(long)]
    stdin: bool,

    /// LLM model used for the summary.
    #[arg(long, env = "CLAIM_EXPLAIN_MODEL")]
    model: Option<String>,

    /// Vision model used for OCR (defaults to --model).
    #[arg(long, env = "CLAIM_EXPLAIN_OCR_MODEL")]
    ocr_model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "CLAIM_EXPLAIN_PROVIDER")]
    provider: Option<String>,

    /// Rendering DPI for OCR of scanned PDFs (72–400).
    #[arg(long, env = "CLAIM_EXPLAIN_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Characters of extracted text passed to the summariser.
    #[arg(long, env = "CLAIM_EXPLAIN_MAX_INPUT_CHARS", default_value_t = 3000)]
    max_input_chars: usize,

    /// Minimum summary length in tokens.
    #[arg(long, env = "CLAIM_EXPLAIN_MIN_SUMMARY_TOKENS", default_value_t = 40)]
    min_summary_tokens: usize,

    /// Maximum summary length in tokens.
    #[arg(long, env = "CLAIM_EXPLAIN_MAX_SUMMARY_TOKENS", default_value_t = 130)]
    max_summary_tokens: usize,

    /// Retries on a transient provider failure.
    #[arg(long, env = "CLAIM_EXPLAIN_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "CLAIM_EXPLAIN_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium (file or containing directory).
    #[arg(long, env = "CLAIM_EXPLAIN_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Print the extracted text instead of a summary.
    #[arg(long)]
    extract_only: bool,

    /// Print the full JSON report instead of plain text.
    #[arg(long, env = "CLAIM_EXPLAIN_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "CLAIM_EXPLAIN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CLAIM_EXPLAIN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the result and errors.
    #[arg(short, long, env = "CLAIM_EXPLAIN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback a user needs; keep INFO logs out of
    // its way unless --verbose asks for everything.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let source = read_source(&cli)?;

    let spinner = show_progress.then(CliProgress::new);
    let progress = spinner.clone().map(|s| s as ProgressCallback);
    let config = build_config(&cli, progress)?;

    // ── Load models once for the whole process ───────────────────────────
    let models = models::init_global(Models::load(&config).context("Failed to load models")?)
        .context("Failed to register models")?;
    let explainer = ClaimExplainer::new(models, config);

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let result = run_extract_only(&explainer, source, cli.json).await;
        if let Some(ref spinner) = spinner {
            spinner.bar.finish_and_clear();
        }
        return result;
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let result = explainer.explain(source).await;
    if let Some(ref spinner) = spinner {
        spinner.bar.finish_and_clear();
    }
    let explanation = result.context("Failed to explain claim")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&explanation)
            .context("Failed to serialise explanation")?;
        println!("{json}");
        return Ok(());
    }

    match &explanation.outcome {
        Outcome::Summary { text } => {
            if !cli.quiet {
                eprintln!(
                    "{} {}",
                    green("✔"),
                    bold("Claim summarized successfully!")
                );
            }
            write_stdout(text)?;
            if !cli.quiet {
                let mut note = format!(
                    "{} chars extracted, {}ms total",
                    explanation.extracted_chars, explanation.timings.total_ms
                );
                if explanation.truncated {
                    note.push_str(&format!(", truncated to {}", cli.max_input_chars));
                }
                eprintln!("   {}", dim(&note));
            }
        }
        sentinel => {
            if !cli.quiet {
                eprintln!("{} {}", yellow("⚠"), sentinel.message());
            }
            write_stdout(sentinel.message())?;
        }
    }

    Ok(())
}

/// Print only the extracted text (or the unsupported sentinel).
async fn run_extract_only(
    explainer: &ClaimExplainer,
    source: DocumentSource,
    json: bool,
) -> Result<()> {
    let DocumentSource::Path(path) = source else {
        anyhow::bail!("--extract-only needs a file input");
    };

    let extraction = explainer
        .extract_only(&path)
        .await
        .with_context(|| format!("Failed to extract text from {}", path.display()))?;

    match extraction {
        Some(ex) if json => {
            let value = serde_json::json!({ "method": ex.method, "text": ex.text });
            println!(
                "{}",
                serde_json::to_string_pretty(&value).context("Failed to serialise extraction")?
            );
        }
        Some(ex) => write_stdout(&ex.text)?,
        None => write_stdout(claim_explainer::UNSUPPORTED_FILE_TYPE)?,
    }
    Ok(())
}

/// Work out which document reference the flags describe.
fn read_source(cli: &Cli) -> Result<DocumentSource> {
    if let Some(ref text) = cli.text {
        return Ok(DocumentSource::Text(text.clone()));
    }
    if cli.stdin {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read claim text from stdin")?;
        return Ok(DocumentSource::Text(text));
    }
    match cli.input {
        Some(ref path) => Ok(DocumentSource::Path(path.clone())),
        None => anyhow::bail!("Provide a claim file, --text, or --stdin"),
    }
}

/// Map CLI args to `ExplainerConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExplainerConfig> {
    let mut builder = ExplainerConfig::builder()
        .dpi(cli.dpi)
        .max_input_chars(cli.max_input_chars)
        .min_summary_tokens(cli.min_summary_tokens)
        .max_summary_tokens(cli.max_summary_tokens)
        .max_retries(cli.max_retries);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref model) = cli.ocr_model {
        builder = builder.ocr_model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn write_stdout(s: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_line(&mut handle, s).context("Failed to write to stdout")
}

/// Write `s`, adding a trailing newline if it lacks one.
fn write_line<W: Write>(out: &mut W, s: &str) -> io::Result<()> {
    out.write_all(s.as_bytes())?;
    if !s.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts `budget` writes, then fails like a closed pipe.
    struct FailingWriter {
        budget: usize,
        written: Vec<u8>,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            self.budget -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_line_appends_missing_newline() {
        let mut out = Vec::new();
        write_line(&mut out, "Summary").unwrap();
        assert_eq!(out, b"Summary\n");
    }

    #[test]
    fn write_line_keeps_existing_newline() {
        let mut out = Vec::new();
        write_line(&mut out, "Summary\n").unwrap();
        assert_eq!(out, b"Summary\n");
    }

    #[test]
    fn newline_write_failure_is_reported() {
        let mut out = FailingWriter {
            budget: 1,
            written: Vec::new(),
        };
        let err = write_line(&mut out, "Summary").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(out.written, b"Summary");
    }

    #[test]
    fn cli_rejects_text_with_input_file() {
        let parsed = Cli::try_parse_from(["claim-explain", "claim.pdf", "--text", "hello"]);
        assert!(parsed.is_err());
    }
}
