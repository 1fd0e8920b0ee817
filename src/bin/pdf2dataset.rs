//! CLI binary for pdf2dataset.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, runs the batch driver, and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2dataset::chat::run_chat_loop;
use pdf2dataset::pipeline::input::collect_pdfs;
use pdf2dataset::{
    build_all, discover_modules, extract_all, BatchReport, ChatConfig, DatasetFormat,
    LlmChatModel, ModuleManifest, PipelineConfig, PipelineProgressCallback, ProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the modules of a batch plus a
/// log line per module and per skipped page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Verb shown in the bar prefix ("Extracting", "Building llava").
    label: String,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new(label: impl Into<String>) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            label: label.into(),
            skipped: AtomicUsize::new(0),
        })
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_modules: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} modules  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total_modules as u64);
        self.bar.set_style(style);
        self.bar.set_prefix(self.label.clone());
    }

    fn on_module_start(&self, module: &str, _index: usize, _total: usize) {
        self.bar.set_message(module.to_string());
    }

    fn on_page_skipped(&self, module: &str, page: u32, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {}  page {:>3}  {}",
            yellow("!"),
            module,
            page,
            dim(reason)
        ));
    }

    fn on_module_complete(&self, module: &str, items: usize) {
        self.bar.println(format!(
            "  {} {:<40}  {}",
            green("✓"),
            module,
            dim(&format!("{items:>5} items"))
        ));
        self.bar.inc(1);
    }

    fn on_module_error(&self, module: &str, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar
            .println(format!("  {} {:<40}  {}", red("✗"), module, red(first_line)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_modules: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_modules.saturating_sub(success_count);
        let skipped = self.skipped.load(Ordering::SeqCst);
        eprintln!(
            "{} {}/{} modules  {}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&success_count.to_string()),
            total_modules,
            dim(&format!("{skipped} pages skipped")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract every PDF in a folder to ./extracted_content
  pdf2dataset extract "Class docs"

  # Build LLaVA records for every extracted module
  pdf2dataset build --format llava --output-dir llava_training_data

  # Build Qwen records (images pooled under <output-dir>/images)
  pdf2dataset build --format qwen --output-dir qwen_training_data

  # Extract and build both formats in one go
  pdf2dataset run "Class docs" --format both

  # Talk to a model
  pdf2dataset chat --provider ollama --model qwen2.5vl

OUTPUT LAYOUT:
  extracted_content/<module>/<module>_text.json      [{page, text}]
  extracted_content/<module>/<module>_summary.json
  extracted_content/<module>/images/page_<N>.png      full-page render
  extracted_content/<module>/images/page_<N>_img_<K>.<ext>
  <output-dir>/<module>_llava.json | <module>_qwen.json
  <output-dir>/images/<module>_page_<N>.png           (qwen only)

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH          Path to libpdfium (file or directory)
  RUST_LOG                 Override log filter (e.g. pdf2dataset=debug)
  EDGEQUAKE_LLM_PROVIDER   Chat provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL          Chat model ID
  OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
"#;

/// Turn PDF course documents into LLaVA / Qwen-VL training records.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2dataset",
    version,
    about = "Turn PDF course documents into LLaVA / Qwen-VL training records",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding one extracted module per PDF.
    #[arg(long, global = true, env = "PDF2DATASET_EXTRACTED_ROOT", default_value = "extracted_content")]
    extracted_root: PathBuf,

    /// Directory receiving the dataset JSON files (and the Qwen image pool).
    #[arg(short, long, global = true, env = "PDF2DATASET_OUTPUT_DIR", default_value = "training_data")]
    output_dir: PathBuf,

    /// Path to the pdfium shared library or its directory.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print reports as JSON on stdout.
    #[arg(long, global = true, env = "PDF2DATASET_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PDF2DATASET_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2DATASET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2DATASET_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text and images from a PDF or a directory of PDFs.
    Extract {
        /// A PDF file or a directory containing *.pdf files.
        input: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Build dataset records for every extracted module.
    Build {
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Extract, then build.
    Run {
        /// A PDF file or a directory containing *.pdf files.
        input: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Interactive chat against a configured model; type 'quit' to exit.
    Chat {
        /// LLM provider: openai, anthropic, gemini, ollama, azure.
        #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
        provider: Option<String>,

        /// Model ID.
        #[arg(long, env = "EDGEQUAKE_MODEL")]
        model: Option<String>,

        /// Optional system prompt.
        #[arg(long)]
        system_prompt: Option<String>,

        /// Sampling temperature (0.0–2.0).
        #[arg(long, default_value_t = 0.7)]
        temperature: f32,

        /// Max tokens per reply.
        #[arg(long, default_value_t = 1024)]
        max_tokens: usize,
    },
}

#[derive(Args, Debug, Clone)]
struct ExtractArgs {
    /// Rendering DPI for full-page images (72–400).
    #[arg(long, env = "PDF2DATASET_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Cap on the longest edge of a rendered page, in pixels.
    #[arg(long, env = "PDF2DATASET_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// Skip saving embedded images (page renders only).
    #[arg(long, env = "PDF2DATASET_NO_EMBEDDED")]
    no_embedded: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2DATASET_PASSWORD")]
    password: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct BuildArgs {
    /// Target dataset format.
    #[arg(long, env = "PDF2DATASET_FORMAT", value_enum, default_value = "llava")]
    format: FormatArg,

    /// Instruction placed in the human/user turn.
    #[arg(long, env = "PDF2DATASET_INSTRUCTION")]
    instruction: Option<String>,

    /// Only build these modules (default: every module under --extracted-root).
    #[arg(long = "module", value_name = "NAME")]
    modules: Vec<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Llava,
    Qwen,
    Both,
}

impl FormatArg {
    fn formats(self) -> Vec<DatasetFormat> {
        match self {
            FormatArg::Llava => vec![DatasetFormat::Llava],
            FormatArg::Qwen => vec![DatasetFormat::Qwen],
            FormatArg::Both => vec![DatasetFormat::Llava, DatasetFormat::Qwen],
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the per-module feedback; keep library INFO
    // logs out of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Extract { input, extract } => {
            let config = build_config(&cli, Some(extract), None, show_progress.then_some("Extracting"))?;
            run_extract(&cli, input, &config).await
        }
        Command::Build { build } => run_build(&cli, build, show_progress).await,
        Command::Run {
            input,
            extract,
            build,
        } => {
            let config = build_config(&cli, Some(extract), None, show_progress.then_some("Extracting"))?;
            run_extract(&cli, input, &config).await?;
            run_build(&cli, build, show_progress).await
        }
        Command::Chat {
            provider,
            model,
            system_prompt,
            temperature,
            max_tokens,
        } => {
            let chat_config = ChatConfig {
                provider_name: provider.clone(),
                model: model.clone(),
                system_prompt: system_prompt.clone(),
                temperature: temperature.clamp(0.0, 2.0),
                max_tokens: *max_tokens,
            };
            let chat_model =
                LlmChatModel::from_config(&chat_config).context("Failed to set up chat model")?;
            let stdin = io::stdin();
            run_chat_loop(&chat_model, stdin.lock(), io::stdout())
                .await
                .context("Chat session failed")?;
            Ok(())
        }
    }
}

async fn run_extract(cli: &Cli, input: &Path, config: &PipelineConfig) -> Result<()> {
    let pdfs = collect_pdfs(input)
        .with_context(|| format!("Failed to collect PDFs from {}", input.display()))?;
    if pdfs.is_empty() {
        anyhow::bail!("No PDF files found in {}", input.display());
    }

    let report = extract_all(&pdfs, config)
        .await
        .context("Extraction failed")?;

    if cli.json {
        let summaries: Vec<_> = report.completed.iter().map(|r| &r.summary).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&summaries).context("Failed to serialise summaries")?
        );
    } else if !cli.quiet {
        for r in &report.completed {
            eprintln!(
                "{}  {}  {} pages, {} images",
                green("✔"),
                bold(&r.summary.pdf_name),
                r.summary.total_pages,
                r.summary.total_images
            );
            for issue in &r.issues {
                eprintln!("   {} {}", yellow("!"), dim(&issue.to_string()));
            }
        }
    }
    report_failures(cli, &report)
}

async fn run_build(cli: &Cli, args: &BuildArgs, show_progress: bool) -> Result<()> {
    let mut modules = discover_modules(&cli.extracted_root).with_context(|| {
        format!(
            "Failed to list modules under {}",
            cli.extracted_root.display()
        )
    })?;
    if !args.modules.is_empty() {
        modules.retain(|m| args.modules.contains(&m.name));
    }
    if modules.is_empty() {
        anyhow::bail!(
            "No modules found under {} — run `pdf2dataset extract` first",
            cli.extracted_root.display()
        );
    }

    let mut all = Vec::new();
    for format in args.format.formats() {
        let label = format!("Building {format}");
        let config = build_config(
            cli,
            None,
            Some(args),
            show_progress.then_some(label.as_str()),
        )?;
        let report = build_all(&modules, format, &config).await;

        if !cli.json && !cli.quiet && !show_progress {
            print_manifests(&report);
        }
        report_failures(cli, &report)?;
        all.extend(report.completed);
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&all).context("Failed to serialise manifests")?
        );
    }
    Ok(())
}

fn print_manifests(report: &BatchReport<ModuleManifest>) {
    for m in &report.completed {
        eprintln!(
            "Created {}  ({} records{})",
            m.output_file.display(),
            m.records,
            if m.skipped_pages.is_empty() {
                String::new()
            } else {
                format!(", skipped pages {:?}", m.skipped_pages)
            }
        );
    }
}

/// Print failures; fail the command only when nothing succeeded.
fn report_failures<T>(cli: &Cli, report: &BatchReport<T>) -> Result<()> {
    if !cli.quiet {
        for f in &report.failed {
            eprintln!("{} {}: {}", red("✗"), bold(&f.module), f.error);
        }
    }
    if report.completed.is_empty() && !report.failed.is_empty() {
        anyhow::bail!("All {} modules failed", report.failed.len());
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(
    cli: &Cli,
    extract: Option<&ExtractArgs>,
    build: Option<&BuildArgs>,
    progress_label: Option<&str>,
) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .extracted_root(&cli.extracted_root)
        .output_dir(&cli.output_dir);

    if let Some(path) = &cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(args) = extract {
        builder = builder
            .dpi(args.dpi)
            .max_rendered_pixels(args.max_pixels)
            .extract_embedded_images(!args.no_embedded);
        if let Some(pwd) = &args.password {
            builder = builder.password(pwd);
        }
    }
    if let Some(instruction) = build.and_then(|b| b.instruction.as_ref()) {
        builder = builder.instruction(instruction);
    }
    if let Some(label) = progress_label {
        let cb: ProgressCallback = CliProgressCallback::new(label);
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
