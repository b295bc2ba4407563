//! pdf-narrate - Read scientific PDFs aloud, without the references and citations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_narrate::config::PdfNarrateConfig;
use pdf_narrate::document::{Document, PdfExtractor};
use pdf_narrate::error::PipelineError;
use pdf_narrate::narration::{
    AudioCache, Dispatcher, NarrationSession, SegmentState, default_cache_dir,
};
use pdf_narrate::output::{self, Manifest, RunInfo};
use pdf_narrate::pipeline::Pipeline;
use pdf_narrate::text::{self, ChunkSpec, ChunkUnit, FilterLevel};
use std::path::PathBuf;
use std::sync::Arc;
use tts_client::{Narrator, ProviderKind, get_narrator};

/// Characters of cleaned text shown by --preview
const PREVIEW_CHARS: usize = 1500;

#[derive(Parser, Debug)]
#[command(name = "pdf-narrate")]
#[command(about = "Convert scientific PDFs to narrated audio, skipping references and citations", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF file
    pdf_file: Option<PathBuf>,

    /// Filter level: none, skip-references, skip-references-and-citations, main-sections-only
    #[arg(short, long)]
    filter: Option<String>,

    /// Chunk size unit: characters or words
    #[arg(long)]
    unit: Option<String>,

    /// Maximum chunk size, in --unit
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Voice or language code passed to the narrator
    #[arg(long)]
    voice: Option<String>,

    /// Narration provider: google-translate, openai, mock
    #[arg(long)]
    provider: Option<String>,

    /// Print the first N sentences of the cleaned text (default from config)
    #[arg(long, value_name = "N")]
    summary: Option<Option<usize>>,

    /// Print the beginning of the cleaned text
    #[arg(long)]
    preview: bool,

    /// Clean and chunk only, do not narrate
    #[arg(long)]
    dry_run: bool,

    /// Parts to narrate (e.g., "3", "2-5", "4-")
    #[arg(long)]
    parts: Option<String>,

    /// Extra passes over parts that failed
    #[arg(long, default_value_t = 1)]
    retry_passes: u32,

    /// Output directory (default: <pdf-name>_audio)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not read or write the on-disk audio cache
    #[arg(long)]
    no_cache: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Audio cache management
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Show the audio cache directory
    Path,
    /// Delete all cached audio
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default filter level
    SetFilter {
        /// none, skip-references, skip-references-and-citations, main-sections-only
        level: String,
    },
    /// Set default voice
    SetVoice {
        /// Voice or language code
        voice: String,
    },
    /// Set default chunk size
    SetChunkSize {
        /// Maximum chunk size
        size: usize,
        /// Unit: characters or words
        #[arg(long)]
        unit: Option<String>,
    },
    /// Set default narration provider
    SetProvider {
        /// google-translate, openai or mock
        provider: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Handle subcommands
    match &args.command {
        Some(Commands::Config { action }) => {
            return handle_config_command(action);
        }
        Some(Commands::Cache { action }) => {
            return handle_cache_command(action);
        }
        None => {}
    }

    // Require PDF file for narration
    let pdf_path = args.pdf_file.clone().ok_or_else(|| {
        anyhow::anyhow!("PDF file path is required. Run 'pdf-narrate --help' for usage.")
    })?;

    if !pdf_path.exists() {
        anyhow::bail!("PDF file not found: {}", pdf_path.display());
    }

    // Load configuration and fail fast on bad settings
    let mut config = PdfNarrateConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args)?;
    config.validate()?;
    let spec = config.chunk_spec()?;
    let summary_sentences = match args.summary {
        Some(Some(0)) => {
            return Err(PipelineError::config("summary length must be at least 1").into());
        }
        Some(n) => Some(n.unwrap_or(config.summary_sentences)),
        None => None,
    };

    let provider = check_provider_bound(&config, &spec)?;

    log::debug!("PDF: {}", pdf_path.display());
    log::debug!("Filter: {}", config.filter);
    log::debug!("Chunks: {} {}", spec.size, spec.unit);
    log::debug!("Provider: {:?} (voice {})", provider, config.tts.voice);

    // Extract
    eprintln!("Reading PDF: {}", pdf_path.display());
    let bytes = std::fs::read(&pdf_path)
        .with_context(|| format!("Failed to read {}", pdf_path.display()))?;
    let document = Document::extract(&bytes, &PdfExtractor).map_err(PipelineError::from)?;
    eprintln!(
        "Pages: {}, Words: ~{}",
        document.page_count(),
        document.total_words()
    );

    // Clean and chunk
    let mut pipeline = Pipeline::new(config.cleaning_profile()?);
    let prepared = pipeline.prepare(&document, config.filter, &spec);
    eprintln!(
        "Cleaned text ({}): {} characters, {} part(s)",
        config.filter,
        prepared.cleaned.chars().count(),
        prepared.chunks.len()
    );

    if let Some(n) = summary_sentences {
        println!("Summary:\n{}\n", text::summarize(&prepared.cleaned, n));
    }

    if args.preview {
        println!("Preview:\n{}\n", preview(&prepared.cleaned, PREVIEW_CHARS));
    }

    if prepared.chunks.is_empty() {
        eprintln!("Nothing to narrate at filter level {}.", config.filter);
        return Ok(());
    }

    if args.dry_run {
        for chunk in &prepared.chunks {
            eprintln!(
                "  {}: {} characters",
                chunk.label(),
                chunk.text.chars().count()
            );
        }
        return Ok(());
    }

    let ordinals = parse_parts_range(&args.parts, prepared.chunks.len())?;
    if ordinals.is_empty() {
        anyhow::bail!(
            "No parts selected (document has {} part(s))",
            prepared.chunks.len()
        );
    }

    let narrator: Arc<dyn Narrator> = Arc::from(
        get_narrator(&config.tts).context("Failed to set up narration provider")?,
    );
    narrator
        .is_available()
        .with_context(|| format!("Narration provider '{}' is not available", narrator.name()))?;

    let cache = if args.no_cache {
        AudioCache::in_memory()
    } else {
        AudioCache::persistent(cache_dir(&config)?)?
    };

    let mut dispatcher = Dispatcher::new(Arc::clone(&narrator), config.tts.voice.clone(), cache)
        .with_max_retries(config.max_retries);
    let mut session = NarrationSession::new(prepared.chunks);

    eprintln!("Narrating {} part(s)...", ordinals.len());
    let pb = ProgressBar::new(ordinals.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let on_done = |state: &SegmentState| {
        pb.inc(1);
        pb.set_message(format!("{} {:?}", state.label, state.status));
    };
    let mut progress = if args.parts.is_some() {
        session
            .generate_many(ordinals, &mut dispatcher, on_done)
            .await
    } else {
        session.generate_all(&mut dispatcher, on_done).await
    };
    pb.finish_with_message("Narration complete!");

    for pass in 1..=args.retry_passes {
        if progress.failed == 0 {
            break;
        }
        eprintln!("Retrying {} failed part(s) (pass {})...", progress.failed, pass);
        progress = session.retry_failed(&mut dispatcher, |_| {}).await;
    }

    let (hits, misses) = dispatcher.cache().stats();
    log::debug!("Audio cache: {} hit(s), {} miss(es)", hits, misses);

    // Write audio parts and manifest
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| output::default_output_dir(&pdf_path));
    let manifest = Manifest::new(
        RunInfo {
            source: pdf_path.display().to_string(),
            document_id: document.id().to_string(),
            filter: config.filter,
            chunk_unit: spec.unit,
            chunk_size: spec.size.get(),
            provider: narrator.name().to_string(),
            voice: config.tts.voice.clone(),
        },
        &session,
    );
    let written = output::write_outputs(&output_dir, &session, &manifest)?;

    // Report summary
    eprintln!(
        "\nReady: {}, Failed: {}, Not requested: {}",
        progress.ready, progress.failed, progress.pending
    );
    for state in session.states().iter().filter(|s| s.is_failed()) {
        eprintln!(
            "  {}: {}",
            state.label,
            state.error.as_deref().unwrap_or("Unknown error")
        );
    }
    eprintln!("Output: {} ({} file(s))", output_dir.display(), written.len());

    if progress.ready == 0 {
        anyhow::bail!("No audio generated");
    }

    Ok(())
}

/// Audio cache directory from config, or the user cache directory.
/// Check the chunk size against the provider's input limit.
///
/// Needs no credentials, so --dry-run works before any key is set.
fn check_provider_bound(config: &PdfNarrateConfig, spec: &ChunkSpec) -> Result<ProviderKind> {
    let kind = ProviderKind::from_str(&config.tts.provider)?;
    spec.check_bound(kind.max_input_chars())?;
    Ok(kind)
}

fn cache_dir(config: &PdfNarrateConfig) -> Result<PathBuf> {
    match &config.cache_dir {
        Some(dir) => Ok(dir.clone()),
        None => default_cache_dir(),
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    builder.format_timestamp(None).format_target(false);
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

/// Apply command-line overrides on top of the config file.
fn apply_overrides(config: &mut PdfNarrateConfig, args: &Args) -> Result<()> {
    if let Some(level) = &args.filter {
        config.filter = level.parse()?;
    }
    if let Some(unit) = &args.unit {
        config.chunk_unit = unit.parse()?;
    }
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if let Some(voice) = &args.voice {
        config.tts.voice = voice.clone();
    }
    if let Some(provider) = &args.provider {
        ProviderKind::from_str(provider)?;
        config.tts.provider = provider.clone();
    }
    Ok(())
}

/// First `max_chars` characters of `text`, with an ellipsis if cut.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Parse a 1-based part range like "2-5", "4-" or "3" into ordinals.
fn parse_parts_range(range: &Option<String>, total: usize) -> Result<Vec<usize>> {
    match range {
        None => Ok((1..=total).collect()),
        Some(r) => {
            let (start, end) = if let Some((start, end)) = r.split_once('-') {
                let start: usize = start.trim().parse().context("Invalid start part")?;
                let end: usize = if end.trim().is_empty() {
                    total
                } else {
                    end.trim().parse().context("Invalid end part")?
                };
                (start, end)
            } else {
                let part: usize = r.trim().parse().context("Invalid part number")?;
                (part, part)
            };

            if start == 0 {
                anyhow::bail!("Parts are numbered from 1");
            }
            if start > end {
                anyhow::bail!("Invalid part range '{}': start is after end", r);
            }
            Ok((start..=end.min(total)).collect())
        }
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PdfNarrateConfig::load()?;
            println!("Configuration file: {:?}", PdfNarrateConfig::config_path()?);
            println!();
            println!("filter = \"{}\"", config.filter);
            println!("chunk_unit = \"{}\"", config.chunk_unit);
            println!("chunk_size = {}", config.chunk_size);
            println!("summary_sentences = {}", config.summary_sentences);
            println!("max_retries = {}", config.max_retries);
            match &config.cache_dir {
                Some(dir) => println!("cache_dir = \"{}\"", dir.display()),
                None => println!("cache_dir = (default)"),
            }
            println!("substitutions = {}", config.substitutions.len());
            println!("sections.trailing = {:?}", config.sections.trailing);
            println!("sections.main = {:?}", config.sections.main);
            println!("tts.provider = \"{}\"", config.tts.provider);
            println!("tts.voice = \"{}\"", config.tts.voice);
            if let Some(model) = &config.tts.model {
                println!("tts.model = \"{}\"", model);
            }
            if config.tts.api_key.is_some() {
                println!("tts.api_key = (set)");
            }
        }
        ConfigAction::SetFilter { level } => {
            let mut config = PdfNarrateConfig::load()?;
            config.filter = level.parse::<FilterLevel>()?;
            config.save()?;
            println!("Default filter level set to: {}", config.filter);
        }
        ConfigAction::SetVoice { voice } => {
            let mut config = PdfNarrateConfig::load()?;
            config.tts.voice = voice.clone();
            config.save()?;
            println!("Default voice set to: {}", voice);
        }
        ConfigAction::SetChunkSize { size, unit } => {
            let mut config = PdfNarrateConfig::load()?;
            let unit = match unit {
                Some(u) => u.parse::<ChunkUnit>()?,
                None => config.chunk_unit,
            };
            let spec = ChunkSpec::new(unit, *size)?;
            config.chunk_unit = spec.unit;
            config.chunk_size = spec.size.get();
            config.save()?;
            println!("Default chunk size set to: {} {}", spec.size, spec.unit);
        }
        ConfigAction::SetProvider { provider } => {
            let mut config = PdfNarrateConfig::load()?;
            ProviderKind::from_str(provider)?;
            config.tts.provider = provider.clone();
            config.save()?;
            println!("Default provider set to: {}", provider);
        }
    }
    Ok(())
}

fn handle_cache_command(action: &CacheAction) -> Result<()> {
    let config = PdfNarrateConfig::load()?;
    let dir = cache_dir(&config)?;
    match action {
        CacheAction::Path => {
            println!("{}", dir.display());
        }
        CacheAction::Clear => {
            if !dir.exists() {
                println!("Audio cache is empty: {}", dir.display());
                return Ok(());
            }
            let mut cache = AudioCache::persistent(&dir)?;
            cache.clear()?;
            println!("Cleared audio cache: {}", dir.display());
        }
    }
    Ok(())
}
