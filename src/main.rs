use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dotlens::braille::{
    translate, translate_normalized, translate_strict, Cell, BRAILLE_BASE, LETTER_PATTERNS,
    UNKNOWN,
};
use dotlens::config;
use dotlens::recognition::{
    RecognitionClient, RecognitionError, TextCache, OCR_KEY_ENV, OCR_URL_ENV,
};

/// Parse and validate a request timeout in seconds (1-300)
fn parse_timeout(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of seconds", s))?;
    if !(1..=300).contains(&secs) {
        return Err(format!(
            "Timeout must be between 1 and 300 seconds, got {}",
            secs
        ));
    }
    Ok(secs)
}

/// dotlens: translate photographed braille into readable text
#[derive(Parser)]
#[command(name = "dotlens")]
#[command(version, about = "Braille dot-pattern translator")]
#[command(long_about = "Translate braille dot-pattern tokens into readable text, \
    either directly from a token string or from a photographed page via a \
    recognition service. Each token is six '0'/'1' flags describing one \
    2x3 braille cell, read row by row.")]
#[command(after_help = "EXAMPLES:
    # Translate a token string directly
    dotlens translate \"100000 101000 110000\"

    # Translate tokens from a file, reporting malformed tokens
    dotlens translate --file page.txt --strict

    # Photograph to text via the recognition service
    dotlens recognize photo.jpg

    # Show the raw recognized tokens without translating
    dotlens recognize photo.jpg --raw

    # Print the alphabet table
    dotlens alphabet

ENVIRONMENT:
    DOTLENS_OCR_URL    Recognition service base URL (overrides config).
    DOTLENS_OCR_KEY    Optional API key for the recognition service.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Custom config file path (default: ~/.config/dotlens/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a space-separated token string to text
    #[command(after_help = "EXAMPLES:
    dotlens translate \"100000 101100 011000 011110 100100\"
    dotlens translate --file page.txt
    dotlens translate --strict \"100000 xx 000000\"")]
    Translate {
        /// Dot-pattern tokens (joined with single spaces)
        #[arg(required_unless_present = "file")]
        tokens: Vec<String>,

        /// Read the token string from a file instead
        #[arg(long, short = 'f', conflicts_with = "tokens")]
        file: Option<PathBuf>,

        /// Report each malformed or unmapped token on stderr and exit
        /// nonzero if any token failed
        #[arg(long)]
        strict: bool,

        /// Split on whitespace runs instead of single spaces (drops the
        /// empty-token '?' artifacts of doubled spaces)
        #[arg(long)]
        normalize: bool,
    },

    /// Recognize a photographed page and translate it
    ///
    /// Sends the image to the recognition service, caches the recognized
    /// token text locally, and prints the translation.
    #[command(after_help = "EXAMPLES:
    dotlens recognize photo.jpg
    dotlens recognize photo.jpg --raw
    dotlens recognize photo.jpg --no-cache

ENVIRONMENT:
    DOTLENS_OCR_URL    Required (or [recognition].base_url in the config file).
    DOTLENS_OCR_KEY    Optional API key.")]
    Recognize {
        /// Path to the image file
        image: PathBuf,

        /// Print the raw recognized token string instead of translating
        #[arg(long)]
        raw: bool,

        /// Bypass the recognition cache for this call
        #[arg(long)]
        no_cache: bool,

        /// Split on whitespace runs instead of single spaces
        #[arg(long)]
        normalize: bool,

        /// Request timeout in seconds (1-300, default: 30)
        #[arg(long, value_parser = parse_timeout)]
        timeout: Option<u64>,
    },

    /// Print the alphabet table
    Alphabet,

    /// Manage the recognition cache
    #[command(after_help = "EXAMPLES:
    dotlens cache list           # List all cached recognitions
    dotlens cache clear          # Remove all cached recognitions
    dotlens cache clear abc123   # Remove a specific entry by hash")]
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List all cached recognitions with hashes and sizes
    List,
    /// Clear cached recognitions (all or by specific hash)
    Clear {
        /// Specific entry hash to clear (clears all if not provided)
        hash: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Format bytes as human-readable string (KB, MB, GB)
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Build the TextCache honoring a config dir override.
fn open_cache(cfg: &config::Config) -> Result<TextCache, String> {
    match cfg.cache.dir {
        Some(ref dir) => TextCache::new_initialized(dir.clone())
            .map_err(|e| format!("Failed to initialize cache at '{}': {}", dir.display(), e)),
        None => TextCache::with_default_dir_initialized()
            .map_err(|e| format!("Failed to initialize cache directory: {}", e)),
    }
}

/// Resolve the recognition service URL: environment > config file.
fn resolve_service_url(cfg: &config::Config) -> Result<String, String> {
    if let Ok(url) = std::env::var(OCR_URL_ENV) {
        return Ok(url);
    }
    if let Some(ref url) = cfg.recognition.base_url {
        return Ok(url.clone());
    }
    Err(format!(
        "Recognition service URL is not configured.\n\n\
        Set it in the environment:\n\
            export {}=\"http://localhost:5000\"\n\n\
        Or in the config file ({}):\n\
            [recognition]\n\
            base_url = \"http://localhost:5000\"",
        OCR_URL_ENV,
        config::default_path().display()
    ))
}

/// Run the translate command.
fn run_translate(
    tokens: Vec<String>,
    file: Option<PathBuf>,
    strict: bool,
    normalize: bool,
) -> Result<(), String> {
    let input = match file {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
            // Trailing newlines are editor artifacts, not tokens
            content.trim_end_matches(['\n', '\r']).to_string()
        }
        None => tokens.join(" "),
    };

    if strict {
        let results = translate_strict(&input);
        let mut failures = 0;
        let mut output = String::with_capacity(results.len());
        for (index, result) in results.iter().enumerate() {
            match result {
                Ok(letter) => output.push(*letter),
                Err(e) => {
                    output.push(UNKNOWN);
                    failures += 1;
                    eprintln!("token {}: {}", index, e);
                }
            }
        }
        println!("{}", output);
        if failures > 0 {
            return Err(format!(
                "{} of {} token(s) failed to translate",
                failures,
                results.len()
            ));
        }
        return Ok(());
    }

    let output = if normalize {
        translate_normalized(&input)
    } else {
        translate(&input)
    };
    let unknowns = output.chars().filter(|&c| c == UNKNOWN).count();
    if unknowns > 0 {
        eprintln!(
            "Warning: {} token(s) could not be translated (shown as '{}').",
            unknowns, UNKNOWN
        );
    }
    println!("{}", output);
    Ok(())
}

/// Run the recognize command: image -> cache/service -> translation.
fn run_recognize(
    image_path: &PathBuf,
    raw: bool,
    no_cache: bool,
    normalize: bool,
    timeout: Option<u64>,
    cfg: &config::Config,
) -> Result<(), String> {
    let image = std::fs::read(image_path)
        .map_err(|e| format!("Failed to read image '{}': {}", image_path.display(), e))?;

    let use_cache = cfg.cache.enabled && !no_cache;
    let cache = if use_cache {
        Some(open_cache(cfg)?)
    } else {
        None
    };

    // Cached recognition skips the service round trip entirely
    let text = if let Some(cached) = cache.as_ref().and_then(|c| c.get(&image)) {
        log::info!("Recognition cache hit for '{}'", image_path.display());
        cached
    } else {
        let base_url = resolve_service_url(cfg)?;
        let api_key = std::env::var(OCR_KEY_ENV).ok();

        let timeout_secs = timeout.or(cfg.recognition.timeout_secs);
        let client = match timeout_secs {
            Some(secs) => RecognitionClient::with_timeout(
                base_url,
                api_key,
                std::time::Duration::from_secs(secs),
            ),
            None => RecognitionClient::with_base_url(base_url, api_key),
        }
        .map_err(|e| format!("Failed to create recognition client: {}", e))?;

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| format!("Failed to create async runtime: {}", e))?;

        let recognized = rt
            .block_on(client.recognize_with_retry(&image))
            .map_err(|e| match e {
                RecognitionError::MissingServiceUrl => {
                    "Recognition service URL is not configured.".to_string()
                }
                other => format!("Recognition failed: {}", other),
            })?;

        if let Some(confidence) = recognized.confidence {
            log::info!("Service confidence: {:.2}", confidence);
        }

        if let Some(ref c) = cache {
            if let Err(e) = c.store_with_cleanup(&image, &recognized.text, cfg.cache.max_size_mb) {
                log::warn!("Failed to cache recognition result: {}", e);
            }
        }

        recognized.text
    };

    if raw {
        println!("{}", text);
        return Ok(());
    }

    let output = if normalize || cfg.translate.normalize {
        translate_normalized(&text)
    } else {
        translate(&text)
    };
    let unknowns = output.chars().filter(|&c| c == UNKNOWN).count();
    if unknowns > 0 {
        eprintln!(
            "Warning: {} cell(s) could not be translated (shown as '{}').",
            unknowns, UNKNOWN
        );
    }
    println!("{}", output);
    Ok(())
}

/// Print the alphabet table with glyphs.
fn run_alphabet() {
    println!("Letter patterns (dots read row by row, '1' = raised):\n");
    for (pattern, letter) in LETTER_PATTERNS {
        let glyph = Cell::parse(pattern)
            .map(|cell| cell.glyph())
            .unwrap_or(BRAILLE_BASE);
        println!("  {}  {}  {}", glyph, letter, pattern);
    }
}

/// Run cache subcommand.
fn run_cache(action: CacheAction, cfg: &config::Config) -> Result<(), String> {
    let cache = open_cache(cfg)?;

    match action {
        CacheAction::List => {
            let entries = cache
                .list_entries()
                .map_err(|e| format!("Failed to list cache entries: {}", e))?;

            if entries.is_empty() {
                println!("Cache is empty.");
                return Ok(());
            }

            println!("Cached recognitions:\n");
            for entry in &entries {
                let text_display = entry
                    .text
                    .as_ref()
                    .map(|t| {
                        // Truncate long token strings for display
                        if t.len() > 50 {
                            format!("{}...", &t[..47])
                        } else {
                            t.clone()
                        }
                    })
                    .unwrap_or_else(|| "(unreadable)".to_string());

                println!(
                    "  {} {} \"{}\"",
                    entry.hash,
                    format_size(entry.size_bytes),
                    text_display
                );
            }

            let total_size = cache
                .total_size_bytes()
                .map_err(|e| format!("Failed to calculate total size: {}", e))?;
            println!(
                "\nTotal: {} entries, {}",
                entries.len(),
                format_size(total_size)
            );

            Ok(())
        }
        CacheAction::Clear { hash } => {
            match hash {
                Some(h) => {
                    let removed = cache
                        .remove(&h)
                        .map_err(|e| format!("Failed to remove cached entry: {}", e))?;

                    if removed {
                        println!("Removed cached entry: {}", h);
                    } else {
                        println!("No cached entry found with hash: {}", h);
                    }
                }
                None => {
                    let count = cache
                        .clear_all()
                        .map_err(|e| format!("Failed to clear cache: {}", e))?;

                    if count == 0 {
                        println!("Cache is already empty.");
                    } else {
                        println!(
                            "Removed {} cached entr{}.",
                            count,
                            if count == 1 { "y" } else { "ies" }
                        );
                    }
                }
            }
            Ok(())
        }
    }
}

/// Handle config subcommand actions.
fn handle_config_action(action: ConfigAction, cfg: &config::Config, config_path: Option<&PathBuf>) {
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  Strict translation: {}", cfg.translate.strict);
            println!("  Normalize whitespace: {}", cfg.translate.normalize);
            println!(
                "  Recognition URL: {}",
                std::env::var(OCR_URL_ENV)
                    .ok()
                    .or_else(|| cfg.recognition.base_url.clone())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!(
                "  Request timeout: {}s",
                cfg.recognition.timeout_secs.unwrap_or(30)
            );
            println!("  Cache enabled: {}", cfg.cache.enabled);
            println!("  Cache max size: {} MB", cfg.cache.max_size_mb);
            println!();

            let path = config_path.cloned().unwrap_or_else(config::default_path);
            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
        }
        ConfigAction::Init => {
            let path = config_path.cloned().unwrap_or_else(config::default_path);

            if path.exists() {
                eprintln!("Config file already exists: {}", path.display());
                eprintln!("Use 'dotlens config show' to view current settings.");
                std::process::exit(1);
            }

            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Error creating config directory: {}", e);
                    std::process::exit(1);
                }
            }

            let default_config = r#"# dotlens configuration

[translate]
# Report per-token diagnostics instead of folding failures into '?'
strict = false
# Split tokens on whitespace runs instead of single spaces
normalize = false

[recognition]
# Recognition service base URL (DOTLENS_OCR_URL overrides this)
# base_url = "http://localhost:5000"
# Request timeout in seconds
timeout_secs = 30

[cache]
# Cache recognized token text by image hash
enabled = true
# Cache directory override
# dir = "/path/to/cache"
# Evict oldest entries past this size
max_size_mb = 50
"#;

            if let Err(e) = std::fs::write(&path, default_config) {
                eprintln!("Error writing config file: {}", e);
                std::process::exit(1);
            }

            println!("Created config file: {}", path.display());
        }
    }
}

/// Load .env file before anything else.
///
/// Does not override existing environment variables.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn main() {
    load_env();

    let cli = Cli::parse();

    // If --config is specified, a broken file is an error; otherwise fall
    // back to defaults with a warning.
    let cfg = match config::Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            if cli.config.is_some() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            eprintln!("Warning: {}", e);
            eprintln!("Using default settings.\n");
            config::Config::default()
        }
    };

    match cli.command {
        Commands::Translate {
            tokens,
            file,
            strict,
            normalize,
        } => {
            // CLI flags > config file
            let strict = strict || cfg.translate.strict;
            let normalize = normalize || cfg.translate.normalize;
            if let Err(e) = run_translate(tokens, file, strict, normalize) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Recognize {
            image,
            raw,
            no_cache,
            normalize,
            timeout,
        } => {
            if let Err(e) = run_recognize(&image, raw, no_cache, normalize, timeout, &cfg) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Alphabet => run_alphabet(),
        Commands::Cache { action } => {
            if let Err(e) = run_cache(action, &cfg) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Config { action } => {
            handle_config_action(action, &cfg, cli.config.as_ref());
        }
    }
}
