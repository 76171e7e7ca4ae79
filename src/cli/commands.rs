use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use source_indexer::config::IndexConfig;
use source_indexer::error::Result;
use source_indexer::indexer::{relative_path, IndexContext, IndexingProgress, ProgressSnapshot};
use source_indexer::languages::LanguageRegistry;

#[derive(Parser)]
#[command(name = "source-indexer")]
#[command(about = "Offline source-structure indexer: symbols, call graph and directory purposes as JSON")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Index the current directory and print JSON
    source-indexer index

    # Index a project into a file, Python and shell only
    source-indexer index ./proj -o index.json --extensions py,sh

    # List the files that would be indexed
    source-indexer files ./proj

    # Show how an ambiguous file is resolved
    source-indexer detect rules.pl

    # Show the extension table
    source-indexer languages
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log per-file decisions
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a directory and write the JSON index
    Index {
        /// Path to the directory to index
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Write the index to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only index these extensions (comma-separated)
        #[arg(long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// Ignore file read from the root
        #[arg(long)]
        ignore_file: Option<String>,

        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Worker threads (0 = all cores)
        #[arg(long)]
        threads: Option<usize>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,

        /// Show a progress bar on stderr
        #[arg(long)]
        progress: bool,
    },

    /// List selected files with their language
    Files {
        /// Path to the directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only list these extensions (comma-separated)
        #[arg(long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the language resolved for a file
    Detect {
        /// File to inspect
        file: PathBuf,

        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the extension table and ambiguous extensions
    Languages,
}

/// Options of the `index` command.
pub struct IndexOptions {
    pub output: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
    pub ignore_file: Option<String>,
    pub config: Option<PathBuf>,
    pub threads: Option<usize>,
    pub compact: bool,
    pub progress: bool,
}

/// Explicit config file, or `.source-indexer.yml` under `root`.
fn load_config(root: &Path, explicit: Option<&Path>) -> Result<IndexConfig> {
    match explicit {
        Some(path) => IndexConfig::from_file(path),
        None => Ok(IndexConfig::discover(root)),
    }
}

pub fn index_directory(path: &Path, options: IndexOptions) -> Result<()> {
    let mut config = load_config(path, options.config.as_deref())?;
    if let Some(extensions) = options.extensions {
        config.extensions = extensions;
    }
    if let Some(ignore_file) = options.ignore_file {
        config.ignore_file = ignore_file;
    }
    if let Some(threads) = options.threads {
        config.threads = threads;
    }

    let progress = IndexingProgress::new();
    let done = AtomicBool::new(false);

    let index = thread::scope(|scope| {
        if options.progress {
            scope.spawn(|| draw_progress(&progress, &done));
        }
        let result = IndexContext::new(config)
            .with_progress(progress.clone())
            .index(path);
        done.store(true, Ordering::Release);
        result
    })?;

    let json = index.to_json(!options.compact)?;
    match options.output {
        Some(output) => {
            fs::write(&output, json)?;
            eprintln!(
                "Indexed {} files ({} skipped, {} degraded), {} symbols -> {}",
                index.stats.files_indexed,
                index.stats.files_skipped,
                index.stats.files_degraded,
                index.stats.symbols,
                output.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn draw_progress(progress: &IndexingProgress, done: &AtomicBool) {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} files {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    while !done.load(Ordering::Acquire) {
        let snapshot = progress.snapshot();
        bar.set_length(snapshot.files_selected as u64);
        bar.set_position(snapshot.files_done as u64);
        bar.set_message(progress_message(&snapshot));
        thread::sleep(Duration::from_millis(100));
    }
    bar.finish_and_clear();
}

fn progress_message(snapshot: &ProgressSnapshot) -> String {
    let mut message = format!("{}, {} symbols", snapshot.phase.label(), snapshot.symbols);
    if snapshot.files_skipped > 0 {
        message.push_str(&format!(", {} skipped", snapshot.files_skipped));
    }
    if snapshot.files_degraded > 0 {
        message.push_str(&format!(", {} degraded", snapshot.files_degraded));
    }
    if let Some(eta) = snapshot.eta {
        message.push_str(&format!(", ~{}s left", eta.as_secs() + 1));
    }
    message
}

pub fn list_files(path: &Path, extensions: Option<Vec<String>>, config: Option<&Path>) -> Result<()> {
    let mut config = load_config(path, config)?;
    if let Some(extensions) = extensions {
        config.extensions = extensions;
    }

    let mut context = IndexContext::new(config);
    let registry = context.registry().clone();
    let walker = context.walker(path);

    let mut count = 0;
    for file in walker.walk(path)? {
        let content = fs::read(&file)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        let language = registry.resolve(&file, &content);
        println!(
            "{}\t{}",
            relative_path(path, &file),
            language.as_deref().unwrap_or("-")
        );
        count += 1;
    }
    eprintln!("{} files", count);

    Ok(())
}

pub fn detect_file(file: &Path, config: Option<&Path>) -> Result<()> {
    let root = file.parent().unwrap_or(Path::new("."));
    let registry = LanguageRegistry::from_config(&load_config(root, config)?);
    let content = String::from_utf8_lossy(&fs::read(file)?).into_owned();
    let assignment = registry.assign(file, &content);

    println!("File: {}", file.display());
    println!("Extension: {}", assignment.extension);
    println!(
        "Language: {}",
        assignment.language.as_deref().unwrap_or("(none)")
    );
    if let Some(outcome) = &assignment.disambiguation {
        println!("Candidates: {}", assignment.candidates.join(", "));
        for (language, score) in &outcome.scores {
            println!("  {}: {}", language, score);
        }
        if outcome.tie_break_applied {
            println!("Scores tied; tie-break chose {}", outcome.language);
        }
    }

    Ok(())
}

pub fn list_languages() -> Result<()> {
    let registry = LanguageRegistry::new();

    println!("Extensions:");
    for (ext, language) in registry.supported_extensions() {
        let extractor = if registry.has_dedicated_extractor(language) {
            registry.extractor_for(language).name()
        } else {
            "generic"
        };
        println!("  {:<14} {:<20} {}", ext, language, extractor);
    }

    println!();
    println!("Ambiguous extensions:");
    for rule in registry.ambiguous_rules() {
        let [first, second] = rule.candidates();
        println!(
            "  {:<6} {} / {} (tie-break: {})",
            rule.extension,
            first,
            second,
            registry.tie_break_for(rule)
        );
    }

    Ok(())
}
