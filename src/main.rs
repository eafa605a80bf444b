//! Main entry point for the runtar CLI application.
//!
//! This binary provides a command-line interface for listing, extracting and
//! verifying tar files from both local filesystem and remote HTTP URLs.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use runtar::{Cli, EntryInfo, HttpLoader, Load, LocalFileLoader, TarExtractor, Verification};

/// Application entry point.
///
/// Parses command-line arguments, loads the whole archive into memory and
/// dispatches to the appropriate handler.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    let data = if cli.is_http_url() {
        // Remote tar files are fetched in full
        let loader = HttpLoader::new(cli.file.clone())?;
        let data = loader.load().await?;
        info!(
            "Loaded {} ({} transferred)",
            loader.source(),
            format_size(loader.transferred_bytes())
        );
        data
    } else {
        LocalFileLoader::new(Path::new(&cli.file))?.load().await?
    };

    process_tar(TarExtractor::new(data), &cli).await
}

/// Process a tar archive based on CLI options.
///
/// - List mode (`-l` or `-v`): Display archive contents
/// - Verify mode (`-t`): Compare entries with files on disk
/// - Extract mode: Extract files matching the specified filters
async fn process_tar(extractor: TarExtractor, cli: &Cli) -> Result<()> {
    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        return list_files(&extractor, cli.verbose);
    }

    let entries = extractor.list_entries()?;
    let selected = select_entries(&entries, cli);

    if let Some(ref dir) = cli.verify_dir {
        return verify_files(&extractor, &selected, Path::new(dir)).await;
    }

    // Extract each matching file
    let multiple_files = cli.pipe && selected.len() > 1;
    for entry in selected {
        extract_file(&extractor, entry, cli, multiple_files).await?;
    }

    Ok(())
}

/// Apply the positional and `-x` filters to the archive entries.
///
/// Directories are skipped; they are created as needed during extraction.
fn select_entries<'e>(entries: &'e [EntryInfo], cli: &Cli) -> Vec<&'e EntryInfo> {
    entries
        .iter()
        .filter(|e| {
            if e.is_directory {
                return false;
            }

            // If specific files are requested via positional arguments,
            // only include entries that match
            if !cli.files.is_empty() {
                let matches = cli.files.iter().any(|f| {
                    if has_glob_chars(f) {
                        glob_match(f, &e.file_name)
                    } else {
                        // No wildcards: exact match on filename or full path
                        let basename = Path::new(&e.file_name)
                            .file_name()
                            .map(|s| s.to_string_lossy())
                            .unwrap_or_default();
                        e.file_name == *f || basename == *f
                    }
                });
                if !matches {
                    return false;
                }
            }

            // Exclude files matching the -x patterns
            !cli
                .exclude
                .iter()
                .any(|x| e.file_name.contains(x) || glob_match(x, &e.file_name))
        })
        .collect()
}

/// List files in the tar archive.
///
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Table with size, archive span and header offset
fn list_files(extractor: &TarExtractor, verbose: bool) -> Result<()> {
    let entries = extractor.list_entries()?;

    if verbose {
        println!("{:>10}  {:>10}  {:>10}  Name", "Length", "Span", "Offset");
        println!("{}", "-".repeat(60));
    }

    let mut total_size = 0u64;
    let mut total_span = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        if verbose {
            println!(
                "{:>10}  {:>10}  {:>10}  {}",
                entry.size, entry.span, entry.offset, entry.file_name
            );

            total_span += entry.span;
            if !entry.is_directory {
                total_size += entry.size;
                file_count += 1;
            }
        } else {
            println!("{}", entry.file_name);
        }
    }

    if verbose {
        println!("{}", "-".repeat(60));
        println!(
            "{:>10}  {:>10}  {:>10}  {} files",
            total_size, total_span, "", file_count
        );
    }

    Ok(())
}

/// Extract a single file from the archive.
///
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
async fn extract_file(
    extractor: &TarExtractor,
    entry: &EntryInfo,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    // Pipe mode: write file contents directly to stdout
    if cli.pipe {
        if show_filename {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(format!("--- {} ---\n", entry.file_name).as_bytes())
                .await?;
        }
        return extractor.extract_to_stdout(entry).await;
    }

    if !entry.is_safe_path() && !cli.junk_paths {
        warn!("Skipping: {} (unsafe path)", entry.file_name);
        return Ok(());
    }

    let file_name = if cli.junk_paths {
        // Junk paths: use only the base filename, ignore directory structure
        match Path::new(&entry.file_name).file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => {
                warn!("Skipping: {} (no file name)", entry.file_name);
                return Ok(());
            }
        }
    } else {
        entry.file_name.clone()
    };

    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(&file_name),
        None => PathBuf::from(&file_name),
    };

    // Handle existing files based on overwrite options
    if output_path.exists() {
        if cli.never_overwrite {
            info!("Skipping: {} (file exists)", entry.file_name);
            return Ok(());
        }

        if !cli.overwrite {
            warn!("Skipping: {} (use -o to overwrite)", entry.file_name);
            return Ok(());
        }
    }

    info!("  extracting: {}", entry.file_name);
    extractor.extract_to_file(entry, &output_path).await?;

    Ok(())
}

/// Compare each entry with the file of the same name under `dir`.
///
/// Fails after checking everything when any entry does not match.
async fn verify_files(extractor: &TarExtractor, entries: &[&EntryInfo], dir: &Path) -> Result<()> {
    let mut failures = 0usize;

    for entry in entries {
        match extractor.verify_entry_in(entry, dir).await? {
            Verification::Match => println!("  OK: {}", entry.file_name),
            Verification::Missing => {
                let path = dir.join(&entry.file_name);
                println!("  MISSING: {} ({} not found)", entry.file_name, path.display());
                failures += 1;
            }
            Verification::UnsafePath => {
                println!("  UNSAFE: {} (path leaves {})", entry.file_name, dir.display());
                failures += 1;
            }
            Verification::SizeMismatch { archived, on_disk } => {
                println!(
                    "  SIZE: {} (archived {} bytes, on disk {} bytes)",
                    entry.file_name, archived, on_disk
                );
                failures += 1;
            }
            Verification::ContentMismatch { offset } => {
                println!("  DIFFERS: {} (first difference at byte {})", entry.file_name, offset);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} files differ", failures, entries.len());
    }

    Ok(())
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Try matching zero characters (skip the star)
            // OR matching one character (keep the star for more)
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
