//! lark CLI - the lark archiver
//!
//! A thin command surface over the `lark-archive` engine: add, extract,
//! list, delete, test and update, with recursive directory walking handled
//! here so the engine never touches the filesystem tree.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use lark_archive::Archive;
use lark_core::{filetime, LarkError, Level, Method};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lark")]
#[command(author, version, about = "The lark archiver")]
#[command(long_about = "
lark stores named byte streams in a single container file, each entry
independently compressed and CRC-checked.

Examples:
  lark a backup.ark notes.txt src/ -r -m lzhuf -c 7
  lark l backup.ark -v
  lark x backup.ark -o restored/
  lark d backup.ark notes.txt
  lark t backup.ark
  lark u backup.ark notes.txt
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add files to an archive (created if missing)
    #[command(alias = "a")]
    Add {
        /// Archive file
        archive: PathBuf,

        /// Files or directories to add
        files: Vec<PathBuf>,

        /// Recurse into directories
        #[arg(short, long)]
        recursive: bool,

        /// Compression method
        #[arg(short, long, value_enum, default_value = "deflate")]
        method: MethodArg,

        /// Compression level (0-9)
        #[arg(short = 'c', long, default_value_t = 6)]
        level: u8,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Extract entries
    #[command(alias = "x")]
    Extract {
        /// Archive file
        archive: PathBuf,

        /// Entry names to extract (all if empty)
        names: Vec<String>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List archive contents
    #[command(alias = "l")]
    List {
        /// Archive file
        archive: PathBuf,

        /// Verbose output with per-method totals
        #[arg(short, long)]
        verbose: bool,
    },

    /// Delete entries
    #[command(alias = "d")]
    Delete {
        /// Archive file
        archive: PathBuf,

        /// Entry names to delete
        names: Vec<String>,
    },

    /// Test archive integrity
    #[command(alias = "t")]
    Test {
        /// Archive file
        archive: PathBuf,

        /// Verbose per-entry output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Update entries (replace by name, add otherwise)
    #[command(alias = "u")]
    Update {
        /// Archive file
        archive: PathBuf,

        /// Files or directories to update
        files: Vec<PathBuf>,

        /// Recurse into directories
        #[arg(short, long)]
        recursive: bool,

        /// Compression method
        #[arg(short, long, value_enum, default_value = "deflate")]
        method: MethodArg,

        /// Compression level (0-9)
        #[arg(short = 'c', long, default_value_t = 6)]
        level: u8,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Compression method names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MethodArg {
    Store,
    Lzss,
    Lzhuf,
    Deflate,
    Lzw,
    Lz77,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Store => Method::Store,
            MethodArg::Lzss => Method::Lzss,
            MethodArg::Lzhuf => Method::Lzhuf,
            MethodArg::Deflate => Method::Deflate,
            MethodArg::Lzw => Method::Lzw,
            MethodArg::Lz77 => Method::Lz77,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Add {
            archive,
            files,
            recursive,
            method,
            level,
            verbose,
        } => cmd_add(&archive, &files, recursive, method.into(), level, verbose, false),
        Commands::Update {
            archive,
            files,
            recursive,
            method,
            level,
            verbose,
        } => cmd_add(&archive, &files, recursive, method.into(), level, verbose, true),
        Commands::Extract {
            archive,
            names,
            output,
            verbose,
        } => cmd_extract(&archive, &names, &output, verbose),
        Commands::List { archive, verbose } => cmd_list(&archive, verbose),
        Commands::Delete { archive, names } => cmd_delete(&archive, &names),
        Commands::Test { archive, verbose } => cmd_test(&archive, verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn cmd_add(
    archive_path: &Path,
    files: &[PathBuf],
    recursive: bool,
    method: Method,
    level: u8,
    verbose: bool,
    replace: bool,
) -> CliResult {
    if files.is_empty() {
        return Err("no files specified".into());
    }

    let mut archive = if archive_path.exists() {
        Archive::open(archive_path)?
    } else {
        Archive::create(archive_path)
    };
    let level = Level::new(level);

    let mut sources: Vec<(String, PathBuf)> = Vec::new();
    for path in files {
        collect_sources(path, path, recursive, &mut sources)?;
    }
    debug!("adding {} files to {}", sources.len(), archive_path.display());

    for (name, path) in &sources {
        let data = fs::read(path).map_err(|_| LarkError::SourceNotFound { path: path.clone() })?;
        let mtime = fs::metadata(path)
            .and_then(|m| m.modified())
            .map(filetime::from_system_time)
            .unwrap_or_else(|_| filetime::now());

        if replace {
            archive.update(name, &data, method, level, mtime)?;
        } else {
            archive.add(name, &data, method, level, mtime)?;
        }
        if verbose {
            println!("  {}: {} ({} bytes)", if replace { "u" } else { "a" }, name, data.len());
        }
    }

    archive.save()?;
    println!(
        "{} {} file(s) in {}",
        if replace { "Updated" } else { "Added" },
        sources.len(),
        archive_path.display()
    );
    Ok(())
}

/// Flatten files and (optionally) directory trees into archive names.
fn collect_sources(
    path: &Path,
    base: &Path,
    recursive: bool,
    out: &mut Vec<(String, PathBuf)>,
) -> CliResult {
    if !path.exists() {
        return Err(Box::new(LarkError::SourceNotFound {
            path: path.to_path_buf(),
        }));
    }
    if path.is_dir() {
        if !recursive {
            return Err(format!("{} is a directory (use -r)", path.display()).into());
        }
        let listing = fs::read_dir(path).map_err(|_| LarkError::EnumerationFailed {
            path: path.to_path_buf(),
        })?;
        for child in listing {
            let child = child.map_err(|_| LarkError::EnumerationFailed {
                path: path.to_path_buf(),
            })?;
            collect_sources(&child.path(), base, recursive, out)?;
        }
    } else {
        let name = path
            .strip_prefix(base.parent().unwrap_or(base))
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        out.push((name, path.to_path_buf()));
    }
    Ok(())
}

fn cmd_extract(archive_path: &Path, names: &[String], output: &Path, verbose: bool) -> CliResult {
    let mut archive = Archive::open(archive_path)?;

    let targets: Vec<String> = if names.is_empty() {
        archive.list().entries.iter().map(|e| e.name.clone()).collect()
    } else {
        names.to_vec()
    };

    let bar = progress_bar(targets.len() as u64);
    for name in &targets {
        let out_path = output.join(sanitize(name));
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut sink = fs::File::create(&out_path)?;
        let written = archive.extract(name, &mut sink)?;
        if verbose {
            bar.println(format!("  x {} ({} bytes)", name, written));
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    println!("Extracted {} entrie(s) to {}", targets.len(), output.display());
    Ok(())
}

/// Strip path components that would escape the output directory.
fn sanitize(name: &str) -> PathBuf {
    let mut clean = PathBuf::new();
    for part in Path::new(name).components() {
        if let std::path::Component::Normal(p) = part {
            clean.push(p);
        }
    }
    if clean.as_os_str().is_empty() {
        clean.push("unnamed");
    }
    clean
}

fn cmd_list(archive_path: &Path, verbose: bool) -> CliResult {
    let archive = Archive::open(archive_path)?;
    let listing = archive.list();

    println!("Archive: {}", archive_path.display());
    println!("{:>12} {:>12} {:>7}  {:<8} Name", "Original", "Compressed", "Ratio", "Method");
    for entry in &listing.entries {
        println!(
            "{:>12} {:>12} {:>6.1}%  {:<8} {}",
            entry.original_size,
            entry.compressed_size,
            entry.ratio * 100.0,
            entry.method.to_string(),
            entry.name
        );
    }
    println!(
        "{:>12} {:>12} {:>6.1}%  {} entrie(s)",
        listing.total_original,
        listing.total_compressed,
        listing.overall_ratio() * 100.0,
        listing.len()
    );

    if verbose && !listing.totals.is_empty() {
        println!();
        println!("Per-method totals:");
        for totals in &listing.totals {
            println!(
                "  {:<8} {:>5} entrie(s) {:>12} -> {:>12} bytes",
                totals.method.to_string(),
                totals.entries,
                totals.original_bytes,
                totals.compressed_bytes
            );
        }
    }
    Ok(())
}

fn cmd_delete(archive_path: &Path, names: &[String]) -> CliResult {
    if names.is_empty() {
        return Err("no entry names specified".into());
    }
    let mut archive = Archive::open(archive_path)?;
    let mut removed = 0usize;
    for name in names {
        if archive.delete(name) {
            removed += 1;
        } else {
            println!("  not present: {}", name);
        }
    }
    if removed > 0 {
        archive.save()?;
    }
    println!("Deleted {} entrie(s)", removed);
    Ok(())
}

fn cmd_test(archive_path: &Path, verbose: bool) -> CliResult {
    let mut archive = Archive::open(archive_path)?;
    let total = archive.list().len() as u64;
    let bar = progress_bar(total);

    let report = archive.test_integrity();
    for check in &report.checks {
        match &check.result {
            Ok(()) => {
                if verbose {
                    bar.println(format!("  OK: {}", check.name));
                }
            }
            Err(e) => bar.println(format!("  FAILED: {} - {} (code {})", check.name, e, e.code())),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!(
        "Tested {} entrie(s): {} failed",
        report.checks.len(),
        report.failure_count()
    );
    if !report.all_ok() {
        return Err("archive failed integrity test".into());
    }
    println!("All entries OK");
    Ok(())
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("[{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(sanitize("../etc/passwd"), PathBuf::from("etc/passwd"));
        assert_eq!(sanitize("/abs/path.txt"), PathBuf::from("abs/path.txt"));
        assert_eq!(sanitize("plain.txt"), PathBuf::from("plain.txt"));
        assert_eq!(sanitize(".."), PathBuf::from("unnamed"));
    }

    #[test]
    fn test_method_arg_mapping() {
        assert_eq!(Method::from(MethodArg::Store), Method::Store);
        assert_eq!(Method::from(MethodArg::Lz77), Method::Lz77);
        assert_eq!(Method::from(MethodArg::Deflate), Method::Deflate);
    }
}
