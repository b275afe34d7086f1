//! teacx CLI - Command-line tool for Tea for God CX resources.
//!
//! This is the main entry point for the teacx command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use teacx_common::ResourceHeader;
use teacx_cx::record::{from_json_str, to_json_string};
use teacx_cx::{from_markup, CxFile, CxHeader, MarkupOptions, MarkupWriter};

/// Format version written when neither a template nor an option gives one.
const DEFAULT_FORMAT_VERSION: u16 = 1;

/// teacx - Tea for God CX resource converter
#[derive(Parser)]
#[command(name = "teacx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert CX files to markup or JSON records
    Decode {
        /// Input CX files
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory (default: next to each input)
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: Option<PathBuf>,

        /// Write JSON records instead of markup
        #[arg(long)]
        json: bool,

        /// Omit the generator comment at the top of markup output
        #[arg(long)]
        no_header_comment: bool,
    },

    /// Convert a markup file or JSON record to CX
    Encode {
        /// Input markup (.xml) or record (.json) file
        #[arg(short, long)]
        input: PathBuf,

        /// Output CX file
        #[arg(short, long)]
        output: PathBuf,

        /// CX file whose header supplies defaults for markup input
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Original file path stored in the header
        #[arg(long)]
        original_path: Option<String>,

        /// Header text stored in the header
        #[arg(long)]
        header_text: Option<String>,

        /// Build number stored in the header
        #[arg(long, env = "TEACX_BUILD_NUMBER")]
        build_number: Option<u32>,

        /// Format version stored in the header
        #[arg(long, env = "TEACX_VERSION")]
        format_version: Option<u16>,
    },

    /// Show the header and tree statistics of a CX file
    Info {
        /// Input CX file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the resource header generated from a source file
    Digest {
        /// Source markup file
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Header overrides given on the command line.
struct HeaderArgs {
    template: Option<PathBuf>,
    original_path: Option<String>,
    header_text: Option<String>,
    build_number: Option<u32>,
    format_version: Option<u16>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Decode {
            input,
            output,
            json,
            no_header_comment,
        } => {
            cmd_decode(&input, output.as_deref(), json, !no_header_comment)?;
        }
        Commands::Encode {
            input,
            output,
            template,
            original_path,
            header_text,
            build_number,
            format_version,
        } => {
            let args = HeaderArgs {
                template,
                original_path,
                header_text,
                build_number,
                format_version,
            };
            cmd_encode(&input, &output, args)?;
        }
        Commands::Info { input } => {
            cmd_info(&input)?;
        }
        Commands::Digest { input } => {
            cmd_digest(&input)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_decode(
    inputs: &[PathBuf],
    output: Option<&Path>,
    json: bool,
    header_comment: bool,
) -> Result<()> {
    if let Some(dir) = output {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let writer = MarkupWriter::new(MarkupOptions {
        header_comment,
        ..MarkupOptions::default()
    });
    let extension = if json { "json" } else { "xml" };

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let errors = AtomicUsize::new(0);

    inputs.par_iter().for_each(|input| {
        let target = output_path(input, output, extension);
        let result = decode_one(input, &target, &writer, json);

        match result {
            Ok(()) => debug!(input = %input.display(), output = %target.display(), "decoded"),
            Err(e) => {
                pb.suspend(|| error!("{}: {:#}", input.display(), e));
                errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        pb.inc(1);
    });

    pb.finish_with_message("Done");
    let errors = errors.into_inner();
    info!(
        "Decoded {} files in {:?} ({} errors)",
        inputs.len() - errors,
        start.elapsed(),
        errors
    );

    if errors > 0 {
        anyhow::bail!("{} of {} files failed to decode", errors, inputs.len());
    }
    Ok(())
}

fn decode_one(input: &Path, target: &Path, writer: &MarkupWriter, json: bool) -> Result<()> {
    let file = CxFile::read_from_path(input).context("Failed to decode CX file")?;

    let text = if json {
        to_json_string(&file).context("Failed to build JSON record")?
    } else {
        writer.render_file(&file).context("Failed to render markup")?
    };

    fs::write(target, text).with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(())
}

/// `dir/<stem>.<ext>` when an output directory is given, else the input path
/// with its extension replaced.
fn output_path(input: &Path, dir: Option<&Path>, extension: &str) -> PathBuf {
    match (dir, input.file_name()) {
        (Some(dir), Some(name)) => dir.join(name).with_extension(extension),
        _ => input.with_extension(extension),
    }
}

fn cmd_encode(input: &Path, output: &Path, args: HeaderArgs) -> Result<()> {
    info!("Encoding: {} -> {}", input.display(), output.display());

    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let is_json = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let file = if is_json {
        let mut file = from_json_str(&text).context("Failed to read JSON record")?;
        apply_overrides(&mut file.header, &args);
        file
    } else {
        let mut header = match &args.template {
            Some(path) => {
                CxFile::read_from_path(path)
                    .with_context(|| format!("Failed to read template {}", path.display()))?
                    .header
            }
            None => CxHeader {
                version: DEFAULT_FORMAT_VERSION,
                original_file_path: input.display().to_string(),
                ..CxHeader::default()
            },
        };
        apply_overrides(&mut header, &args);

        from_markup(
            &text,
            header.original_file_path,
            header.header_text,
            header.build_number,
            header.version,
        )
        .context("Failed to parse markup")?
    };

    file.write_to_path(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        "Wrote {} nodes (version {}, build {})",
        file.root.descendant_count(),
        file.header.version,
        file.header.build_number
    );

    Ok(())
}

fn apply_overrides(header: &mut CxHeader, args: &HeaderArgs) {
    if let Some(path) = &args.original_path {
        header.original_file_path = path.clone();
    }
    if let Some(text) = &args.header_text {
        header.header_text = text.clone();
    }
    if let Some(build) = args.build_number {
        header.build_number = build;
    }
    if let Some(version) = args.format_version {
        header.version = version;
    }
}

fn cmd_info(input: &Path) -> Result<()> {
    let file = CxFile::read_from_path(input).context("Failed to decode CX file")?;
    let header = &file.header;

    println!("File:              {}", input.display());
    println!("Version:           {}", header.version);
    println!("Build number:      {}", header.build_number);
    println!("Original path:     {}", header.original_file_path);
    println!("Header text:       {:?}", header.header_text);
    println!("Source digest:     {}", header.resource.source_digest);
    println!("Definition digest: {}", header.resource.definition_digest);
    println!("Root type:         {}", file.root.node_type);
    println!("Nodes:             {}", file.root.descendant_count());
    println!("Depth:             {}", file.root.depth());

    Ok(())
}

fn cmd_digest(input: &Path) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let resource = ResourceHeader::generate_from(&text);

    println!("Source digest:     {}", resource.source_digest);
    println!("Definition digest: {}", resource.definition_digest);

    Ok(())
}
