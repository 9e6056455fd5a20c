use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

// Import from pdfbox-core
use pdfbox_core::{
    parse_tokens, CancelToken, FileArchiveProvider, JavaResolver, PageRange, ToolkitConfig,
    ToolkitHandle, ARCHIVE_NAME,
};

// Import CLI utilities
use pdfbox_cli::ArchiveManager;

#[derive(Parser)]
#[command(name = "pdfbox")]
#[command(about = "Run Apache PDFBox subcommands with streamed input and output")]
struct Args {
    /// Path to custom config file (YAML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the java executable (default: JAVA_HOME, then PATH)
    #[arg(long, global = true)]
    java: Option<PathBuf>,

    /// Path to the PDFBox jar (default: searched, see fetch-archive)
    #[arg(long, global = true)]
    jar: Option<PathBuf>,

    /// Kill the subprocess after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a PDFBox subcommand with literal arguments
    Exec {
        /// Subcommand name, e.g. ExtractText
        command: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run a subcommand on a temp copy of INPUT; use {READER} and {WRITER} in ARGS
    Convert {
        #[arg(short, long)]
        input: PathBuf,
        /// Receives whatever the subcommand writes to {WRITER}
        #[arg(short, long)]
        output: Option<PathBuf>,
        command: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Extract plain text from a PDF (stdout when no output is given)
    Text {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sort text by position on the page
        #[arg(long)]
        sort: bool,
    },

    /// Render a page range of a PDF to image files
    Images {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long, default_value_t = 1)]
        start: u32,
        #[arg(long)]
        end: u32,
        /// Directory receiving the images and summary.json
        #[arg(short = 'd', long)]
        output_dir: PathBuf,
        /// Image format (jpg, png, gif, bmp)
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        dpi: Option<u32>,
    },

    /// Download the pinned PDFBox jar into the data directory
    FetchArchive,

    /// Print the effective configuration as YAML
    ShowConfig,
}

/// Written next to extracted images
#[derive(Serialize)]
struct ImageSummary {
    input: String,
    identity: String,
    start_page: u32,
    end_page: u32,
    extracted_at: DateTime<Utc>,
    images: Vec<ImageEntry>,
}

#[derive(Serialize)]
struct ImageEntry {
    file: String,
    bytes: u64,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<()> {
    let mut config = ToolkitConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        log::info!("📋 Loaded config from: {}", config_path);
    }

    // Apply CLI overrides to config
    if let Some(java) = args.java {
        config.java_path = Some(java);
    }
    if let Some(jar) = args.jar {
        config.archive_path = Some(jar);
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }

    let cancel = CancelToken::new();

    match args.command {
        Command::Exec { command, args } => {
            let handle = open_toolkit(&config)?;
            handle.execute(&cancel, &command, &args)?;
            println!("✅ {} finished", command);
            handle.close()?;
        }
        Command::Convert {
            input,
            output,
            command,
            args,
        } => {
            let handle = open_toolkit(&config)?;
            let tokens = parse_tokens(&args);
            let mut reader = open_input(&input)?;
            match output {
                Some(output) => {
                    let mut buffer = Vec::new();
                    handle.execute_with_reader_and_writer(
                        &cancel,
                        &mut reader,
                        &mut buffer,
                        &command,
                        &tokens,
                    )?;
                    write_output(&output, &buffer)?;
                }
                None => {
                    handle.execute_with_reader(&cancel, &mut reader, &command, &tokens)?;
                    println!("✅ {} finished", command);
                }
            }
            handle.close()?;
        }
        Command::Text {
            input,
            output,
            sort,
        } => {
            let handle = open_toolkit(&config)?;
            let mut reader = open_input(&input)?;
            let mut buffer = Vec::new();
            if sort {
                handle.extract_text_sorted(&cancel, &mut reader, &mut buffer)?;
            } else {
                handle.extract_text(&cancel, &mut reader, &mut buffer)?;
            }
            match output {
                Some(output) => write_output(&output, &buffer)?,
                None => io::Write::write_all(&mut io::stdout().lock(), &buffer)?,
            }
            handle.close()?;
        }
        Command::Images {
            input,
            start,
            end,
            output_dir,
            format,
            dpi,
        } => {
            let mut options = config.extract_options();
            if format.is_some() {
                options.format = format;
            }
            if dpi.is_some() {
                options.dpi = dpi;
            }

            let handle = open_toolkit(&config)?;
            extract_images(&handle, &cancel, &input, PageRange::new(start, end), &options, &output_dir)?;
            handle.close()?;
        }
        Command::FetchArchive => {
            let manager = ArchiveManager::new()?;
            manager.ensure_archive()?;
        }
        Command::ShowConfig => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}

/// Create the toolkit handle from the effective config
fn open_toolkit(config: &ToolkitConfig) -> Result<ToolkitHandle> {
    let archive = ArchiveManager::new()?.find_archive_path(config)?;
    log::info!("🔧 Using JAR: {}", archive.display());

    let name = config
        .archive_name
        .clone()
        .unwrap_or_else(|| ARCHIVE_NAME.to_string());
    let provider = FileArchiveProvider::with_name(name, archive);

    let mut resolver = JavaResolver::from_env();
    if let Some(java) = &config.java_path {
        log::info!("🔧 Using specified java: {}", java.display());
        resolver = resolver.with_explicit(java);
    }

    ToolkitHandle::create_with_config(&provider, &resolver, config)
        .context("Failed to start PDFBox toolkit")
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open input: {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write: {}", path.display()))?;
    println!("💾 Saved to: {} ({} bytes)", path.display(), content.len());
    Ok(())
}

fn extract_images(
    handle: &ToolkitHandle,
    cancel: &CancelToken,
    input: &Path,
    range: PageRange,
    options: &pdfbox_core::ExtractOptions,
    output_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let source_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    println!("📄 Rendering pages {}-{} of {}", range.start, range.end, input.display());

    let mut reader = open_input(input)?;
    let mut identity = source_name.clone().unwrap_or_default();
    let mut images = Vec::new();

    handle.extract_page_images(
        cancel,
        source_name.as_deref(),
        &mut reader,
        range,
        options,
        |_, source, relative_path, content| {
            let dest = output_dir.join(relative_path);
            let mut file = File::create(&dest)?;
            let bytes = io::copy(content, &mut file)?;
            println!("  💾 {} ({} bytes)", dest.display(), bytes);
            identity = source.to_string();
            images.push(ImageEntry {
                file: relative_path.to_string(),
                bytes,
            });
            Ok(())
        },
    )?;

    let summary = ImageSummary {
        input: input.display().to_string(),
        identity,
        start_page: range.start,
        end_page: range.end,
        extracted_at: Utc::now(),
        images,
    };
    let summary_path = output_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    println!("  💾 {}", summary_path.display());
    println!("✅ Extracted {} image(s)", summary.images.len());

    Ok(())
}
