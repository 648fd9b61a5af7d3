//! fieldpack - Inspect and decode fixed-layout binary records
//!
//! This tool compiles a text record layout, decodes consecutive records from
//! a binary file, and builds or checks file identification manifests.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fieldpack_core::verify::{self, Manifest};
use fieldpack_core::{Codec, Record, Schema, SchemaConfig, StringMode, TransformRegistry, TypeTag};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;

/// Inspect and decode fixed-layout binary records
#[derive(Parser, Debug)]
#[command(name = "fieldpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the compiled field table of a layout file
    Inspect {
        /// Layout file in the text layout language
        schema: PathBuf,

        /// The layout places fields by offset (`0xOFFSET TYPE NAME` lines)
        #[arg(long)]
        offsets: bool,
    },

    /// Decode consecutive records from a binary file
    Unpack {
        /// Layout file in the text layout language
        schema: PathBuf,

        /// Binary file to decode
        input: PathBuf,

        /// The layout places fields by offset (`0xOFFSET TYPE NAME` lines)
        #[arg(long)]
        offsets: bool,

        /// Byte offset of the first record
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Maximum number of records to decode (0 = until end of file)
        #[arg(long, default_value = "0")]
        records: usize,

        /// Trailing padding treatment for string fields
        #[arg(long, value_enum, default_value = "raw")]
        trim: TrimMode,
    },

    /// Write a size/hash manifest of every file under a directory
    Manifest {
        /// Directory to describe
        directory: PathBuf,

        /// Write the manifest here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a directory against a manifest
    Verify {
        /// Manifest file (`path size hash` per line)
        manifest: PathBuf,

        /// Directory the manifest paths are relative to
        directory: PathBuf,
    },
}

/// String padding treatment
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TrimMode {
    /// Keep strings as raw bytes
    Raw,
    /// Strip trailing NUL bytes
    Nul,
    /// Strip trailing spaces
    Space,
}

impl From<TrimMode> for StringMode {
    fn from(mode: TrimMode) -> Self {
        match mode {
            TrimMode::Raw => StringMode::Raw,
            TrimMode::Nul => StringMode::TrimNul,
            TrimMode::Space => StringMode::TrimSpace,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::Inspect { schema, offsets } => {
            let schema = load_schema(&schema, &SchemaConfig::default(), offsets)?;
            write_field_table(&mut stdout, &schema)?;
        }
        Command::Unpack {
            schema,
            input,
            offsets,
            offset,
            records,
            trim,
        } => {
            let config = SchemaConfig::new().string_mode(trim.into());
            let codec = Codec::new(load_schema(&schema, &config, offsets)?);
            unpack_file(&mut stdout, &codec, &input, offset, records)?;
        }
        Command::Manifest { directory, output } => {
            if !directory.is_dir() {
                bail!("Path is not a directory: {}", directory.display());
            }
            let manifest = Manifest::from_directory(&directory)
                .with_context(|| format!("Failed to describe {}", directory.display()))?;
            info!("Described {} files", manifest.files.len());

            match output {
                Some(path) => fs::write(&path, manifest.to_string())
                    .with_context(|| format!("Failed to write manifest: {}", path.display()))?,
                None => write!(stdout, "{}", manifest)?,
            }
        }
        Command::Verify {
            manifest,
            directory,
        } => {
            let manifest = Manifest::load(&manifest)
                .with_context(|| format!("Failed to load manifest: {}", manifest.display()))?;

            return match verify::check(&manifest.files, &directory) {
                Ok(()) => {
                    writeln!(stdout, "OK: {} files verified", manifest.files.len())?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(mismatch) => {
                    warn!("Verification failed in {}", directory.display());
                    writeln!(stdout, "FAILED: {}", mismatch)?;
                    Ok(ExitCode::FAILURE)
                }
            };
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Read and compile a layout file
fn load_schema(path: &Path, config: &SchemaConfig, offsets: bool) -> Result<Schema> {
    let layout = fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout file: {}", path.display()))?;

    // The CLI has no way to load transform code; custom types pass through.
    let registry = TransformRegistry::new();
    let schema = if offsets {
        Schema::from_offsets(&layout, &registry, config)
    } else {
        Schema::compile_with_config(&layout, &registry, config)
    }
    .with_context(|| format!("Failed to compile layout: {}", path.display()))?;

    debug!(
        "Compiled {}: {} fields, {} bytes per record",
        path.display(),
        schema.len(),
        schema.total_length()
    );
    Ok(schema)
}

/// Print one row per field: offset, length, type and name
fn write_field_table(out: &mut impl Write, schema: &Schema) -> Result<()> {
    writeln!(
        out,
        "# {} fields, {} bytes, byte order '{}'",
        schema.len(),
        schema.total_length(),
        schema.byte_order().directive()
    )?;
    writeln!(out, "{:>8}  {:>6}  {:<20}  name", "offset", "length", "type")?;

    for field in schema.fields() {
        let type_name = match field.type_tag() {
            TypeTag::Custom(tag) => format!("{}[{}] (custom)", tag, field.count()),
            tag => format!("{}[{}]", tag, field.count()),
        };
        writeln!(
            out,
            "{:>#8x}  {:>6}  {:<20}  {}",
            field.offset(),
            field.byte_length(),
            type_name,
            field.name()
        )?;
    }
    Ok(())
}

/// Decode records from `input` starting at `offset`
fn unpack_file(
    out: &mut impl Write,
    codec: &Codec,
    input: &Path,
    offset: usize,
    limit: usize,
) -> Result<()> {
    let data = fs::read(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    trace!("Read {} bytes from {}", data.len(), input.display());

    let record_length = codec.record_length();
    if record_length == 0 {
        bail!("Layout describes an empty record");
    }
    if offset > data.len() {
        bail!(
            "Offset {} is past the end of {} ({} bytes)",
            offset,
            input.display(),
            data.len()
        );
    }

    let chunks = data[offset..].chunks_exact(record_length);
    let trailing = chunks.remainder().len();
    let limit = if limit == 0 { usize::MAX } else { limit };

    let mut decoded = 0;
    for (i, chunk) in chunks.take(limit).enumerate() {
        let at = offset + i * record_length;
        let record = codec
            .unpack(chunk)
            .with_context(|| format!("Failed to decode record {} at offset {:#x}", i, at))?;
        write_record(out, codec, i, at, &record)?;
        decoded += 1;
    }

    if trailing > 0 && decoded < limit {
        warn!("Ignoring {} trailing bytes shorter than one record", trailing);
    }
    info!("Decoded {} records of {} bytes", decoded, record_length);
    Ok(())
}

/// Print a record in layout order
fn write_record(
    out: &mut impl Write,
    codec: &Codec,
    index: usize,
    offset: usize,
    record: &Record,
) -> Result<()> {
    writeln!(out, "[{}] @ {:#x}", index, offset)?;
    for field in codec.schema().record_fields() {
        if let Some(value) = record.get(field.name()) {
            writeln!(out, "  {} = {}", field.name(), value)?;
        }
    }
    Ok(())
}
