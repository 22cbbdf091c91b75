use clap::{Parser, Subcommand};
use matv5::matrix::{Matrix, MatrixData};
use matv5::options::{DEFAULT_INFLATE_RATIO, DEFAULT_MAX_DEPTH};
use matv5::{DecodeOptions, MatFile};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "matdump", about = "Inspect MATLAB Level 5 .mat files")]
struct Cli {
    /// Log decoding progress to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Maximum struct nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, global = true)]
    max_depth: usize,
    /// Initial inflate buffer size as a multiple of the compressed size
    #[arg(long, default_value_t = DEFAULT_INFLATE_RATIO, global = true)]
    inflate_ratio: usize,
    /// Accept unknown version words and endianness indicators
    #[arg(long, global = true)]
    lenient: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show file header fields
    Info {
        input: PathBuf,
    },
    /// List top-level variables
    List {
        input: PathBuf,
    },
    /// Print decoded values, optionally for a single path such as `s.field`
    Show {
        input: PathBuf,
        path:  Option<String>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List struct field paths
    Fields {
        input: PathBuf,
        /// Only fields with two dimensions, neither of them 1
        #[arg(long)]
        two_d: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let opts = DecodeOptions {
        max_depth:     cli.max_depth,
        inflate_ratio: cli.inflate_ratio,
        strict_header: !cli.lenient,
        ..DecodeOptions::default()
    };

    match cli.command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let mat = MatFile::open_with_options(&input, opts)?;
            let h   = mat.header();
            println!("── MAT-file ─────────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Text           {}", h.signature_text());
            println!("  Version        0x{:04x}", h.version);
            println!("  Indicator      {} ({:?})", String::from_utf8_lossy(&h.indicator), h.endian);
            if h.has_subsystem_data() {
                println!("  Subsystem      {} B", h.subsystem_offset);
            }
            println!("  Variables      {}", mat.matrices().len());
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input } => {
            let mat = MatFile::open_with_options(&input, opts)?;
            println!("{:<24} {:<8} {:<14} {:>10}", "Name", "Class", "Dims", "Elements");
            for m in mat.matrices() {
                println!("{:<24} {:<8} {:<14} {:>10}",
                    m.name, m.class().name(), dims_string(&m.dims), element_count(m));
            }
        }

        // ── Show ─────────────────────────────────────────────────────────────
        Commands::Show { input, path, json } => {
            let mat = MatFile::open_with_options(&input, opts)?;
            let selected: Vec<&Matrix> = match &path {
                Some(p) => vec![mat.lookup(p).ok_or_else(|| format!("no variable or field '{p}'"))?],
                None    => mat.matrices().iter().collect(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&selected)?);
            } else {
                for m in selected {
                    print_matrix(m, 0);
                }
            }
        }

        // ── Fields ───────────────────────────────────────────────────────────
        Commands::Fields { input, two_d } => {
            let mat = MatFile::open_with_options(&input, opts)?;
            for path in mat.field_paths(two_d) {
                println!("{path}");
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn dims_string(dims: &[i32]) -> String {
    dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("x")
}

fn element_count(m: &Matrix) -> usize {
    match &m.data {
        MatrixData::Numeric(n)        => n.len(),
        MatrixData::Char { text, .. } => text.chars().count(),
        MatrixData::Struct(s)         => s.elements.len(),
    }
}

fn print_matrix(m: &Matrix, indent: usize) {
    let pad = "  ".repeat(indent);
    let label = if m.path.is_empty() { "<unnamed>" } else { m.path.as_str() };
    print!("{pad}{label} [{} {}]", m.class().name(), dims_string(&m.dims));
    match &m.data {
        MatrixData::Numeric(n) => {
            if let Some(rows) = m.to_rows() {
                println!();
                for row in rows {
                    let cells: Vec<String> = row.iter().map(|v| format!("{v:>12.6}")).collect();
                    println!("{pad}  {}", cells.join(" "));
                }
            } else {
                println!(" = {:?}", n.to_f64_vec());
            }
            if let Some(imag) = n.imag_to_f64_vec() {
                println!("{pad}  imag {imag:?}");
            }
        }
        MatrixData::Char { text, .. } => println!(" = {text:?}"),
        MatrixData::Struct(s) => {
            println!();
            for member in s.elements.iter().flatten() {
                print_matrix(member, indent + 1);
            }
        }
    }
}
