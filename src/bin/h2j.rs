//! CLI tool to convert Symphony history log files into JSON.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use hist2json::{
    driver, CodeTable, Decoder, ItemIndex, JsonArrayEmitter, JsonLinesEmitter, LineSource,
    RangeGate, RunStats,
};

/// Data codes observed in production logs but missing from the stock
/// Symphony definition file.
const EXTRA_DATA_CODES: [(&str, &str); 4] = [
    ("uF", "user_first_name"),
    ("uL", "user_last_name"),
    ("uU", "user_prefered_name"),
    ("P7", "circ_rule"),
];

/// Convert SirsiDynix Symphony history logs into JSON.
///
/// User PINs are redacted during conversion; the many date shapes found in
/// history logs all come out as 'yyyy-mm-dd'. Gzip-compressed logs are
/// handled transparently.
#[derive(Parser)]
#[command(name = "h2j", version)]
struct Cli {
    /// History log file(s) to convert (.hist, .hist.gz)
    #[arg(required = true)]
    hist_files: Vec<PathBuf>,

    /// Symphony root directory holding Custom/cmdcode and Custom/datacode
    #[arg(short = 'U', long, default_value = "/software/EDPL/Unicorn")]
    unicorn: PathBuf,

    /// Command code definitions (default: <unicorn>/Custom/cmdcode)
    #[arg(short = 'C', long)]
    cmd_codes: Option<PathBuf>,

    /// Data code definitions (default: <unicorn>/Custom/datacode)
    #[arg(short = 'D', long)]
    data_codes: Option<PathBuf>,

    /// Hold client table (numeric client id -> client type)
    #[arg(short = 'c', long)]
    client_codes: Option<PathBuf>,

    /// Item key / barcode list in 'c_key|call_seq|copy_num|item_id' form,
    /// from 'selitem -oIB'
    #[arg(short = 'I', long)]
    item_keys: Option<PathBuf>,

    /// Only convert records at or after this YYYYMMDDhhmmss prefix
    #[arg(short, long)]
    start: Option<String>,

    /// Only convert records strictly before this YYYYMMDDhhmmss prefix
    #[arg(short, long)]
    end: Option<String>,

    /// Write JSON to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit one JSON object per line (MongoDB style) instead of an array
    #[arg(short = 'm', long)]
    mongo: bool,

    /// Show debug detail on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = convert(&cli) {
        eprintln!("h2j: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn convert(cli: &Cli) -> hist2json::Result<()> {
    let cmd_path = cli
        .cmd_codes
        .clone()
        .unwrap_or_else(|| cli.unicorn.join("Custom").join("cmdcode"));
    let data_path = cli
        .data_codes
        .clone()
        .unwrap_or_else(|| cli.unicorn.join("Custom").join("datacode"));

    let cmd_codes = CodeTable::load(&cmd_path, false)?;
    let mut data_codes = CodeTable::load(&data_path, true)?;
    data_codes.merge(EXTRA_DATA_CODES);

    let client_types = match &cli.client_codes {
        Some(path) => CodeTable::load(path, false)?,
        None => {
            warn!("no hold client table given: dC values pass through untranslated");
            CodeTable::new(false)
        }
    };
    let item_index = match &cli.item_keys {
        Some(path) => Some(ItemIndex::load(path)?),
        None => None,
    };

    let cmd_count = cmd_codes.len();
    let data_count = data_codes.len();
    let item_count = item_index.as_ref().map_or(0, ItemIndex::len);

    let mut decoder = Decoder::new(cmd_codes, data_codes, client_types, item_index);
    let gate = RangeGate::new(cli.start.as_deref(), cli.end.as_deref());

    // Open every input up front so a bad path fails before any output is
    // written, then chain them into one ordered stream.
    let mut sources = Vec::with_capacity(cli.hist_files.len());
    for path in &cli.hist_files {
        sources.push(LineSource::open(path)?);
    }
    let lines = sources.into_iter().flatten();

    let out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let stats = if cli.mongo {
        driver::run(lines, &gate, &mut decoder, &mut JsonLinesEmitter::new(out))?
    } else {
        driver::run(lines, &gate, &mut decoder, &mut JsonArrayEmitter::new(out))?
    };

    report(cmd_count, data_count, item_count, stats, &decoder);
    Ok(())
}

/// End-of-run summary on stderr, journal of unknown data codes included.
fn report(cmd_count: usize, data_count: usize, item_count: usize, stats: RunStats, decoder: &Decoder) {
    eprintln!("Total cmd codes read:    {cmd_count}");
    eprintln!("Total data codes read:   {data_count}");
    eprintln!("Total history records:   {}", stats.lines_read);
    eprintln!("Total items read:     {item_count}");
    eprintln!("Total errors:     {}", stats.errors);
    let missing = decoder.missing_codes();
    if !missing.is_empty() {
        eprintln!(
            "Data codes without definitions have been recorded as 'data_code_[data code value]':'[read value]'"
        );
        for (line, codes) in missing {
            eprintln!(" * on line {line} => {codes}");
        }
    }
}
