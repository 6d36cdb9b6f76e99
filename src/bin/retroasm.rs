//! The CLI front-end: argument parsing, file I/O and exit-code
//! mapping. No assembly logic lives here; everything is delegated to the
//! `retroasm` library.

use clap::Parser;
use retroasm::diagnostics::Diagnostics;
use retroasm::profile::CpuProfile;
use retroasm::{assemble, emit};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "retroasm", about = "A retargetable two-pass assembler for 8/16-bit microprocessors")]
struct Args {
    /// Assembly source file to assemble.
    source: PathBuf,

    /// CPU profile to assemble against (base filename under --profiles-dir).
    #[arg(long)]
    cpu: String,

    /// Directory profiles are looked up in.
    #[arg(long, default_value = "profiles")]
    profiles_dir: PathBuf,

    /// Overrides the initial origin (decimal, `0x...`, or `$...`).
    #[arg(long, value_parser = parse_number)]
    start_address: Option<u32>,

    /// Output binary path. Defaults to the source's basename with a `.bin` extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also emit a human-readable listing at this path.
    #[arg(long)]
    listing: Option<PathBuf>,

    /// Mirror every diagnostic (uncolored) to this file in addition to stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_number(text: &str) -> Result<u32, String> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).or_else(|| text.strip_prefix('$')) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        text.parse::<u32>().map_err(|e| e.to_string())
    }
}

fn default_output_path(source: &std::path::Path) -> PathBuf {
    source.with_extension("bin")
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut diagnostics = match &args.log_file {
        Some(path) => match Diagnostics::with_log_file(path) {
            Ok(diagnostics) => diagnostics,
            Err(e) => {
                eprintln!("error: failed to create log file {}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        },
        None => Diagnostics::new(),
    };

    let profile = match CpuProfile::load_from_dir(&args.profiles_dir, &args.cpu) {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let source = match fs::read_to_string(&args.source) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", args.source.display(), e);
            return ExitCode::from(2);
        }
    };

    let outcome = assemble(&source, &profile, args.start_address, &mut diagnostics);

    let output_path = args.output.clone().unwrap_or_else(|| default_output_path(&args.source));
    if let Err(e) = fs::write(&output_path, emit::binary_image(&outcome.program)) {
        eprintln!("error: failed to write {}: {}", output_path.display(), e);
        return ExitCode::from(2);
    }

    if let Some(listing_path) = &args.listing {
        let rendered = emit::listing(&outcome.program, &source);
        if let Err(e) = fs::write(listing_path, rendered) {
            eprintln!("error: failed to write {}: {}", listing_path.display(), e);
            return ExitCode::from(2);
        }
    }

    eprintln!("{}", diagnostics.summary());

    if diagnostics.had_errors() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
