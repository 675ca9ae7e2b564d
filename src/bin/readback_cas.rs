use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "readback-cas")]
#[command(version)]
#[command(about = "Merge annotations from a CAS XMI file back into a TEITOK document", long_about = None)]
struct Args {
    /// TEITOK XML file to update in place
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// XMI input filename (default: the TEI file with an .xmi extension)
    #[arg(long, value_name = "FILE")]
    infile: Option<PathBuf>,

    /// Print the updated document to stdout instead of rewriting it
    #[arg(long)]
    test: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();
    teitok_convert::init_logging(args.verbose, args.debug);

    let infile = args
        .infile
        .clone()
        .unwrap_or_else(|| args.file.with_extension("xmi"));
    log::info!("processing XML file: {}", args.file.display());
    let merged = match teitok_convert::readback_cas(&args.file, &infile) {
        Ok(merged) => merged,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if args.test {
        if let Err(e) = std::io::stdout().write_all(&merged) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = fs::write(&args.file, &merged) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
