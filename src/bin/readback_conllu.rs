use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "readback-conllu")]
#[command(version)]
#[command(about = "Merge annotations from a CoNLL-U file back into a TEITOK document", long_about = None)]
struct Args {
    /// TEITOK XML file to update in place
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// CoNLL-U input filename (default: the TEI file with a .conllu extension)
    #[arg(long, value_name = "FILE")]
    infile: Option<PathBuf>,

    /// Set join="right" on tokens marked SpaceAfter=No
    #[arg(long)]
    join: bool,

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
        .unwrap_or_else(|| args.file.with_extension("conllu"));
    log::info!("processing XML file: {}", args.file.display());
    let merged = match teitok_convert::readback_conllu(&args.file, &infile, args.join) {
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
