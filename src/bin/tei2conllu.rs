use std::fs;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "tei2conllu")]
#[command(version)]
#[command(about = "Export a tokenized TEITOK document as CoNLL-U", long_about = None)]
struct Args {
    /// Input TEITOK XML file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// CoNLL-U output filename (default: the input with a .conllu extension)
    #[arg(long, value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Print the output to stdout instead of writing a file
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

    log::info!("processing XML file: {}", args.file.display());
    let conllu = match teitok_convert::tei_to_conllu(&args.file) {
        Ok(conllu) => conllu,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if args.test {
        print!("{conllu}");
        return;
    }

    let outfile = args
        .outfile
        .clone()
        .unwrap_or_else(|| args.file.with_extension("conllu"));
    log::info!("writing CoNLL-U to {}", outfile.display());
    if let Err(e) = fs::write(&outfile, &conllu) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
