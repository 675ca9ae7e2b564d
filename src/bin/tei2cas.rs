use std::fs;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "tei2cas")]
#[command(version)]
#[command(about = "Convert a tokenized TEITOK document into UIMA CAS XMI", long_about = None)]
struct Args {
    /// Input TEITOK XML file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// XMI output filename (default: the input with an .xmi extension)
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
    let xmi = match teitok_convert::tei_to_cas(&args.file) {
        Ok(xmi) => xmi,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if args.test {
        print!("{xmi}");
        return;
    }

    let outfile = args
        .outfile
        .clone()
        .unwrap_or_else(|| args.file.with_extension("xmi"));
    log::info!("writing CAS XMI to {}", outfile.display());
    if let Err(e) = fs::write(&outfile, &xmi) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
