use std::fs;
use std::path::PathBuf;

use clap::Parser;

use teitok_convert::{WhisperOptions, paths};

#[derive(Parser)]
#[command(name = "whisper2tei")]
#[command(version)]
#[command(about = "Convert a whisper-timestamped JSON transcription into a TEITOK document", long_about = None)]
struct Args {
    /// Input whisper-timestamped JSON file
    #[arg(value_name = "FILE")]
    infile: PathBuf,

    /// Folder to place the XML file
    #[arg(short, long, value_name = "DIR", default_value = "xmlfiles")]
    outfolder: PathBuf,

    /// Keep confidence scores
    #[arg(long)]
    confs: bool,

    /// Language of the audio
    #[arg(short, long)]
    language: Option<String>,

    /// Audio file the transcription was made from
    #[arg(long, value_name = "FILE")]
    audio: Option<PathBuf>,

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

    let opts = WhisperOptions {
        language: args.language.as_deref(),
        audio: args.audio.as_deref(),
        confs: args.confs,
    };
    log::info!("processing JSON file: {}", args.infile.display());
    let tei = match teitok_convert::whisper_to_tei(&args.infile, &opts) {
        Ok(tei) => tei,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let outfile = args
        .outfolder
        .join(format!("{}.xml", paths::file_stem(&args.infile)));
    let written = fs::create_dir_all(&args.outfolder).and_then(|_| fs::write(&outfile, &tei));
    if let Err(e) = written {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    println!("output written to {}", outfile.display());
}
