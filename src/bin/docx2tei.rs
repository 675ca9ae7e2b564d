use std::path::PathBuf;

use clap::Parser;

use teitok_convert::{DocxTeiOptions, paths};

#[derive(Parser)]
#[command(name = "docx2tei")]
#[command(version)]
#[command(about = "Convert a DOCX file into a TEITOK-style TEI XML document", long_about = None)]
struct Args {
    /// Input DOCX file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output TEI file (default: derived from the input path)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory for extracted images (default: derived from the output path)
    #[arg(long, value_name = "DIR")]
    image_dir: Option<PathBuf>,

    /// Original filename recorded in the TEI header (default: the input filename)
    #[arg(long, value_name = "NAME")]
    orgfile: Option<String>,

    /// Append a footnote apparatus after the body
    #[arg(long)]
    footnotes: bool,

    /// Overwrite the output file if it exists
    #[arg(short, long)]
    force: bool,

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

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| paths::default_tei_path(&args.input));
    if output.exists() && !args.force {
        eprintln!(
            "Output file {} exists, use --force to overwrite",
            output.display()
        );
        std::process::exit(1);
    }

    let image_dir = args
        .image_dir
        .clone()
        .unwrap_or_else(|| paths::default_image_dir(&output));
    let image_reldir = paths::image_reldir(&image_dir);
    let orgfile = match &args.orgfile {
        Some(name) => name.clone(),
        None => args
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    log::info!("processing DOCX file: {}", args.input.display());
    let opts = DocxTeiOptions {
        image_dir: &image_dir,
        image_reldir: &image_reldir,
        orgfile: &orgfile,
        include_footnotes: args.footnotes,
    };
    if let Err(e) = teitok_convert::convert_docx_to_tei(&args.input, &output, &opts) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    println!("Conversion complete! Saved as {}", output.display());
}
