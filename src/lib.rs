mod cas;
mod conllu;
mod docx;
mod error;
mod model;
pub mod paths;
mod tei;
mod teitok;
mod whisper;
mod xml;

pub use cas::{readback_cas, tei_to_cas};
pub use conllu::{readback_conllu, tei_to_conllu};
pub use error::{Error, Result};
pub use whisper::{WhisperOptions, whisper_to_tei};

use std::path::Path;
use std::time::Instant;

pub struct DocxTeiOptions<'a> {
    /// Directory extracted media files are written into.
    pub image_dir: &'a Path,
    /// Directory prefix for graphic URLs in the TEI output.
    pub image_reldir: &'a str,
    /// Original filename recorded in the header.
    pub orgfile: &'a str,
    /// Append a footnote apparatus after the body.
    pub include_footnotes: bool,
}

pub fn convert_docx_to_tei(input: &Path, output: &Path, opts: &DocxTeiOptions) -> Result<()> {
    let t0 = Instant::now();

    let mut doc = docx::parse(input)?;
    let t_parse = t0.elapsed();

    let media = std::mem::take(&mut doc.media);
    if !media.is_empty() {
        std::fs::create_dir_all(opts.image_dir)?;
        for file in &media {
            std::fs::write(opts.image_dir.join(&file.filename), &file.data)?;
        }
    }

    let text_id = paths::file_stem(input);
    let tei = tei::build_document(
        doc,
        &tei::BuildOptions {
            orgfile: opts.orgfile,
            text_id: &text_id,
            image_reldir: opts.image_reldir,
            include_footnotes: opts.include_footnotes,
        },
    );
    let t_build = t0.elapsed();

    let xml_text = xml::serialize(&tei, true);
    std::fs::write(output, &xml_text)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, build={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_build - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_build).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        xml_text.len(),
    );

    Ok(())
}

/// Same conversion for an in-memory DOCX; the text id comes from the
/// output filename.
pub fn convert_docx_bytes_to_tei(
    input: &[u8],
    output: &Path,
    opts: &DocxTeiOptions,
) -> Result<()> {
    let t0 = Instant::now();

    let mut doc = docx::parse_bytes(input)?;
    let t_parse = t0.elapsed();

    let media = std::mem::take(&mut doc.media);
    if !media.is_empty() {
        std::fs::create_dir_all(opts.image_dir)?;
        for file in &media {
            std::fs::write(opts.image_dir.join(&file.filename), &file.data)?;
        }
    }

    let text_id = paths::file_stem(output);
    let tei = tei::build_document(
        doc,
        &tei::BuildOptions {
            orgfile: opts.orgfile,
            text_id: &text_id,
            image_reldir: opts.image_reldir,
            include_footnotes: opts.include_footnotes,
        },
    );
    let t_build = t0.elapsed();

    let xml_text = xml::serialize(&tei, true);
    std::fs::write(output, &xml_text)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, build={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_build - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_build).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        xml_text.len(),
    );

    Ok(())
}

/// Logging setup shared by the command-line tools. `RUST_LOG` overrides
/// the level picked from the flags.
#[cfg(feature = "cli")]
pub fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
