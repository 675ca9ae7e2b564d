use std::path::{Path, PathBuf};

/// File stem as a string, empty when the path has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Default TEI output path for an input document. Inputs kept under an
/// `Originals` tree map into a sibling `xmlfiles` tree; anything else just
/// swaps the extension.
pub fn default_tei_path(input: &Path) -> PathBuf {
    let s = input.to_string_lossy();
    match s.find("Originals") {
        Some(idx) => PathBuf::from(format!("{}xmlfiles/{}.xml", &s[..idx], file_stem(input))),
        None => input.with_extension("xml"),
    }
}

/// Default image directory for a TEI output path: a per-document directory
/// under a sibling `Graphics` tree when the output sits in `xmlfiles`,
/// otherwise `<stem>_files` next to the output.
pub fn default_image_dir(tei_path: &Path) -> PathBuf {
    let s = tei_path.to_string_lossy();
    match s.find("xmlfiles") {
        Some(idx) => PathBuf::from(format!("{}Graphics/{}", &s[..idx], file_stem(tei_path))),
        None => {
            let without_ext = tei_path.with_extension("");
            PathBuf::from(format!("{}_files", without_ext.to_string_lossy()))
        }
    }
}

/// Directory prefix for `graphic url=` references: just the per-document
/// directory name when images live under a `Graphics` tree (the corpus
/// publishes Graphics next to the XML), the image directory as given
/// otherwise.
pub fn image_reldir(image_dir: &Path) -> String {
    let components: Vec<String> = image_dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if let [.., parent, last] = components.as_slice()
        && parent.as_str() == "Graphics"
    {
        return last.clone();
    }
    image_dir.to_string_lossy().into_owned()
}
