use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Number;

use crate::error::Result;
use crate::paths;
use crate::xml::{self, Element};

/// A whisper-timestamped transcription dump. Unknown keys (seek, tokens,
/// temperature and friends) are ignored; timestamps stay as JSON numbers so
/// they print exactly as dumped.
#[derive(Debug, Deserialize)]
struct Transcription {
    language: Option<String>,
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    start: Number,
    end: Number,
    #[serde(default)]
    text: String,
    confidence: Option<Number>,
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Deserialize)]
struct Word {
    #[serde(alias = "word")]
    text: String,
    start: Number,
    end: Number,
    confidence: Option<Number>,
}

pub struct WhisperOptions<'a> {
    /// Overrides the language recorded in the transcription.
    pub language: Option<&'a str>,
    /// The audio file the transcription was made from; defaults to the
    /// JSON stem with a `.wav` extension.
    pub audio: Option<&'a Path>,
    /// Keep per-utterance and per-token confidence scores.
    pub confs: bool,
}

/// Convert a whisper-timestamped JSON transcription into a TEITOK document
/// with one `u` per segment and one `tok` per word.
pub fn whisper_to_tei(input: &Path, opts: &WhisperOptions) -> Result<String> {
    let json = fs::read_to_string(input)?;
    let transcription: Transcription = serde_json::from_str(&json)?;

    let audio_name = match opts.audio {
        Some(path) => path
            .file_name()
            .unwrap_or(path.as_os_str())
            .to_string_lossy()
            .into_owned(),
        None => format!("{}.wav", paths::file_stem(input)),
    };
    Ok(build_tei(&transcription, &audio_name, opts))
}

fn build_tei(transcription: &Transcription, audio_name: &str, opts: &WhisperOptions) -> String {
    let audio_ext = audio_name.rsplit_once('.').map_or("", |(_, ext)| ext);

    let mut recording = Element::new("recording").attr("type", "audio");
    recording.children.push(
        Element::new("media")
            .attr("mimeType", format!("audio/{audio_ext}"))
            .attr("url", format!("Audio/{audio_name}")),
    );
    let mut recording_stmt = Element::new("recordingStmt");
    recording_stmt.children.push(recording);
    let mut header = Element::new("teiHeader");
    header.children.push(recording_stmt);

    let mut text = Element::new("text");
    let lang = opts
        .language
        .map(str::to_string)
        .or_else(|| transcription.language.clone());
    if let Some(lang) = lang {
        text.set_attr("lang", lang);
    }

    let mut utt_count = 0;
    let mut tok_count = 0;
    for seg in &transcription.segments {
        utt_count += 1;
        let mut utt = Element::new("u")
            .attr("text", seg.text.clone())
            .attr("start", seg.start.to_string())
            .attr("end", seg.end.to_string())
            .attr("id", format!("u-{utt_count}"));
        if opts.confs
            && let Some(conf) = &seg.confidence
        {
            utt.set_attr("conf", conf.to_string());
        }

        for word in &seg.words {
            tok_count += 1;
            let mut tok = Element::new("tok")
                .with_text(word.text.clone())
                .attr("start", word.start.to_string())
                .attr("end", word.end.to_string())
                .attr("id", format!("w-{tok_count}"));
            if opts.confs
                && let Some(conf) = &word.confidence
            {
                tok.set_attr("conf", conf.to_string());
            }
            tok.tail = " ".into();

            // Split trailing punctuation into tokens of their own, right to
            // left, keeping the text order. The ids record split order, so
            // they run counter to document order within one group; a word
            // never shrinks below one character.
            let mut puncts: Vec<Element> = Vec::new();
            let mut last = true;
            while tok.text.chars().count() > 1
                && tok.text.ends_with(|c: char| c.is_ascii_punctuation())
            {
                let Some(ch) = tok.text.pop() else {
                    break;
                };
                tok_count += 1;
                let mut punct = Element::new("tok")
                    .attr("id", format!("w-{tok_count}"))
                    .with_text(ch.to_string());
                if last {
                    punct.tail = " ".into();
                    tok.tail = String::new();
                    last = false;
                }
                puncts.insert(0, punct);
            }
            utt.children.push(tok);
            utt.children.extend(puncts);
        }
        utt.tail = "\n".into();
        text.children.push(utt);
    }

    let mut tei = Element::new("TEI");
    tei.children.push(header);
    tei.children.push(text);
    xml::serialize(&tei, false)
}
