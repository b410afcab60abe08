//! Text decoding for raw source bytes.
//!
//! The catalog has shipped the same CSV as UTF-8 and as Latin-1 at different
//! points in time, so a fixed ladder of encodings is tried in order. A decode
//! is accepted only when it also parses as well-formed delimited text; that is
//! what rejects a "successful" single-byte decode of garbage.

use std::borrow::Cow;

use tracing::debug;

use crate::error::LoadError;

/// Encodings attempted, in order.
const ENCODING_LADDER: [&str; 3] = ["UTF-8", "ISO-8859-1", "Windows-1252"];

/// Header row plus string cells, exactly as they appeared in the source.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Which ladder entry decoded the payload.
    pub encoding: &'static str,
}

/// Decodes raw bytes into a [`RawTable`], trying the encoding ladder in order.
pub fn decode_table(bytes: &[u8]) -> Result<RawTable, LoadError> {
    let mut attempted = Vec::new();
    for name in ENCODING_LADDER {
        attempted.push(name.to_string());
        let Some(text) = decode_with(name, bytes) else {
            continue;
        };
        match parse_delimited(&text) {
            Ok((headers, rows)) => {
                debug!(encoding = name, rows = rows.len(), "decoded source payload");
                return Ok(RawTable { headers, rows, encoding: name });
            }
            Err(e) => {
                debug!(encoding = name, "decoded text is not valid delimited text: {}", e);
            }
        }
    }
    Err(LoadError::UndecodableEncoding { attempted })
}

fn decode_with<'a>(name: &str, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
    match name {
        // Strict: any invalid sequence rejects the encoding
        "UTF-8" => encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes),
        // True Latin-1: every byte maps to the same code point
        "ISO-8859-1" => Some(encoding_rs::mem::decode_latin1(bytes)),
        "Windows-1252" => {
            let (text, had_errors) = encoding_rs::WINDOWS_1252.decode_with_bom_removal(bytes);
            if had_errors {
                None
            } else {
                Some(text)
            }
        }
        _ => None,
    }
}

fn parse_delimited(text: &str) -> Result<(Vec<String>, Vec<Vec<String>>), csv::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    if headers.len() < 2 {
        // A schema this pipeline can use always has several columns; one
        // column means the decode produced undelimited noise.
        return Err(csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "fewer than two columns",
        )));
    }
    Ok((headers, rows))
}
