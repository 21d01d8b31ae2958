//! Report text decoding.
//!
//! `simpleperf report` output reaches us in whatever encoding the host
//! shell wrote it in. Redirected PowerShell output is UTF-16, Android
//! hosts write UTF-8, and some tools prefix a BOM.

use crate::utils::error::InputError;
use log::{debug, warn};
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Bytes inspected when guessing BOM-less UTF-16
const SNIFF_LEN: usize = 4096;

/// How faithfully the bytes were decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeQuality {
    /// Decoded in a detected Unicode encoding without loss
    Exact,
    /// Not valid in any Unicode encoding; read as Latin-1
    Latin1,
    /// Some sequences were replaced with U+FFFD
    Lossy,
}

fn decode_utf16(bytes: &[u8], little_endian: bool) -> (String, DecodeQuality) {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    match String::from_utf16(&units) {
        Ok(text) if bytes.len() % 2 == 0 => (text, DecodeQuality::Exact),
        _ => (String::from_utf16_lossy(&units), DecodeQuality::Lossy),
    }
}

/// Guess BOM-less UTF-16 from where NUL bytes fall
///
/// Mostly-ASCII UTF-16 text has a NUL in every other byte: odd offsets
/// for little endian, even offsets for big endian.
fn sniff_utf16(bytes: &[u8]) -> Option<bool> {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    let pairs = sample.len() / 2;
    if pairs == 0 {
        return None;
    }

    let even_nuls = sample.iter().step_by(2).filter(|b| **b == 0).count();
    let odd_nuls = sample.iter().skip(1).step_by(2).filter(|b| **b == 0).count();
    let threshold = pairs * 3 / 10;

    if odd_nuls > threshold && even_nuls <= pairs / 10 {
        Some(true)
    } else if even_nuls > threshold && odd_nuls <= pairs / 10 {
        Some(false)
    } else {
        None
    }
}

/// Decode raw report bytes into text
///
/// **Public** - used for report files and captured profiler output
///
/// Tries, in order: UTF-8 with BOM, UTF-16 with BOM, BOM-less UTF-16
/// (little endian first), plain UTF-8, then Latin-1.
pub fn decode_report(bytes: &[u8]) -> (String, DecodeQuality) {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        debug!("Decoding report as UTF-8 (BOM)");
        return match std::str::from_utf8(rest) {
            Ok(text) => (text.to_string(), DecodeQuality::Exact),
            Err(_) => (String::from_utf8_lossy(rest).into_owned(), DecodeQuality::Lossy),
        };
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        debug!("Decoding report as UTF-16LE (BOM)");
        return decode_utf16(rest, true);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        debug!("Decoding report as UTF-16BE (BOM)");
        return decode_utf16(rest, false);
    }
    if let Some(little_endian) = sniff_utf16(bytes) {
        debug!(
            "Decoding report as UTF-16{} (no BOM)",
            if little_endian { "LE" } else { "BE" }
        );
        return decode_utf16(bytes, little_endian);
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), DecodeQuality::Exact);
    }

    debug!("Report is not valid UTF-8; reading as Latin-1");
    (bytes.iter().map(|&b| b as char).collect(), DecodeQuality::Latin1)
}

/// Read and decode a report file
///
/// **Public** - main entry point for `--report` input
///
/// # Errors
/// * `InputError::NotFound` - the file does not exist
/// * `InputError::ReadFailed` - the file could not be read
pub fn read_report_file(path: impl AsRef<Path>) -> Result<String, InputError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let (text, quality) = decode_report(&bytes);
    match quality {
        DecodeQuality::Exact => {}
        DecodeQuality::Latin1 => warn!("{} is not Unicode text; read as Latin-1", path.display()),
        DecodeQuality::Lossy => warn!(
            "{} contains undecodable bytes; they were replaced",
            path.display()
        ),
    }

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(text)
}
