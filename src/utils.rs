//! File handling and nucleotide packing.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

//-----------------------------------------------------------------------------

// Files.

const SIZE_UNITS: [(f64, &str); 5] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
];

/// Returns a human-readable representation of the given number of bytes.
///
/// # Examples
///
/// ```
/// use cdbg_base::utils;
///
/// assert_eq!(utils::human_readable_size(512), "512.000 B");
/// assert_eq!(utils::human_readable_size(3 * 1024 * 1024), "3.000 MiB");
/// ```
pub fn human_readable_size(bytes: usize) -> String {
    let value = bytes as f64;
    let (divisor, unit) = SIZE_UNITS.iter().rev()
        .find(|(divisor, _)| value >= *divisor)
        .copied()
        .unwrap_or(SIZE_UNITS[0]);
    format!("{:.3} {}", value / divisor, unit)
}

/// Returns a human-readable size of the file, or [`None`] if the file cannot be accessed.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    let metadata = fs::metadata(filename).ok()?;
    Some(human_readable_size(metadata.len() as usize))
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Returns `true` if the file starts with the gzip magic number.
pub fn is_gzipped<P: AsRef<Path>>(filename: P) -> bool {
    let mut magic = [0; 2];
    match File::open(filename) {
        Ok(mut file) => file.read_exact(&mut magic).is_ok() && magic == GZIP_MAGIC,
        Err(_) => false,
    }
}

/// Returns a buffered reader for the file, decompressing it if it is gzip-compressed.
pub fn open_file<P: AsRef<Path>>(filename: P) -> Result<Box<dyn BufRead>, String> {
    let file = File::open(&filename).map_err(|x| format!("Cannot open {}: {}", filename.as_ref().display(), x))?;
    let reader = BufReader::new(file);
    if is_gzipped(&filename) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

//-----------------------------------------------------------------------------

// Nucleotide packing.

// Symbol 0 marks the end of a sequence that does not fill the last byte.
const SYMBOLS: [u8; 6] = [0, b'A', b'C', b'G', b'T', b'N'];
const RADIX: usize = SYMBOLS.len();
const BASES_PER_BYTE: usize = 3;

const fn symbol_table() -> [u8; 256] {
    let mut result = [5; 256];
    let mut i = 1;
    while i < 5 {
        result[SYMBOLS[i] as usize] = i as u8;
        result[SYMBOLS[i].to_ascii_lowercase() as usize] = i as u8;
        i += 1;
    }
    result
}

const SYMBOL_TABLE: [u8; 256] = symbol_table();

/// Returns the length of the packed encoding of a sequence of `len` bases.
#[inline]
pub fn encoded_len(len: usize) -> usize {
    len.div_ceil(BASES_PER_BYTE)
}

/// Returns the sequence in the alphabet that survives [`encode_sequence`].
///
/// Bases are converted to uppercase, and anything outside `ACGT` becomes `N`.
///
/// # Examples
///
/// ```
/// use cdbg_base::utils;
///
/// assert_eq!(utils::normalize_sequence(b"gaTTacaRY"), b"GATTACANN");
/// ```
pub fn normalize_sequence(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().map(|base| SYMBOLS[SYMBOL_TABLE[*base as usize] as usize]).collect()
}

/// Packs a nucleotide sequence into bytes with three bases per byte.
///
/// Bases are case-insensitive, and anything outside `ACGT` becomes `N`.
/// If the length is not divisible by 3, the last byte is padded with an end marker.
/// See [`decode_sequence`] for unpacking.
///
/// # Examples
///
/// ```
/// use cdbg_base::utils;
///
/// let encoded = utils::encode_sequence(b"GATTACA");
/// assert_eq!(encoded.len(), utils::encoded_len(7));
/// assert_eq!(utils::decode_sequence(&encoded), b"GATTACA");
/// assert_eq!(utils::decode_sequence(&utils::encode_sequence(b"gaxy")), b"GANN");
/// ```
pub fn encode_sequence(sequence: &[u8]) -> Vec<u8> {
    sequence.chunks(BASES_PER_BYTE).map(|bases| {
        bases.iter().rev().fold(0, |packed, base| packed * RADIX + SYMBOL_TABLE[*base as usize] as usize) as u8
    }).collect()
}

/// Unpacks a sequence packed with [`encode_sequence`].
pub fn decode_sequence(encoded: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(BASES_PER_BYTE * encoded.len());
    for byte in encoded {
        let mut value = *byte as usize;
        for _ in 0..BASES_PER_BYTE {
            let symbol = SYMBOLS[value % RADIX];
            if symbol == 0 {
                return result;
            }
            result.push(symbol);
            value /= RADIX;
        }
    }
    result
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
