//! Content-based binary detection (spec.md §4.D `search_files`,
//! extended here to `read_file` per the same heuristic: a null byte
//! anywhere in the first 512 bytes marks the file binary).
//!
//! Conservative by construction: a `true` result always skips; a
//! `false` result may still let genuinely binary content through if
//! the first 512 bytes happen not to contain a null byte, which is
//! acceptable per spec.md's own framing of the heuristic.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const SNIFF_WINDOW: usize = 512;

pub fn is_binary_file(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buf = [0u8; SNIFF_WINDOW];
    let read = file.read(&mut buf)?;
    Ok(buf[..read].contains(&0))
}
