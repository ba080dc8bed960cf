// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-memory file tail reader, used to enrich stage-failure activity
//! entries with stderr/stdout excerpts without loading a whole log file.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Reads at most `budget` trailing bytes of `path`, always starting at a
/// line boundary (a possibly-partial first line is dropped). A file smaller
/// than `budget` is returned whole.
pub fn tail_bytes(path: &Path, budget: u64) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let len = file.metadata()?.len();
    let start = len.saturating_sub(budget);
    file.seek(SeekFrom::Start(start))?;

    let mut buf = Vec::with_capacity((len - start) as usize);
    file.read_to_end(&mut buf)?;

    let text = String::from_utf8_lossy(&buf);
    if start == 0 {
        return Ok(text.into_owned());
    }
    match text.find('\n') {
        Some(idx) => Ok(text[idx + 1..].to_string()),
        None => Ok(String::new()),
    }
}

/// Returns the last `n` lines of `tail_bytes(path, budget)`.
pub fn tail_lines(path: &Path, budget: u64, n: usize) -> std::io::Result<Vec<String>> {
    let text = tail_bytes(path, budget)?;
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].to_vec())
}

/// Scans `tail_bytes(path, budget)` for lines matching `pattern` (simple
/// case-insensitive substring-of-any-keyword match, not a full regex engine),
/// keeping at most the last `keep` matches.
pub fn tail_matching(path: &Path, budget: u64, keywords: &[&str], keep: usize) -> std::io::Result<Vec<String>> {
    let text = tail_bytes(path, budget)?;
    let matches: Vec<String> = text
        .lines()
        .filter(|line| {
            let lower = line.to_ascii_lowercase();
            keywords.iter().any(|k| lower.contains(&k.to_ascii_lowercase()))
        })
        .map(str::to_string)
        .collect();
    let start = matches.len().saturating_sub(keep);
    Ok(matches[start..].to_vec())
}

#[cfg(test)]
#[path = "tail_tests.rs"]
mod tests;
