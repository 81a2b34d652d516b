//! Interactive path prompt, used when no path is given on the command line.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

pub const PROMPT: &str = "Enter the path to a file or directory to process:";
pub const INVALID_PATH: &str = "Invalid path.";

/// Strip surrounding whitespace and one pair of matching quotes, as left by
/// drag-and-drop into a terminal
pub fn clean_input(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed
}

/// Ask for a path until the answer names an existing file or directory.
///
/// End of input is an error.
pub fn prompt_for_path<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<PathBuf> {
    writeln!(output, "{}", PROMPT)?;
    loop {
        output.flush()?;
        let mut line = String::new();
        let read = input.read_line(&mut line).context("Failed to read path from stdin")?;
        if read == 0 {
            return Err(anyhow::anyhow!("No path given: input closed"));
        }

        let candidate = clean_input(&line);
        if !candidate.is_empty() {
            let path = PathBuf::from(candidate);
            if path.is_file() || path.is_dir() {
                return Ok(path);
            }
        }
        writeln!(output, "{}", INVALID_PATH)?;
        writeln!(output, "{}", PROMPT)?;
    }
}
