//! Batch file parsing: one `<url> <semitones>` job per line.

use crate::error::{Result, TransposeError};
use anyhow::Context;
use std::{fs, path::Path};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEntry {
    pub url: String,
    pub semitones: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchLine {
    Blank,
    Job(BatchEntry),
    /// Not a job; carries the offending line and why.
    Malformed { line: String, reason: String },
}

pub fn parse_batch_line(line: &str) -> BatchLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return BatchLine::Blank;
    }
    let mut parts = trimmed.split_whitespace();
    let (Some(url), Some(semi)) = (parts.next(), parts.next()) else {
        return BatchLine::Malformed {
            line: trimmed.to_string(),
            reason: "expected `<url> <semitones>`".into(),
        };
    };
    match semi.parse::<i32>() {
        Ok(semitones) => BatchLine::Job(BatchEntry {
            url: url.to_string(),
            semitones,
        }),
        Err(_) => BatchLine::Malformed {
            line: trimmed.to_string(),
            reason: format!("`{semi}` is not a whole number of semitones"),
        },
    }
}

/// Parses every line of `path`, keeping line numbers (1-based) and dropping blanks.
pub fn parse_batch_file(path: &Path) -> Result<Vec<(usize, BatchLine)>> {
    if !path.is_file() {
        return Err(TransposeError::InvalidInput(format!(
            "{} not found",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    Ok(raw
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, parse_batch_line(l)))
        .filter(|(_, l)| *l != BatchLine::Blank)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_jobs() {
        assert_eq!(
            parse_batch_line("  https://youtu.be/abc -2  "),
            BatchLine::Job(BatchEntry {
                url: "https://youtu.be/abc".into(),
                semitones: -2
            })
        );
        assert_eq!(
            parse_batch_line("https://x +3"),
            BatchLine::Job(BatchEntry {
                url: "https://x".into(),
                semitones: 3
            })
        );
    }

    #[test]
    fn blank_and_malformed() {
        assert_eq!(parse_batch_line("   \t"), BatchLine::Blank);
        assert!(matches!(parse_batch_line("https://only-url"), BatchLine::Malformed { .. }));
        assert!(matches!(parse_batch_line("https://x two"), BatchLine::Malformed { .. }));
        assert!(matches!(parse_batch_line("https://x 1.5"), BatchLine::Malformed { .. }));
    }

    #[test]
    fn file_keeps_line_numbers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("urls.txt");
        fs::write(&path, "https://a 1\n\nbad\nhttps://b -4\n").unwrap();
        let lines = parse_batch_file(&path).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].0, 1);
        assert!(matches!(lines[1], (3, BatchLine::Malformed { .. })));
        assert_eq!(lines[2].0, 4);
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = parse_batch_file(Path::new("/definitely/not/here/urls.txt")).unwrap_err();
        assert!(matches!(err, TransposeError::InvalidInput(_)));
    }
}
