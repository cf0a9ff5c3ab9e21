use crate::domain::{LOOKUP_TABLE_MARKER, Vec3};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

pub(super) const STREAM_ORIGIN: &str = "<stream>";

#[derive(Debug, thiserror::Error)]
pub enum VtkReadError {
    #[error("failed to open results file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read results file '{}' at line {line}: {source}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        source: std::io::Error,
    },
    #[error("'{}' line {line}: not valid UTF-8 text", path.display())]
    Encoding { path: PathBuf, line: usize },
    #[error("'{}' line {line}: token '{token}' in section '{keyword}' is not a valid number", path.display())]
    InvalidNumber {
        path: PathBuf,
        line: usize,
        keyword: String,
        token: String,
    },
    #[error("'{}' line {line}: section '{keyword}' expects {expected} field(s) per line, found {found}", path.display())]
    FieldCount {
        path: PathBuf,
        line: usize,
        keyword: String,
        expected: usize,
        found: usize,
    },
}

impl VtkReadError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Open { path, .. }
            | Self::Read { path, .. }
            | Self::Encoding { path, .. }
            | Self::InvalidNumber { path, .. }
            | Self::FieldCount { path, .. } => path,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Open { .. } => None,
            Self::Read { line, .. }
            | Self::Encoding { line, .. }
            | Self::InvalidNumber { line, .. }
            | Self::FieldCount { line, .. } => Some(*line),
        }
    }
}

pub(super) fn open(path: &Path) -> Result<BufReader<File>, VtkReadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| VtkReadError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Walks the section introduced by the first line containing `keyword` and
/// hands every non-blank line of it to `visit` as whitespace-split tokens.
///
/// Collection stops at the first blank line; nothing past it is read.
pub(super) fn scan_section<R, F>(
    reader: R,
    origin: &Path,
    keyword: &str,
    mut visit: F,
) -> Result<(), VtkReadError>
where
    R: BufRead,
    F: FnMut(SectionLine<'_>) -> Result<(), VtkReadError>,
{
    let mut found_keyword = false;

    for (line_index, line) in reader.lines().enumerate() {
        let line_number = line_index + 1;
        let line = line.map_err(|source| match source.kind() {
            ErrorKind::InvalidData => VtkReadError::Encoding {
                path: origin.to_path_buf(),
                line: line_number,
            },
            _ => VtkReadError::Read {
                path: origin.to_path_buf(),
                line: line_number,
                source,
            },
        })?;

        if !found_keyword {
            found_keyword = line.contains(keyword);
            continue;
        }

        if line.trim().is_empty() {
            break;
        }

        let tokens = line.split_whitespace().collect::<Vec<_>>();
        visit(SectionLine {
            origin,
            keyword,
            line: line_number,
            tokens: &tokens,
        })?;
    }

    Ok(())
}

pub(super) struct SectionLine<'a> {
    origin: &'a Path,
    keyword: &'a str,
    line: usize,
    tokens: &'a [&'a str],
}

impl SectionLine<'_> {
    pub(super) fn is_lookup_table(&self) -> bool {
        self.tokens.first() == Some(&LOOKUP_TABLE_MARKER)
    }

    pub(super) fn vector(&self) -> Result<Vec3, VtkReadError> {
        self.expect_field_count(3)?;
        Ok([
            self.number(self.tokens[0])?,
            self.number(self.tokens[1])?,
            self.number(self.tokens[2])?,
        ])
    }

    pub(super) fn scalar(&self) -> Result<f64, VtkReadError> {
        self.expect_field_count(1)?;
        self.number(self.tokens[0])
    }

    fn expect_field_count(&self, expected: usize) -> Result<(), VtkReadError> {
        if self.tokens.len() == expected {
            return Ok(());
        }
        Err(VtkReadError::FieldCount {
            path: self.origin.to_path_buf(),
            line: self.line,
            keyword: self.keyword.to_string(),
            expected,
            found: self.tokens.len(),
        })
    }

    fn number(&self, token: &str) -> Result<f64, VtkReadError> {
        token
            .parse::<f64>()
            .map_err(|_| VtkReadError::InvalidNumber {
                path: self.origin.to_path_buf(),
                line: self.line,
                keyword: self.keyword.to_string(),
                token: token.to_string(),
            })
    }
}
