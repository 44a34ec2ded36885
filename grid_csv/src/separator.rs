//! Separator auto-detection: a
//! byte-frequency heuristic over comma/tab/semicolon.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::CsvLoadError;

#[derive(strum::EnumIter, strum::Display, Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Separator {
    Auto,
    #[default]
    Comma,
    Tab,
    Semicolon,
}

impl Separator {
    /// Resolves to a concrete delimiter byte. `Auto` scans the file once,
    /// counting comma/tab/semicolon occurrences and picking the most
    /// frequent; a tie favors comma.
    pub fn resolve(self, path: &Path) -> Result<u8, CsvLoadError> {
        match self {
            Separator::Comma => Ok(b','),
            Separator::Tab => Ok(b'\t'),
            Separator::Semicolon => Ok(b';'),
            Separator::Auto => {
                let file = File::open(path).map_err(CsvLoadError::Io)?;
                let reader = BufReader::new(file);
                let mut counts: [(usize, u8); 3] = [(0, b','), (0, b'\t'), (0, b';')];
                for b in reader.bytes() {
                    let Ok(b) = b else { break };
                    match b {
                        b',' => counts[0].0 += 1,
                        b'\t' => counts[1].0 += 1,
                        b';' => counts[2].0 += 1,
                        _ => {}
                    }
                }
                counts.sort_by(|a, b| b.0.cmp(&a.0));
                if counts[0].0 == 0 {
                    Err(CsvLoadError::UnknownSeparator)
                } else {
                    Ok(counts[0].1)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn auto_detects_semicolon() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a;b;c").unwrap();
        writeln!(file, "1;2;3").unwrap();
        assert_eq!(Separator::Auto.resolve(file.path()).unwrap(), b';');
    }

    #[test]
    fn auto_detects_comma_by_default_on_tie() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        assert_eq!(Separator::Auto.resolve(file.path()).unwrap(), b',');
    }

    #[test]
    fn auto_on_unrecognized_content_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nothing here").unwrap();
        assert!(matches!(
            Separator::Auto.resolve(file.path()),
            Err(CsvLoadError::UnknownSeparator)
        ));
    }
}
