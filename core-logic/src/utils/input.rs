use crate::error::ConfigError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

/// Read a line-oriented input file.
///
/// Lines are trimmed; blank lines and `#` comments are dropped. A missing
/// file is not an error and yields an empty list.
pub fn read_entries(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} not found, treating as empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(ConfigError::IoError {
                path: path.display().to_string(),
                msg: e.to_string(),
            })
        }
    };

    Ok(parse_entries(&content))
}

pub(crate) fn parse_entries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
