//! Legacy `key=value` configuration reader.
//!
//! Older deployments keep the dataset path in a flat file such as
//! `config.ini`, one `key=value` per line, with the path under `linuxpath`.

use std::fs;
use std::path::Path;

use crate::config::loader::ConfigError;

/// Key holding the dataset path in legacy files.
pub const DATASET_PATH_KEY: &str = "linuxpath";

/// Extract the dataset path from legacy config text.
///
/// The first `linuxpath=` line with a non-empty value wins. No such line is a
/// `MissingKey` error.
pub fn parse_dataset_path(content: &str) -> Result<String, ConfigError> {
    content
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .find(|(key, value)| key.trim() == DATASET_PATH_KEY && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
        .ok_or(ConfigError::MissingKey(DATASET_PATH_KEY))
}

/// Read a legacy config file and return its dataset path.
pub fn read_dataset_path(path: &Path) -> Result<String, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_dataset_path(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_linuxpath() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "linuxpath=/path/to/200k.txt").unwrap();
        assert_eq!(read_dataset_path(file.path()).unwrap(), "/path/to/200k.txt");
    }

    #[test]
    fn skips_other_keys() {
        let content = "# comment\nother=1\n  linuxpath = /srv/data.txt  \nlinuxpath=/second.txt\n";
        assert_eq!(parse_dataset_path(content).unwrap(), "/srv/data.txt");
    }

    #[test]
    fn empty_value_does_not_hide_later_path() {
        let content = "linuxpath=\nlinuxpath = /srv/later.txt\n";
        assert_eq!(parse_dataset_path(content).unwrap(), "/srv/later.txt");
    }

    #[test]
    fn missing_key_is_error() {
        assert!(matches!(
            parse_dataset_path("some_other_data\n"),
            Err(ConfigError::MissingKey("linuxpath"))
        ));
        assert!(matches!(parse_dataset_path(""), Err(ConfigError::MissingKey(_))));
        assert!(matches!(parse_dataset_path("linuxpath=\n"), Err(ConfigError::MissingKey(_))));
        assert!(matches!(parse_dataset_path("=/invalid/file/path\n"), Err(ConfigError::MissingKey(_))));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let err = read_dataset_path(Path::new("/nonexistent/config.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
