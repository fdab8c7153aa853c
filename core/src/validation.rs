//! Pre-flight checks on `(mode, input, output)`.
//!
//! Checks run in a fixed order and the first failure is reported; nothing is
//! created on disk here.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::debug;
use sysinfo::Disks;
use thiserror::Error;

use crate::constants::{ARCHIVE_EXTENSION, GZIP_MAGIC};
use crate::stream::Direction;
use crate::utils::has_extension;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Input error. Follow the pattern: compress(decompress) source destination")]
    ArgumentCount,

    #[error("First argument must be 'compress' or 'decompress'")]
    UnknownMode,

    #[error("Wrong file format (not gzip archive)")]
    NotGzip,

    #[error("Source file is not specified")]
    SourceNotSpecified,

    #[error("Missing source file")]
    MissingSource,

    #[error("File has already been compressed")]
    AlreadyCompressed,

    #[error("Source file to be decompressed must have .gz extension")]
    MissingGzExtension,

    #[error("Destination file is not specified")]
    DestinationNotSpecified,

    #[error("Destination file already exists")]
    DestinationExists,

    #[error("Source and destination files must be different")]
    SameFile,

    #[error("Free space exhausted. Free space left: {available} bytes.")]
    InsufficientSpace { required: u64, available: u64 },

    #[error("cannot inspect {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Raw positional arguments: exactly `mode input output`.
pub fn check_args(args: &[String]) -> Result<Direction, ValidationError> {
    match args {
        [mode, input, output] => check(mode, Path::new(input), Path::new(output)),
        _ => Err(ValidationError::ArgumentCount),
    }
}

pub fn check(mode: &str, input: &Path, output: &Path) -> Result<Direction, ValidationError> {
    let direction = Direction::from_mode(mode).ok_or(ValidationError::UnknownMode)?;

    if direction == Direction::Decompress && !input.as_os_str().is_empty() {
        check_signature(input)?;
    }

    let input_name = input.file_name().ok_or(ValidationError::SourceNotSpecified)?;

    let meta = match input.metadata() {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(ValidationError::MissingSource),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ValidationError::MissingSource),
        Err(source) => return Err(ValidationError::Io { path: input.to_path_buf(), source }),
    };

    let gz_input = has_extension(input, ARCHIVE_EXTENSION);
    match direction {
        Direction::Compress if gz_input => return Err(ValidationError::AlreadyCompressed),
        Direction::Decompress if !gz_input => return Err(ValidationError::MissingGzExtension),
        _ => {}
    }

    let output_name = output.file_name().ok_or(ValidationError::DestinationNotSpecified)?;

    if output.exists() && has_extension(output, ARCHIVE_EXTENSION) {
        return Err(ValidationError::DestinationExists);
    }

    if input_name == output_name {
        return Err(ValidationError::SameFile);
    }

    if let Some(available) = free_space_for(output) {
        if meta.len() > available {
            return Err(ValidationError::InsufficientSpace { required: meta.len(), available });
        }
    }

    debug!("[VALIDATE] {direction} {} -> {} ok", input.display(), output.display());
    Ok(direction)
}

/// First three bytes must be the gzip magic plus the deflate method byte.
fn check_signature(input: &Path) -> Result<(), ValidationError> {
    let file = match File::open(input) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ValidationError::MissingSource),
        Err(source) => return Err(ValidationError::Io { path: input.to_path_buf(), source }),
    };

    let mut head = Vec::with_capacity(GZIP_MAGIC.len());
    file.take(GZIP_MAGIC.len() as u64)
        .read_to_end(&mut head)
        .map_err(|source| ValidationError::Io { path: input.to_path_buf(), source })?;

    if head != GZIP_MAGIC {
        return Err(ValidationError::NotGzip);
    }
    Ok(())
}

/// Available bytes on the disk that would hold `output`, or `None` when no
/// mounted disk can be matched.
pub fn free_space_for(output: &Path) -> Option<u64> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir().ok()?,
    };
    let dir = parent.canonicalize().ok()?;

    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|d| dir.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| d.available_space())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wrong_argument_count() {
        assert!(matches!(check_args(&args(&["compress", "a"])), Err(ValidationError::ArgumentCount)));
        assert!(matches!(check_args(&[]), Err(ValidationError::ArgumentCount)));
    }

    #[test]
    fn unknown_mode_comes_before_file_checks() {
        assert!(matches!(
            check("zip", Path::new("/nope/in"), Path::new("/nope/out")),
            Err(ValidationError::UnknownMode)
        ));
    }

    #[test]
    fn messages_are_stable() {
        assert_eq!(ValidationError::SameFile.to_string(), "Source and destination files must be different");
        assert_eq!(
            ValidationError::InsufficientSpace { required: 10, available: 3 }.to_string(),
            "Free space exhausted. Free space left: 3 bytes."
        );
    }

    #[test]
    fn compress_accepts_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.bin");
        fs::write(&input, b"hello").unwrap();
        let out = dir.path().join("data.bin.gz");
        assert_eq!(check("COMPRESS", &input, &out).unwrap(), Direction::Compress);
    }

    #[test]
    fn decompress_requires_signature() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.gz");
        fs::write(&input, b"plain text").unwrap();
        let out = dir.path().join("data");
        assert!(matches!(check("decompress", &input, &out), Err(ValidationError::NotGzip)));

        fs::write(&input, [0x1F, 0x8B]).unwrap();
        assert!(matches!(check("decompress", &input, &out), Err(ValidationError::NotGzip)));
    }
}
