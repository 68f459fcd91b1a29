use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use sift_core::KeypointSet;
use crate::error::{LoadError, LoadResult};
use crate::parser::KeyFileParser;

/// Extension of keypoint dataset files
pub const KEY_EXTENSION: &str = "key";

/// Reads keypoint datasets from disk or memory
pub struct KeyFileLoader;

impl KeyFileLoader {
    /// Load `<base>.key`; the image id is the final component of `base`.
    ///
    /// `load("data/library")` reads `data/library.key` and yields a set whose
    /// companion image is `data/library.pgm`.
    pub fn load<P: AsRef<Path>>(base: P) -> LoadResult<KeypointSet> {
        let base = base.as_ref();
        let image_id = base
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = Self::key_path(base);
        Self::load_file(&path, image_id)
    }

    /// Load an explicit file path; the image id is the file stem
    pub fn load_path<P: AsRef<Path>>(path: P) -> LoadResult<KeypointSet> {
        let path = path.as_ref();
        let image_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::load_file(path, image_id)
    }

    /// `<base>.key`, keeping any dots already present in the base name
    pub fn key_path<P: AsRef<Path>>(base: P) -> PathBuf {
        let mut os = base.as_ref().as_os_str().to_owned();
        os.push(".");
        os.push(KEY_EXTENSION);
        PathBuf::from(os)
    }

    fn load_file(path: &Path, image_id: String) -> LoadResult<KeypointSet> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(image_id, BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(image_id: impl Into<String>, reader: R) -> LoadResult<KeypointSet> {
        let mut parser = KeyFileParser::new(image_id);
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    return Err(LoadError::format(parser.line() + 1, "line is not valid UTF-8"));
                }
                Err(e) => return Err(e.into()),
            };
            parser.feed_line(&line)?;
        }
        parser.finish()
    }

    pub fn from_str(image_id: impl Into<String>, text: &str) -> LoadResult<KeypointSet> {
        let mut parser = KeyFileParser::new(image_id);
        for line in text.lines() {
            parser.feed_line(line)?;
        }
        parser.finish()
    }
}
