//! Output management module
//!
//! One output file per run, opened in append mode so every input file of the
//! run (and earlier runs) accumulates into it.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default buffer size for file writing (8MB)
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Default output file name
pub const DEFAULT_OUTPUT_FILE: &str = "filtered_ulp.txt";

/// Buffered append-mode output file
pub struct OutputWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    lines_written: u64,
    bytes_written: u64,
}

impl OutputWriter {
    /// Open `path` for appending, creating it if needed
    pub fn append(path: &Path, buffer_size: usize) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_output_dir(parent)?;
        }

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| Error::OpenOutput {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            writer: BufWriter::with_capacity(buffer_size, file),
            path: path.to_path_buf(),
            lines_written: 0,
            bytes_written: 0,
        })
    }

    /// Write a line followed by `\n`
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|source| Error::Write {
                path: self.path.clone(),
                source,
            })?;

        self.lines_written += 1;
        self.bytes_written += line.len() as u64 + 1;
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Lines written through this writer (not counting earlier file content)
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl Drop for OutputWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Ensure output directory exists
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|source| Error::OpenOutput {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_writer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");

        let mut writer = OutputWriter::append(&path, 1024).unwrap();
        writer.write_line("hello").unwrap();
        writer.write_line("world").unwrap();
        writer.flush().unwrap();

        assert_eq!(writer.lines_written(), 2);
        assert_eq!(writer.bytes_written(), 12);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "hello\nworld\n");
    }

    #[test]
    fn test_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");
        std::fs::write(&path, "earlier\n").unwrap();

        {
            let mut writer = OutputWriter::append(&path, 1024).unwrap();
            writer.write_line("later").unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "earlier\nlater\n");
    }

    #[test]
    fn test_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/out.txt");

        let mut writer = OutputWriter::append(&path, 1024).unwrap();
        writer.write_line("x").unwrap();
        writer.flush().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_unopenable_output() {
        let temp_dir = TempDir::new().unwrap();
        let err = OutputWriter::append(temp_dir.path(), 1024).err().unwrap();
        assert!(matches!(err, Error::OpenOutput { .. }));
    }
}
