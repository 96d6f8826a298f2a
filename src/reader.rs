//! Input line reader
//!
//! Maps an input file into memory, detects its text encoding and yields its
//! lines as UTF-8 with line terminators and any BOM removed. Combolists come in
//! all kinds of encodings, so anything that is not UTF-8 is transcoded.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};

/// How much of the file is sampled for encoding detection
const DETECT_SAMPLE: usize = 64 * 1024;

/// Detect the encoding of a byte sample
///
/// A BOM wins; otherwise valid UTF-8 stays UTF-8 and anything else is guessed.
pub fn detect_encoding(sample: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding;
    }

    // error_len() == None: only the sample cut a character in half
    match std::str::from_utf8(sample) {
        Ok(_) => return UTF_8,
        Err(e) if e.error_len().is_none() => return UTF_8,
        Err(_) => {}
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    detector.guess(None, true)
}

/// Decode one line without ever substituting U+FFFD
///
/// Lines the file encoding cannot decode are tried as UTF-8, then as
/// windows-1252, which maps every byte to a distinct character.
pub fn decode_line(line: &[u8], encoding: &'static Encoding) -> String {
    if encoding != UTF_8 {
        let (decoded, had_errors) = encoding.decode_without_bom_handling(line);
        if !had_errors {
            return decoded.into_owned();
        }
    }

    if let Ok(text) = std::str::from_utf8(line) {
        return text.to_owned();
    }

    log::trace!("Line is not {}, decoding as windows-1252", encoding.name());
    let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(line);
    decoded.into_owned()
}

fn is_utf16(encoding: &'static Encoding) -> bool {
    encoding == UTF_16LE || encoding == UTF_16BE
}

/// Backing bytes of a reader
enum Source {
    /// Empty files cannot be mapped on every platform
    Empty,
    Mapped(Mmap),
    /// UTF-16 input, transcoded up front so lines can be split on `\n`
    Decoded(String),
}

impl Source {
    fn bytes(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Mapped(mmap) => &mmap[..],
            Self::Decoded(text) => text.as_bytes(),
        }
    }
}

/// Memory-mapped line source for one input file
pub struct LineReader {
    source: Source,
    size: usize,
    encoding: &'static Encoding,
    position: usize,
}

impl LineReader {
    /// Open and map `path`
    pub fn open(path: &Path) -> Result<Self> {
        let open_err = |source| Error::OpenInput {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(open_err)?;
        let len = file.metadata().map_err(open_err)?.len();

        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: the mapping is read-only; inputs are not expected to change during a run
            Some(unsafe { Mmap::map(&file) }.map_err(open_err)?)
        };

        let bytes = mmap.as_deref().unwrap_or(&[]);
        let size = bytes.len();
        let encoding = detect_encoding(&bytes[..size.min(DETECT_SAMPLE)]);
        let bom_len = Encoding::for_bom(bytes).map(|(_, bom_len)| bom_len).unwrap_or(0);

        log::debug!("{:?}: {} bytes, encoding {}", path, len, encoding.name());

        let (source, position) = match mmap {
            None => (Source::Empty, 0),
            Some(mmap) if is_utf16(encoding) => {
                let (text, had_errors) = encoding.decode_without_bom_handling(&mmap[bom_len..]);
                if had_errors {
                    log::warn!("{:?}: malformed {} sequences replaced", path, encoding.name());
                }
                (Source::Decoded(text.into_owned()), 0)
            }
            Some(mmap) => (Source::Mapped(mmap), bom_len),
        };

        Ok(Self {
            source,
            size,
            encoding,
            position,
        })
    }

    /// Size of the file in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

impl Iterator for LineReader {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.source.bytes();
        if self.position >= bytes.len() {
            return None;
        }

        let remaining = &bytes[self.position..];
        let line_end = memchr::memchr(b'\n', remaining)
            .map(|i| i + 1)
            .unwrap_or(remaining.len());
        self.position += line_end;

        let line = &remaining[..line_end];
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        let encoding = match self.source {
            Source::Decoded(_) => UTF_8,
            _ => self.encoding,
        };
        Some(decode_line(line, encoding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_utf8_detection() {
        assert_eq!(detect_encoding("user@mail.ru:Привет".as_bytes()), encoding_rs::UTF_8);
        assert_eq!(detect_encoding(&[0xEF, 0xBB, 0xBF, b'a']), encoding_rs::UTF_8);
        assert_eq!(detect_encoding(&[0xFF, 0xFE, b'a', 0]), encoding_rs::UTF_16LE);
    }

    #[test]
    fn test_line_reader() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "line1\r\nline2\n\nline3").unwrap();

        let reader = LineReader::open(file.path()).unwrap();
        let lines: Vec<_> = reader.collect();

        assert_eq!(lines, vec!["line1", "line2", "", "line3"]);
    }

    #[test]
    fn test_bom_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xEF, 0xBB, 0xBF]).unwrap();
        file.write_all(b"a@b.com:pw\n").unwrap();

        let lines: Vec<_> = LineReader::open(file.path()).unwrap().collect();
        assert_eq!(lines, vec!["a@b.com:pw"]);
    }

    #[test]
    fn test_latin1_transcoded() {
        let mut file = NamedTempFile::new().unwrap();
        // windows-1252
        file.write_all(b"m\xFCller@web.de:p\xE4ssword\n").unwrap();
        file.write_all(b"gr\xFC\xDFe@m\xFCnchen.de:sch\xF6ne Gr\xF6\xDFe\n").unwrap();

        let reader = LineReader::open(file.path()).unwrap();
        assert_ne!(reader.encoding(), encoding_rs::UTF_8);

        let lines: Vec<_> = reader.collect();
        assert_eq!(lines, vec!["müller@web.de:pässword", "grüße@münchen.de:schöne Größe"]);
    }

    #[test]
    fn test_invalid_utf8_after_sample_is_not_lossy() {
        let mut file = NamedTempFile::new().unwrap();
        for i in 0..8000 {
            writeln!(file, "user{}@example.com:password{}", i, i).unwrap();
        }
        file.write_all(b"a@b.com:p\xE4ss\n").unwrap();
        file.write_all(b"a@b.com:p\xF6ss\n").unwrap();

        let reader = LineReader::open(file.path()).unwrap();
        assert_eq!(reader.encoding(), encoding_rs::UTF_8);

        let lines: Vec<_> = reader.collect();
        assert_eq!(lines.len(), 8002);
        assert_eq!(lines[8000], "a@b.com:päss");
        assert_eq!(lines[8001], "a@b.com:pöss");
        assert!(lines.iter().all(|l| !l.contains('\u{FFFD}')));
    }

    #[test]
    fn test_decode_line_fallbacks() {
        assert_eq!(decode_line(b"plain", encoding_rs::UTF_8), "plain");
        assert_eq!(decode_line("grüße".as_bytes(), encoding_rs::UTF_8), "grüße");
        assert_eq!(decode_line(b"gr\xFC\xDFe", encoding_rs::UTF_8), "grüße");
        assert_ne!(decode_line(b"\x81", encoding_rs::UTF_8), decode_line(b"\x8D", encoding_rs::UTF_8));
        assert_eq!(decode_line(b"m\xFCller", encoding_rs::WINDOWS_1252), "müller");
    }

    fn utf16(text: &str, little_endian: bool) -> Vec<u8> {
        let mut bytes = if little_endian { vec![0xFF, 0xFE] } else { vec![0xFE, 0xFF] };
        for unit in text.encode_utf16() {
            if little_endian {
                bytes.extend_from_slice(&unit.to_le_bytes());
            } else {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
        }
        bytes
    }

    #[test]
    fn test_utf16_lines() {
        for little_endian in [true, false] {
            let mut file = NamedTempFile::new().unwrap();
            file.write_all(&utf16("a@b.com:pw\r\nc@d.com:Привет\n", little_endian)).unwrap();

            let reader = LineReader::open(file.path()).unwrap();
            assert!(is_utf16(reader.encoding()));

            let lines: Vec<_> = reader.collect();
            assert_eq!(lines, vec!["a@b.com:pw", "c@d.com:Привет"]);
        }
    }

    #[test]
    fn test_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let mut reader = LineReader::open(file.path()).unwrap();

        assert_eq!(reader.size(), 0);
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn test_missing_file() {
        let err = LineReader::open(Path::new("/definitely/not/here.txt")).err().unwrap();
        assert!(matches!(err, Error::OpenInput { .. }));
    }
}
