//! Line splitting shared by forward and backward reads.
//!
//! A line is trusted when it is terminated by `\n`. Whatever follows the last
//! newline is a *fragment*: either the final record of a file written without
//! a trailing newline, or a write that is still in flight.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

/// Bytes read per step when scanning backward from the end of a file.
const TAIL_BLOCK: u64 = 4096;

#[derive(Debug, Default, PartialEq)]
pub(crate) struct Segments {
    pub complete: Vec<String>,
    pub fragment: Option<String>,
    /// The fragment is the only non-blank line in the whole file.
    pub fragment_is_sole: bool,
}

impl Segments {
    fn len(&self) -> usize {
        self.complete.len() + usize::from(self.fragment.is_some())
    }
}

fn is_blank(segment: &[u8]) -> bool {
    segment.iter().all(u8::is_ascii_whitespace)
}

fn to_line(segment: &[u8]) -> String {
    String::from_utf8_lossy(segment)
        .trim_end_matches('\r')
        .to_string()
}

/// Splits `bytes` into non-blank lines. With `head_is_cut` the first segment
/// starts mid-line and is discarded.
pub(crate) fn split_segments(bytes: &[u8], head_is_cut: bool) -> Segments {
    let mut parts: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    if head_is_cut {
        parts.remove(0);
    }

    let fragment = parts.pop().filter(|p| !is_blank(p)).map(to_line);
    let complete: Vec<String> = parts
        .into_iter()
        .filter(|p| !is_blank(p))
        .map(to_line)
        .collect();
    let fragment_is_sole = !head_is_cut && complete.is_empty() && fragment.is_some();

    Segments {
        complete,
        fragment,
        fragment_is_sole,
    }
}

/// Reads every line of `file`.
pub(crate) fn read_all(file: &mut File) -> io::Result<Segments> {
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(split_segments(&bytes, false))
}

/// Reads the first non-blank line without touching the rest of the file.
pub(crate) fn read_head(file: &mut File) -> io::Result<Segments> {
    let mut reader = BufReader::new(file);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(Segments::default());
        }
        if is_blank(&line) {
            continue;
        }
        return Ok(match line.strip_suffix(b"\n") {
            Some(terminated) => Segments {
                complete: vec![to_line(terminated)],
                fragment: None,
                fragment_is_sole: false,
            },
            // nothing but blank lines came before it, and EOF follows
            None => Segments {
                complete: Vec::new(),
                fragment: Some(to_line(&line)),
                fragment_is_sole: true,
            },
        });
    }
}

/// Reads at most `wanted` trailing non-blank lines by scanning backward in
/// fixed-size blocks, so the cost depends on the tail length, not the file
/// length.
pub(crate) fn read_tail(file: &mut File, wanted: usize) -> io::Result<Segments> {
    if wanted == 0 {
        return Ok(Segments::default());
    }

    let mut pos = file.seek(SeekFrom::End(0))?;
    let mut buf: Vec<u8> = Vec::new();

    loop {
        let step = pos.min(TAIL_BLOCK);
        pos -= step;
        file.seek(SeekFrom::Start(pos))?;

        let mut block = vec![0u8; step as usize];
        file.read_exact(&mut block)?;
        block.extend_from_slice(&buf);
        buf = block;

        let mut segments = split_segments(&buf, pos > 0);
        if segments.len() >= wanted || pos == 0 {
            let keep = wanted - usize::from(segments.fragment.is_some());
            let excess = segments.complete.len().saturating_sub(keep);
            segments.complete.drain(..excess);
            return Ok(segments);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempdir::TempDir;

    fn file_with(dir: &TempDir, name: &str, content: &[u8]) -> File {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        File::open(&path).unwrap()
    }

    #[test]
    fn test_split_skips_blank_lines_and_keeps_fragment() {
        let segments = split_segments(b"\n100\n\n200\n300", false);
        assert_eq!(segments.complete, vec!["100", "200"]);
        assert_eq!(segments.fragment.as_deref(), Some("300"));
    }

    #[test]
    fn test_split_terminated_has_no_fragment() {
        let segments = split_segments(b"100\r\n200\n", false);
        assert_eq!(segments.complete, vec!["100", "200"]);
        assert_eq!(segments.fragment, None);
    }

    #[test]
    fn test_split_drops_cut_head() {
        let segments = split_segments(b"00\n200\n", true);
        assert_eq!(segments.complete, vec!["200"]);

        let segments = split_segments(b"no newline at all", true);
        assert_eq!(segments, Segments::default());
    }

    #[test]
    fn test_read_tail_legacy_format() {
        let dir = TempDir::new("tail-legacy").unwrap();
        let mut f = file_with(&dir, "idx.txt", b"\n1000\n1060\n1120");
        let segments = read_tail(&mut f, 1).unwrap();
        assert!(segments.complete.is_empty());
        assert_eq!(segments.fragment.as_deref(), Some("1120"));
        assert!(!segments.fragment_is_sole);

        let mut single = file_with(&dir, "single.txt", b"\n1000");
        assert!(read_tail(&mut single, 1).unwrap().fragment_is_sole);
    }

    #[test]
    fn test_read_tail_crosses_block_boundaries() {
        let dir = TempDir::new("tail-blocks").unwrap();
        let mut content = String::new();
        for i in 0..2000 {
            content.push_str(&format!("{}\n", 1_000_000 + i));
        }
        let mut f = file_with(&dir, "idx.txt", content.as_bytes());

        let segments = read_tail(&mut f, 3).unwrap();
        assert_eq!(segments.complete, vec!["1001997", "1001998", "1001999"]);
        assert_eq!(segments.fragment, None);

        let segments = read_tail(&mut f, 1500).unwrap();
        assert_eq!(segments.complete.len(), 1500);
        assert_eq!(segments.complete[0], "1000500");
    }

    #[test]
    fn test_read_tail_short_file_returns_everything() {
        let dir = TempDir::new("tail-short").unwrap();
        let mut f = file_with(&dir, "idx.txt", b"1\n2\n");
        let segments = read_tail(&mut f, 10).unwrap();
        assert_eq!(segments.complete, vec!["1", "2"]);

        let mut empty = file_with(&dir, "empty.txt", b"");
        assert_eq!(read_tail(&mut empty, 1).unwrap(), Segments::default());
    }

    #[test]
    fn test_read_head_skips_leading_blank() {
        let dir = TempDir::new("head").unwrap();
        let mut f = file_with(&dir, "idx.txt", b"\n\n1000\n1060\n");
        let segments = read_head(&mut f).unwrap();
        assert_eq!(segments.complete, vec!["1000"]);

        let mut single = file_with(&dir, "single.txt", b"1000");
        let segments = read_head(&mut single).unwrap();
        assert_eq!(segments.fragment.as_deref(), Some("1000"));
        assert!(segments.fragment_is_sole);
    }
}
