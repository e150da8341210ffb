//! Line reader for MaTeX source.
//!
//! The reader hands out one directive line at a time, skipping blank lines
//!     and `#` comment lines.
//! It supports repositioning with [`LineReader::tell`] and [`LineReader::seek`],
//!     which is how `FOR` blocks replay their body.

use std::io::{self, BufRead, Seek, SeekFrom};

/// Maps byte offsets in the source to 1-based line numbers.
///
/// The tracker records the offset at which each line ends as the source is read forward.
/// The table only grows: after a seek backwards, lines are re-read but
///     their boundaries are already known.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    line_ends: Vec<u64>,
}

impl Default for PositionTracker {
    fn default() -> Self {
        PositionTracker { line_ends: vec![0] }
    }
}

impl PositionTracker {
    /// Records that a line ends at the provided offset.
    pub fn record(&mut self, offset: u64) {
        if offset > *self.line_ends.last().unwrap_or(&0) {
            self.line_ends.push(offset);
        }
    }

    /// Returns the number of the line that contains the last position read
    ///     before the provided offset.
    pub fn line(&self, offset: u64) -> usize {
        let i = self.line_ends.partition_point(|&end| end < offset);
        std::cmp::min(i, self.line_ends.len() - 1)
    }
}

/// One directive line of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The first word of the line, uppercased.
    pub head: String,
    /// Everything after the first space, as written.
    pub tail: String,
    /// Byte span of the line in the source, without the line terminator.
    pub span: std::ops::Range<usize>,
}

/// Reader that returns the directive lines of a seekable source.
pub struct LineReader<R> {
    input: R,
    position: u64,
    tracker: PositionTracker,
    buffer: Vec<u8>,
}

impl<R: BufRead + Seek> LineReader<R> {
    pub fn new(mut input: R) -> io::Result<LineReader<R>> {
        let position = input.stream_position()?;
        Ok(LineReader {
            input,
            position,
            tracker: Default::default(),
            buffer: Vec::new(),
        })
    }

    /// Returns the next line that is neither blank nor a comment,
    ///     or [`None`] at the end of the source.
    ///
    /// A line that is not valid UTF-8 is an [`io::ErrorKind::InvalidData`] error.
    /// The reader has moved past that line, so [`LineReader::current_line`] is its number.
    pub fn next_line(&mut self) -> io::Result<Option<Line>> {
        loop {
            let start = self.position;
            self.buffer.clear();
            let n = self.input.read_until(b'\n', &mut self.buffer)?;
            self.position += n as u64;
            self.tracker.record(self.position);
            if n == 0 {
                return Ok(None);
            }
            let text = std::str::from_utf8(&self.buffer)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
            let line = text.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let leading = text.len() - text.trim_start().len();
            let span_start = start as usize + leading;
            let span = span_start..span_start + line.len();
            let (head, tail) = match line.split_once(' ') {
                None => (line, ""),
                Some((head, tail)) => (head, tail),
            };
            return Ok(Some(Line {
                head: head.to_uppercase(),
                tail: tail.into(),
                span,
            }));
        }
    }

    /// Returns the current byte offset in the source.
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Moves the reader to a byte offset previously returned by [`LineReader::tell`].
    pub fn seek(&mut self, position: u64) -> io::Result<()> {
        self.position = self.input.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    /// Returns the 1-based number of the line that was read last.
    pub fn current_line(&self) -> usize {
        self.tracker.line(self.position)
    }
}
