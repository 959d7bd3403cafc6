//! Line framing: turns a byte stream into trimmed protocol lines.
//!
//! Lines are terminated by `\n`; a preceding `\r` and surrounding
//! whitespace are stripped. The receive buffer is bounded by
//! [`MAX_LINE_LENGTH`] and an over-long line is never emitted in part.

/// Maximum accepted line length in bytes, excluding the `\n` or `\r\n`
/// terminator.
pub const MAX_LINE_LENGTH: usize = 128;

/// An owned copy of one framed line.
pub type Line = heapless::Vec<u8, MAX_LINE_LENGTH>;

/// What to do when a line outgrows the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OverflowPolicy {
    /// Drop the buffer and everything up to and including the next `\n`.
    #[default]
    DiscardLine,
    /// Drop the buffer (and the overflowing byte) and keep accumulating.
    ///
    /// This is what most device sketches do; the tail of an over-long line
    /// then arrives as a line of its own.
    Restart,
}

/// Incremental line framer with a fixed-size buffer.
///
/// # Example
///
/// ```
/// use dataref_proto::LineFramer;
///
/// let mut framer = LineFramer::new();
/// let lines: Vec<_> = framer.feed(b"PING\r\nGET GEAR").collect();
/// assert_eq!(lines.len(), 1);
/// assert_eq!(&lines[0][..], b"PING");
///
/// // The rest of the second line arrives later
/// let lines: Vec<_> = framer.feed(b"_LED\n").collect();
/// assert_eq!(&lines[0][..], b"GET GEAR_LED");
/// ```
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Line,
    policy: OverflowPolicy,
    /// Skipping the remainder of an over-long line.
    discarding: bool,
    /// The previous call returned a line; clear before accepting more.
    complete: bool,
    /// A `\r` held back until the next byte shows whether it ends the line.
    pending_cr: bool,
    overflows: u32,
}

impl LineFramer {
    /// Create a framer with the default [`OverflowPolicy`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_policy(OverflowPolicy::DiscardLine)
    }

    #[must_use]
    pub const fn with_policy(policy: OverflowPolicy) -> Self {
        Self {
            buffer: heapless::Vec::new(),
            policy,
            discarding: false,
            complete: false,
            pending_cr: false,
            overflows: 0,
        }
    }

    /// Push one byte. Returns the trimmed line when `byte` completes one.
    ///
    /// Blank lines are returned as empty slices.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if self.complete {
            self.buffer.clear();
            self.complete = false;
        }

        if byte == b'\n' {
            self.pending_cr = false;
            if self.discarding {
                self.discarding = false;
                self.buffer.clear();
                return None;
            }
            self.complete = true;
            return Some(trim_line(&self.buffer));
        }

        if self.discarding {
            return None;
        }

        // Not followed by `\n`, so the held `\r` is part of the line
        if core::mem::take(&mut self.pending_cr) {
            self.store(b'\r');
            if self.discarding {
                return None;
            }
        }

        if byte == b'\r' {
            self.pending_cr = true;
        } else {
            self.store(byte);
        }
        None
    }

    fn store(&mut self, byte: u8) {
        if self.buffer.push(byte).is_err() {
            self.overflows = self.overflows.wrapping_add(1);
            self.buffer.clear();
            self.discarding = self.policy == OverflowPolicy::DiscardLine;
        }
    }

    /// Feed a chunk of bytes, yielding owned copies of completed lines.
    ///
    /// The iterator is lazy: bytes after the last yielded line are only
    /// consumed as iteration continues. Dropping it early leaves the rest
    /// of the chunk unprocessed.
    pub fn feed<'f, 'b>(&'f mut self, bytes: &'b [u8]) -> Lines<'f, 'b> {
        Lines {
            framer: self,
            bytes: bytes.iter(),
        }
    }

    /// Drop any partial line and return to the initial state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
        self.complete = false;
        self.pending_cr = false;
    }

    /// Number of bytes in the current partial line.
    #[inline]
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        if self.complete || self.discarding {
            0
        } else {
            self.buffer.len()
        }
    }

    /// Number of over-long lines dropped so far.
    #[inline]
    #[must_use]
    pub fn overflow_count(&self) -> u32 {
        self.overflows
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

/// Iterator over lines completed by a chunk. See [`LineFramer::feed`].
pub struct Lines<'f, 'b> {
    framer: &'f mut LineFramer,
    bytes: core::slice::Iter<'b, u8>,
}

impl Iterator for Lines<'_, '_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        for &byte in self.bytes.by_ref() {
            if let Some(line) = self.framer.push(byte) {
                // A framed line always fits: it is a slice of the buffer
                if let Ok(line) = Line::from_slice(line) {
                    return Some(line);
                }
            }
        }
        None
    }
}

/// Strip a trailing `\r` and surrounding ASCII whitespace.
#[inline]
fn trim_line(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line.trim_ascii()
}
