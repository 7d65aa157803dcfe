// Line framing: reassemble '\n'-terminated messages from arbitrary read chunks
use crate::error::{Result, TransportError};

/// Bytes requested from the stream per refill.
pub const READ_CHUNK_SIZE: usize = 256;

pub const LINE_TERMINATOR: u8 = b'\n';

/// Bytes received but not yet handed out as a complete line.
///
/// There is no upper bound on how much a peer can make this grow while it
/// withholds the terminator.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    // Prefix of `pending` already known to hold no terminator
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Split off the first complete line, terminator excluded.
    pub fn next_line(&mut self) -> Option<String> {
        let offset = self.pending[self.scanned..]
            .iter()
            .position(|&b| b == LINE_TERMINATOR);

        match offset {
            Some(pos) => {
                let end = self.scanned + pos;
                let mut line: Vec<u8> = self.pending.drain(..=end).collect();
                line.pop();
                self.scanned = 0;
                Some(decode(line))
            }
            None => {
                self.scanned = self.pending.len();
                None
            }
        }
    }

    /// Return the next line, refilling from `fill` until one is complete.
    ///
    /// `fill` gets a scratch chunk and reports how many bytes it wrote; a
    /// report of zero means the peer closed and yields `UnexpectedClose`.
    /// Errors from `fill` are passed through untouched and leave the buffered
    /// bytes in place.
    pub fn read_line_with<F>(&mut self, mut fill: F) -> Result<String>
    where
        F: FnMut(&mut [u8]) -> Result<usize>,
    {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            if let Some(line) = self.next_line() {
                return Ok(line);
            }
            let n = fill(&mut chunk)?;
            if n == 0 {
                return Err(TransportError::UnexpectedClose);
            }
            self.extend(&chunk[..n]);
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.scanned = 0;
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn decode(line: Vec<u8>) -> String {
    String::from_utf8(line)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
