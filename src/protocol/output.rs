//! Growable output buffers for the encoders.

use bytes::Bytes;

use super::{Error, Result};

/// Default chunk size used by [`ArrayOutput::default`].
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// A sink that exposes a writable window at its current position.
///
/// Encoders fill [`Output::buffer`], call [`Output::advance`] with the number
/// of bytes written and ask for more room with [`Output::enlarge`]. An
/// implementation may grant less room than requested; writes are split
/// across however many windows it hands out.
pub trait Output {
    /// Writable window at the current position. May be empty.
    fn buffer(&mut self) -> &mut [u8];

    /// Mark `count` bytes of the current window as written.
    fn advance(&mut self, count: usize);

    /// Ask for at least `desired` more writable bytes.
    fn enlarge(&mut self, desired: usize);
}

pub(crate) trait OutputExt: Output {
    /// Write every byte of `data`, enlarging as many times as needed.
    fn write_all(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            if self.buffer().is_empty() {
                self.enlarge(data.len());
                if self.buffer().is_empty() {
                    return Err(Error::OutputExhausted);
                }
            }

            let window = self.buffer();
            let count = window.len().min(data.len());
            window[..count].copy_from_slice(&data[..count]);
            self.advance(count);
            data = &data[count..];
        }
        Ok(())
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])
    }

    fn write_u64_be(&mut self, value: u64) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }
}

impl<O: Output + ?Sized> OutputExt for O {}

/// Vector-backed [`Output`] that grows one fixed-size chunk at a time.
#[derive(Debug, Clone)]
pub struct ArrayOutput {
    data: Vec<u8>,
    written: usize,
    chunk_size: usize,
}

impl ArrayOutput {
    /// Create an output that grows by `chunk_size` bytes per enlarge call.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        Self {
            data: Vec::new(),
            written: 0,
            chunk_size,
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.written]
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.written
    }

    /// Check whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Consume the output, returning the written bytes.
    #[must_use]
    pub fn into_bytes(mut self) -> Bytes {
        self.data.truncate(self.written);
        Bytes::from(self.data)
    }
}

impl Default for ArrayOutput {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl Output for ArrayOutput {
    fn buffer(&mut self) -> &mut [u8] {
        &mut self.data[self.written..]
    }

    fn advance(&mut self, count: usize) {
        assert!(
            self.written + count <= self.data.len(),
            "advanced past the end of the window"
        );
        self.written += count;
    }

    fn enlarge(&mut self, _desired: usize) {
        let len = self.data.len();
        self.data.resize(len + self.chunk_size, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_spans_chunks() {
        let mut output = ArrayOutput::new(3);
        output.write_all(b"hello, world").unwrap();

        assert_eq!(output.as_slice(), b"hello, world");
        assert_eq!(output.len(), 12);
    }

    #[test]
    fn test_big_endian_in_single_byte_chunks() {
        let mut output = ArrayOutput::new(1);
        output.write_u64_be(0x0102_0304_0506_0708).unwrap();
        output.write_u8(0xFF).unwrap();

        assert_eq!(
            output.into_bytes().as_ref(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 0xFF]
        );
    }

    struct FixedOutput {
        data: [u8; 4],
        written: usize,
    }

    impl Output for FixedOutput {
        fn buffer(&mut self) -> &mut [u8] {
            &mut self.data[self.written..]
        }

        fn advance(&mut self, count: usize) {
            self.written += count;
        }

        fn enlarge(&mut self, _desired: usize) {}
    }

    #[test]
    fn test_exhausted_output() {
        let mut output = FixedOutput {
            data: [0; 4],
            written: 0,
        };

        assert_eq!(output.write_all(b"abcdef"), Err(Error::OutputExhausted));
        assert_eq!(&output.data, b"abcd");
    }

    #[test]
    #[should_panic(expected = "chunk_size must be positive")]
    fn test_zero_chunk_size_panics() {
        let _ = ArrayOutput::new(0);
    }

    #[test]
    fn test_empty_output() {
        let output = ArrayOutput::default();
        assert!(output.is_empty());
        assert!(output.into_bytes().is_empty());
    }
}
