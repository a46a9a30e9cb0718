//! In-process unidirectional byte pipe
//!
//! Connects a producer thread to a consumer decoder without buffering the
//! whole body. The buffer is bounded; writers block while it is full.
//!
//! Closing rules:
//! - dropping the [`PipeWriter`] closes the pipe, the reader drains what is
//!   buffered and then sees end-of-stream
//! - [`PipeWriter::close_with_error`] closes the pipe with a cause, the
//!   reader drains what is buffered and then gets that error on every read
//! - dropping the [`PipeReader`] discards buffered bytes and makes every
//!   later write fail with `BrokenPipe`

use bytes::{Buf, BytesMut};
use parking_lot::{Condvar, Mutex};
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Pipe configuration
#[derive(Debug, Clone, Copy)]
pub struct PipeConfig {
    /// Maximum number of bytes buffered between writer and reader
    pub capacity: usize,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self::kb(32)
    }
}

impl PipeConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    /// Capacity in kilobytes
    pub fn kb(size: usize) -> Self {
        Self::new(size * 1024)
    }
}

/// Error recorded by `close_with_error`; io::Error is not Clone.
#[derive(Debug, Clone)]
struct PipeError {
    kind: io::ErrorKind,
    message: String,
}

impl PipeError {
    fn to_io(&self) -> io::Error {
        io::Error::new(self.kind, self.message.clone())
    }
}

#[derive(Debug)]
struct State {
    buf: BytesMut,
    writer_closed: bool,
    reader_closed: bool,
    error: Option<PipeError>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    /// Signalled when data arrives or the writer closes
    readable: Condvar,
    /// Signalled when space frees up or the reader closes
    writable: Condvar,
    capacity: usize,
}

/// Create a connected reader/writer pair
pub fn pipe(config: PipeConfig) -> (PipeReader, PipeWriter) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            buf: BytesMut::with_capacity(config.capacity),
            writer_closed: false,
            reader_closed: false,
            error: None,
        }),
        readable: Condvar::new(),
        writable: Condvar::new(),
        capacity: config.capacity,
    });

    (
        PipeReader {
            shared: Arc::clone(&shared),
        },
        PipeWriter { shared },
    )
}

/// Read half of a [`pipe`]
#[derive(Debug)]
pub struct PipeReader {
    shared: Arc<Shared>,
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let mut state = self.shared.state.lock();
        loop {
            if !state.buf.is_empty() {
                let n = out.len().min(state.buf.len());
                out[..n].copy_from_slice(&state.buf[..n]);
                state.buf.advance(n);
                self.shared.writable.notify_one();
                return Ok(n);
            }

            if let Some(err) = &state.error {
                return Err(err.to_io());
            }

            if state.writer_closed {
                return Ok(0);
            }

            self.shared.readable.wait(&mut state);
        }
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.reader_closed = true;
        state.buf.clear();
        self.shared.writable.notify_all();
    }
}

/// Write half of a [`pipe`]
#[derive(Debug)]
pub struct PipeWriter {
    shared: Arc<Shared>,
}

impl PipeWriter {
    /// Close the pipe so the reader observes `err` once the buffer drains
    pub fn close_with_error(self, err: io::Error) {
        self.shared.state.lock().error = Some(PipeError {
            kind: err.kind(),
            message: err.to_string(),
        });
        // Drop sets writer_closed and wakes the reader.
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let mut state = self.shared.state.lock();
        loop {
            if state.reader_closed {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "write on closed pipe",
                ));
            }

            let space = self.shared.capacity.saturating_sub(state.buf.len());
            if space > 0 {
                let n = space.min(data.len());
                state.buf.extend_from_slice(&data[..n]);
                self.shared.readable.notify_one();
                return Ok(n);
            }

            self.shared.writable.wait(&mut state);
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.writer_closed = true;
        self.shared.readable.notify_all();
    }
}
