// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Stream bindings
//!
//! Where a stage reads its input and writes its output and error streams.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, PipeReader, PipeWriter, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use super::relay::DrainTarget;

/// One endpoint of a stage
///
/// Bindings are owned values. Whatever descriptor a binding holds is moved
/// into the child at launch and closed in this process right after the
/// spawn, so every endpoint is closed exactly once.
#[derive(Default)]
pub enum StreamBinding {
    /// Unset: the child inherits the caller's stream
    #[default]
    Inherit,
    /// `/dev/null`
    Null,
    /// Read end of a pipe between two stages
    PipeReader(PipeReader),
    /// Write end of a pipe between two stages
    PipeWriter(PipeWriter),
    /// An open file, closed after launch
    File(File),
    /// A raw OS descriptor, closed with `close(2)` after launch
    Fd(OwnedFd),
    /// In-memory data relayed into the child's stdin
    Source(Box<dyn Read + Send>),
    /// In-memory writer receiving the child's output
    Sink(Box<dyn Write + Send>),
    /// Collect the stream into memory
    Capture,
}

impl StreamBinding {
    /// Bind any readable value as a stage input
    pub fn source(reader: impl Read + Send + 'static) -> Self {
        Self::Source(Box::new(reader))
    }

    /// Bind any writable value as a stage output
    pub fn sink(writer: impl Write + Send + 'static) -> Self {
        Self::Sink(Box::new(writer))
    }

    /// Feed fixed bytes to a stage
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::source(Cursor::new(data.into()))
    }

    /// Adopt a raw file descriptor
    ///
    /// # Safety
    ///
    /// `fd` must be an open descriptor that nothing else will close; the
    /// binding closes it after the stage is launched.
    pub unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self::Fd(OwnedFd::from_raw_fd(fd))
    }

    /// Whether the binding was left unset
    pub fn is_inherit(&self) -> bool {
        matches!(self, Self::Inherit)
    }

    /// Whether the binding is one end of an inter-stage pipe
    pub fn is_pipe(&self) -> bool {
        matches!(self, Self::PipeReader(_) | Self::PipeWriter(_))
    }

    /// Whether a child can read from this binding
    pub fn is_readable(&self) -> bool {
        match self {
            Self::Inherit | Self::Null | Self::PipeReader(_) | Self::Source(_) => true,
            Self::PipeWriter(_) | Self::Sink(_) | Self::Capture => false,
            Self::File(file) => access_mode(file.as_fd()).is_some_and(|mode| mode != libc::O_WRONLY),
            Self::Fd(fd) => access_mode(fd.as_fd()).is_some_and(|mode| mode != libc::O_WRONLY),
        }
    }

    /// Whether a child can write to this binding
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Inherit | Self::Null | Self::PipeWriter(_) | Self::Sink(_) | Self::Capture => true,
            Self::PipeReader(_) | Self::Source(_) => false,
            Self::File(file) => access_mode(file.as_fd()).is_some_and(|mode| mode != libc::O_RDONLY),
            Self::Fd(fd) => access_mode(fd.as_fd()).is_some_and(|mode| mode != libc::O_RDONLY),
        }
    }

    /// Short name of the binding kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Inherit => "inherit",
            Self::Null => "null",
            Self::PipeReader(_) => "pipe-read",
            Self::PipeWriter(_) => "pipe-write",
            Self::File(_) => "file",
            Self::Fd(_) => "fd",
            Self::Source(_) => "source",
            Self::Sink(_) => "sink",
            Self::Capture => "capture",
        }
    }

    /// Resolve an input binding for spawning
    pub(crate) fn into_input(self) -> (Stdio, Option<Box<dyn Read + Send>>) {
        match self {
            Self::Inherit => (Stdio::inherit(), None),
            Self::PipeReader(reader) => (Stdio::from(reader), None),
            Self::File(file) => (Stdio::from(file), None),
            Self::Fd(fd) => (Stdio::from(fd), None),
            Self::Source(reader) => (Stdio::piped(), Some(reader)),
            // Write-only kinds are rejected when the binding is set.
            Self::Null | Self::PipeWriter(_) | Self::Sink(_) | Self::Capture => (Stdio::null(), None),
        }
    }

    /// Resolve an output or error binding for spawning
    pub(crate) fn into_output(self) -> (Stdio, Option<DrainTarget>) {
        match self {
            Self::Inherit => (Stdio::inherit(), None),
            Self::PipeWriter(writer) => (Stdio::from(writer), None),
            Self::File(file) => (Stdio::from(file), None),
            Self::Fd(fd) => (Stdio::from(fd), None),
            Self::Sink(writer) => (Stdio::piped(), Some(DrainTarget::Sink(writer))),
            Self::Capture => (Stdio::piped(), Some(DrainTarget::Capture)),
            Self::Null | Self::PipeReader(_) | Self::Source(_) => (Stdio::null(), None),
        }
    }
}

impl fmt::Debug for StreamBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PipeReader(pipe) => write!(f, "PipeReader({})", pipe.as_fd().as_raw_fd()),
            Self::PipeWriter(pipe) => write!(f, "PipeWriter({})", pipe.as_fd().as_raw_fd()),
            Self::File(file) => write!(f, "File({})", file.as_raw_fd()),
            Self::Fd(fd) => write!(f, "Fd({})", fd.as_raw_fd()),
            other => f.write_str(match other {
                Self::Inherit => "Inherit",
                Self::Null => "Null",
                Self::Source(_) => "Source",
                Self::Sink(_) => "Sink",
                _ => "Capture",
            }),
        }
    }
}

impl From<File> for StreamBinding {
    /// The pipeline takes the file and closes it once the stage is launched;
    /// pass `file.try_clone()?` to keep using it afterwards.
    fn from(file: File) -> Self {
        Self::File(file)
    }
}

impl From<OwnedFd> for StreamBinding {
    fn from(fd: OwnedFd) -> Self {
        Self::Fd(fd)
    }
}

impl From<PipeReader> for StreamBinding {
    fn from(reader: PipeReader) -> Self {
        Self::PipeReader(reader)
    }
}

impl From<PipeWriter> for StreamBinding {
    fn from(writer: PipeWriter) -> Self {
        Self::PipeWriter(writer)
    }
}

impl From<SharedBuffer> for StreamBinding {
    fn from(buffer: SharedBuffer) -> Self {
        Self::sink(buffer)
    }
}

/// Read the `O_ACCMODE` bits of an open descriptor
fn access_mode(fd: BorrowedFd<'_>) -> Option<libc::c_int> {
    // SAFETY: F_GETFL only reads the status flags of a descriptor we borrow.
    let flags = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFL) };
    (flags >= 0).then_some(flags & libc::O_ACCMODE)
}

/// An in-memory sink that stays readable after the pipeline has run
///
/// Clones share the same buffer: hand one clone to the pipeline and keep
/// another to read what the stage wrote.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the bytes written so far
    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The contents decoded as UTF-8, replacing invalid sequences
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_inherit() {
        assert!(StreamBinding::default().is_inherit());
    }

    #[test]
    fn test_pipe_end_capabilities() {
        let (reader, writer) = std::io::pipe().unwrap();
        let reader = StreamBinding::from(reader);
        let writer = StreamBinding::from(writer);

        assert!(reader.is_pipe() && writer.is_pipe());
        assert!(reader.is_readable());
        assert!(!reader.is_writable());
        assert!(writer.is_writable());
        assert!(!writer.is_readable());
    }

    #[test]
    fn test_file_capability_follows_open_mode() {
        let tmp = NamedTempFile::new().unwrap();

        let read_only = StreamBinding::from(File::open(tmp.path()).unwrap());
        assert!(read_only.is_readable());
        assert!(!read_only.is_writable());

        let write_only = StreamBinding::from(
            OpenOptions::new().write(true).open(tmp.path()).unwrap(),
        );
        assert!(write_only.is_writable());
        assert!(!write_only.is_readable());

        let both = StreamBinding::from(
            OpenOptions::new().read(true).write(true).open(tmp.path()).unwrap(),
        );
        assert!(both.is_readable() && both.is_writable());
    }

    #[test]
    fn test_memory_endpoints() {
        assert!(StreamBinding::bytes("abc").is_readable());
        assert!(!StreamBinding::bytes("abc").is_writable());
        assert!(StreamBinding::from(SharedBuffer::new()).is_writable());
        assert!(!StreamBinding::Capture.is_readable());
    }

    #[test]
    fn test_shared_buffer_clones_share_contents() {
        let buffer = SharedBuffer::new();
        let mut writer = buffer.clone();
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();

        assert_eq!(buffer.to_string_lossy(), "hello world");
        assert_eq!(buffer.len(), 11);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_debug_names_kind() {
        assert_eq!(format!("{:?}", StreamBinding::Capture), "Capture");
        assert_eq!(format!("{:?}", StreamBinding::bytes("x")), "Source");
        assert_eq!(StreamBinding::Null.kind(), "null");
    }
}
