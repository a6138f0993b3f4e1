// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Relays between child pipes and in-memory endpoints
//!
//! A child cannot write into a `Vec<u8>` or read from a `Cursor`, so those
//! bindings are spawned with a pipe and a scoped thread copies the bytes.
//! Relays must run concurrently with the children: a stage blocked on a
//! full pipe would otherwise never exit.

use std::fmt;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin};
use std::thread::{Scope, ScopedJoinHandle};

use tracing::trace;

/// What a drained stream is copied into
pub(crate) enum DrainTarget {
    Capture,
    Sink(Box<dyn Write + Send>),
}

struct Feed {
    stdin: ChildStdin,
    source: Box<dyn Read + Send>,
}

impl Feed {
    fn run(mut self) -> io::Result<()> {
        match io::copy(&mut self.source, &mut self.stdin) {
            Ok(bytes) => {
                trace!(bytes, "fed stage input");
                Ok(())
            }
            // The stage stopped reading; the rest of the input is not wanted.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            Err(e) => Err(e),
        }
    }
}

struct Drain {
    stream: Box<dyn Read + Send>,
    target: DrainTarget,
}

impl Drain {
    fn run(mut self) -> io::Result<Option<Vec<u8>>> {
        match self.target {
            DrainTarget::Capture => {
                let mut captured = Vec::new();
                self.stream.read_to_end(&mut captured)?;
                trace!(bytes = captured.len(), "captured stage stream");
                Ok(Some(captured))
            }
            DrainTarget::Sink(mut sink) => {
                let bytes = io::copy(&mut self.stream, &mut sink)?;
                sink.flush()?;
                trace!(bytes, "relayed stage stream into sink");
                Ok(None)
            }
        }
    }
}

/// Relays a launched stage needs serviced
///
/// Empty unless a binding was an in-memory source, sink or capture.
#[derive(Default)]
pub struct StageRelays {
    feed: Option<Feed>,
    output: Option<Drain>,
    error: Option<Drain>,
}

impl fmt::Debug for StageRelays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRelays")
            .field("feed", &self.feed.is_some())
            .field("output", &self.output.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl StageRelays {
    /// Take the piped handles a freshly spawned child exposes
    pub(crate) fn attach(
        child: &mut Child,
        source: Option<Box<dyn Read + Send>>,
        output: Option<DrainTarget>,
        error: Option<DrainTarget>,
    ) -> Self {
        let feed = source.and_then(|source| {
            child.stdin.take().map(|stdin| Feed { stdin, source })
        });
        let output = output.and_then(|target| {
            child.stdout.take().map(|stream| Drain {
                stream: Box::new(stream),
                target,
            })
        });
        let error = error.and_then(|target| {
            child.stderr.take().map(|stream| Drain {
                stream: Box::new(stream),
                target,
            })
        });

        Self { feed, output, error }
    }

    /// Whether there is nothing to relay
    pub fn is_empty(&self) -> bool {
        self.feed.is_none() && self.output.is_none() && self.error.is_none()
    }

    /// Start one thread per relay inside `scope`
    pub fn start<'scope>(self, scope: &'scope Scope<'scope, '_>) -> RunningRelays<'scope> {
        RunningRelays {
            feed: self.feed.map(|feed| scope.spawn(move || feed.run())),
            output: self.output.map(|drain| scope.spawn(move || drain.run())),
            error: self.error.map(|drain| scope.spawn(move || drain.run())),
        }
    }
}

/// Relay threads of one stage
pub struct RunningRelays<'scope> {
    feed: Option<ScopedJoinHandle<'scope, io::Result<()>>>,
    output: Option<ScopedJoinHandle<'scope, io::Result<Option<Vec<u8>>>>>,
    error: Option<ScopedJoinHandle<'scope, io::Result<Option<Vec<u8>>>>>,
}

/// Streams collected by `Capture` bindings
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CapturedStreams {
    /// Captured standard output
    pub output: Option<Vec<u8>>,
    /// Captured standard error
    pub error: Option<Vec<u8>>,
}

impl RunningRelays<'_> {
    /// Join every relay thread
    pub fn finish(self) -> io::Result<CapturedStreams> {
        if let Some(feed) = self.feed {
            join(feed)??;
        }

        let output = match self.output {
            Some(handle) => join(handle)??,
            None => None,
        };
        let error = match self.error {
            Some(handle) => join(handle)??,
            None => None,
        };

        Ok(CapturedStreams { output, error })
    }
}

fn join<T>(handle: ScopedJoinHandle<'_, T>) -> io::Result<T> {
    handle
        .join()
        .map_err(|_| io::Error::other("stream relay thread panicked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_reports_present_relays() {
        let relays = StageRelays::default();
        assert!(relays.is_empty());
        assert_eq!(
            format!("{:?}", relays),
            "StageRelays { feed: false, output: false, error: false }"
        );
    }
}
