use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// A child killed by a signal is reported as `128 + signal`, the way POSIX
/// shells do it.
pub type ExitCode = i32;

/// A writer that may be shared between the stdout and stderr of one child.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Readable byte stream wired to a child's standard input.
///
/// OS-backed variants are handed to the child directly. A [`Source::Reader`]
/// is fed through a pipe by a helper thread for as long as the child runs.
#[derive(Default)]
pub enum Source {
    #[default]
    Inherit,
    Null,
    File(File),
    Reader(Box<dyn Read + Send>),
}

impl Source {
    pub fn inherit() -> Self {
        Source::Inherit
    }

    pub fn null() -> Self {
        Source::Null
    }

    pub fn file(file: File) -> Self {
        Source::File(file)
    }

    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Source::Reader(Box::new(reader))
    }

    pub(crate) fn wire(self) -> Wiring<Box<dyn Read + Send>> {
        match self {
            Source::Inherit => Wiring::Direct(Stdio::inherit()),
            Source::Null => Wiring::Direct(Stdio::null()),
            Source::File(file) => Wiring::Direct(Stdio::from(file)),
            Source::Reader(reader) => Wiring::Pumped(reader),
        }
    }
}

impl From<File> for Source {
    fn from(file: File) -> Self {
        Source::File(file)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Inherit => f.write_str("Inherit"),
            Source::Null => f.write_str("Null"),
            Source::File(file) => f.debug_tuple("File").field(file).finish(),
            Source::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Writable byte stream wired to a child's standard output or error.
///
/// A sink is cheap to clone; clones refer to the same destination, which is
/// how one sink is bound to both stdout and stderr.
#[derive(Clone, Default)]
pub enum Sink {
    #[default]
    Inherit,
    Null,
    File(Arc<File>),
    Writer(SharedWriter),
}

impl Sink {
    pub fn inherit() -> Self {
        Sink::Inherit
    }

    pub fn null() -> Self {
        Sink::Null
    }

    pub fn file(file: File) -> Self {
        Sink::File(Arc::new(file))
    }

    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Sink::Writer(Arc::new(Mutex::new(writer)))
    }

    /// Produce the child-side handle for this sink.
    ///
    /// Files are duplicated so the same file can back both streams.
    pub(crate) fn wire(&self) -> io::Result<Wiring<SharedWriter>> {
        Ok(match self {
            Sink::Inherit => Wiring::Direct(Stdio::inherit()),
            Sink::Null => Wiring::Direct(Stdio::null()),
            Sink::File(file) => Wiring::Direct(Stdio::from(file.try_clone()?)),
            Sink::Writer(writer) => Wiring::Pumped(Arc::clone(writer)),
        })
    }

    /// True when both sinks write into the very same destination.
    pub fn same_destination(&self, other: &Sink) -> bool {
        match (self, other) {
            (Sink::Inherit, Sink::Inherit) | (Sink::Null, Sink::Null) => true,
            (Sink::File(a), Sink::File(b)) => Arc::ptr_eq(a, b),
            (Sink::Writer(a), Sink::Writer(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<File> for Sink {
    fn from(file: File) -> Self {
        Sink::file(file)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Inherit => f.write_str("Inherit"),
            Sink::Null => f.write_str("Null"),
            Sink::File(file) => f.debug_tuple("File").field(file).finish(),
            Sink::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// How a stream ends up attached to the child.
pub(crate) enum Wiring<T> {
    /// Handed to the child as-is.
    Direct(Stdio),
    /// Connected through a pipe served by a helper thread.
    Pumped(T),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_inherit() {
        assert!(matches!(Source::default(), Source::Inherit));
        assert!(matches!(Sink::default(), Sink::Inherit));
    }

    #[test]
    fn test_cloned_writer_sink_is_same_destination() {
        let a = Sink::writer(Vec::new());
        let b = a.clone();
        let c = Sink::writer(Vec::new());
        assert!(a.same_destination(&b));
        assert!(!a.same_destination(&c));
        assert!(!a.same_destination(&Sink::null()));
    }

    #[test]
    fn test_reader_source_is_pumped() {
        let source = Source::reader(io::Cursor::new(b"abc".to_vec()));
        assert!(matches!(source.wire(), Wiring::Pumped(_)));
        assert!(matches!(Source::null().wire(), Wiring::Direct(_)));
    }

    #[test]
    fn test_writer_sink_is_pumped() {
        let sink = Sink::writer(Vec::new());
        assert!(matches!(sink.wire().unwrap(), Wiring::Pumped(_)));
        assert!(matches!(Sink::inherit().wire().unwrap(), Wiring::Direct(_)));
    }
}
