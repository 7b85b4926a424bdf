//! Stdout capture for child processes
//!
//! While a child runs its test, fd 1 points at stderr so that anything the
//! test prints cannot be mistaken for the result line. The result itself is
//! written to a duplicate of the original stdout.

#[cfg(unix)]
pub use unix::StdoutCapture;

#[cfg(not(unix))]
pub use fallback::StdoutCapture;

#[cfg(unix)]
mod unix {
    use nix::unistd::dup2;
    use std::fs::File;
    use std::io::{self, Write};
    use std::os::fd::{AsFd, AsRawFd};

    pub struct StdoutCapture {
        channel: File,
    }

    impl StdoutCapture {
        /// Redirect fd 1 to stderr, keeping the original stdout as the
        /// result channel.
        pub fn start() -> io::Result<Self> {
            io::stdout().flush()?;
            let channel = File::from(io::stdout().as_fd().try_clone_to_owned()?);
            dup2(io::stderr().as_raw_fd(), io::stdout().as_raw_fd())?;
            Ok(Self { channel })
        }

        /// Write to the original stdout. Buffered test output is flushed to
        /// stderr first.
        pub fn write_flushed(&mut self, bytes: &[u8]) -> io::Result<()> {
            io::stdout().flush()?;
            self.channel.write_all(bytes)?;
            self.channel.flush()
        }
    }

    impl Drop for StdoutCapture {
        fn drop(&mut self) {
            let _ = io::stdout().flush();
            let _ = dup2(self.channel.as_raw_fd(), io::stdout().as_raw_fd());
        }
    }
}

#[cfg(not(unix))]
mod fallback {
    use std::io;

    /// Never constructed: fd redirection is unix-only.
    pub enum StdoutCapture {}

    impl StdoutCapture {
        pub fn start() -> io::Result<Self> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "stdout capture is not supported on this platform",
            ))
        }

        pub fn write_flushed(&mut self, _bytes: &[u8]) -> io::Result<()> {
            match *self {}
        }
    }
}
