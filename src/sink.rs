// Report destination: console (stdout) or a file truncated once per run.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Console,
    File(PathBuf),
}

impl Sink {
    /// `None` or an empty path means console.
    pub fn from_output_file(path: Option<&str>) -> Self {
        match path {
            Some(p) if !p.is_empty() => Sink::File(PathBuf::from(p)),
            _ => Sink::Console,
        }
    }

    /// Opens the destination. Files are created or truncated, owner read/write only on Unix.
    pub fn open(&self) -> io::Result<Box<dyn Write>> {
        match self {
            Sink::Console => Ok(Box::new(BufWriter::new(io::stdout()))),
            Sink::File(path) => {
                let mut options = OpenOptions::new();
                options.write(true).create(true).truncate(true);
                #[cfg(unix)]
                {
                    use std::os::unix::fs::OpenOptionsExt;
                    options.mode(0o600);
                }
                let file = options.open(path).map_err(|e| {
                    io::Error::new(e.kind(), format!("open {}: {}", path.display(), e))
                })?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }
}

impl std::fmt::Display for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sink::Console => f.write_str("console"),
            Sink::File(path) => write!(f, "{}", path.display()),
        }
    }
}
