use log::{debug, warn};
use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Size ceiling applied to files when none is configured: 100 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("couldn't open {}: {source}", path.display())]
    Unavailable { path: PathBuf, source: io::Error },
    #[error("{} is {size} bytes, which exceeds the {limit} byte limit", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("error reading log input: {0}")]
    Read(#[from] io::Error),
}

/// Where log lines are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    File { path: PathBuf, size: u64 },
    Stdin,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::File { path, size } => write!(f, "{} ({} bytes)", path.display(), size),
            SourceKind::Stdin => write!(f, "standard input"),
        }
    }
}

/// An opened, size-checked line source.
pub struct Source {
    pub kind: SourceKind,
    pub reader: Box<dyn BufRead>,
}

/// Open `path` for reading, with `-` meaning standard input.
/// Files larger than `max_size` bytes are rejected before anything is read. Standard input is never size checked.
pub fn open(path: impl AsRef<Path>, max_size: Option<u64>) -> Result<Source, SourceError> {
    let path = path.as_ref();
    if path == Path::new("-") {
        debug!("reading from standard input");
        return Ok(Source {
            kind: SourceKind::Stdin,
            reader: Box::new(BufReader::new(io::stdin())),
        });
    }
    let unavailable = |source| SourceError::Unavailable {
        path: path.to_owned(),
        source,
    };
    let file = File::open(path).map_err(unavailable)?;
    let metadata = file.metadata().map_err(unavailable)?;
    if metadata.is_dir() {
        return Err(unavailable(io::Error::new(io::ErrorKind::Other, "is a directory")));
    }
    let size = metadata.len();
    debug!("opened {} ({} bytes, limit {:?})", path.display(), size, max_size);
    check_size(path, size, max_size)?;
    Ok(Source {
        kind: SourceKind::File {
            path: path.to_owned(),
            size,
        },
        reader: Box::new(BufReader::new(file)),
    })
}

fn check_size(path: &Path, size: u64, max_size: Option<u64>) -> Result<(), SourceError> {
    match max_size {
        Some(limit) if size > limit => {
            warn!("rejecting {}: {} bytes is over the {} byte limit", path.display(), size, limit);
            Err(SourceError::TooLarge {
                path: path.to_owned(),
                size,
                limit,
            })
        }
        _ => Ok(()),
    }
}
