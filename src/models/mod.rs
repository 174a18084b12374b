// Domain models: bandwidth samples and directory entries

mod directory;
mod sample;

pub use directory::{Group, Site};
pub use sample::{Sample, SourceKind, Timestamp};
