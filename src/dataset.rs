use std::fmt;
use std::path::PathBuf;

use crate::format::AnnotationFormat;

/// Conventional splits the service lays a dataset out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    Train,
    Valid,
    Test,
}

impl Subset {
    pub const ALL: [Subset; 3] = [Subset::Train, Subset::Valid, Subset::Test];

    pub fn dir_name(self) -> &'static str {
        match self {
            Subset::Train => "train",
            Subset::Valid => "valid",
            Subset::Test => "test",
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A dataset version materialized on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub version: u32,
    pub format: AnnotationFormat,
    pub location: PathBuf,
}

impl Dataset {
    /// Subsets present under [`Dataset::location`]. `test` is optional.
    pub fn subsets(&self) -> Vec<Subset> {
        Subset::ALL
            .into_iter()
            .filter(|s| self.location.join(s.dir_name()).is_dir())
            .collect()
    }

    /// Path of the per-subset annotation file, for formats that have one.
    pub fn annotation_file(&self, subset: Subset) -> Option<PathBuf> {
        self.format
            .annotation_file()
            .map(|name| self.location.join(subset.dir_name()).join(name))
    }
}
