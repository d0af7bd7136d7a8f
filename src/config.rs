use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::loader::LoaderError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Reject a Transpose whose `perm` length differs from the input rank,
    /// when that rank is known at import time.
    pub check_permutation_rank: bool,
    /// Overrides the source's own placeholder-input count when set.
    pub placeholder_inputs: Option<usize>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            check_permutation_rank: true,
            placeholder_inputs: None,
        }
    }
}

impl ImportOptions {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| LoaderError::InvalidFormat(e.to_string()))
    }
}
