//! Shared domain enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which source served a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Remote,
    Fallback,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Remote => "remote",
            DataSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
