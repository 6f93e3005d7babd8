//! Where JSON documents come from.
//!
//! Syntax errors are reported here; the converter only ever sees a parsed tree.

use serde_json::Value as JsonValue;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonSource {
    File(PathBuf),
    Stdin,
    Text(String),
}

impl JsonSource {
    /// `-` means stdin, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    /// A table name derived from the source, if it has one (the file stem).
    pub fn name_hint(&self) -> Option<String> {
        match self {
            Self::File(path) => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string),
            _ => None,
        }
    }

    pub fn read_to_string(&self) -> Result<String, SourceError> {
        match self {
            Self::File(path) => read_file(path),
            Self::Stdin => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .map_err(|source| SourceError::Io {
                        path: "<stdin>".to_string(),
                        source,
                    })?;
                Ok(text)
            }
            Self::Text(text) => Ok(text.clone()),
        }
    }

    pub fn load(&self) -> Result<JsonValue, SourceError> {
        let text = self.read_to_string()?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn read_file(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })
}
