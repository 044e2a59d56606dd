// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types shared across assh.
//!
//! # Error Categories
//!
//! - [`ConfigError`]: loading, parsing and interpolating `config.advanced` files.
//!   These are fatal and reported before any process is started.
//! - [`AsshError`]: everything that can go wrong while connecting, including
//!   control directory creation and process spawning.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or querying the configuration store
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source exists but could not be read
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A line in a configuration source is not a header, option, comment or continuation
    #[error("parse error in '{origin}' at line {line}: {message}")]
    Parse {
        origin: String,
        line: usize,
        message: String,
    },

    /// An option appears before the first `[section]` header
    #[error("option before any section header in '{origin}' at line {line}")]
    MissingSectionHeader { origin: String, line: usize },

    /// A section name is not a valid regular expression
    #[error("section '[{section}]' is not a valid host pattern: {source}")]
    InvalidPattern {
        section: String,
        #[source]
        source: regex::Error,
    },

    /// One or more files listed in `default.includes` do not exist
    #[error("include not found: {}", display_paths(.paths))]
    MissingIncludes { paths: Vec<PathBuf> },

    /// A lookup referenced a section that is not defined
    #[error("no section named '[{0}]'")]
    NoSection(String),

    /// `%(name)s` expansion failed
    #[error("bad interpolation in '[{section}] {key}': {message}")]
    Interpolation {
        section: String,
        key: String,
        message: String,
    },
}

/// Errors raised while resolving and running a connection
#[derive(Debug, Error)]
pub enum AsshError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The control-path directory could not be created
    #[error("failed to create control path directory '{}': {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid host path '{0}': destination host is empty")]
    InvalidHostPath(String),

    #[error("invalid port '{value}' resolved for host '{host}'")]
    InvalidPort { host: String, value: String },

    /// A primary connection process could not be started
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The generated OpenSSH config could not be written
    #[error("failed to write ssh config '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}
