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

//! Configuration loading, source ordering and `includes` handling.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::parser::parse_into;
use super::types::{ConfigStore, DEFAULT_SECTION};
use crate::error::ConfigError;
use crate::utils::expand_tilde;

/// System-wide configuration, merged first
pub const SYSTEM_CONFIG_PATH: &str = "/etc/ssh/config.advanced";

/// Per-user configuration, merged after the system file
pub const USER_CONFIG_PATH: &str = "~/.ssh/config.advanced";

impl ConfigStore {
    /// Standard sources in merge order
    pub fn default_sources() -> Vec<PathBuf> {
        vec![
            PathBuf::from(SYSTEM_CONFIG_PATH),
            expand_tilde(Path::new(USER_CONFIG_PATH)),
        ]
    }

    /// Load the standard sources followed by `extra` files.
    pub async fn load(extra: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut sources = Self::default_sources();
        sources.extend(extra.iter().map(|p| expand_tilde(p)));
        Self::load_from_sources(&sources).await
    }

    /// Merge `sources` in order, then the files listed in `default.includes`.
    ///
    /// Missing sources are skipped. Missing includes are all reported and
    /// fail the load.
    pub async fn load_from_sources(sources: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut store = Self::new();

        for source in sources {
            store.merge_file(source).await?;
        }

        store.merge_includes().await?;

        tracing::debug!("configfiles : {:?}", store.sources);
        tracing::debug!(
            "loaded {} host sections",
            store.pattern_sections().len()
        );

        Ok(store)
    }

    /// Merge one file into the store. Returns `false` when it does not exist.
    pub async fn merge_file(&mut self, path: &Path) -> Result<bool, ConfigError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("config file not found, skipping: {}", path.display());
                return Ok(false);
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        self.merge_str(&content, &path.display().to_string())?;
        self.sources.push(path.to_path_buf());
        Ok(true)
    }

    /// Merge configuration text into the store
    pub fn merge_str(&mut self, content: &str, origin: &str) -> Result<(), ConfigError> {
        parse_into(self, content, origin)
    }

    async fn merge_includes(&mut self) -> Result<(), ConfigError> {
        let includes = self
            .get(DEFAULT_SECTION, "includes", false, &[])?
            .unwrap_or_default();

        let mut missing = Vec::new();

        for include in includes.split_whitespace() {
            let path = expand_tilde(Path::new(include));

            // A file already merged as a source is not merged twice, and is
            // not reported as a missing include either.
            if self.sources.contains(&path) {
                tracing::debug!("include already loaded, skipping: {}", path.display());
                continue;
            }

            if fs::try_exists(&path).await.unwrap_or(false) {
                self.merge_file(&path).await?;
            } else {
                tracing::error!("'{}' include not found", path.display());
                missing.push(path);
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingIncludes { paths: missing })
        }
    }
}
