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

//! Generation of the native OpenSSH client configuration
//!
//! Every pattern section becomes a `Host` block and the `default` section
//! becomes a trailing `Host *` block. Keys only meaningful to assh are left
//! out, and `alias` is emitted as `hostname` so that a section can point
//! OpenSSH at a different address than the one assh forwards to.

use std::path::{Path, PathBuf};

use crate::config::ConfigStore;
use crate::error::{AsshError, ConfigError};
use crate::utils::expand_tilde;

/// Standard per-user OpenSSH configuration file
pub const SSH_CONFIG_PATH: &str = "~/.ssh/config";

/// Keys of pattern sections that OpenSSH does not understand
const SECTION_INTERNAL_KEYS: &[&str] = &[
    "hostname",
    "gateways",
    "reallocalcommand",
    "remotecommand",
];

/// Keys of the `default` section that are not copied into `Host *`
const DEFAULT_INTERNAL_KEYS: &[&str] = &["hostname", "gateways", "includes"];

/// Where generated configuration goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshConfigTarget {
    /// Overwrite this file
    File(PathBuf),
    /// Print to stdout
    Stdout,
}

impl Default for SshConfigTarget {
    fn default() -> Self {
        Self::File(expand_tilde(Path::new(SSH_CONFIG_PATH)))
    }
}

/// Turn a section pattern back into an OpenSSH host glob
///
/// `.*` becomes `*`, then `\.` becomes `.`.
pub fn host_glob(pattern: &str) -> String {
    pattern.replace(".*", "*").replace("\\.", ".")
}

/// Render the whole store as OpenSSH configuration text
pub fn render(store: &ConfigStore) -> Result<String, ConfigError> {
    let mut lines = Vec::new();

    for section in store.pattern_sections() {
        let host = host_glob(section.name());
        lines.push(format!("Host {host}"));

        for (key, value) in store.items(section.name(), &[("hostname", host.as_str())])? {
            if SECTION_INTERNAL_KEYS.contains(&key.as_str()) {
                continue;
            }
            let key = if key == "alias" { "hostname" } else { key.as_str() };
            lines.push(format!("  {key} {value}"));
        }
        lines.push(String::new());
    }

    lines.push("Host *".to_string());
    for (key, value) in store.items(store.default_section().name(), &[])? {
        if DEFAULT_INTERNAL_KEYS.contains(&key.as_str()) {
            continue;
        }
        lines.push(format!("  {key} {value}"));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

/// Render `store` and write it to `target`
pub async fn write_ssh_config(
    store: &ConfigStore,
    target: &SshConfigTarget,
) -> Result<(), AsshError> {
    let text = render(store)?;

    match target {
        SshConfigTarget::Stdout => {
            print!("{text}");
        }
        SshConfigTarget::File(path) => {
            tokio::fs::write(path, text)
                .await
                .map_err(|source| AsshError::Write {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!("ssh config written to {}", path.display());
        }
    }

    Ok(())
}
