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

//! Control-path directory used by OpenSSH connection multiplexing

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::AsshError;
use crate::utils::expand_tilde;

/// Used when no `controlpath` is configured
pub const DEFAULT_CONTROL_PATH: &str = "/tmp";

/// Directory that must exist before `ssh` can open its control socket
///
/// `controlpath` is a socket path template such as
/// `~/.ssh/controlmasters/%r@%h:%p`; the directory is its parent, extended by
/// the host path minus its last segment.
pub fn control_dir(controlpath: &str, host_path: &str) -> PathBuf {
    let expanded = expand_tilde(Path::new(controlpath));
    let base = expanded.parent().unwrap_or(&expanded).to_path_buf();
    let joined = base.join(host_path);
    joined
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(base)
}

/// Create `dir` and its parents; an existing entry is not an error
pub async fn prepare_control_dir(dir: &Path) -> Result<(), AsshError> {
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(AsshError::DirectoryCreation {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_control_dir_for_plain_host() {
        assert_eq!(
            control_dir("/var/run/assh/%r@%h:%p", "web"),
            PathBuf::from("/var/run/assh")
        );
        assert_eq!(control_dir(DEFAULT_CONTROL_PATH, "web"), PathBuf::from("/"));
    }

    #[test]
    fn test_control_dir_for_host_path() {
        assert_eq!(
            control_dir("/var/run/assh/%h", "db/edge"),
            PathBuf::from("/var/run/assh/db")
        );
    }

    #[test]
    fn test_control_dir_expands_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            control_dir("~/.ssh/cm/%h", "web"),
            home.join(".ssh").join("cm")
        );
    }

    #[tokio::test]
    async fn test_prepare_creates_and_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");

        prepare_control_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        prepare_control_dir(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_prepare_fails_below_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, "x").unwrap();

        let err = prepare_control_dir(&file.join("sub")).await.unwrap_err();
        assert!(matches!(err, AsshError::DirectoryCreation { .. }));
    }
}
