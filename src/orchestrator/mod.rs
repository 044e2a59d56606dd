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

//! Connection orchestration
//!
//! One attempt runs at most two processes: the primary proxy/forwarder chain
//! and an optional companion command. The companion starts right after the
//! primary, is never waited on, and is killed once the primary exits,
//! whatever the primary's status.

mod control_path;
mod process;

pub use control_path::{control_dir, prepare_control_dir, DEFAULT_CONTROL_PATH};
pub use process::{ProcessExit, ProcessLauncher, ProcessRole, RunningProcess, SystemLauncher};

use std::fmt;
use std::path::Path;

use crate::error::AsshError;
use crate::jump::{ConnectionAttempt, ProxyCommands};

/// Local command run for the lifetime of a connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanionCommand {
    argv: Vec<String>,
}

impl CompanionCommand {
    /// Tokenize on whitespace; an empty string means no companion
    pub fn parse(spec: &str) -> Self {
        Self {
            argv: spec.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for CompanionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// What happened to one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Nothing was spawned
    DryRun,
    Exited(ProcessExit),
}

impl AttemptStatus {
    pub fn success(&self) -> bool {
        match self {
            Self::DryRun => true,
            Self::Exited(exit) => exit.success(),
        }
    }
}

/// Record of one executed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub attempt: ConnectionAttempt,
    pub argv: Vec<String>,
    pub status: AttemptStatus,
}

/// Runs connection attempts as child processes
pub struct Orchestrator<L = SystemLauncher> {
    launcher: L,
    commands: ProxyCommands,
    dry_run: bool,
}

impl Orchestrator<SystemLauncher> {
    pub fn new(commands: ProxyCommands, dry_run: bool) -> Self {
        Self::with_launcher(SystemLauncher, commands, dry_run)
    }
}

impl<L: ProcessLauncher> Orchestrator<L> {
    pub fn with_launcher(launcher: L, commands: ProxyCommands, dry_run: bool) -> Self {
        Self {
            launcher,
            commands,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Make sure the control-path directory exists before anything is spawned
    pub async fn prepare(&self, control_dir: &Path) -> Result<(), AsshError> {
        tracing::debug!("control path directory: {}", control_dir.display());
        prepare_control_dir(control_dir).await
    }

    /// Run one attempt to completion
    ///
    /// A non-zero exit is logged and returned, not raised. The companion is
    /// terminated once the primary is gone, even if waiting failed.
    pub async fn execute(
        &self,
        attempt: &ConnectionAttempt,
        companion: &CompanionCommand,
    ) -> Result<AttemptOutcome, AsshError> {
        let argv = attempt.argv(&self.commands);
        let program = argv[0].clone();
        tracing::debug!("cmd         : {:?}", argv);

        if self.dry_run {
            tracing::info!("dry run: {}", argv.join(" "));
            if !companion.is_empty() {
                tracing::info!("dry run companion: {}", companion);
            }
            return Ok(AttemptOutcome {
                attempt: attempt.clone(),
                argv,
                status: AttemptStatus::DryRun,
            });
        }

        let mut primary = self
            .launcher
            .launch(&argv, ProcessRole::Primary)
            .await
            .map_err(|source| AsshError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut companion_process = if companion.is_empty() {
            None
        } else {
            match self
                .launcher
                .launch(companion.argv(), ProcessRole::Companion)
                .await
            {
                Ok(process) => Some(process),
                Err(e) => {
                    tracing::warn!("failed to start companion command '{}': {}", companion, e);
                    None
                }
            }
        };

        let waited = primary.wait().await;

        if let Some(mut process) = companion_process.take() {
            if let Err(e) = process.terminate().await {
                tracing::debug!("failed to terminate companion command '{}': {}", companion, e);
            }
        }

        let exit = waited.map_err(|source| AsshError::Wait { program, source })?;
        if !exit.success() {
            tracing::error!("connection {} failed: {}", attempt, exit);
        }

        Ok(AttemptOutcome {
            attempt: attempt.clone(),
            argv,
            status: AttemptStatus::Exited(exit),
        })
    }
}
