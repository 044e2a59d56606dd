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

//! Child process abstraction used by the orchestrator

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Which of the two cooperating processes is being started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// The proxy/forwarder chain carrying the SSH stream on stdio
    Primary,
    /// The optional `reallocalcommand` running alongside the connection
    Companion,
}

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Starts processes from an argv
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(
        &self,
        argv: &[String],
        role: ProcessRole,
    ) -> io::Result<Box<dyn RunningProcess>>;
}

/// Handle to a started process
#[async_trait]
pub trait RunningProcess: Send {
    fn id(&self) -> Option<u32>;

    /// Block until the process exits
    async fn wait(&mut self) -> io::Result<ProcessExit>;

    /// Forcibly stop the process (and its group, if it owns one) and reap it
    async fn terminate(&mut self) -> io::Result<()>;
}

/// Launches real OS processes through tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    async fn launch(
        &self,
        argv: &[String],
        role: ProcessRole,
    ) -> io::Result<Box<dyn RunningProcess>> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;

        let mut cmd = Command::new(program);
        cmd.args(args);

        let own_group = role == ProcessRole::Companion;
        if own_group {
            // stdin/stdout belong to the SSH stream
            cmd.stdin(Stdio::null())
                .stdout(io::stderr())
                .kill_on_drop(true);
            #[cfg(unix)]
            cmd.process_group(0);
        }

        let child = cmd.spawn()?;
        tracing::debug!("spawned {:?} as {:?} (pid {:?})", argv, role, child.id());

        Ok(Box::new(SystemProcess { child, own_group }))
    }
}

struct SystemProcess {
    child: Child,
    own_group: bool,
}

#[async_trait]
impl RunningProcess for SystemProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> io::Result<ProcessExit> {
        let status = self.child.wait().await?;
        Ok(ProcessExit {
            code: status.code(),
        })
    }

    async fn terminate(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        if self.own_group {
            if let Some(pid) = self.child.id() {
                use nix::sys::signal::{killpg, Signal};
                use nix::unistd::Pid;

                if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    tracing::debug!("killpg({}) failed: {}", pid, e);
                }
            }
        }

        #[cfg(not(unix))]
        let _ = self.own_group;

        // Already exited and reaped is fine
        match self.child.kill().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e),
        }
    }
}
