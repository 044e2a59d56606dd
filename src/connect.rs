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

//! End-to-end connection flow for one host path

use crate::config::{ConfigStore, DEFAULT_SECTION};
use crate::error::AsshError;
use crate::jump::{plan, Gateway, HostPath, DIRECT};
use crate::orchestrator::{
    control_dir, AttemptOutcome, AttemptStatus, CompanionCommand, Orchestrator, ProcessLauncher,
    SystemLauncher, DEFAULT_CONTROL_PATH,
};
use crate::resolver::{EnvSource, ProcessEnv, ResolvedParameters, Resolver};
use crate::ssh_config::{write_ssh_config, SshConfigTarget};

/// Default SSH port used when nothing is configured
pub const DEFAULT_PORT: u16 = 22;

/// Settings of a [`Connector`] that do not come from `config.advanced`
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub default_port: u16,
    /// Where regenerated OpenSSH configuration is written
    pub ssh_config: SshConfigTarget,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            ssh_config: SshConfigTarget::default(),
        }
    }
}

/// Everything that happened during one `connect`
#[derive(Debug)]
pub struct ConnectReport {
    pub host_path: HostPath,
    pub params: ResolvedParameters,
    /// Interpolated values were written back and the OpenSSH config regenerated
    pub config_updated: bool,
    /// One entry per gateway, in the order they ran
    pub attempts: Vec<Result<AttemptOutcome, AsshError>>,
}

impl ConnectReport {
    /// Process exit code: that of the last attempt
    ///
    /// Signals, spawn failures and wait failures map to 1.
    pub fn exit_code(&self) -> i32 {
        match self.attempts.last() {
            None => 0,
            Some(Ok(outcome)) => match outcome.status {
                AttemptStatus::DryRun => 0,
                AttemptStatus::Exited(exit) => exit.code.unwrap_or(1),
            },
            Some(Err(_)) => 1,
        }
    }
}

/// Resolves host paths against the store and runs every planned attempt
pub struct Connector<L = SystemLauncher> {
    store: ConfigStore,
    orchestrator: Orchestrator<L>,
    options: ConnectOptions,
    env: Box<dyn EnvSource + Send + Sync>,
}

impl<L: ProcessLauncher> Connector<L> {
    pub fn new(store: ConfigStore, orchestrator: Orchestrator<L>, options: ConnectOptions) -> Self {
        Self::with_env(store, orchestrator, options, Box::new(ProcessEnv))
    }

    pub fn with_env(
        store: ConfigStore,
        orchestrator: Orchestrator<L>,
        options: ConnectOptions,
        env: Box<dyn EnvSource + Send + Sync>,
    ) -> Self {
        Self {
            store,
            orchestrator,
            options,
            env,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Regenerate the OpenSSH config from the current store
    pub async fn update_ssh_config(&self, target: &SshConfigTarget) -> Result<(), AsshError> {
        write_ssh_config(&self.store, target).await
    }

    /// Connect to `target` (`destination[/hop...]`), trying every gateway in turn
    ///
    /// Configuration and control directory errors abort before anything is
    /// spawned. Errors of a single attempt are recorded in the report and do
    /// not stop the remaining attempts.
    pub async fn connect(&mut self, target: &str) -> Result<ConnectReport, AsshError> {
        let host_path = HostPath::parse(target)?;

        tracing::debug!("hostname    : {}", host_path);
        tracing::debug!("path        : {:?}", host_path.segments());

        let (params, updates, gateways, companion, dir) = {
            let resolver = Resolver::new(&self.store, self.env.as_ref());

            let controlpath = resolver
                .resolve("controlpath", DEFAULT_SECTION, Some(DEFAULT_CONTROL_PATH))?
                .unwrap_or_else(|| DEFAULT_CONTROL_PATH.to_string());
            let dir = control_dir(&controlpath, &host_path.to_string());

            let (params, updates) = ResolvedParameters::resolve(
                &resolver,
                host_path.destination(),
                self.options.default_port,
            )?;

            let gateways = resolver
                .resolve("gateways", host_path.last(), Some(DIRECT))?
                .unwrap_or_default();
            let companion = resolver
                .resolve("reallocalcommand", host_path.last(), None)?
                .unwrap_or_default();

            (params, updates, gateways, companion, dir)
        };

        self.orchestrator.prepare(&dir).await?;

        let config_updated = !updates.is_empty();
        for update in &updates {
            tracing::debug!(
                "[{}] {} interpolated to '{}'",
                update.section,
                update.key,
                update.value
            );
            update.apply(&mut self.store)?;
        }

        if config_updated {
            if self.orchestrator.is_dry_run() {
                tracing::info!("dry run: ssh config not regenerated");
            } else {
                write_ssh_config(&self.store, &self.options.ssh_config).await?;
                tracing::debug!("config updated, running ssh sessions keep the old settings");
            }
        }

        let gateways = Gateway::parse_list(&gateways);
        let companion = CompanionCommand::parse(&companion);

        tracing::debug!("params      : {}", params);
        tracing::debug!(
            "gateways    : {}",
            gateways
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        tracing::debug!("reallocalcommand: {:?}", companion.argv());

        let mut attempts = Vec::with_capacity(gateways.len());
        for attempt in plan(&host_path, &params, &gateways) {
            let result = self.orchestrator.execute(&attempt, &companion).await;
            if let Err(e) = &result {
                tracing::error!("attempt {} failed: {}", attempt, e);
            }
            attempts.push(result);
        }

        Ok(ConnectReport {
            host_path,
            params,
            config_updated,
            attempts,
        })
    }
}
