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

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use assh::{
    cli::Cli,
    config::ConfigStore,
    connect::{ConnectOptions, Connector},
    jump::ProxyCommands,
    orchestrator::Orchestrator,
    ssh_config::SshConfigTarget,
    utils::init_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.is_empty_request() {
        Cli::command().print_help()?;
        eprintln!();
        anyhow::bail!("no host given: use -H <host>, -u or --print-sshconfig");
    }

    init_logging(cli.verbose);

    let store = ConfigStore::load(&cli.config)
        .await
        .context("Errors found in config")?;

    let ssh_config = match &cli.ssh_config {
        Some(path) => SshConfigTarget::File(assh::utils::expand_tilde(path)),
        None => SshConfigTarget::default(),
    };

    let orchestrator = Orchestrator::new(
        ProxyCommands {
            proxy: cli.proxy_command.clone(),
            forwarder: cli.forwarder.clone(),
        },
        cli.dry_run,
    );

    let mut connector = Connector::new(
        store,
        orchestrator,
        ConnectOptions {
            default_port: cli.port,
            ssh_config: ssh_config.clone(),
        },
    );

    if cli.print_sshconfig {
        connector
            .update_ssh_config(&SshConfigTarget::Stdout)
            .await
            .context("Failed to render ssh config")?;
    } else if cli.update_sshconfig {
        connector
            .update_ssh_config(&ssh_config)
            .await
            .context("Failed to update ssh config")?;
    }

    let Some(hostname) = cli.hostname.as_deref() else {
        return Ok(());
    };

    let report = connector
        .connect(hostname)
        .await
        .with_context(|| format!("Failed to connect to {hostname}"))?;

    let code = report.exit_code();
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
