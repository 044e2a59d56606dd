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

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "assh",
    version,
    about = "Advanced SSH config - regex host sections, gateway chains and ProxyCommand helper",
    long_about = "assh reads ~/.ssh/config.advanced, an INI-style file whose [sections] are regular\nexpressions matched against the start of the host name. It resolves port, user, hostname\nand identity file for a target, then connects to it directly or through the gateways\nconfigured for it, running a local companion command for the duration of the session.\nIt is meant to be used as an OpenSSH ProxyCommand and can regenerate ~/.ssh/config\nfrom the advanced configuration.",
    after_help = "EXAMPLES:\n  As a ProxyCommand (in config.advanced [default]):\n    proxycommand = assh -H %h -p %p\n  Connect to db through the explicit hop edge:  assh -H db/edge\n  Show what would run:                          assh -H db --dry-run -vv\n  Regenerate ~/.ssh/config:                     assh -u\n  Print the generated config:                   assh --print-sshconfig"
)]
pub struct Cli {
    #[arg(
        short = 'H',
        long,
        help = "Target host path: destination[/hop...]\nHops are reached with nested ssh connections before the gateways"
    )]
    pub hostname: Option<String>,

    #[arg(
        short = 'p',
        long,
        default_value_t = 22,
        help = "Port used when the configuration does not set one"
    )]
    pub port: u16,

    #[arg(
        short = 'c',
        long = "config",
        action = clap::ArgAction::Append,
        help = "Additional config.advanced file, merged after /etc/ssh/config.advanced\nand ~/.ssh/config.advanced (may be repeated)"
    )]
    pub config: Vec<PathBuf>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    #[arg(
        short = 'u',
        long,
        help = "Regenerate the OpenSSH config file from the advanced configuration"
    )]
    pub update_sshconfig: bool,

    #[arg(
        long,
        help = "Print the generated OpenSSH config to stdout instead of writing it"
    )]
    pub print_sshconfig: bool,

    #[arg(
        long,
        help = "Resolve and log the commands without spawning anything"
    )]
    pub dry_run: bool,

    #[arg(
        long,
        value_name = "PATH",
        env = "ASSH_SSH_CONFIG",
        help = "OpenSSH config file to regenerate [default: ~/.ssh/config]"
    )]
    pub ssh_config: Option<PathBuf>,

    #[arg(
        long,
        value_name = "CMD",
        default_value = "ssh",
        help = "Command used to reach relay hosts"
    )]
    pub proxy_command: String,

    #[arg(
        long,
        value_name = "CMD",
        default_value = "nc",
        help = "Command forwarding stdio to the final host and port"
    )]
    pub forwarder: String,
}

impl Cli {
    /// Nothing to do: no target and no config generation requested
    pub fn is_empty_request(&self) -> bool {
        self.hostname.is_none() && !self.update_sshconfig && !self.print_sshconfig
    }
}
