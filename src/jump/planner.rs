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

//! Gateway chain planning
//!
//! Every gateway of the list produces one independent attempt. The relay
//! path of an attempt is the explicit hops of the host path followed by the
//! gateway itself (unless it is `direct`); a non-empty relay path is reached
//! through a nested `ssh`, and the last leg always ends in a forwarder
//! (`nc host port`) to the resolved destination.

use std::fmt;

use super::path::HostPath;
use crate::resolver::ResolvedParameters;

/// Sentinel gateway name meaning "no gateway"
pub const DIRECT: &str = "direct";

/// One entry of the `gateways` list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Gateway {
    Direct,
    Named(String),
}

impl Gateway {
    pub fn new(name: &str) -> Self {
        if name == DIRECT {
            Self::Direct
        } else {
            Self::Named(name.to_string())
        }
    }

    /// Parse a whitespace-separated gateway list; empty means `direct`
    pub fn parse_list(spec: &str) -> Vec<Self> {
        let gateways: Vec<Self> = spec.split_whitespace().map(Self::new).collect();
        if gateways.is_empty() {
            vec![Self::Direct]
        } else {
            gateways
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "{DIRECT}"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Final host and port reached by the forwarder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// How one attempt reaches its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hop {
    /// Run the forwarder locally against the target
    Direct { target: Target },
    /// Run the forwarder on `via`, reached by a nested proxy connection
    Relay { via: String, target: Target },
}

impl Hop {
    pub fn target(&self) -> &Target {
        match self {
            Self::Direct { target } | Self::Relay { target, .. } => target,
        }
    }
}

/// Executables used to build attempt command lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCommands {
    /// Command reaching a relay path, `ssh` by default
    pub proxy: String,
    /// Command piping stdio to `host port`, `nc` by default
    pub forwarder: String,
}

impl Default for ProxyCommands {
    fn default() -> Self {
        Self {
            proxy: "ssh".to_string(),
            forwarder: "nc".to_string(),
        }
    }
}

/// A single candidate connection produced for one gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionAttempt {
    pub gateway: Gateway,
    pub hop: Hop,
}

impl ConnectionAttempt {
    /// Command line of the primary process for this attempt
    pub fn argv(&self, commands: &ProxyCommands) -> Vec<String> {
        let mut argv = Vec::with_capacity(5);
        if let Hop::Relay { via, .. } = &self.hop {
            argv.push(commands.proxy.clone());
            argv.push(via.clone());
        }
        let target = self.hop.target();
        argv.push(commands.forwarder.clone());
        argv.push(target.host.clone());
        argv.push(target.port.to_string());
        argv
    }
}

impl fmt::Display for ConnectionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hop {
            Hop::Direct { target } => write!(f, "direct to {target}"),
            Hop::Relay { via, target } => write!(f, "{target} via {via}"),
        }
    }
}

/// Build one attempt per gateway, in declared order
///
/// Attempts are yielded lazily; the caller decides how many to run.
pub fn plan<'a>(
    path: &'a HostPath,
    params: &'a ResolvedParameters,
    gateways: &'a [Gateway],
) -> impl Iterator<Item = ConnectionAttempt> + 'a {
    gateways.iter().map(move |gateway| {
        let mut right_path: Vec<&str> = path.hops().iter().map(String::as_str).collect();
        if let Gateway::Named(name) = gateway {
            right_path.push(name);
        }

        let target = Target {
            host: params.hostname.clone(),
            port: params.port,
        };

        let hop = if right_path.is_empty() {
            Hop::Direct { target }
        } else {
            Hop::Relay {
                via: right_path.join("/"),
                target,
            }
        };

        ConnectionAttempt {
            gateway: gateway.clone(),
            hop,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(host: &str, port: u16) -> ResolvedParameters {
        ResolvedParameters {
            hostname: host.to_string(),
            port,
            user: None,
            identity_file: None,
        }
    }

    #[test]
    fn test_parse_gateway_list() {
        assert_eq!(Gateway::parse_list(""), vec![Gateway::Direct]);
        assert_eq!(
            Gateway::parse_list("  bastion   direct "),
            vec![Gateway::Named("bastion".to_string()), Gateway::Direct]
        );
    }

    #[test]
    fn test_direct_only() {
        let path = HostPath::parse("host").unwrap();
        let params = params("host", 22);
        let gateways = [Gateway::Direct];

        let attempts: Vec<_> = plan(&path, &params, &gateways).collect();
        assert_eq!(attempts.len(), 1);
        assert_eq!(
            attempts[0].hop,
            Hop::Direct {
                target: Target {
                    host: "host".to_string(),
                    port: 22
                }
            }
        );
        assert_eq!(
            attempts[0].argv(&ProxyCommands::default()),
            vec!["nc", "host", "22"]
        );
    }

    #[test]
    fn test_gateway_then_direct_with_intermediate_hop() {
        let path = HostPath::parse("host/mid").unwrap();
        let params = params("host.internal", 2222);
        let gateways = Gateway::parse_list("gw1 direct");

        let attempts: Vec<_> = plan(&path, &params, &gateways).collect();
        assert_eq!(attempts.len(), 2);

        assert!(matches!(&attempts[0].hop, Hop::Relay { via, .. } if via == "mid/gw1"));
        assert!(matches!(&attempts[1].hop, Hop::Relay { via, .. } if via == "mid"));

        let commands = ProxyCommands::default();
        assert_eq!(
            attempts[0].argv(&commands),
            vec!["ssh", "mid/gw1", "nc", "host.internal", "2222"]
        );
        assert_eq!(
            attempts[1].argv(&commands),
            vec!["ssh", "mid", "nc", "host.internal", "2222"]
        );
    }

    #[test]
    fn test_named_gateway_without_hops() {
        let path = HostPath::parse("db").unwrap();
        let params = params("db", 5432);
        let gateways = [Gateway::Named("bastion".to_string())];

        let attempt = plan(&path, &params, &gateways).next().unwrap();
        assert_eq!(attempt.to_string(), "db:5432 via bastion");
    }

    #[test]
    fn test_custom_commands() {
        let path = HostPath::parse("db/edge").unwrap();
        let params = params("db", 22);
        let gateways = [Gateway::Direct];
        let commands = ProxyCommands {
            proxy: "/usr/bin/ssh".to_string(),
            forwarder: "ncat".to_string(),
        };

        let attempt = plan(&path, &params, &gateways).next().unwrap();
        assert_eq!(
            attempt.argv(&commands),
            vec!["/usr/bin/ssh", "edge", "ncat", "db", "22"]
        );
    }
}
