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

//! Per-connection parameters resolved for the destination host

use std::fmt;

use super::{Resolved, Resolver};
use crate::config::ConfigStore;
use crate::error::{AsshError, ConfigError};

/// Connection attributes of the final destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParameters {
    /// Host name handed to the forwarder (`hostname` key, else the path destination)
    pub hostname: String,
    pub port: u16,
    pub user: Option<String>,
    pub identity_file: Option<String>,
}

/// An interpolated value that must be written back into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub section: String,
    pub key: String,
    pub value: String,
}

impl Update {
    fn from_resolved(resolved: &Resolved) -> Option<Self> {
        if !resolved.changed {
            return None;
        }
        Some(Self {
            section: resolved.section.clone()?,
            key: resolved.key.clone(),
            value: resolved.value.clone()?,
        })
    }

    /// Persist this value into `store`
    pub fn apply(&self, store: &mut ConfigStore) -> Result<(), ConfigError> {
        store.set(&self.section, &self.key, &self.value)
    }
}

impl ResolvedParameters {
    /// Resolve port, user, hostname and identity file for `destination`
    ///
    /// Returns the parameters together with the values whose interpolation
    /// differs from what the store holds. Fallback values are never returned
    /// as updates since no section owns them.
    pub fn resolve(
        resolver: &Resolver<'_>,
        destination: &str,
        default_port: u16,
    ) -> Result<(Self, Vec<Update>), AsshError> {
        let default_port_str = default_port.to_string();

        let port =
            resolver.resolve_interpolated("port", destination, Some(default_port_str.as_str()))?;
        let user = resolver.resolve_interpolated("user", destination, None)?;
        let hostname = resolver.resolve_interpolated("hostname", destination, Some(destination))?;
        let identity = resolver.resolve_interpolated("identityfile", destination, None)?;

        for resolved in [&port, &user, &hostname, &identity] {
            tracing::debug!(
                "get {:<12} : {}",
                resolved.key,
                resolved.value.as_deref().unwrap_or("")
            );
        }

        let updates: Vec<Update> = [&port, &user, &hostname, &identity]
            .into_iter()
            .filter_map(Update::from_resolved)
            .collect();

        let port_value = non_empty(port.value).unwrap_or(default_port_str);
        let port = port_value
            .trim()
            .parse::<u16>()
            .map_err(|_| AsshError::InvalidPort {
                host: destination.to_string(),
                value: port_value.clone(),
            })?;

        let params = Self {
            hostname: non_empty(hostname.value).unwrap_or_else(|| destination.to_string()),
            port,
            user: non_empty(user.value),
            identity_file: non_empty(identity.value),
        };

        Ok((params, updates))
    }
}

impl fmt::Display for ResolvedParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn store(content: &str) -> ConfigStore {
        let mut store = ConfigStore::new();
        store.merge_str(content, "test").unwrap();
        store
    }

    #[test]
    fn test_defaults_when_unconfigured() {
        let store = ConfigStore::new();
        let env: HashMap<String, String> = HashMap::new();
        let resolver = Resolver::new(&store, &env);

        let (params, updates) = ResolvedParameters::resolve(&resolver, "box", 22).unwrap();
        assert_eq!(
            params,
            ResolvedParameters {
                hostname: "box".to_string(),
                port: 22,
                user: None,
                identity_file: None,
            }
        );
        assert!(updates.is_empty());
        assert_eq!(params.to_string(), "box:22");
    }

    #[test]
    fn test_configured_values() {
        let store = store(
            "[default]\nuser = ops\n[web]\nhostname = web.internal\nport = 2222\nidentityfile = ~/.ssh/web\n",
        );
        let env: HashMap<String, String> = HashMap::new();
        let resolver = Resolver::new(&store, &env);

        let (params, _) = ResolvedParameters::resolve(&resolver, "web", 22).unwrap();
        assert_eq!(params.hostname, "web.internal");
        assert_eq!(params.port, 2222);
        assert_eq!(params.user.as_deref(), Some("ops"));
        assert_eq!(params.identity_file.as_deref(), Some("~/.ssh/web"));
        assert_eq!(params.to_string(), "ops@web.internal:2222");
    }

    #[test]
    fn test_interpolated_values_become_updates() {
        let mut store = store("[web]\nuser = $DEPLOY_USER\n[default]\nport = $WEB_PORT\n");
        let env: HashMap<String, String> = HashMap::from([
            ("DEPLOY_USER".to_string(), "alice".to_string()),
            ("WEB_PORT".to_string(), "2200".to_string()),
        ]);

        let updates = {
            let resolver = Resolver::new(&store, &env);
            let (params, updates) = ResolvedParameters::resolve(&resolver, "web", 22).unwrap();
            assert_eq!(params.user.as_deref(), Some("alice"));
            assert_eq!(params.port, 2200);
            updates
        };

        assert_eq!(
            updates,
            vec![
                Update {
                    section: "default".to_string(),
                    key: "port".to_string(),
                    value: "2200".to_string(),
                },
                Update {
                    section: "web".to_string(),
                    key: "user".to_string(),
                    value: "alice".to_string(),
                },
            ]
        );

        for update in &updates {
            update.apply(&mut store).unwrap();
        }
        assert_eq!(store.section("web").unwrap().get("user"), Some("alice"));
        assert_eq!(store.default_section().get("port"), Some("2200"));
    }

    #[test]
    fn test_empty_values_fall_back() {
        let store = store("[web]\nhostname = \"\"\nport = \"\"\nuser = \"\"\n");
        let env: HashMap<String, String> = HashMap::new();
        let resolver = Resolver::new(&store, &env);

        let (params, _) = ResolvedParameters::resolve(&resolver, "web", 2022).unwrap();
        assert_eq!(params.hostname, "web");
        assert_eq!(params.port, 2022);
        assert_eq!(params.user, None);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let store = store("[web]\nport = ssh\n");
        let env: HashMap<String, String> = HashMap::new();
        let resolver = Resolver::new(&store, &env);

        let err = ResolvedParameters::resolve(&resolver, "web", 22).unwrap_err();
        assert!(matches!(err, AsshError::InvalidPort { .. }));
    }
}
