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

//! Cascading key resolution across host-pattern sections
//!
//! Lookup order for a key and a host:
//!
//! 1. The first pattern section (in declaration order) that matches the host
//!    at position 0 **and** defines the key. This is first-match, not
//!    best-match: a broad pattern declared early shadows narrower ones.
//! 2. The `default` section.
//! 3. The caller-supplied fallback.

mod env;
mod params;

pub use env::{interpolate, EnvSource, ProcessEnv};
pub use params::{ResolvedParameters, Update};

use crate::config::{ConfigStore, DEFAULT_SECTION};
use crate::error::ConfigError;

/// A value found in the store, with the section that supplied it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub value: String,
    pub section: String,
}

/// Result of resolving and environment-interpolating a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub key: String,
    /// Interpolated value, `None` when nothing matched and no fallback was given
    pub value: Option<String>,
    /// Section the value came from; `None` when the caller fallback was used
    pub section: Option<String>,
    /// Interpolation produced something different from the stored value
    pub changed: bool,
}

/// Read-only resolution engine over a [`ConfigStore`]
pub struct Resolver<'a> {
    store: &'a ConfigStore,
    env: &'a dyn EnvSource,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a ConfigStore, env: &'a dyn EnvSource) -> Self {
        Self { store, env }
    }

    /// Find `key` for `host` in the first matching section, then `default`
    pub fn lookup(&self, key: &str, host: &str) -> Result<Option<Lookup>, ConfigError> {
        let section = self
            .store
            .pattern_sections()
            .iter()
            .find(|s| s.matches(host) && s.contains_key(key))
            .map(|s| s.name())
            .or_else(|| {
                self.store
                    .default_section()
                    .contains_key(key)
                    .then_some(DEFAULT_SECTION)
            });

        let Some(section) = section else {
            return Ok(None);
        };

        let value = self
            .store
            .get(section, key, false, &[])?
            .unwrap_or_default();

        Ok(Some(Lookup {
            value,
            section: section.to_string(),
        }))
    }

    /// Resolve `key` for `host`, falling back to `default`
    pub fn resolve(
        &self,
        key: &str,
        host: &str,
        default: Option<&str>,
    ) -> Result<Option<String>, ConfigError> {
        Ok(self
            .lookup(key, host)?
            .map(|found| found.value)
            .or_else(|| default.map(str::to_string)))
    }

    /// Resolve `key` and interpolate environment variables into the result
    ///
    /// The store is not touched; callers persist `changed` values themselves.
    pub fn resolve_interpolated(
        &self,
        key: &str,
        host: &str,
        default: Option<&str>,
    ) -> Result<Resolved, ConfigError> {
        let (raw, section) = match self.lookup(key, host)? {
            Some(found) => (Some(found.value), Some(found.section)),
            None => (default.map(str::to_string), None),
        };

        let value = raw.as_deref().map(|raw| interpolate(raw, self.env));
        let changed = value != raw;

        Ok(Resolved {
            key: key.to_lowercase(),
            value,
            section,
            changed,
        })
    }
}
