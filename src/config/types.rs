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

//! Core data structures for the advanced configuration store

use regex::Regex;
use std::path::PathBuf;

use super::interpolation::expand_references;
use crate::error::ConfigError;

/// Name of the fallback section consulted after every pattern section
pub const DEFAULT_SECTION: &str = "default";

/// One `[pattern]` block of the configuration
///
/// The section name doubles as a regular expression which is matched at the
/// start of the host name. The `default` section carries no pattern and never
/// takes part in the host scan.
#[derive(Debug, Clone)]
pub struct Section {
    name: String,
    pattern: Option<Regex>,
    values: Vec<(String, String)>,
}

impl Section {
    /// Create a section, compiling its name as an anchored host pattern
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        if name == DEFAULT_SECTION {
            return Ok(Self::fallback());
        }

        let pattern =
            Regex::new(&format!("^(?:{name})")).map_err(|source| ConfigError::InvalidPattern {
                section: name.to_string(),
                source,
            })?;

        Ok(Self {
            name: name.to_string(),
            pattern: Some(pattern),
            values: Vec::new(),
        })
    }

    fn fallback() -> Self {
        Self {
            name: DEFAULT_SECTION.to_string(),
            pattern: None,
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.pattern.is_none()
    }

    /// Does the section pattern match `host` at position 0
    pub fn matches(&self, host: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(host))
    }

    /// Raw stored value for `key` (keys are case-insensitive)
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite a value, keeping the original key position
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = key.to_lowercase();
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key, value)),
        }
    }

    pub(super) fn append_continuation(&mut self, key: &str, line: &str) {
        if let Some(entry) = self.values.iter_mut().find(|(k, _)| k == key) {
            entry.1.push('\n');
            entry.1.push_str(line);
        }
    }

    /// Keys and raw values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered, mergeable set of configuration sections
///
/// Pattern sections keep the order in which they were first declared; the
/// `default` section always exists and is listed last.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    pub(super) sections: Vec<Section>,
    pub(super) default: Section,
    pub(super) sources: Vec<PathBuf>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Create a store holding only an empty `default` section
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            default: Section::fallback(),
            sources: Vec::new(),
        }
    }

    /// All sections, pattern sections first in declaration order, `default` last
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().chain(std::iter::once(&self.default))
    }

    /// Pattern sections only, in declaration order
    pub fn pattern_sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn default_section(&self) -> &Section {
        &self.default
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        if name == DEFAULT_SECTION {
            return Some(&self.default);
        }
        self.sections.iter().find(|s| s.name == name)
    }

    fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        if name == DEFAULT_SECTION {
            return Some(&mut self.default);
        }
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Return the named section, declaring it if needed
    pub(super) fn section_entry(&mut self, name: &str) -> Result<&mut Section, ConfigError> {
        if self.section(name).is_none() {
            self.sections.push(Section::new(name)?);
        }
        self.section_mut(name)
            .ok_or_else(|| ConfigError::NoSection(name.to_string()))
    }

    /// Files merged into this store, in load order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.section(section).is_some_and(|s| s.contains_key(key))
    }

    /// Read a value, optionally expanding `%(name)s` references
    ///
    /// References resolve against `vars` first, then the section itself, then
    /// the `default` section.
    pub fn get(
        &self,
        section: &str,
        key: &str,
        raw: bool,
        vars: &[(&str, &str)],
    ) -> Result<Option<String>, ConfigError> {
        let sect = self
            .section(section)
            .ok_or_else(|| ConfigError::NoSection(section.to_string()))?;

        let Some(value) = sect.get(key) else {
            return Ok(None);
        };

        if raw {
            return Ok(Some(value.to_string()));
        }

        self.expand(sect, key, value, vars).map(Some)
    }

    /// Overwrite a value in an existing section
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let sect = self
            .section_mut(section)
            .ok_or_else(|| ConfigError::NoSection(section.to_string()))?;
        sect.set(key, value);
        Ok(())
    }

    /// All key/value pairs of a section with `vars` layered on top, expanded
    pub fn items(
        &self,
        section: &str,
        vars: &[(&str, &str)],
    ) -> Result<Vec<(String, String)>, ConfigError> {
        let sect = self
            .section(section)
            .ok_or_else(|| ConfigError::NoSection(section.to_string()))?;

        let mut items: Vec<(String, String)> = sect
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        for (name, value) in vars {
            let name = name.to_lowercase();
            match items.iter_mut().find(|(k, _)| *k == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => items.push((name, value.to_string())),
            }
        }

        items
            .into_iter()
            .map(|(key, value)| {
                let expanded = self.expand(sect, &key, &value, vars)?;
                Ok((key, expanded))
            })
            .collect()
    }

    fn expand(
        &self,
        sect: &Section,
        key: &str,
        value: &str,
        vars: &[(&str, &str)],
    ) -> Result<String, ConfigError> {
        expand_references(sect.name(), key, value, |name| {
            vars.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.to_string())
                .or_else(|| sect.get(name).map(str::to_string))
                .or_else(|| self.default.get(name).map(str::to_string))
        })
    }
}
