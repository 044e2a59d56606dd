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

//! Environment variable interpolation for resolved values
//!
//! A value starting with `$NAME` has every `$NAME` occurrence replaced by the
//! variable's value, and the result is interpolated again so that a variable
//! may itself start with another `$NAME` reference. Only a *leading* token
//! triggers expansion.

use std::collections::{HashMap, HashSet};

/// Hard ceiling on chained expansions of one value
const MAX_EXPANSION_DEPTH: usize = 16;

/// Source of environment variables
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Interpolate the leading `$NAME` token of `value`, recursively
///
/// Undefined or empty variables stop the expansion and leave the token in
/// place. A variable expanding back to itself (directly or through others),
/// or a chain longer than the depth limit, is logged as a warning and the
/// value expanded so far is returned.
pub fn interpolate(value: &str, env: &dyn EnvSource) -> String {
    let mut value = value.to_string();
    let mut seen = HashSet::new();

    for _ in 0..MAX_EXPANSION_DEPTH {
        let Some(name) = leading_variable(&value) else {
            return value;
        };

        let replacement = match env.var(&name) {
            Some(replacement) if !replacement.is_empty() => replacement,
            _ => return value,
        };

        if !seen.insert(name.clone()) {
            tracing::warn!(
                "cyclic environment reference '${}' while interpolating '{}', leaving it unresolved",
                name,
                value
            );
            return value;
        }

        let expanded = replace_variable(&value, &name, &replacement);
        tracing::debug!("'{}' => '{}'", value, expanded);
        value = expanded;
    }

    if leading_variable(&value).is_some() {
        tracing::warn!(
            "environment interpolation exceeded {} expansions, leaving '{}' unresolved",
            MAX_EXPANSION_DEPTH,
            value
        );
    }
    value
}

/// Name of the `$NAME` token at position 0, if any
fn leading_variable(value: &str) -> Option<String> {
    let rest = value.strip_prefix('$')?;
    let end = rest.find(|c: char| !is_word(c)).unwrap_or(rest.len());
    if end == 0 {
        None
    } else {
        Some(rest[..end].to_string())
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replace every whole-word `$name` in `value`
fn replace_variable(value: &str, name: &str, replacement: &str) -> String {
    let token = format!("${name}");
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find(&token) {
        let after = &rest[pos + token.len()..];
        out.push_str(&rest[..pos]);
        if after.starts_with(is_word) {
            out.push_str(&token);
        } else {
            out.push_str(replacement);
        }
        rest = after;
    }

    out.push_str(rest);
    out
}
