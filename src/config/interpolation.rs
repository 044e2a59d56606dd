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

//! `%(name)s` reference expansion inside stored values

use crate::error::ConfigError;

/// References nested deeper than this are rejected
const MAX_INTERPOLATION_DEPTH: usize = 10;

/// Expand `%(name)s` references in `value` using `lookup`
///
/// Values without `%(` are returned untouched, including any lone `%`.
/// Inside an expanded value `%%` collapses to `%`.
pub(super) fn expand_references<F>(
    section: &str,
    key: &str,
    value: &str,
    lookup: F,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut value = value.to_string();

    for _ in 0..MAX_INTERPOLATION_DEPTH {
        if !value.contains("%(") {
            return Ok(value);
        }
        value = expand_once(section, key, &value, &lookup)?;
    }

    if value.contains("%(") {
        return Err(ConfigError::Interpolation {
            section: section.to_string(),
            key: key.to_string(),
            message: format!(
                "references nested deeper than {MAX_INTERPOLATION_DEPTH} levels: '{value}'"
            ),
        });
    }

    Ok(value)
}

fn expand_once<F>(section: &str, key: &str, value: &str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("%%") {
            out.push('%');
            rest = after;
        } else if let Some(body) = tail.strip_prefix("%(") {
            let Some(close) = body.find(")s") else {
                return Err(ConfigError::Interpolation {
                    section: section.to_string(),
                    key: key.to_string(),
                    message: format!("unterminated reference in '{value}'"),
                });
            };
            let name = body[..close].to_lowercase();
            let replacement = lookup(&name).ok_or_else(|| ConfigError::Interpolation {
                section: section.to_string(),
                key: key.to_string(),
                message: format!("missing option '{name}' referenced by '{value}'"),
            })?;
            out.push_str(&replacement);
            rest = &body[close + 2..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    Ok(out)
}
