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

//! Line parser for `config.advanced` files
//!
//! The format is INI-like:
//!
//! ```text
//! [default]
//! port = 22
//! gateways = direct
//!
//! [web\d+\.example\.com]
//! user: deploy
//! gateways = bastion direct
//! ```
//!
//! Section headers are taken verbatim between the first `[` and the last `]`
//! so that regular expressions containing brackets survive intact.

use super::types::ConfigStore;
use crate::error::ConfigError;

// Security: Set reasonable limits to prevent DoS attacks
const MAX_LINE_LENGTH: usize = 8192;

/// Parse `content` and merge it into `store`
///
/// `origin` names the source in error messages.
pub(super) fn parse_into(
    store: &mut ConfigStore,
    content: &str,
    origin: &str,
) -> Result<(), ConfigError> {
    let mut current_section: Option<String> = None;
    let mut current_key: Option<String> = None;

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;

        if line.len() > MAX_LINE_LENGTH {
            return Err(ConfigError::Parse {
                origin: origin.to_string(),
                line: line_number,
                message: format!("line exceeds maximum length of {MAX_LINE_LENGTH} bytes"),
            });
        }

        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        // Indented lines continue the previous value
        if line.starts_with(char::is_whitespace) {
            if let (Some(section), Some(key)) = (&current_section, &current_key) {
                store.section_entry(section)?.append_continuation(key, trimmed);
                continue;
            }
        }

        if let Some(header) = parse_section_header(trimmed) {
            tracing::trace!("{origin}:{line_number}: section [{header}]");
            store.section_entry(header)?;
            current_section = Some(header.to_string());
            current_key = None;
            continue;
        }

        let Some((key, value)) = parse_option(trimmed) else {
            return Err(ConfigError::Parse {
                origin: origin.to_string(),
                line: line_number,
                message: format!("expected '[section]' or 'key = value', found '{trimmed}'"),
            });
        };

        let Some(section) = &current_section else {
            return Err(ConfigError::MissingSectionHeader {
                origin: origin.to_string(),
                line: line_number,
            });
        };

        store.section_entry(section)?.set(&key, value);
        current_key = Some(key);
    }

    Ok(())
}

fn parse_section_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    let end = rest.rfind(']')?;
    let header = &rest[..end];
    if header.is_empty() {
        None
    } else {
        Some(header)
    }
}

/// Split `key = value` or `key: value`, lowercasing the key
fn parse_option(line: &str) -> Option<(String, String)> {
    let separator = line.find([':', '='])?;
    let key = line[..separator].trim_end();
    if key.is_empty() {
        return None;
    }

    let mut value = line[separator + 1..].trim();

    // Inline comments need whitespace before the ';'
    if let Some(pos) = value.find(" ;").or_else(|| value.find("\t;")) {
        value = value[..pos].trim_end();
    }

    if value == "\"\"" {
        value = "";
    }

    Some((key.to_lowercase(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigStore, ConfigError> {
        let mut store = ConfigStore::new();
        parse_into(&mut store, content, "test")?;
        Ok(store)
    }

    #[test]
    fn test_parse_basic_sections() {
        let store = parse(
            r#"
[default]
Port = 22
gateways: direct

[web\d+]
user = deploy
"#,
        )
        .unwrap();

        assert_eq!(store.default_section().get("port"), Some("22"));
        assert_eq!(store.default_section().get("gateways"), Some("direct"));
        let web = store.section(r"web\d+").unwrap();
        assert_eq!(web.get("user"), Some("deploy"));
    }

    #[test]
    fn test_header_keeps_regex_brackets() {
        let store = parse("[db[0-9]+\\.example]\nport = 5432\n").unwrap();
        assert!(store.section("db[0-9]+\\.example").is_some());
    }

    #[test]
    fn test_continuation_lines() {
        let store = parse("[default]\nincludes = ~/a.conf\n    ~/b.conf\n").unwrap();
        assert_eq!(
            store.default_section().get("includes"),
            Some("~/a.conf\n~/b.conf")
        );
    }

    #[test]
    fn test_comments_and_inline_comments() {
        let store = parse(
            "# leading comment\n; another\n[default]\nport = 2222 ; custom port\nuser = a;b\n",
        )
        .unwrap();
        assert_eq!(store.default_section().get("port"), Some("2222"));
        assert_eq!(store.default_section().get("user"), Some("a;b"));
    }

    #[test]
    fn test_empty_quoted_value() {
        let store = parse("[default]\nidentityfile = \"\"\n").unwrap();
        assert_eq!(store.default_section().get("identityfile"), Some(""));
    }

    #[test]
    fn test_repeated_section_is_merged() {
        let store = parse("[web]\nport = 1\n[db]\nport = 2\n[web]\nuser = u\nport = 3\n").unwrap();
        let names: Vec<&str> = store.pattern_sections().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["web", "db"]);
        let web = store.section("web").unwrap();
        assert_eq!(web.get("port"), Some("3"));
        assert_eq!(web.get("user"), Some("u"));
    }

    #[test]
    fn test_option_before_header_fails() {
        let err = parse("port = 22\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSectionHeader { line: 1, .. }
        ));
    }

    #[test]
    fn test_garbage_line_fails_with_line_number() {
        let err = parse("[default]\nport 22\n").unwrap_err();
        match err {
            ConfigError::Parse { line, origin, .. } => {
                assert_eq!(line, 2);
                assert_eq!(origin, "test");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_section_pattern_fails() {
        let err = parse("[web(]\nport = 22\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
