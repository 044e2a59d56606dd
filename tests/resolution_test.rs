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

//! Resolution of host parameters from layered config.advanced files

use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

use assh::config::ConfigStore;
use assh::error::ConfigError;
use assh::resolver::{ProcessEnv, ResolvedParameters, Resolver};

async fn load(files: &[(&str, &str)]) -> (TempDir, ConfigStore) {
    let temp = TempDir::new().unwrap();
    let mut paths = Vec::new();
    for (name, content) in files {
        let path = temp.path().join(name);
        fs::write(&path, content).unwrap();
        paths.push(path);
    }
    let store = ConfigStore::load_from_sources(&paths).await.unwrap();
    (temp, store)
}

#[tokio::test]
async fn test_first_matching_section_wins_then_default() {
    let (_temp, store) = load(&[(
        "config.advanced",
        r#"
[default]
user = fallback
port = 22

[web1]
port = 8022

[web\d+]
port = 9022
user = webops
"#,
    )])
    .await;

    let env = ProcessEnv;
    let resolver = Resolver::new(&store, &env);

    assert_eq!(
        resolver.resolve("port", "web1", None).unwrap().as_deref(),
        Some("8022")
    );
    assert_eq!(
        resolver.resolve("user", "web1", None).unwrap().as_deref(),
        Some("webops")
    );
    assert_eq!(
        resolver.resolve("port", "web7", None).unwrap().as_deref(),
        Some("9022")
    );
    assert_eq!(
        resolver.resolve("user", "db", None).unwrap().as_deref(),
        Some("fallback")
    );
    assert_eq!(resolver.resolve("identityfile", "db", None).unwrap(), None);
    assert_eq!(
        resolver
            .resolve("identityfile", "db", Some("~/.ssh/id"))
            .unwrap()
            .as_deref(),
        Some("~/.ssh/id")
    );
}

#[tokio::test]
async fn test_later_file_overrides_earlier_file() {
    let (_temp, store) = load(&[
        ("system", "[db]\nport = 5432\nuser = postgres\n"),
        ("user", "[db]\nport = 6432\n"),
    ])
    .await;

    let env = ProcessEnv;
    let resolver = Resolver::new(&store, &env);
    let (params, updates) = ResolvedParameters::resolve(&resolver, "db", 22).unwrap();

    assert_eq!(params.port, 6432);
    assert_eq!(params.user.as_deref(), Some("postgres"));
    assert_eq!(params.hostname, "db");
    assert!(updates.is_empty());
}

#[tokio::test]
async fn test_section_interpolation_uses_default_values() {
    let (_temp, store) = load(&[(
        "config.advanced",
        "[default]\ndomain = example.com\n\n[app]\nhostname = app.%(domain)s\n",
    )])
    .await;

    let env = ProcessEnv;
    let resolver = Resolver::new(&store, &env);
    let (params, _) = ResolvedParameters::resolve(&resolver, "app", 22).unwrap();
    assert_eq!(params.hostname, "app.example.com");
}

#[tokio::test]
async fn test_broken_reference_is_an_error() {
    let (_temp, store) = load(&[("config.advanced", "[app]\nuser = %(missing)s\n")]).await;

    let env = ProcessEnv;
    let resolver = Resolver::new(&store, &env);
    let err = resolver.resolve("user", "app", None).unwrap_err();
    assert!(matches!(err, ConfigError::Interpolation { .. }));
}

#[tokio::test]
async fn test_missing_include_fails_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.advanced");
    fs::write(
        &path,
        format!(
            "[default]\nincludes = {}\n",
            temp.path().join("nope.advanced").display()
        ),
    )
    .unwrap();

    let err = ConfigStore::load_from_sources(&[path]).await.unwrap_err();
    assert!(matches!(err, ConfigError::MissingIncludes { .. }));
}

#[tokio::test]
#[serial]
async fn test_process_environment_interpolation() {
    let original = env::var("ASSH_TEST_DEPLOY_USER").ok();
    unsafe {
        env::set_var("ASSH_TEST_DEPLOY_USER", "deployer");
    }

    let (_temp, store) = load(&[(
        "config.advanced",
        "[deploy]\nuser = $ASSH_TEST_DEPLOY_USER\n",
    )])
    .await;

    let env = ProcessEnv;
    let resolver = Resolver::new(&store, &env);
    let (params, updates) = ResolvedParameters::resolve(&resolver, "deploy", 22).unwrap();

    assert_eq!(params.user.as_deref(), Some("deployer"));
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].section, "deploy");
    assert_eq!(updates[0].key, "user");
    assert_eq!(updates[0].value, "deployer");

    unsafe {
        match original {
            Some(value) => env::set_var("ASSH_TEST_DEPLOY_USER", value),
            None => env::remove_var("ASSH_TEST_DEPLOY_USER"),
        }
    }
}

#[tokio::test]
#[serial]
async fn test_cyclic_environment_reference_terminates() {
    unsafe {
        env::set_var("ASSH_TEST_CYCLE_A", "$ASSH_TEST_CYCLE_B");
        env::set_var("ASSH_TEST_CYCLE_B", "$ASSH_TEST_CYCLE_A");
    }

    let (_temp, store) = load(&[("config.advanced", "[c]\nuser = $ASSH_TEST_CYCLE_A\n")]).await;

    let env = ProcessEnv;
    let resolver = Resolver::new(&store, &env);
    let resolved = resolver.resolve_interpolated("user", "c", None).unwrap();
    assert!(resolved.value.unwrap().starts_with("$ASSH_TEST_CYCLE_"));

    unsafe {
        env::remove_var("ASSH_TEST_CYCLE_A");
        env::remove_var("ASSH_TEST_CYCLE_B");
    }
}
