// tests/harvest_config.rs
use std::{env, fs};

use specials_harvester::harvest::config::{
    load_config_default, load_config_from, ENV_ACCESS_TOKEN, ENV_CONFIG_PATH,
};
use specials_harvester::SourceKind;

const TOML: &str = r##"
channel_capacity = 8
request_timeout_secs = 5

[[sources]]
name = "OK Foods"
url = "https://www.okfoods.co.za/content/okfoods/na/en_NA/specials.html"
category = "Groceries"
kind = { type = "ok_foods", base_url = "https://www.okfoods.co.za" }

[store]
project_id = "specials-test"
bucket = "specials-test.appspot.com"
access_token = "ENV"
"##;

#[serial_test::serial]
#[test]
fn toml_file_with_env_token() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("harvest.toml");
    fs::write(&p, TOML).unwrap();

    env::set_var(ENV_ACCESS_TOKEN, "secret-token");
    let cfg = load_config_from(&p).unwrap();
    env::remove_var(ENV_ACCESS_TOKEN);

    assert_eq!(cfg.channel_capacity, 8);
    assert_eq!(cfg.request_timeout_secs, 5);
    assert_eq!(
        cfg.sources[0].kind,
        SourceKind::OkFoods {
            base_url: "https://www.okfoods.co.za".into()
        }
    );
    let store = cfg.store.unwrap();
    assert_eq!(store.collection, "specials");
    assert_eq!(store.access_token, "secret-token");
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so a real config/ in the repo does not leak in
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_ACCESS_TOKEN);

    // No files → built-in seed, dry-run
    let seed = load_config_default().unwrap();
    assert!(seed.sources.len() >= 6);
    assert!(seed.store.is_none());

    // config/harvest.json is picked up
    fs::create_dir_all("config").unwrap();
    fs::write(
        "config/harvest.json",
        r#"{ "sources": [ { "name": "Checkers", "url": "https://c/", "category": "Groceries", "kind": { "type": "checkers" } } ] }"#,
    )
    .unwrap();
    let from_json = load_config_default().unwrap();
    assert_eq!(from_json.sources.len(), 1);

    // Env takes precedence; ENV token missing → store dropped
    let p = tmp.path().join("custom.toml");
    fs::write(&p, TOML).unwrap();
    env::set_var(ENV_CONFIG_PATH, p.display().to_string());
    let from_env = load_config_default().unwrap();
    assert_eq!(from_env.channel_capacity, 8);
    assert!(from_env.store.is_none());

    // Env pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(load_config_default().is_err());
    env::remove_var(ENV_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}
