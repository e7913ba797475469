use feedgate_proxy::{ConfigError, ProxyConfig, WhitelistedFeedProxy};
use feedgate_test_utils::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(&format!(
        "owner = \"{}\"\nmaintainer = \"{}\"\nowner_bypasses_whitelist = true\n\
         allow_maintainer_reassignment = false\njournal_capacity = 16\n",
        owner(),
        maintainer()
    ));

    let config = ProxyConfig::load(file.path()).unwrap();
    assert_eq!(
        config,
        ProxyConfig::new(owner())
            .with_maintainer(maintainer())
            .with_owner_bypass(true)
            .with_maintainer_reassignment(false)
            .with_journal_capacity(16)
    );
}

#[test]
fn test_loaded_config_drives_proxy() {
    let file = write_config(&format!(
        "owner = \"{}\"\nowner_bypasses_whitelist = true\n",
        owner()
    ));
    let config = ProxyConfig::load(file.path()).unwrap();
    let proxy = WhitelistedFeedProxy::from_config(config, scenario_source_a(), reader_whitelist());

    assert_eq!(proxy.whitelist_maintainer(), owner());
    assert_eq!(proxy.latest_answer(&owner()), Ok(54321));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProxyConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_unknown_key_rejected() {
    let file = write_config(&format!("owner = \"{}\"\nbogus = 1\n", owner()));
    assert!(matches!(
        ProxyConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_bad_address_rejected() {
    let file = write_config("owner = \"0x1234\"\n");
    assert!(matches!(
        ProxyConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_zero_owner_rejected() {
    let file = write_config("owner = \"0x0000000000000000000000000000000000000000\"\n");
    assert!(matches!(
        ProxyConfig::load(file.path()),
        Err(ConfigError::Invalid(_))
    ));
}
