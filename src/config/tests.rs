use super::*;

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.database.url.is_none());
    assert_eq!(settings.database.max_connections.get(), 8);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.max_entries, 10_000);
    assert_eq!(settings.cache.sweep_interval, Duration::from_secs(60));
    assert_eq!(settings.accounts.deletion_lockout_days, 90);
    assert_eq!(settings.accounts.deleted_badge, "deleted");
    assert_eq!(settings.accounts.deleted_with_recovery_badge, "deleted2");
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.database.url = Some("postgres://file".to_string());

    let overrides = GlobalOverrides {
        log_level: Some("debug".to_string()),
        database_url: Some("postgres://cli".to_string()),
        cache_enabled: Some(false),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.database.url.as_deref(), Some("postgres://cli"));
    assert!(!settings.cache.enabled);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_database_url_is_treated_as_unset() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    let err = Settings::from_raw(raw).expect_err("invalid level");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn zero_values_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.max_entries = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.max_entries",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.database.max_connections = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "database.max_connections",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.accounts.deletion_lockout_days = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "accounts.deletion_lockout_days",
            ..
        })
    ));
}

#[test]
fn lockout_beyond_a_century_is_rejected() {
    let mut raw = RawSettings::default();
    raw.accounts.deletion_lockout_days = Some(36_500);
    assert!(Settings::from_raw(raw).is_ok());

    let mut raw = RawSettings::default();
    raw.accounts.deletion_lockout_days = Some(u32::MAX);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "accounts.deletion_lockout_days",
            ..
        })
    ));
}

#[test]
fn blank_badge_ids_are_rejected() {
    let mut raw = RawSettings::default();
    raw.accounts.deleted_badge = Some(" ".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "accounts.deleted_badge",
            ..
        })
    ));
}

#[test]
fn cache_settings_feed_cache_config() {
    let settings = Settings::from_raw(RawSettings {
        cache: RawCacheSettings {
            enabled: Some(true),
            max_entries: Some(32),
            sweep_interval_ms: Some(250),
        },
        ..Default::default()
    })
    .expect("valid settings");

    let config = crate::cache::CacheConfig::from(&settings.cache);
    assert_eq!(config.max_entries, 32);
    assert_eq!(config.sweep_interval_ms, 250);
}
