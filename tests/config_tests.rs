//! Integration tests for configuration and preferences

use ephemera::config::{Config, Preferences, Theme, THEME_KEY};
use tempfile::tempdir;

#[test]
fn test_missing_config_uses_defaults() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let config = Config::load_from(&dir.path().join("absent.toml"))?;

    assert_eq!(config.session.duration_seconds, 1800);
    assert_eq!(config.session.max_duration_seconds, 7200);
    assert!(config.session.welcome_messages);
    assert_eq!(config.invitation.origin, "http://localhost:8080");

    Ok(())
}

#[test]
fn test_partial_config_keeps_other_defaults() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[session]\nduration_seconds = 600\n\n[invitation]\norigin = \"https://chat.example.com\"\n",
    )?;

    let config = Config::load_from(&path)?;

    assert_eq!(config.session.duration_seconds, 600);
    assert_eq!(config.session.max_duration_seconds, 7200);
    assert_eq!(config.invitation.origin, "https://chat.example.com");

    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let cases = [
        "[session]\nduration_seconds = 0\n",
        "[session]\nduration_seconds = 100\nmax_duration_seconds = 50\n",
        "[invitation]\norigin = \"ftp://files.example.com\"\n",
        "[invitation]\norigin = \"https://\"\n",
        "[session]\nduration_seconds = \"long\"\n",
    ];

    for (i, content) in cases.iter().enumerate() {
        let path = dir.path().join(format!("bad{}.toml", i));
        std::fs::write(&path, content)?;
        assert!(Config::load_from(&path).is_err(), "accepted: {}", content);
    }

    Ok(())
}

#[test]
fn test_preferences_persist_across_loads() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("preferences.json");

    let prefs = Preferences::load(&path);
    assert_eq!(prefs.get(THEME_KEY), None);
    prefs.set(THEME_KEY, "dark")?;

    let reloaded = Preferences::load(&path);
    assert_eq!(reloaded.get(THEME_KEY).as_deref(), Some("dark"));

    Ok(())
}

#[test]
fn test_malformed_preferences_are_ignored() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("preferences.json");
    std::fs::write(&path, "{ not json")?;

    let prefs = Preferences::load(&path);
    assert_eq!(prefs.get(THEME_KEY), None);

    Ok(())
}

#[test]
fn test_theme_prefers_stored_value() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let prefs = Preferences::load(dir.path().join("preferences.json"));

    Theme::set(&prefs, Theme::Dark)?;
    assert_eq!(Theme::init(&prefs), Theme::Dark);

    Theme::set(&prefs, Theme::Dark.toggled())?;
    assert_eq!(Theme::init(&prefs), Theme::Light);

    Ok(())
}

#[test]
fn test_theme_system_default_from_colorfgbg() {
    assert_eq!(Theme::from_colorfgbg(Some("15;0")), Theme::Dark);
    assert_eq!(Theme::from_colorfgbg(Some("15;default;8")), Theme::Dark);
    assert_eq!(Theme::from_colorfgbg(Some("0;15")), Theme::Light);
    assert_eq!(Theme::from_colorfgbg(Some("garbage")), Theme::Light);
    assert_eq!(Theme::from_colorfgbg(None), Theme::Light);
}

#[test]
fn test_theme_parse() {
    assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
    assert_eq!(" light ".parse::<Theme>().unwrap(), Theme::Light);
    assert!("sepia".parse::<Theme>().is_err());
}
