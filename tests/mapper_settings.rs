use std::fs;
use std::path::PathBuf;

use rowbind::{MapperSettings, RowbindError};

fn settings_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rowbind-settings-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(name);
    fs::write(&path, contents).expect("settings written");
    path
}

#[test]
fn defaults_to_two_workers() {
    assert_eq!(MapperSettings::default().max_workers, 2);
}

#[test]
fn reads_workers_from_a_file() {
    let path = settings_file("four.toml", "max_workers = 4\n");
    let settings = MapperSettings::load_from(&path).expect("settings load");
    assert_eq!(settings.max_workers, 4);
}

#[test]
fn missing_keys_keep_their_defaults() {
    let path = settings_file("empty.toml", "# nothing here\n");
    let settings = MapperSettings::load_from(&path).expect("settings load");
    assert_eq!(settings, MapperSettings::default());
}

#[test]
fn zero_workers_are_rejected() {
    let path = settings_file("zero.toml", "max_workers = 0\n");
    assert!(matches!(MapperSettings::load_from(&path), Err(RowbindError::Config(_))));
    assert!(matches!(MapperSettings::with_max_workers(0), Err(RowbindError::Config(_))));
    assert_eq!(MapperSettings::with_max_workers(3).expect("valid").max_workers, 3);
}

#[test]
fn a_named_file_must_exist() {
    let missing = std::env::temp_dir().join("rowbind-settings-missing/none.toml");
    assert!(matches!(MapperSettings::load_from(missing), Err(RowbindError::Config(_))));
}
