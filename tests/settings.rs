use sigbrowse::config::{settings_from_json, settings_from_yaml, settings_to_json, settings_to_yaml};
use sigbrowse::{load_settings_from_path, save_settings_to_path, BrowserSettings, ScaleMode, SignalBrowserModel, WholeBufferMode};

fn custom() -> BrowserSettings {
    BrowserSettings {
        release_buffer: true,
        whole_buffer: WholeBufferMode::Full,
        pixel_per_sec: 250.0,
        signal_height: 60,
        signal_spacing: 4,
        show_y_grid: false,
        auto_zoom: ScaleMode::ZeroCentered,
        all_event_types_selected: false,
        shown_event_types: vec![0x0101, 0x0300],
        ..BrowserSettings::default()
    }
}

#[test]
fn json_and_yaml_preserve_settings() {
    let settings = custom();
    let json = settings_to_json(&settings).unwrap();
    assert_eq!(settings_from_json(&json).unwrap(), settings);
    let yaml = settings_to_yaml(&settings).unwrap();
    assert_eq!(settings_from_yaml(&yaml).unwrap(), settings);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let settings = settings_from_json(r#"{ "signal_height": 40 }"#).unwrap();
    assert_eq!(settings.signal_height, 40);
    assert_eq!(settings.pixel_per_sec, 100.0);
    assert_eq!(settings.preferred_y_grid_pixel_interval, 25);
    assert!(settings.all_event_types_selected);
}

#[test]
fn file_format_follows_extension() {
    let dir = std::env::temp_dir().join(format!("sigbrowse-settings-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    for name in ["browser.yaml", "browser.json"] {
        let path = dir.join(name);
        save_settings_to_path(&custom(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_start().starts_with('{'), name.ends_with(".json"), "{}", name);
        assert_eq!(load_settings_from_path(&path).unwrap(), custom());
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn loading_sanitizes_unusable_values() {
    let dir = std::env::temp_dir().join(format!("sigbrowse-sanitize-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bad.json");
    std::fs::write(&path, r#"{ "pixel_per_sec": -1.0, "signal_height": 0, "window_blocks": 0 }"#).unwrap();
    let settings = load_settings_from_path(&path).unwrap();
    let defaults = BrowserSettings::default();
    assert_eq!(settings.pixel_per_sec, defaults.pixel_per_sec);
    assert_eq!(settings.signal_height, defaults.signal_height);
    assert_eq!(settings.window_blocks, defaults.window_blocks);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_is_an_error() {
    let err = load_settings_from_path(std::path::Path::new("/nonexistent/sigbrowse.yaml")).unwrap_err();
    assert!(err.contains("Failed to read file"), "{}", err);
}

#[test]
fn model_round_trips_settings() {
    let reader = sigbrowse::shared_reader(sigbrowse::MemorySignalReader::synthetic(1, 8.0, 4, 1.0));
    let mut model = SignalBrowserModel::new(reader).unwrap();
    model.apply_settings(&custom());
    assert_eq!(model.settings(), custom());
    assert_eq!(model.pixel_per_sec(), 250.0);
    assert!(model.release_buffer());
    assert_eq!(model.buffer().options().whole_buffer, WholeBufferMode::Full);
    assert!(!model.is_event_type_shown(1));
    assert!(model.is_event_type_shown(0x0300));
}
