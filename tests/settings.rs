use modlist::item::{PrimaryCategory, HAIR};
use modlist::settings::{
    relocate_directory, ColorSlot, ExportFormat, ManagedDir, Settings, SettingsModel, SettingsProperty,
    BROWN_DEFAULT,
};
use modlist::{FilterMode, SortMode};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

#[test]
fn settings_survive_a_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config").join("settings.bin");

    let mut settings = Settings::default();
    settings.game_dir = tmp.path().join("game").join("sqpack").join("ffxiv");
    settings.default_author = "Someone".to_string();
    settings.mod_list_filter = FilterMode::ModPack.as_setting().to_string();
    settings.export_formats.set(ExportFormat::Png, true);
    settings.save_to(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(loaded.filter_mode(), FilterMode::ModPack);
    assert_eq!(loaded.sort_mode(), SortMode::Name);
}

#[test]
fn corrupt_settings_fall_back_to_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("settings.bin");
    fs::write(&path, [0xff, 0x00, 0x13]).unwrap();

    assert!(Settings::load_from(&path).is_err());
    assert_eq!(Settings::load_or_default(&path), Settings::default());
    assert_eq!(Settings::load_or_default(&tmp.path().join("missing.bin")), Settings::default());
}

#[test]
fn setters_persist_and_notify() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("settings.bin");
    let mut model = SettingsModel::with_path(path.clone());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    model.notifier().subscribe(move |p: &SettingsProperty| sink.borrow_mut().push(*p));

    model.set_color(ColorSlot::Hair, [10, 20, 30, 255]).unwrap();
    model.set_skin_type("Raen").unwrap();
    model.set_export_format(ExportFormat::Bmp, true).unwrap();

    assert_eq!(
        *seen.borrow(),
        [
            SettingsProperty::Color(ColorSlot::Hair),
            SettingsProperty::SkinType,
            SettingsProperty::ExportFormats,
        ]
    );

    let reloaded = SettingsModel::with_path(path);
    assert_eq!(reloaded.color(ColorSlot::Hair), [10, 20, 30, 255]);
    assert_eq!(reloaded.settings().skin_type, "Raen");
    assert!(reloaded.settings().export_formats.bmp);
}

#[test]
fn reset_restores_default_colors() {
    let mut model = SettingsModel::in_memory(Settings::default());
    model.set_color(ColorSlot::Iris, [1, 2, 3, 4]).unwrap();
    model.reset_colors().unwrap();
    assert_eq!(model.settings().color(ColorSlot::Iris), BROWN_DEFAULT);
}

#[test]
fn author_is_saved_on_commit_only() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("settings.bin");
    let mut model = SettingsModel::with_path(path.clone());

    model.author_draft_mut().push_str("Modder");
    assert_eq!(model.settings().default_author, "");
    model.commit_author().unwrap();
    assert_eq!(model.settings().default_author, "Modder");
    assert_eq!(Settings::load_from(&path).unwrap().default_author, "Modder");
}

#[test]
fn import_options_are_only_remembered_for_their_category() {
    let mut model = SettingsModel::in_memory(Settings::default());

    model.set_force_uv1_quadrant(Some(PrimaryCategory::Character), true).unwrap();
    assert!(!model.settings().force_uv1_quadrant);
    model.set_force_uv1_quadrant(Some(PrimaryCategory::Gear), true).unwrap();
    assert!(model.settings().force_uv1_quadrant);

    model.set_clone_uv1_to_uv2("Body", true).unwrap();
    assert!(!model.settings().clone_uv1_to_uv2);
    model.set_clone_uv1_to_uv2(HAIR, true).unwrap();
    assert!(model.settings().clone_uv1_to_uv2);
}

#[test]
fn moving_a_directory_takes_its_files() {
    let tmp = tempfile::tempdir().unwrap();
    let old = tmp.path().join("Saved");
    let new = tmp.path().join("elsewhere").join("Saved");
    fs::create_dir_all(old.join("Body").join("Top")).unwrap();
    fs::write(old.join("Body").join("Top").join("a.png"), b"png").unwrap();

    let mut settings = Settings::default();
    settings.save_dir = old.clone();
    let mut model = SettingsModel::in_memory(settings);
    model.set_dir(ManagedDir::Save, new.clone(), true).unwrap();

    assert_eq!(model.dir(ManagedDir::Save), new.as_path());
    assert!(new.join("Body").join("Top").join("a.png").is_file());
    assert!(!old.exists());
}

#[test]
fn changing_a_directory_without_moving_leaves_files() {
    let tmp = tempfile::tempdir().unwrap();
    let old = tmp.path().join("Backups");
    fs::create_dir_all(&old).unwrap();
    fs::write(old.join("index.bak"), b"x").unwrap();

    let mut settings = Settings::default();
    settings.backup_dir = old.clone();
    let mut model = SettingsModel::in_memory(settings);
    model.set_dir(ManagedDir::Backup, tmp.path().join("New"), false).unwrap();

    assert!(old.join("index.bak").is_file());
    assert!(!tmp.path().join("New").exists());
}

#[test]
fn relocating_a_missing_directory_is_a_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    relocate_directory(&tmp.path().join("nope"), &tmp.path().join("there")).unwrap();
    assert!(!tmp.path().join("there").exists());
}
