mod common;

use common::{gear, FakeArchive};
use modlist::item::classify;
use modlist::preview::{build_preview_rows, PreviewEvent, PREFETCH_THRESHOLD};
use modlist::thumbnail::Thumbnail;
use modlist::{DecodeError, ModEntry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn entries(count: usize) -> Vec<ModEntry> {
    (0..count)
        .map(|i| gear("Top", "Body", &format!("v01_c0101e0037_top_{i}"), None))
        .collect()
}

fn run(entries: &[ModEntry], archive: &FakeArchive, cancel: &AtomicBool) -> Vec<PreviewEvent> {
    let item = classify(&entries[0]).unwrap();
    let mut events = Vec::new();
    build_preview_rows(&item, entries, archive, cancel, |e| events.push(e));
    events
}

fn kinds(events: &[PreviewEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| match e {
            PreviewEvent::Row(_) => "row".to_string(),
            PreviewEvent::Progress { current, total } => format!("{current}/{total}"),
            PreviewEvent::Error(_) => "error".to_string(),
        })
        .collect()
}

#[test]
fn a_failed_entry_is_reported_and_counted() {
    let list = entries(5);
    let archive = FakeArchive::new().failing(&list[2].full_path);
    let events = run(&list, &archive, &AtomicBool::new(false));

    assert_eq!(
        kinds(&events),
        ["row", "1/5", "row", "2/5", "error", "3/5", "row", "4/5", "row", "5/5"]
    );
    let failed = events.iter().find_map(|e| match e {
        PreviewEvent::Error(err) => Some(err),
        _ => None,
    });
    assert!(matches!(failed, Some(DecodeError::Texture { .. })));
    assert_eq!(failed.unwrap().path(), list[2].full_path);
}

#[test]
fn an_unreadable_material_keeps_its_row() {
    let mut material = gear("Top", "Body", "unused", None);
    material.full_path = "chara/equipment/e0037/material/v0001/mt_c0101e0037_top_a.mtrl".to_string();
    let archive = FakeArchive::new().failing(&material.full_path);
    let events = run(&[material.clone()], &archive, &AtomicBool::new(false));

    assert_eq!(kinds(&events), ["error", "row", "1/1"]);
    assert!(matches!(&events[0], PreviewEvent::Error(DecodeError::Material { path, .. }) if *path == material.full_path));
    match &events[1] {
        PreviewEvent::Row(row) => {
            assert_eq!(row.thumbnail, Thumbnail::None);
            assert_eq!(row.entry.full_path, material.full_path);
        }
        other => panic!("expected a row, got {other:?}"),
    }
}

#[test]
fn rows_follow_entry_order() {
    let list = entries(3);
    let events = run(&list, &FakeArchive::new(), &AtomicBool::new(false));
    let paths: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            PreviewEvent::Row(row) => Some(row.entry.full_path.as_str()),
            _ => None,
        })
        .collect();
    let expected: Vec<&str> = list.iter().map(|e| e.full_path.as_str()).collect();
    assert_eq!(paths, expected);
}

#[test]
fn cancel_stops_before_the_in_flight_row() {
    let list = entries(5);
    let cancel = Arc::new(AtomicBool::new(false));
    let archive = FakeArchive::new().cancel_on_read(3, Arc::clone(&cancel));
    let events = run(&list, &archive, &cancel);

    assert_eq!(kinds(&events), ["row", "1/5", "row", "2/5"]);
    assert_eq!(archive.texture_reads.load(Ordering::SeqCst), 3);
}

#[test]
fn cancelled_before_start_emits_nothing() {
    let list = entries(4);
    let archive = FakeArchive::new();
    let events = run(&list, &archive, &AtomicBool::new(true));
    assert!(events.is_empty());
    assert_eq!(archive.texture_reads.load(Ordering::SeqCst), 0);
}

#[test]
fn many_textures_share_a_prefetched_index() {
    let list = entries(PREFETCH_THRESHOLD + 1);
    let archive = FakeArchive::new();
    let events = run(&list, &archive, &AtomicBool::new(false));

    assert_eq!(archive.index_loads.load(Ordering::SeqCst), 1);
    assert_eq!(archive.indexed_reads.load(Ordering::SeqCst), list.len());
    assert_eq!(events.iter().filter(|e| matches!(e, PreviewEvent::Row(_))).count(), list.len());
}

#[test]
fn few_textures_skip_the_index() {
    let list = entries(PREFETCH_THRESHOLD);
    let archive = FakeArchive::new();
    run(&list, &archive, &AtomicBool::new(false));

    assert_eq!(archive.index_loads.load(Ordering::SeqCst), 0);
    assert_eq!(archive.indexed_reads.load(Ordering::SeqCst), 0);
}

#[test]
fn failed_prefetch_falls_back_to_single_reads() {
    let list = entries(PREFETCH_THRESHOLD + 2);
    let archive = FakeArchive::new().failing_index();
    let events = run(&list, &archive, &AtomicBool::new(false));

    assert!(matches!(events[0], PreviewEvent::Error(DecodeError::Index { .. })));
    assert_eq!(archive.indexed_reads.load(Ordering::SeqCst), 0);
    assert_eq!(archive.texture_reads.load(Ordering::SeqCst), list.len());
    assert_eq!(events.iter().filter(|e| matches!(e, PreviewEvent::Row(_))).count(), list.len());
    assert!(matches!(
        events.last(),
        Some(PreviewEvent::Progress { current, total }) if current == total
    ));
}

#[test]
fn thumbnails_by_file_kind() {
    let mut model = gear("Top", "Body", "unused", None);
    model.full_path = "chara/equipment/e0037/model/c0101e0037_top.mdl".to_string();
    let mut material = gear("Top", "Body", "unused", None);
    material.full_path = "chara/equipment/e0037/material/v0001/mt_c0101e0037_top_a.mtrl".to_string();
    let texture = gear("Top", "Body", "v01_c0101e0037_top_d", None);

    let archive = FakeArchive::new();
    let events = run(&[model, material, texture], &archive, &AtomicBool::new(false));
    let rows: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            PreviewEvent::Row(row) => Some(row),
            _ => None,
        })
        .collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].thumbnail, Thumbnail::ModelPlaceholder);
    let color_set = rows[1].thumbnail.image().unwrap();
    assert_eq!((color_set.width(), color_set.height()), (4, 16));
    assert_eq!(color_set.get_pixel(0, 0).0, [255, 255, 255, 255]);
    let tex = rows[2].thumbnail.image().unwrap();
    assert_eq!((tex.width(), tex.height()), (2, 2));

    assert_eq!(archive.color_set_reads.load(Ordering::SeqCst), 1);
    assert_eq!(archive.texture_reads.load(Ordering::SeqCst), 1);
}

#[test]
fn row_state_mirrors_entry() {
    let mut disabled = gear("Top", "Body", "a", None);
    disabled.enabled = false;
    let mut added = gear("Top", "Body", "b", None);
    added.data.original_offset = added.data.mod_offset;

    let events = run(&[disabled, added], &FakeArchive::new(), &AtomicBool::new(false));
    let rows: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            PreviewEvent::Row(row) => Some(row),
            _ => None,
        })
        .collect();

    assert!(!rows[0].active.is_enabled());
    assert!(rows[0].toggleable);
    assert!(rows[1].active.is_enabled());
    assert!(!rows[1].toggleable);
}
