use gemcase_core::codec::{self, CodecError};
use gemcase_core::model::item::FieldKind;
use gemcase_core::query;
use gemcase_core::service::{catalog_service, template_service};
use gemcase_core::store::{ChangeEvent, ItemStore};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn sample_store() -> ItemStore {
    let mut store = ItemStore::new();
    catalog_service::new_project(&mut store, "specimens").unwrap();
    let template = catalog_service::add_template(&mut store, "Minerals", false).unwrap();
    let column = query::template_columns(&store, template).unwrap()[0];
    template_service::add_field(&mut store, template, column, "Name", FieldKind::Text).unwrap();
    let shelf = catalog_service::add_collection(&mut store, "Shelf", "", template).unwrap();
    catalog_service::add_entry(&mut store, "Quartz", shelf, &[]).unwrap();
    store
}

fn project_file(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("rocks.mdat")
}

#[test]
fn save_load_round_trip_preserves_items_and_allocator() {
    let dir = tempfile::tempdir().unwrap();
    let path = project_file(&dir);
    let store = sample_store();

    codec::save(&store, &path).unwrap();
    let loaded = codec::load(&path).unwrap();

    assert_eq!(loaded.len(), store.len());
    assert_eq!(loaded.next_id(), store.next_id());
    for (original, restored) in store.items().iter().zip(loaded.items()) {
        assert_eq!(original.id, restored.id);
        assert_eq!(original.body.kind(), restored.body.kind());
        assert_eq!(original.body.name(), restored.body.name());
    }
}

#[test]
fn ids_are_not_reused_after_a_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = project_file(&dir);
    let store = sample_store();
    let highest = store.items().iter().map(|item| item.id.0).max().unwrap();
    codec::save(&store, &path).unwrap();

    let mut loaded = codec::load(&path).unwrap();
    let fresh = catalog_service::add_template(&mut loaded, "Fossils", false).unwrap();
    assert!(fresh.0 > highest);
}

#[test]
fn load_into_replaces_contents_with_a_single_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = project_file(&dir);
    codec::save(&sample_store(), &path).unwrap();

    let mut target = ItemStore::new();
    catalog_service::new_project(&mut target, "scratch").unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    target.subscribe(Box::new(move |event: &ChangeEvent| {
        sink.lock().unwrap().push(*event);
    }));

    codec::load_into(&mut target, &path).unwrap();

    assert_eq!(*events.lock().unwrap(), vec![ChangeEvent::Reset]);
    assert_eq!(target.len(), sample_store().len());
}

#[test]
fn a_newer_format_revision_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = project_file(&dir);
    fs::write(&path, r#"{"format":99,"next_id":1,"items":[]}"#).unwrap();

    assert!(matches!(
        codec::load(&path),
        Err(CodecError::UnsupportedFormat { found: 99, .. })
    ));
}

#[test]
fn duplicate_ids_are_rejected_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = project_file(&dir);
    let item = r#"{"id":1,"kind":"database","name":"x","description":"","default_edit_mode":true}"#;
    fs::write(
        &path,
        format!(r#"{{"format":1,"next_id":5,"items":[{item},{item}]}}"#),
    )
    .unwrap();

    assert!(matches!(codec::load(&path), Err(CodecError::Corrupt(_))));
}

#[test]
fn ids_at_or_above_the_allocator_are_rejected_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = project_file(&dir);
    fs::write(
        &path,
        r#"{"format":1,"next_id":1,"items":[{"id":1,"kind":"database","name":"x","description":"","default_edit_mode":true}]}"#,
    )
    .unwrap();

    assert!(matches!(codec::load(&path), Err(CodecError::Corrupt(_))));
}

#[test]
fn unreadable_files_surface_parse_and_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = project_file(&dir);

    assert!(matches!(codec::load(&path), Err(CodecError::Io(_))));

    fs::write(&path, "not json at all").unwrap();
    assert!(matches!(codec::load(&path), Err(CodecError::Parse(_))));
}

#[test]
fn a_failed_load_into_leaves_the_target_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = project_file(&dir);
    fs::write(&path, r#"{"format":99,"next_id":1,"items":[]}"#).unwrap();

    let mut target = ItemStore::new();
    catalog_service::new_project(&mut target, "scratch").unwrap();
    let before = target.len();

    assert!(codec::load_into(&mut target, &path).is_err());
    assert_eq!(target.len(), before);
}
