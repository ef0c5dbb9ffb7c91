use spanscope::filter_expr::{FilterOperator, FilterPredicate};
use spanscope::persistent::{builtin_views, make_uuid_from_seed, SavedView, Settings};

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load_from(&dir.path().join("persistent_data.json")).unwrap();
    assert_eq!(settings, Settings::default());
    assert!(settings.find_view("Errors").is_some());
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("persistent_data.json");

    let mut settings = Settings::default();
    settings.columns = "span.http.route, name".to_string();
    settings.upsert_view(SavedView::new(
        "Slow checkout",
        vec![
            FilterPredicate::new("resource.service.name", FilterOperator::Equal, "checkout"),
            FilterPredicate::new("span.http.status_code", FilterOperator::GreaterOrEqual, 500.0),
        ],
    ));
    settings.save_to(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded, settings);

    // Builtin views are not written to disk
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("Server spans"));
    assert!(raw.contains("Slow checkout"));
}

#[test]
fn test_upsert_replaces_user_view() {
    let mut settings = Settings::default();
    let view_count = settings.views.len();
    settings.upsert_view(SavedView::new(
        "mine",
        vec![FilterPredicate::new("kind", FilterOperator::Equal, "client")],
    ));
    settings.upsert_view(SavedView::new(
        "mine",
        vec![FilterPredicate::new("kind", FilterOperator::Equal, "server")],
    ));
    assert_eq!(settings.views.len(), view_count + 1);
    let view = settings.find_view("mine").unwrap();
    assert_eq!(view.filters[0].render(), "kind=server");
}

#[test]
fn test_builtin_view_ids_are_stable() {
    let views = builtin_views();
    assert_eq!(views[0].id, make_uuid_from_seed(&views[0].name));
    assert_eq!(builtin_views()[0].id, views[0].id);
    assert_ne!(views[0].id, views[1].id);
}
