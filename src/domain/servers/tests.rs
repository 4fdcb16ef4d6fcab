use super::*;

fn test_db() -> (tempfile::TempDir, db::Db) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = db::init_for_tests(&dir.path().join("servers.db")).expect("init db");
    (dir, db)
}

fn input(name: &str, application_id: &str, master_key: &str, server_url: &str) -> ServerConfigInput {
    ServerConfigInput {
        name: name.to_string(),
        application_id: application_id.to_string(),
        master_key: master_key.to_string(),
        server_url: server_url.to_string(),
    }
}

fn open_gate() -> AccessGate {
    AccessGate::from_parts(false, false)
}

#[test]
fn create_then_list_returns_equal_fields() {
    let (_dir, db) = test_db();
    let created = create(
        &db,
        input("Prod", "app123", "mk456", "https://api.example.com/parse"),
    )
    .expect("create");

    let items = list(&db, &open_gate()).expect("list");
    assert_eq!(items.len(), 1);
    assert!(items[0].same_fields(&created));
    assert_eq!(items[0].icon, None);
}

#[test]
fn input_fields_are_trimmed_and_may_be_empty() {
    let (_dir, db) = test_db();
    let created = create(&db, input("  Staging ", "", "", " http://localhost:1337/parse "))
        .expect("create");
    assert_eq!(created.name, "Staging");
    assert_eq!(created.application_id, "");
    assert_eq!(created.server_url, "http://localhost:1337/parse");
}

#[test]
fn server_url_must_be_absolute_http_url() {
    let (_dir, db) = test_db();
    for bad in ["", "api.example.com", "ftp://example.com", "not a url"] {
        let err = create(&db, input("Bad", "a", "k", bad)).expect_err(bad);
        assert_eq!(err.code(), "SEC_INVALID_INPUT", "{bad}");
    }
    assert!(list(&db, &open_gate()).expect("list").is_empty());
}

#[test]
fn list_is_refused_while_locked() {
    let (_dir, db) = test_db();
    create(&db, input("Prod", "a", "k", "https://x.example.com")).expect("create");

    let err = list(&db, &AccessGate::from_parts(true, false)).expect_err("locked");
    assert_eq!(err.code(), "ACCESS_DENIED");
    assert_eq!(err.message(), ACCESS_REQUIRED_MESSAGE);

    let items = list(&db, &AccessGate::from_parts(true, true)).expect("unlocked");
    assert_eq!(items.len(), 1);
}

#[test]
fn list_keeps_insertion_order() {
    let (_dir, db) = test_db();
    for name in ["A", "B", "C"] {
        create(&db, input(name, "a", "k", "https://x.example.com")).expect("create");
    }
    let names: Vec<String> = list(&db, &open_gate())
        .expect("list")
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn update_replaces_text_fields_and_keeps_icon() {
    let (_dir, db) = test_db();
    let created = create(&db, input("Prod", "app123", "mk456", "https://api.example.com/parse"))
        .expect("create");
    set_icon(&db, created.id, Some(vec![0xFF, 0xD8, 0xFF])).expect("icon");

    let updated = update(
        &db,
        created.id,
        input("Prod", "app123", "mk456", "https://api2.example.com/parse"),
    )
    .expect("update");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.server_url, "https://api2.example.com/parse");
    assert_eq!(updated.icon, Some(vec![0xFF, 0xD8, 0xFF]));
}

#[test]
fn update_unknown_id_is_not_found() {
    let (_dir, db) = test_db();
    let err = update(&db, 999, input("X", "a", "k", "https://x.example.com")).expect_err("missing");
    assert_eq!(err.code(), "DB_NOT_FOUND");
}

#[test]
fn set_icon_none_or_empty_clears_icon() {
    let (_dir, db) = test_db();
    let created = create(&db, input("Prod", "a", "k", "https://x.example.com")).expect("create");

    let with_icon = set_icon(&db, created.id, Some(vec![1, 2, 3])).expect("set");
    assert_eq!(with_icon.icon, Some(vec![1, 2, 3]));

    let cleared = set_icon(&db, created.id, Some(Vec::new())).expect("clear empty");
    assert_eq!(cleared.icon, None);

    set_icon(&db, created.id, Some(vec![4])).expect("set again");
    let cleared = set_icon(&db, created.id, None).expect("clear none");
    assert_eq!(cleared.icon, None);
}

#[test]
fn duplicate_creates_distinct_record_without_icon() {
    let (_dir, db) = test_db();
    let source = create(&db, input("Prod", "app123", "mk456", "https://api.example.com/parse"))
        .expect("create");
    set_icon(&db, source.id, Some(vec![9, 9])).expect("icon");

    let copy = duplicate(&db, source.id).expect("duplicate");
    assert_ne!(copy.id, source.id);
    assert!(copy.same_fields(&source));
    assert_eq!(copy.icon, None);

    delete(&db, source.id).expect("delete source");
    let remaining = list(&db, &open_gate()).expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, copy.id);
}

#[test]
fn delete_removes_exactly_one_record() {
    let (_dir, db) = test_db();
    let a = create(&db, input("A", "a", "k", "https://a.example.com")).expect("a");
    let b = create(&db, input("B", "a", "k", "https://b.example.com")).expect("b");

    delete(&db, a.id).expect("delete");
    let items = list(&db, &open_gate()).expect("list");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, b.id);

    let err = delete(&db, a.id).expect_err("already gone");
    assert_eq!(err.code(), "DB_NOT_FOUND");
}

#[test]
fn serialized_icon_is_base64() {
    let (_dir, db) = test_db();
    let created = create(&db, input("Prod", "a", "k", "https://x.example.com")).expect("create");
    let with_icon = set_icon(&db, created.id, Some(b"jpeg".to_vec())).expect("icon");

    let json = serde_json::to_value(&with_icon).expect("serialize");
    assert_eq!(json["icon_base64"], "anBlZw==");
    assert!(json.get("icon").is_none());
}

#[test]
fn debug_output_masks_master_key() {
    let (_dir, db) = test_db();
    let created = create(
        &db,
        input("Prod", "app123", "mk456-production-key", "https://x.example.com"),
    )
    .expect("create");
    let rendered = format!("{created:?} {:?}", created.context());
    assert!(!rendered.contains("mk456-production-key"));
    assert!(rendered.contains("mk45...ey"));
}
