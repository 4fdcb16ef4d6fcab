mod support;

use parse_dashboard_lib::test_support;
use serde_json::json;
use support::{json_bool, json_str};

fn enable_protection(handle: &tauri::AppHandle<tauri::test::MockRuntime>) {
    let mut settings = test_support::settings_read_json(handle).expect("read settings");
    settings["is_setup"] = json!(true);
    settings["passkey"] = json!(1357);
    settings["is_protected"] = json!(true);
    test_support::settings_write_json(handle, settings).expect("write settings");
}

#[test]
fn fresh_install_lists_servers() {
    let app = support::TestApp::new();
    let handle = app.handle();

    let status = test_support::access_status_json(&handle).expect("status");
    assert_eq!(json_str(&status, "phase"), "not_setup");
    assert!(json_bool(&status, "access_enabled"));

    test_support::server_create_json(
        &handle,
        json!({"name": "Dev", "server_url": "http://localhost:1337/parse"}),
    )
    .expect("create");
    let list = test_support::servers_list_json(&handle).expect("list");
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[test]
fn locked_gate_refuses_listing_and_clears_presented_list() {
    let app = support::TestApp::new();
    let handle = app.handle();

    test_support::server_create_json(
        &handle,
        json!({"name": "Dev", "server_url": "http://localhost:1337/parse"}),
    )
    .expect("create");
    test_support::server_select_json(&handle, 1).expect("selectable while open");
    enable_protection(&handle);

    let status = test_support::access_status_json(&handle).expect("status");
    assert_eq!(json_str(&status, "phase"), "locked");
    assert!(!json_bool(&status, "is_granted"));

    let err = test_support::servers_list_json(&handle).expect_err("locked");
    assert_eq!(err.code(), "ACCESS_DENIED");
    assert_eq!(err.message(), "Authorization required to load saved servers");

    let shown = test_support::presented_servers_json(&handle).expect("presented");
    assert_eq!(shown.as_array().map(Vec::len), Some(0));

    // Selection only sees the presented list, which the refused load just emptied.
    let err = test_support::server_select_json(&handle, 1).expect_err("nothing to select");
    assert_eq!(err.code(), "DB_NOT_FOUND");
}

#[test]
fn destroy_reopens_gate_and_clears_credential() {
    let app = support::TestApp::new();
    let handle = app.handle();

    enable_protection(&handle);
    let status = test_support::access_destroy_json(&handle).expect("destroy");
    assert_eq!(json_str(&status, "phase"), "not_setup");
    assert!(json_bool(&status, "access_enabled"));

    let settings = test_support::settings_read_json(&handle).expect("read settings");
    assert!(!json_bool(&settings, "is_setup"));
    assert!(!json_bool(&settings, "is_protected"));
    assert!(settings["passkey"].is_null());

    test_support::servers_list_json(&handle).expect("list after destroy");
}
