use super::harness::{load_page, run, run_fail};

#[test]
#[ignore]
fn test_accept_alert() {
    load_page("alerts.html");

    run(&["click", "alert"]);
    run(&["wait-dialog"]);

    let text = run(&["dialog-text"]);
    assert_eq!(text.trim(), "cheese", "alert text should be 'cheese': {text}");

    run(&["accept"]);

    // If we can perform any action, we're good to go
    let title = run(&["title"]);
    assert_eq!(title.trim(), "Testing Alerts");
}

#[test]
#[ignore]
fn test_dismiss_alert() {
    load_page("alerts.html");

    run(&["click", "alert"]);
    run(&["wait-dialog"]);
    run(&["dismiss"]);

    let title = run(&["title"]);
    assert_eq!(title.trim(), "Testing Alerts");
}

#[test]
#[ignore]
fn test_prompt_keys_land_in_result() {
    load_page("alerts.html");

    run(&["click", "prompt"]);
    run(&["wait-dialog"]);
    run(&["dialog-keys", "cheese"]);
    run(&["accept"]);

    let value = run(&["text", "text"]);
    assert_eq!(value.trim(), "cheese", "prompt result should be 'cheese': {value}");
}

#[test]
#[ignore]
fn test_prompt_default_value_on_plain_accept() {
    load_page("alerts.html");

    run(&["click", "prompt-with-default"]);
    run(&["wait-dialog"]);
    run(&["accept"]);

    let value = run(&["text", "text"]);
    assert_eq!(value.trim(), "This is a default value");
}

#[test]
#[ignore]
fn test_prompt_null_when_dismissed() {
    load_page("alerts.html");

    run(&["click", "prompt-with-default"]);
    run(&["wait-dialog"]);
    run(&["dismiss"]);

    let value = run(&["text", "text"]);
    assert_eq!(value.trim(), "null");
}

#[test]
#[ignore]
fn test_double_prompt_resolves_in_order() {
    load_page("alerts.html");

    run(&["click", "double-prompt"]);

    run(&["wait-dialog"]);
    run(&["dialog-keys", "brie"]);
    run(&["accept"]);

    run(&["wait-dialog"]);
    run(&["dialog-keys", "cheddar"]);
    run(&["accept"]);

    assert_eq!(run(&["text", "text1"]).trim(), "brie");
    assert_eq!(run(&["text", "text2"]).trim(), "cheddar");
}

#[test]
#[ignore]
fn test_alert_in_frame() {
    load_page("alerts.html");

    run(&["frame", "iframeWithAlert"]);
    run(&["click", "alertInFrame"]);
    run(&["wait-dialog"]);
    run(&["accept"]);

    let title = run(&["title"]);
    assert_eq!(title.trim(), "Testing Alerts");
}

#[test]
#[ignore]
fn test_onload_alert_via_navigate() {
    load_page("pageWithOnLoad.html");

    run(&["wait-dialog"]);
    let text = run(&["dialog-text"]);
    assert_eq!(text.trim(), "onload");
    run(&["accept"]);
}

#[test]
#[ignore]
fn test_wait_dialog_times_out_without_dialog() {
    load_page("alerts.html");

    let err = run_fail(&["wait-dialog", "-t", "500"]);
    assert!(
        err.contains("no dialog appeared"),
        "timeout error should say so: {err}"
    );
}
