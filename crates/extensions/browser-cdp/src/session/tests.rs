use serde_json::json;

use super::core::PageSession;

#[test]
fn test_quad_center() {
    let quad = vec![0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0];
    assert_eq!(PageSession::quad_center(&quad), (50.0, 50.0));
}

#[test]
fn test_quad_center_short_quad() {
    assert_eq!(PageSession::quad_center(&[1.0, 2.0]), (0.0, 0.0));
}

#[test]
fn test_get_modifiers() {
    assert_eq!(PageSession::get_modifiers(&["Control", "Shift"]), 10);
    assert_eq!(PageSession::get_modifiers(&["Meta"]), 4);
    assert_eq!(PageSession::get_modifiers(&["cmd", "alt"]), 5);
    assert_eq!(PageSession::get_modifiers(&["a"]), 0);
}

#[test]
fn test_enter_inserts_carriage_return() {
    let def = PageSession::key_definition("Enter");
    assert_eq!(def.key_code, 13);
    assert_eq!(def.text.as_deref(), Some("\r"));
}

#[test]
fn test_letter_key_definition() {
    let def = PageSession::key_definition("a");
    assert_eq!(def.code, "KeyA");
    assert_eq!(def.key_code, 65);
    assert_eq!(def.text.as_deref(), Some("a"));

    let digit = PageSession::key_definition("7");
    assert_eq!(digit.code, "Digit7");
}

#[test]
fn test_escape_has_no_text() {
    let def = PageSession::key_definition("Escape");
    assert_eq!(def.key_code, 27);
    assert!(def.text.is_none());
}

#[test]
fn test_exception_text_prefers_description() {
    let details = json!({
        "text": "Uncaught",
        "exception": { "description": "TypeError: x is null" }
    });
    assert_eq!(PageSession::exception_text(&details), "TypeError: x is null");
    assert_eq!(
        PageSession::exception_text(&json!({ "text": "Uncaught" })),
        "Uncaught"
    );
}
