//! Mouse and keyboard input.

use serde_json::{json, Value};
use tracing::debug;

use crate::error::CdpError;
use crate::protocol::{KeyEventType, MouseButton, MouseEventType};

use super::core::PageSession;

/// What `Input.dispatchKeyEvent` needs to know about a key.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct KeyDefinition {
    pub key: String,
    pub code: String,
    pub key_code: u32,
    pub text: Option<String>,
}

impl KeyDefinition {
    fn named(key: &str, key_code: u32, text: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            code: key.to_string(),
            key_code,
            text: text.map(str::to_string),
        }
    }
}

impl PageSession {
    /// Move to and click at viewport coordinates.
    pub async fn click(&self, x: f64, y: f64) -> Result<(), CdpError> {
        self.mouse_move(x, y).await?;
        for event in [MouseEventType::MousePressed, MouseEventType::MouseReleased] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": event,
                    "x": x,
                    "y": y,
                    "button": MouseButton::Left,
                    "clickCount": 1,
                })),
            )
            .await?;
        }

        debug!("Clicked at ({}, {})", x, y);
        Ok(())
    }

    pub async fn mouse_move(&self, x: f64, y: f64) -> Result<(), CdpError> {
        self.call(
            "Input.dispatchMouseEvent",
            Some(json!({
                "type": MouseEventType::MouseMoved,
                "x": x,
                "y": y,
            })),
        )
        .await?;
        Ok(())
    }

    /// Wheel-scroll with the pointer at (`x`, `y`).
    pub async fn scroll(&self, x: f64, y: f64, delta_y: f64) -> Result<(), CdpError> {
        self.call(
            "Input.dispatchMouseEvent",
            Some(json!({
                "type": MouseEventType::MouseWheel,
                "x": x,
                "y": y,
                "deltaX": 0,
                "deltaY": delta_y,
            })),
        )
        .await?;
        Ok(())
    }

    /// Insert text into the focused element.
    pub async fn type_text(&self, text: &str) -> Result<(), CdpError> {
        self.call("Input.insertText", Some(json!({ "text": text })))
            .await?;
        Ok(())
    }

    pub async fn press_key(&self, key: &str) -> Result<(), CdpError> {
        self.dispatch_key(&Self::key_definition(key), 0).await
    }

    /// Press `key` while holding `modifiers` (`Control`, `Shift`, `Alt`, `Meta`).
    pub async fn press_key_combo(&self, modifiers: &[&str], key: &str) -> Result<(), CdpError> {
        let flags = Self::get_modifiers(modifiers);
        let mut def = Self::key_definition(key);
        if flags & !8 != 0 {
            // Chords with Control/Alt/Meta must not insert the character.
            def.text = None;
        }
        self.dispatch_key(&def, flags).await
    }

    async fn dispatch_key(&self, def: &KeyDefinition, modifiers: i32) -> Result<(), CdpError> {
        let mut down = json!({
            "type": KeyEventType::KeyDown,
            "key": def.key,
            "code": def.code,
            "windowsVirtualKeyCode": def.key_code,
            "modifiers": modifiers,
        });
        if let Some(text) = &def.text {
            down["text"] = Value::String(text.clone());
        }
        self.call("Input.dispatchKeyEvent", Some(down)).await?;

        self.call(
            "Input.dispatchKeyEvent",
            Some(json!({
                "type": KeyEventType::KeyUp,
                "key": def.key,
                "code": def.code,
                "windowsVirtualKeyCode": def.key_code,
                "modifiers": modifiers,
            })),
        )
        .await?;
        Ok(())
    }

    /// Modifier bit flags: alt 1, ctrl 2, meta 4, shift 8.
    pub(super) fn get_modifiers(modifiers: &[&str]) -> i32 {
        let mut flags = 0;
        for m in modifiers {
            match m.to_lowercase().as_str() {
                "alt" => flags |= 1,
                "control" | "ctrl" => flags |= 2,
                "meta" | "command" | "cmd" => flags |= 4,
                "shift" => flags |= 8,
                _ => {}
            }
        }
        flags
    }

    pub(super) fn key_definition(key: &str) -> KeyDefinition {
        match key {
            "Enter" => KeyDefinition::named("Enter", 13, Some("\r")),
            "Escape" => KeyDefinition::named("Escape", 27, None),
            "Backspace" => KeyDefinition::named("Backspace", 8, None),
            "Tab" => KeyDefinition::named("Tab", 9, None),
            "Delete" => KeyDefinition::named("Delete", 46, None),
            "ArrowLeft" => KeyDefinition::named("ArrowLeft", 37, None),
            "ArrowUp" => KeyDefinition::named("ArrowUp", 38, None),
            "ArrowRight" => KeyDefinition::named("ArrowRight", 39, None),
            "ArrowDown" => KeyDefinition::named("ArrowDown", 40, None),
            " " | "Space" => KeyDefinition {
                key: " ".to_string(),
                code: "Space".to_string(),
                key_code: 32,
                text: Some(" ".to_string()),
            },
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() => {
                        let upper = c.to_ascii_uppercase();
                        let code = if c.is_ascii_digit() {
                            format!("Digit{}", c)
                        } else {
                            format!("Key{}", upper)
                        };
                        KeyDefinition {
                            key: other.to_string(),
                            code,
                            key_code: upper as u32,
                            text: Some(other.to_string()),
                        }
                    }
                    _ => KeyDefinition {
                        key: other.to_string(),
                        code: String::new(),
                        key_code: 0,
                        text: None,
                    },
                }
            }
        }
    }
}
