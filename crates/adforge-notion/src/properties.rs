//! Property payload builders and page value extraction.
//!
//! Notion property payloads are keyed by the property type configured on
//! the target database, so builders take the introspected type and adapt.
//! Unknown text-ish types fall back to rich_text.

use serde_json::{json, Value};

fn text_value(value: &str) -> Value {
    json!({"type": "text", "text": {"content": value}})
}

/// Build a text-carrying property payload for the given property type.
pub fn build_text(prop_type: &str, value: &str) -> Value {
    match prop_type {
        "title" => json!({"title": [text_value(value)]}),
        "rich_text" => json!({"rich_text": [text_value(value)]}),
        "select" => json!({"select": {"name": value}}),
        "multi_select" => json!({"multi_select": [{"name": value}]}),
        "status" => json!({"status": {"name": value}}),
        "url" => json!({"url": value}),
        _ => json!({"rich_text": [text_value(value)]}),
    }
}

/// Build a checkbox property payload.
pub fn build_checkbox(value: bool) -> Value {
    json!({"checkbox": value})
}

/// Build a number property payload.
pub fn build_number(value: u32) -> Value {
    json!({"number": value})
}

/// Extract the plain text behind a property value, whatever its type.
pub fn extract_text(prop: &Value) -> Option<String> {
    let prop_type = prop.get("type")?.as_str()?;
    match prop_type {
        "title" | "rich_text" => prop
            .get(prop_type)?
            .as_array()?
            .first()?
            .get("plain_text")?
            .as_str()
            .map(str::to_string),
        "select" | "status" => prop
            .get(prop_type)?
            .get("name")?
            .as_str()
            .map(str::to_string),
        "url" | "created_time" => prop.get(prop_type)?.as_str().map(str::to_string),
        _ => None,
    }
}

/// Extract a checkbox value.
pub fn extract_bool(prop: &Value) -> Option<bool> {
    match prop.get("type")?.as_str()? {
        "checkbox" => prop.get("checkbox")?.as_bool(),
        _ => None,
    }
}

/// Extract a number value.
pub fn extract_number(prop: &Value) -> Option<f64> {
    match prop.get("type")?.as_str()? {
        "number" => prop.get("number")?.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_text_by_type() {
        assert_eq!(
            build_text("title", "SET-1"),
            json!({"title": [{"type": "text", "text": {"content": "SET-1"}}]})
        );
        assert_eq!(
            build_text("select", "Awareness"),
            json!({"select": {"name": "Awareness"}})
        );
        assert_eq!(
            build_text("status", "Generated"),
            json!({"status": {"name": "Generated"}})
        );
        assert_eq!(
            build_text("url", "https://cdn.example/x.mp4"),
            json!({"url": "https://cdn.example/x.mp4"})
        );
    }

    #[test]
    fn test_build_text_unknown_type_falls_back_to_rich_text() {
        assert_eq!(
            build_text("formula", "value"),
            json!({"rich_text": [{"type": "text", "text": {"content": "value"}}]})
        );
    }

    #[test]
    fn test_extract_text() {
        let prop = json!({"type": "rich_text", "rich_text": [{"plain_text": "hello"}]});
        assert_eq!(extract_text(&prop).as_deref(), Some("hello"));

        let prop = json!({"type": "status", "status": {"name": "Generated"}});
        assert_eq!(extract_text(&prop).as_deref(), Some("Generated"));

        let prop = json!({"type": "rich_text", "rich_text": []});
        assert_eq!(extract_text(&prop), None);
    }

    #[test]
    fn test_extract_bool_and_number() {
        assert_eq!(
            extract_bool(&json!({"type": "checkbox", "checkbox": true})),
            Some(true)
        );
        assert_eq!(
            extract_number(&json!({"type": "number", "number": 3})),
            Some(3.0)
        );
        assert_eq!(extract_number(&json!({"type": "number", "number": null})), None);
    }
}
