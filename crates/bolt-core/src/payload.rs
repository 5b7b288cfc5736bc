//! Accessors over decoded inbound payloads.
//!
//! Payloads arrive as untyped JSON. Nothing in this module panics on a
//! missing or wrongly-typed field: every accessor returns `None` instead,
//! which the matchers treat as "does not match".

use serde_json::Value;

use crate::classifier::{
    is_attachment_action, is_block_actions, is_dialog_cancellation, is_dialog_submission, is_event,
    is_options, is_shortcut, is_slash_command, is_view_closed, is_view_submission,
    is_workflow_step_edit, is_workflow_step_save,
};

/// A decoded inbound payload.
pub type Body = Value;

/// Returns the string stored at `key`, if `value` is an object holding a string there.
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Returns the string at the end of `path`, walking nested objects.
pub fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .and_then(Value::as_str)
}

/// Returns `true` if `value` is an object that carries `key` (even when its value is `null`).
pub fn has_key(value: &Value, key: &str) -> bool {
    value.as_object().is_some_and(|obj| obj.contains_key(key))
}

// =============================================================================
// Kind-specific views
// =============================================================================

/// Returns the payload itself when it is a slash command.
pub fn to_command(body: &Value) -> Option<&Value> {
    is_slash_command(body).then_some(body)
}

/// Returns the inner `event` object of an Events API payload.
pub fn to_event(body: &Value) -> Option<&Value> {
    if is_event(body) {
        body.get("event")
    } else {
        None
    }
}

/// Returns the inner `event` object when it is a `message` event.
pub fn to_message(body: &Value) -> Option<&Value> {
    to_event(body).filter(|event| str_field(event, "type") == Some("message"))
}

/// Returns the payload itself when it is a global or message shortcut.
pub fn to_shortcut(body: &Value) -> Option<&Value> {
    is_shortcut(body).then_some(body)
}

/// Returns the single action entry of an action payload.
///
/// Block actions and attachment actions carry an `actions` array; the first
/// entry is the one the user interacted with. Dialog and workflow-step payloads
/// carry their identifiers at the top level, so the payload itself is returned.
pub fn to_action(body: &Value) -> Option<&Value> {
    if is_block_actions(body) || is_attachment_action(body) {
        body.get("actions").and_then(|actions| actions.get(0))
    } else if is_dialog_submission(body) || is_dialog_cancellation(body) || is_workflow_step_edit(body)
    {
        Some(body)
    } else {
        None
    }
}

/// Returns the payload itself when it requests external select options.
pub fn to_options(body: &Value) -> Option<&Value> {
    is_options(body).then_some(body)
}

/// Returns the `view` object of a view submission, view closed or workflow-step save.
pub fn to_view(body: &Value) -> Option<&Value> {
    if is_view_submission(body) || is_view_closed(body) || is_workflow_step_save(body) {
        body.get("view")
    } else {
        None
    }
}

// =============================================================================
// Identifier extraction
// =============================================================================

/// Reads an identifier stored either as a plain string or as `{ "id": "..." }`.
fn id_of<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    match value.get(key)? {
        Value::String(id) => Some(id),
        Value::Object(obj) => obj.get("id").and_then(Value::as_str),
        _ => None,
    }
}

fn first_authorization(body: &Value) -> Option<&Value> {
    body.get("authorizations").and_then(|auths| auths.get(0))
}

/// Extracts the Enterprise Grid organization id, if the payload carries one.
pub fn extract_enterprise_id(body: &Value) -> Option<&str> {
    id_of(body, "enterprise")
        .or_else(|| first_authorization(body).and_then(extract_enterprise_id))
        .or_else(|| str_field(body, "enterprise_id"))
        .or_else(|| str_at(body, &["team", "enterprise_id"]))
        .or_else(|| body.get("event").and_then(extract_enterprise_id))
}

/// Extracts the workspace (team) id.
pub fn extract_team_id(body: &Value) -> Option<&str> {
    str_at(body, &["view", "app_installed_team_id"])
        .or_else(|| id_of(body, "team"))
        .or_else(|| first_authorization(body).and_then(extract_team_id))
        .or_else(|| str_field(body, "team_id"))
        .or_else(|| body.get("event").and_then(extract_team_id))
        .or_else(|| str_at(body, &["user", "team_id"]))
}

/// Extracts the id of the user who triggered the payload.
pub fn extract_user_id(body: &Value) -> Option<&str> {
    id_of(body, "user")
        .or_else(|| str_field(body, "user_id"))
        .or_else(|| body.get("event").and_then(extract_user_id))
}

/// Extracts the id of the channel the payload relates to.
pub fn extract_channel_id(body: &Value) -> Option<&str> {
    id_of(body, "channel")
        .or_else(|| str_field(body, "channel_id"))
        .or_else(|| body.get("event").and_then(extract_channel_id))
        .or_else(|| body.get("item").and_then(extract_channel_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_str_at_walks_nested_objects() {
        let body = json!({"view": {"callback_id": "modal"}});
        assert_eq!(str_at(&body, &["view", "callback_id"]), Some("modal"));
        assert_eq!(str_at(&body, &["view", "missing"]), None);
        assert_eq!(str_at(&json!("scalar"), &["view"]), None);
    }

    #[test]
    fn test_has_key_sees_null_values() {
        let body = json!({"subtype": null});
        assert!(has_key(&body, "subtype"));
        assert!(!has_key(&body, "other"));
        assert!(!has_key(&json!([1, 2]), "subtype"));
    }

    #[test]
    fn test_to_action_block_actions_returns_first_entry() {
        let body = json!({
            "type": "block_actions",
            "actions": [{"action_id": "a", "block_id": "b"}, {"action_id": "other"}]
        });
        let action = to_action(&body).unwrap();
        assert_eq!(str_field(action, "action_id"), Some("a"));
    }

    #[test]
    fn test_to_action_without_actions_is_none() {
        let body = json!({"type": "block_actions"});
        assert!(to_action(&body).is_none());
    }

    #[test]
    fn test_to_action_dialog_returns_body() {
        let body = json!({"type": "dialog_submission", "callback_id": "d"});
        assert_eq!(to_action(&body), Some(&body));
    }

    #[test]
    fn test_to_message_requires_message_event() {
        let message = json!({"type": "event_callback", "event": {"type": "message", "text": "hi"}});
        let reaction = json!({"type": "event_callback", "event": {"type": "reaction_added"}});
        assert!(to_message(&message).is_some());
        assert!(to_message(&reaction).is_none());
    }

    #[test]
    fn test_to_view_covers_workflow_step_save() {
        let body = json!({"type": "view_submission", "view": {"type": "workflow_step", "callback_id": "c"}});
        assert_eq!(str_field(to_view(&body).unwrap(), "callback_id"), Some("c"));
    }

    #[test]
    fn test_extract_ids_from_slash_command() {
        let body = json!({
            "command": "/hello",
            "team_id": "T1",
            "user_id": "U1",
            "channel_id": "C1",
            "enterprise_id": "E1"
        });
        assert_eq!(extract_team_id(&body), Some("T1"));
        assert_eq!(extract_user_id(&body), Some("U1"));
        assert_eq!(extract_channel_id(&body), Some("C1"));
        assert_eq!(extract_enterprise_id(&body), Some("E1"));
    }

    #[test]
    fn test_extract_ids_from_interactive_payload() {
        let body = json!({
            "type": "block_actions",
            "team": {"id": "T2", "enterprise_id": "E2"},
            "user": {"id": "U2", "team_id": "T2"},
            "channel": {"id": "C2"}
        });
        assert_eq!(extract_team_id(&body), Some("T2"));
        assert_eq!(extract_user_id(&body), Some("U2"));
        assert_eq!(extract_channel_id(&body), Some("C2"));
        assert_eq!(extract_enterprise_id(&body), Some("E2"));
    }

    #[test]
    fn test_extract_ids_from_event_payload() {
        let body = json!({
            "type": "event_callback",
            "authorizations": [{"team_id": "T3", "enterprise_id": null}],
            "event": {"type": "reaction_added", "user": "U3", "item": {"channel": "C3"}}
        });
        assert_eq!(extract_team_id(&body), Some("T3"));
        assert_eq!(extract_user_id(&body), Some("U3"));
        assert_eq!(extract_channel_id(&body), Some("C3"));
        assert_eq!(extract_enterprise_id(&body), None);
    }
}
