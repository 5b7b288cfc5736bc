//! Builtin matcher builders, one per listener category.
//!
//! Each builder takes a [`Constraint`] and an asynchrony flag, resolves the
//! constraint's shape once, and returns a matcher whose predicate closes over
//! the resolved pieces. Shape problems are configuration errors and are
//! reported here, at registration time; a payload that merely lacks the
//! inspected fields is an ordinary no-match.
//!
//! # Example
//!
//! ```rust,ignore
//! use bolt_core::{Constraint, ConstraintFields};
//! use bolt_framework::matcher_builders::{action, event, shortcut};
//!
//! let approve = action("approve_button", false)?;
//! let any_button = action(Constraint::pattern(r"^btn_")?, false)?;
//! let plain_messages = event(
//!     ConstraintFields::new().with("type", "message").with_null("subtype"),
//!     false,
//! )?;
//! let global = shortcut(
//!     ConstraintFields::new().with("type", "shortcut").with("callback_id", "open"),
//!     true,
//! )?;
//! ```

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use bolt_core::classifier::{
    is_attachment_action, is_block_actions, is_block_suggestion, is_dialog_cancellation,
    is_dialog_submission, is_dialog_suggestion, is_global_shortcut, is_message_shortcut,
    is_shortcut, is_slash_command, is_view_closed, is_view_submission, is_workflow_step_edit,
    is_workflow_step_execute, is_workflow_step_save,
};
use bolt_core::payload::{has_key, str_at, str_field, to_action, to_event, to_message};
use bolt_core::pattern::matches;
use bolt_core::{
    BoltError, BoltResult, Constraint, ConstraintFields, PayloadKind, StringMatcher,
    exclusive_kind,
};

use crate::matcher::{BoxedMatcher, build_listener_matcher};

// =============================================================================
// Shared helpers
// =============================================================================

fn matcher_name(category: ListenerCategory, constraint: &impl fmt::Display) -> String {
    format!("{category}({constraint})")
}

/// Requires a literal or pattern constraint.
fn id_matcher(category: ListenerCategory, constraint: &Constraint) -> BoltResult<StringMatcher> {
    constraint
        .as_string_matcher()
        .ok_or_else(|| BoltError::invalid_shape(category.as_str(), constraint))
}

/// Reads the literal `type` discriminator of a structured constraint.
fn discriminator(category: ListenerCategory, fields: &ConstraintFields) -> BoltResult<&str> {
    match fields.get("type") {
        Some(Some(StringMatcher::Literal(type_name))) => Ok(type_name),
        _ => Err(BoltError::invalid_shape(category.as_str(), fields)),
    }
}

/// Reads a non-null companion field of a structured constraint.
fn required_field(
    category: ListenerCategory,
    fields: &ConstraintFields,
    field: &'static str,
) -> BoltResult<StringMatcher> {
    fields
        .matcher(field)
        .cloned()
        .ok_or_else(|| BoltError::missing_field(category.as_str(), field))
}

/// A literal/pattern listener over `check(body) && callback_id`.
fn callback_listener(
    category: ListenerCategory,
    check: fn(&Value) -> bool,
    constraint: Constraint,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    let callback_id = id_matcher(category, &constraint)?;
    Ok(build_listener_matcher(
        matcher_name(category, &constraint),
        move |body: &Value| check(body) && matches(Some(&callback_id), str_field(body, "callback_id")),
        is_async,
    ))
}

fn block_action_matches(
    action_id: &StringMatcher,
    block_id: Option<&StringMatcher>,
    body: &Value,
) -> bool {
    if !is_block_actions(body) {
        return false;
    }
    let Some(action) = to_action(body) else {
        return false;
    };
    let block_id_matched =
        block_id.is_none_or(|block_id| matches(Some(block_id), str_field(action, "block_id")));
    block_id_matched && matches(Some(action_id), str_field(action, "action_id"))
}

// =============================================================================
// Slash commands
// =============================================================================

/// Matches slash commands by their `command` token.
pub fn command(constraint: impl Into<Constraint>, is_async: bool) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    let token = id_matcher(ListenerCategory::Command, &constraint)?;
    Ok(build_listener_matcher(
        matcher_name(ListenerCategory::Command, &constraint),
        move |body: &Value| is_slash_command(body) && matches(Some(&token), str_field(body, "command")),
        is_async,
    ))
}

// =============================================================================
// Events
// =============================================================================

/// Matches Events API payloads.
///
/// A literal or pattern is compared against `event.type`. A structured
/// constraint must carry `type` and may carry `subtype`:
///
/// - `subtype` absent: any subtype, or none;
/// - `subtype: null`: the event must not carry a `subtype` key;
/// - `subtype: "x"`: the event must carry a matching `subtype`.
pub fn event(constraint: impl Into<Constraint>, is_async: bool) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    let name = matcher_name(ListenerCategory::Event, &constraint);
    match &constraint {
        Constraint::Literal(_) | Constraint::Pattern(_) => {
            let event_type = id_matcher(ListenerCategory::Event, &constraint)?;
            Ok(build_listener_matcher(
                name,
                move |body: &Value| {
                    to_event(body)
                        .is_some_and(|event| matches(Some(&event_type), str_field(event, "type")))
                },
                is_async,
            ))
        }
        Constraint::Structured(fields) => {
            let Some(event_type) = fields.matcher("type").cloned() else {
                return Err(BoltError::invalid_shape(
                    ListenerCategory::Event.as_str(),
                    fields,
                ));
            };
            let subtype: Option<Option<StringMatcher>> =
                fields.get("subtype").map(|expected| expected.cloned());
            Ok(build_listener_matcher(
                name,
                move |body: &Value| {
                    let Some(event) = to_event(body) else {
                        return false;
                    };
                    if !matches(Some(&event_type), str_field(event, "type")) {
                        return false;
                    }
                    match &subtype {
                        None => true,
                        Some(None) => !has_key(event, "subtype"),
                        Some(Some(expected)) => {
                            has_key(event, "subtype")
                                && matches(Some(expected), str_field(event, "subtype"))
                        }
                    }
                },
                is_async,
            ))
        }
    }
}

/// Matches `message` events whose text contains `keyword`.
///
/// A literal keyword matches anywhere in the text; a pattern is searched
/// as-is. An empty literal matches every message.
pub fn message(keyword: impl Into<Constraint>, is_async: bool) -> BoltResult<BoxedMatcher> {
    let constraint = keyword.into();
    let keyword = match &constraint {
        Constraint::Literal(literal) => {
            let source = regex::escape(literal);
            Regex::new(&source).map_err(|err| BoltError::invalid_pattern(source, &err))?
        }
        Constraint::Pattern(regex) => regex.clone(),
        Constraint::Structured(_) => {
            return Err(BoltError::invalid_shape(
                ListenerCategory::Message.as_str(),
                &constraint,
            ));
        }
    };
    let keyword = StringMatcher::Pattern(keyword);
    Ok(build_listener_matcher(
        matcher_name(ListenerCategory::Message, &constraint),
        move |body: &Value| {
            to_message(body).is_some_and(|event| matches(Some(&keyword), str_field(event, "text")))
        },
        is_async,
    ))
}

/// Matches workflow step executions by `event.callback_id`.
pub fn workflow_step_execute(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    let callback_id = id_matcher(ListenerCategory::WorkflowStepExecute, &constraint)?;
    Ok(build_listener_matcher(
        matcher_name(ListenerCategory::WorkflowStepExecute, &constraint),
        move |body: &Value| {
            is_workflow_step_execute(body)
                && matches(Some(&callback_id), str_at(body, &["event", "callback_id"]))
        },
        is_async,
    ))
}

// =============================================================================
// Shortcuts
// =============================================================================

/// Matches shortcuts by `callback_id`.
///
/// A literal or pattern accepts either shortcut kind. A structured constraint
/// `{type, callback_id}` delegates to [`global_shortcut`] (`type: "shortcut"`)
/// or [`message_shortcut`] (`type: "message_action"`).
pub fn shortcut(constraint: impl Into<Constraint>, is_async: bool) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    let Constraint::Structured(fields) = &constraint else {
        return callback_listener(ListenerCategory::Shortcut, is_shortcut, constraint, is_async);
    };
    if !fields.contains("type") || !fields.contains("callback_id") {
        return Err(BoltError::invalid_shape(
            ListenerCategory::Shortcut.as_str(),
            fields,
        ));
    }
    let callback_id = required_field(ListenerCategory::Shortcut, fields, "callback_id")?;
    match discriminator(ListenerCategory::Shortcut, fields)? {
        "shortcut" => global_shortcut(callback_id, is_async),
        "message_action" => message_shortcut(callback_id, is_async),
        other => Err(BoltError::unsupported_type(
            ListenerCategory::Shortcut.as_str(),
            other,
        )),
    }
}

/// Matches global `shortcut` payloads by `callback_id`.
pub fn global_shortcut(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    callback_listener(
        ListenerCategory::GlobalShortcut,
        is_global_shortcut,
        constraint.into(),
        is_async,
    )
}

/// Matches `message_action` payloads by `callback_id`.
pub fn message_shortcut(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    callback_listener(
        ListenerCategory::MessageShortcut,
        is_message_shortcut,
        constraint.into(),
        is_async,
    )
}

// =============================================================================
// Actions
// =============================================================================

/// Matches any of the five action kinds.
///
/// A literal or pattern is compared against the block action's `action_id`,
/// or against `callback_id` for the other four kinds. A structured constraint
/// selects one kind through `type`; `{action_id, block_id?}` without a `type`
/// means block actions.
///
/// The five kinds are exclusive. A payload that passes more than one kind
/// check is logged and never matched.
pub fn action(constraint: impl Into<Constraint>, is_async: bool) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    let Constraint::Structured(fields) = &constraint else {
        let id = id_matcher(ListenerCategory::Action, &constraint)?;
        return Ok(build_listener_matcher(
            matcher_name(ListenerCategory::Action, &constraint),
            move |body: &Value| match exclusive_kind(body, &PayloadKind::ACTIONS) {
                Some(PayloadKind::BlockActions) => block_action_matches(&id, None, body),
                Some(_) => matches(Some(&id), str_field(body, "callback_id")),
                None => false,
            },
            is_async,
        ));
    };

    if fields.contains("type") {
        let category = ListenerCategory::Action;
        return match discriminator(category, fields)? {
            "block_actions" => block_action(constraint.clone(), is_async),
            "interactive_message" => {
                attachment_action(required_field(category, fields, "callback_id")?, is_async)
            }
            "dialog_submission" => {
                dialog_submission(required_field(category, fields, "callback_id")?, is_async)
            }
            "dialog_cancellation" => {
                dialog_cancellation(required_field(category, fields, "callback_id")?, is_async)
            }
            "workflow_step_edit" => {
                workflow_step_edit(required_field(category, fields, "callback_id")?, is_async)
            }
            other => Err(BoltError::unsupported_type(category.as_str(), other)),
        };
    }
    if fields.contains("action_id") {
        return block_action(constraint.clone(), is_async);
    }
    Err(BoltError::invalid_shape(
        ListenerCategory::Action.as_str(),
        fields,
    ))
}

/// Matches block actions by `action_id`, and optionally `block_id`.
///
/// Accepts a literal or pattern (the `action_id`) or a structured
/// `{action_id, block_id?}`. A missing or `null` `block_id` matches any block.
pub fn block_action(constraint: impl Into<Constraint>, is_async: bool) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    let category = ListenerCategory::BlockAction;
    let (action_id, block_id) = match &constraint {
        Constraint::Structured(fields) => (
            required_field(category, fields, "action_id")?,
            fields.matcher("block_id").cloned(),
        ),
        other => (id_matcher(category, other)?, None),
    };
    Ok(build_listener_matcher(
        matcher_name(category, &constraint),
        move |body: &Value| block_action_matches(&action_id, block_id.as_ref(), body),
        is_async,
    ))
}

/// Matches legacy `interactive_message` payloads by `callback_id`.
pub fn attachment_action(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    callback_listener(
        ListenerCategory::AttachmentAction,
        is_attachment_action,
        constraint.into(),
        is_async,
    )
}

/// Matches `dialog_submission` payloads by `callback_id`.
pub fn dialog_submission(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    callback_listener(
        ListenerCategory::DialogSubmission,
        is_dialog_submission,
        constraint.into(),
        is_async,
    )
}

/// Matches `dialog_cancellation` payloads by `callback_id`.
pub fn dialog_cancellation(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    callback_listener(
        ListenerCategory::DialogCancellation,
        is_dialog_cancellation,
        constraint.into(),
        is_async,
    )
}

/// Matches `workflow_step_edit` payloads by `callback_id`.
pub fn workflow_step_edit(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    callback_listener(
        ListenerCategory::WorkflowStepEdit,
        is_workflow_step_edit,
        constraint.into(),
        is_async,
    )
}

// =============================================================================
// Views
// =============================================================================

/// Matches view payloads by `view.callback_id`.
///
/// A literal or pattern means view submissions. A structured constraint
/// selects `view_submission` or `view_closed` through `type`.
pub fn view(constraint: impl Into<Constraint>, is_async: bool) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    let category = ListenerCategory::View;
    let Constraint::Structured(fields) = &constraint else {
        return view_submission(constraint, is_async);
    };
    if !fields.contains("type") {
        return Err(BoltError::invalid_shape(category.as_str(), fields));
    }
    match discriminator(category, fields)? {
        "view_submission" => {
            view_submission(required_field(category, fields, "callback_id")?, is_async)
        }
        "view_closed" => view_closed(required_field(category, fields, "callback_id")?, is_async),
        other => Err(BoltError::unsupported_type(category.as_str(), other)),
    }
}

fn view_listener(
    category: ListenerCategory,
    check: fn(&Value) -> bool,
    constraint: Constraint,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    let callback_id = id_matcher(category, &constraint)?;
    Ok(build_listener_matcher(
        matcher_name(category, &constraint),
        move |body: &Value| {
            check(body) && matches(Some(&callback_id), str_at(body, &["view", "callback_id"]))
        },
        is_async,
    ))
}

/// Matches `view_submission` payloads by `view.callback_id`.
pub fn view_submission(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    view_listener(
        ListenerCategory::ViewSubmission,
        is_view_submission,
        constraint.into(),
        is_async,
    )
}

/// Matches `view_closed` payloads by `view.callback_id`.
pub fn view_closed(constraint: impl Into<Constraint>, is_async: bool) -> BoltResult<BoxedMatcher> {
    view_listener(
        ListenerCategory::ViewClosed,
        is_view_closed,
        constraint.into(),
        is_async,
    )
}

/// Matches a saved workflow step configuration by `view.callback_id`.
pub fn workflow_step_save(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    view_listener(
        ListenerCategory::WorkflowStepSave,
        is_workflow_step_save,
        constraint.into(),
        is_async,
    )
}

// =============================================================================
// Options
// =============================================================================

/// Matches options requests.
///
/// A literal or pattern accepts a block suggestion by `action_id` or a dialog
/// suggestion by `callback_id`. A structured `{action_id}` means block
/// suggestions and `{callback_id}` means dialog suggestions.
pub fn options(constraint: impl Into<Constraint>, is_async: bool) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    let category = ListenerCategory::Options;
    let Constraint::Structured(fields) = &constraint else {
        let id = id_matcher(category, &constraint)?;
        return Ok(build_listener_matcher(
            matcher_name(category, &constraint),
            move |body: &Value| match exclusive_kind(body, &PayloadKind::OPTIONS) {
                Some(PayloadKind::BlockSuggestion) => {
                    matches(Some(&id), str_field(body, "action_id"))
                }
                Some(_) => matches(Some(&id), str_field(body, "callback_id")),
                None => false,
            },
            is_async,
        ));
    };
    if fields.contains("action_id") {
        return block_suggestion(required_field(category, fields, "action_id")?, is_async);
    }
    if fields.contains("callback_id") {
        return dialog_suggestion(required_field(category, fields, "callback_id")?, is_async);
    }
    Err(BoltError::invalid_shape(category.as_str(), fields))
}

/// Matches block suggestions by `action_id`.
pub fn block_suggestion(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    let action_id = id_matcher(ListenerCategory::BlockSuggestion, &constraint)?;
    Ok(build_listener_matcher(
        matcher_name(ListenerCategory::BlockSuggestion, &constraint),
        move |body: &Value| {
            is_block_suggestion(body) && matches(Some(&action_id), str_field(body, "action_id"))
        },
        is_async,
    ))
}

/// Matches `dialog_suggestion` payloads by `callback_id`.
pub fn dialog_suggestion(
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    callback_listener(
        ListenerCategory::DialogSuggestion,
        is_dialog_suggestion,
        constraint.into(),
        is_async,
    )
}

// =============================================================================
// ListenerCategory
// =============================================================================

/// Every category a listener can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerCategory {
    Command,
    Event,
    Message,
    WorkflowStepExecute,
    Shortcut,
    GlobalShortcut,
    MessageShortcut,
    Action,
    BlockAction,
    AttachmentAction,
    DialogSubmission,
    DialogCancellation,
    WorkflowStepEdit,
    View,
    ViewSubmission,
    ViewClosed,
    WorkflowStepSave,
    Options,
    BlockSuggestion,
    DialogSuggestion,
}

impl ListenerCategory {
    pub const ALL: [ListenerCategory; 20] = [
        Self::Command,
        Self::Event,
        Self::Message,
        Self::WorkflowStepExecute,
        Self::Shortcut,
        Self::GlobalShortcut,
        Self::MessageShortcut,
        Self::Action,
        Self::BlockAction,
        Self::AttachmentAction,
        Self::DialogSubmission,
        Self::DialogCancellation,
        Self::WorkflowStepEdit,
        Self::View,
        Self::ViewSubmission,
        Self::ViewClosed,
        Self::WorkflowStepSave,
        Self::Options,
        Self::BlockSuggestion,
        Self::DialogSuggestion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Event => "event",
            Self::Message => "message",
            Self::WorkflowStepExecute => "workflow_step_execute",
            Self::Shortcut => "shortcut",
            Self::GlobalShortcut => "global_shortcut",
            Self::MessageShortcut => "message_shortcut",
            Self::Action => "action",
            Self::BlockAction => "block_action",
            Self::AttachmentAction => "attachment_action",
            Self::DialogSubmission => "dialog_submission",
            Self::DialogCancellation => "dialog_cancellation",
            Self::WorkflowStepEdit => "workflow_step_edit",
            Self::View => "view",
            Self::ViewSubmission => "view_submission",
            Self::ViewClosed => "view_closed",
            Self::WorkflowStepSave => "workflow_step_save",
            Self::Options => "options",
            Self::BlockSuggestion => "block_suggestion",
            Self::DialogSuggestion => "dialog_suggestion",
        }
    }
}

impl fmt::Display for ListenerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known listener category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown listener category '{0}'")]
pub struct ParseCategoryError(pub String);

impl FromStr for ListenerCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// Builds the matcher for `category`.
///
/// This is the single entry point used by declarative registration; the
/// per-category functions above are equivalent.
pub fn build_matcher(
    category: ListenerCategory,
    constraint: impl Into<Constraint>,
    is_async: bool,
) -> BoltResult<BoxedMatcher> {
    let constraint = constraint.into();
    match category {
        ListenerCategory::Command => command(constraint, is_async),
        ListenerCategory::Event => event(constraint, is_async),
        ListenerCategory::Message => message(constraint, is_async),
        ListenerCategory::WorkflowStepExecute => workflow_step_execute(constraint, is_async),
        ListenerCategory::Shortcut => shortcut(constraint, is_async),
        ListenerCategory::GlobalShortcut => global_shortcut(constraint, is_async),
        ListenerCategory::MessageShortcut => message_shortcut(constraint, is_async),
        ListenerCategory::Action => action(constraint, is_async),
        ListenerCategory::BlockAction => block_action(constraint, is_async),
        ListenerCategory::AttachmentAction => attachment_action(constraint, is_async),
        ListenerCategory::DialogSubmission => dialog_submission(constraint, is_async),
        ListenerCategory::DialogCancellation => dialog_cancellation(constraint, is_async),
        ListenerCategory::WorkflowStepEdit => workflow_step_edit(constraint, is_async),
        ListenerCategory::View => view(constraint, is_async),
        ListenerCategory::ViewSubmission => view_submission(constraint, is_async),
        ListenerCategory::ViewClosed => view_closed(constraint, is_async),
        ListenerCategory::WorkflowStepSave => workflow_step_save(constraint, is_async),
        ListenerCategory::Options => options(constraint, is_async),
        ListenerCategory::BlockSuggestion => block_suggestion(constraint, is_async),
        ListenerCategory::DialogSuggestion => dialog_suggestion(constraint, is_async),
    }
}
