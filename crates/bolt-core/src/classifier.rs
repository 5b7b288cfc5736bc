//! Payload classification.
//!
//! Stateless predicates answering "is this payload of kind K?". Each check
//! inspects only the top-level keys needed to identify its kind and returns
//! `false` for anything it cannot read; none of them panic or allocate.
//!
//! The kinds are designed to be mutually exclusive, with one refinement:
//! a workflow-step save is also a view submission. [`classify`] resolves that
//! case to the more specific kind, and [`exclusive_kind`] lets composite
//! matchers verify exclusivity among a candidate set at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::payload::{has_key, str_at, str_field};

fn has_type(body: &Value, expected: &str) -> bool {
    str_field(body, "type") == Some(expected)
}

/// Slash command invocation (`/command text`).
pub fn is_slash_command(body: &Value) -> bool {
    has_key(body, "command")
}

/// Events API callback carrying a typed inner event.
pub fn is_event(body: &Value) -> bool {
    has_type(body, "event_callback")
        && body
            .get("event")
            .is_some_and(|event| str_field(event, "type").is_some())
}

/// Workflow step execution event (a refinement of [`is_event`]).
pub fn is_workflow_step_execute(body: &Value) -> bool {
    is_event(body)
        && str_at(body, &["event", "type"]) == Some("workflow_step_execute")
        && body
            .get("event")
            .is_some_and(|event| has_key(event, "workflow_step"))
}

/// Global shortcut invoked from the shortcuts menu.
pub fn is_global_shortcut(body: &Value) -> bool {
    has_type(body, "shortcut")
}

/// Message shortcut invoked from a message's context menu.
pub fn is_message_shortcut(body: &Value) -> bool {
    has_type(body, "message_action")
}

/// Either kind of shortcut.
pub fn is_shortcut(body: &Value) -> bool {
    is_global_shortcut(body) || is_message_shortcut(body)
}

/// Interaction with a Block Kit element.
pub fn is_block_actions(body: &Value) -> bool {
    has_type(body, "block_actions")
}

/// Interaction with a legacy attachment button or menu.
pub fn is_attachment_action(body: &Value) -> bool {
    has_type(body, "interactive_message")
}

/// Legacy dialog submission.
pub fn is_dialog_submission(body: &Value) -> bool {
    has_type(body, "dialog_submission")
}

/// Legacy dialog cancellation.
pub fn is_dialog_cancellation(body: &Value) -> bool {
    has_type(body, "dialog_cancellation")
}

/// Workflow step configuration opened in Workflow Builder.
pub fn is_workflow_step_edit(body: &Value) -> bool {
    has_type(body, "workflow_step_edit")
}

/// Any of the five action kinds.
pub fn is_action(body: &Value) -> bool {
    is_block_actions(body)
        || is_attachment_action(body)
        || is_dialog_submission(body)
        || is_dialog_cancellation(body)
        || is_workflow_step_edit(body)
}

/// Modal view submission.
pub fn is_view_submission(body: &Value) -> bool {
    has_type(body, "view_submission")
}

/// Modal view closed by the user.
pub fn is_view_closed(body: &Value) -> bool {
    has_type(body, "view_closed")
}

/// Either view lifecycle payload.
pub fn is_view(body: &Value) -> bool {
    is_view_submission(body) || is_view_closed(body)
}

/// Workflow step configuration saved (a view submission of a `workflow_step` view).
pub fn is_workflow_step_save(body: &Value) -> bool {
    is_view_submission(body) && str_at(body, &["view", "type"]) == Some("workflow_step")
}

/// Options request from a Block Kit external select.
pub fn is_block_suggestion(body: &Value) -> bool {
    has_type(body, "block_suggestion")
}

/// Options request from a legacy dialog select.
pub fn is_dialog_suggestion(body: &Value) -> bool {
    has_type(body, "dialog_suggestion")
}

/// Either kind of options request.
pub fn is_options(body: &Value) -> bool {
    is_block_suggestion(body) || is_dialog_suggestion(body)
}

// =============================================================================
// PayloadKind
// =============================================================================

/// The recognized payload kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    SlashCommand,
    GlobalShortcut,
    MessageShortcut,
    BlockActions,
    AttachmentAction,
    DialogSubmission,
    DialogCancellation,
    WorkflowStepEdit,
    WorkflowStepSave,
    Event,
    ViewSubmission,
    ViewClosed,
    BlockSuggestion,
    DialogSuggestion,
}

impl PayloadKind {
    /// Every kind, in detection order. Refinements precede the kind they refine.
    pub const ALL: [PayloadKind; 14] = [
        Self::SlashCommand,
        Self::GlobalShortcut,
        Self::MessageShortcut,
        Self::BlockActions,
        Self::AttachmentAction,
        Self::DialogSubmission,
        Self::DialogCancellation,
        Self::WorkflowStepEdit,
        Self::WorkflowStepSave,
        Self::Event,
        Self::ViewSubmission,
        Self::ViewClosed,
        Self::BlockSuggestion,
        Self::DialogSuggestion,
    ];

    /// The kinds a generic `action` listener accepts.
    pub const ACTIONS: [PayloadKind; 5] = [
        Self::BlockActions,
        Self::AttachmentAction,
        Self::DialogSubmission,
        Self::DialogCancellation,
        Self::WorkflowStepEdit,
    ];

    /// The kinds a generic `options` listener accepts.
    pub const OPTIONS: [PayloadKind; 2] = [Self::BlockSuggestion, Self::DialogSuggestion];

    /// Runs this kind's classification predicate.
    pub fn check(self, body: &Value) -> bool {
        match self {
            Self::SlashCommand => is_slash_command(body),
            Self::GlobalShortcut => is_global_shortcut(body),
            Self::MessageShortcut => is_message_shortcut(body),
            Self::BlockActions => is_block_actions(body),
            Self::AttachmentAction => is_attachment_action(body),
            Self::DialogSubmission => is_dialog_submission(body),
            Self::DialogCancellation => is_dialog_cancellation(body),
            Self::WorkflowStepEdit => is_workflow_step_edit(body),
            Self::WorkflowStepSave => is_workflow_step_save(body),
            Self::Event => is_event(body),
            Self::ViewSubmission => is_view_submission(body),
            Self::ViewClosed => is_view_closed(body),
            Self::BlockSuggestion => is_block_suggestion(body),
            Self::DialogSuggestion => is_dialog_suggestion(body),
        }
    }

    /// The snake_case name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SlashCommand => "slash_command",
            Self::GlobalShortcut => "global_shortcut",
            Self::MessageShortcut => "message_shortcut",
            Self::BlockActions => "block_actions",
            Self::AttachmentAction => "attachment_action",
            Self::DialogSubmission => "dialog_submission",
            Self::DialogCancellation => "dialog_cancellation",
            Self::WorkflowStepEdit => "workflow_step_edit",
            Self::WorkflowStepSave => "workflow_step_save",
            Self::Event => "event",
            Self::ViewSubmission => "view_submission",
            Self::ViewClosed => "view_closed",
            Self::BlockSuggestion => "block_suggestion",
            Self::DialogSuggestion => "dialog_suggestion",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns every kind whose predicate accepts `body`.
pub fn detect_kinds(body: &Value) -> Vec<PayloadKind> {
    PayloadKind::ALL
        .into_iter()
        .filter(|kind| kind.check(body))
        .collect()
}

/// Returns the single kind of `body`, or `None` when it is unrecognized or ambiguous.
pub fn classify(body: &Value) -> Option<PayloadKind> {
    match detect_kinds(body).as_slice() {
        [kind] => Some(*kind),
        [PayloadKind::WorkflowStepSave, PayloadKind::ViewSubmission] => {
            Some(PayloadKind::WorkflowStepSave)
        }
        _ => None,
    }
}

/// Returns the one kind among `candidates` that accepts `body`.
///
/// If more than one candidate accepts the payload the exclusivity invariant
/// is broken; this is logged and treated as no match.
pub fn exclusive_kind(body: &Value, candidates: &[PayloadKind]) -> Option<PayloadKind> {
    let mut found = None;
    for kind in candidates {
        if !kind.check(body) {
            continue;
        }
        if let Some(previous) = found {
            warn!(
                first = %previous,
                second = %kind,
                "payload satisfies more than one exclusive kind, refusing to match"
            );
            return None;
        }
        found = Some(*kind);
    }
    found
}
