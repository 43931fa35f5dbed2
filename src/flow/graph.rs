//! Declarative flow definitions.
//!
//! Every dialogue is a table of edges over [`FlowState`]; the dispatcher is
//! a single generic interpreter over this data. Adding a question to a flow
//! means adding a row here, not writing a handler.

use crate::channels::EventPayload;

use super::answers::Field;
use super::state::FlowState;

/// Callback tags used on inline buttons.
pub mod callbacks {
    pub const MENU: &str = "menu";
    pub const QUICK_START: &str = "quick_analyze";
    pub const DEEP_START: &str = "deep_analyze";
    pub const GOAL_START: &str = "goal_start";
    pub const UPLOAD_START: &str = "upload_statement";
    pub const CATEGORY_PREFIX: &str = "cat_";
    pub const CATEGORIES_DONE: &str = "quick_done";
    pub const QUICK_RECOMMENDATIONS: &str = "quick_recommendations";
    pub const DEBT_YES: &str = "debt_yes";
    pub const DEBT_NO: &str = "debt_no";
    pub const DEEP_FULL: &str = "deep_full";
}

/// What kind of inbound event an edge responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Any text message.
    Text,
    /// A button press with this exact callback tag.
    Callback(&'static str),
    /// A button press whose tag starts with this prefix.
    CallbackPrefix(&'static str),
    /// Photo, document, or text — the statement-upload catch-all.
    TextOrAttachment,
}

impl Matcher {
    pub fn matches(&self, payload: &EventPayload) -> bool {
        match (self, payload) {
            (Self::Text, EventPayload::Text(_)) => true,
            (Self::Callback(tag), EventPayload::Callback(t)) => t == tag,
            (Self::CallbackPrefix(prefix), EventPayload::Callback(t)) => t.starts_with(prefix),
            (Self::TextOrAttachment, EventPayload::Text(_) | EventPayload::Attachment(_)) => true,
            _ => false,
        }
    }
}

/// How a matched edge transforms the answer bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Parse a non-negative integer amount into `field`.
    StoreAmount(Field),
    /// Store trimmed free text of at least `min_len` chars into `field`.
    StoreText { field: Field, min_len: usize },
    /// Store an integer month count, or the input verbatim, into `field`.
    StoreDuration(Field),
    /// Flip membership of the category named by the callback suffix.
    ToggleCategory,
    /// Advance only if at least one category is selected.
    RequireCategories,
    /// Write a constant amount into `field` without consuming input.
    InjectAmount(Field, u64),
    /// Pure transition, no bag mutation.
    None,
}

/// One transition: `(state, event-matcher, action, target)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: FlowState,
    pub on: Matcher,
    pub action: Action,
    pub to: FlowState,
}

const fn edge(from: FlowState, on: Matcher, action: Action, to: FlowState) -> Edge {
    Edge {
        from,
        on,
        action,
        to,
    }
}

/// The full transition table, all four flows. First match wins.
pub const EDGES: &[Edge] = &[
    // ── Quick Analysis ──────────────────────────────────────────────
    edge(
        FlowState::QuickIncome,
        Matcher::Text,
        Action::StoreAmount(Field::Income),
        FlowState::QuickCategories,
    ),
    edge(
        FlowState::QuickCategories,
        Matcher::CallbackPrefix(callbacks::CATEGORY_PREFIX),
        Action::ToggleCategory,
        FlowState::QuickCategories,
    ),
    edge(
        FlowState::QuickCategories,
        Matcher::Callback(callbacks::CATEGORIES_DONE),
        Action::RequireCategories,
        FlowState::QuickSummary,
    ),
    edge(
        FlowState::QuickSummary,
        Matcher::Callback(callbacks::QUICK_RECOMMENDATIONS),
        Action::None,
        FlowState::QuickProcessing,
    ),
    // ── Deep Analysis ───────────────────────────────────────────────
    edge(
        FlowState::DeepIncome,
        Matcher::Text,
        Action::StoreAmount(Field::Income),
        FlowState::DeepRent,
    ),
    edge(
        FlowState::DeepRent,
        Matcher::Text,
        Action::StoreAmount(Field::Rent),
        FlowState::DeepUtilities,
    ),
    edge(
        FlowState::DeepUtilities,
        Matcher::Text,
        Action::StoreAmount(Field::Utilities),
        FlowState::DeepTransport,
    ),
    edge(
        FlowState::DeepTransport,
        Matcher::Text,
        Action::StoreAmount(Field::Transport),
        FlowState::DeepSubscriptions,
    ),
    edge(
        FlowState::DeepSubscriptions,
        Matcher::Text,
        Action::StoreText {
            field: Field::Subscriptions,
            min_len: 1,
        },
        FlowState::DeepDebtPrompt,
    ),
    edge(
        FlowState::DeepDebtPrompt,
        Matcher::Callback(callbacks::DEBT_YES),
        Action::None,
        FlowState::DeepDebtAmount,
    ),
    edge(
        FlowState::DeepDebtPrompt,
        Matcher::Callback(callbacks::DEBT_NO),
        Action::InjectAmount(Field::DebtPayment, 0),
        FlowState::DeepProcessing,
    ),
    edge(
        FlowState::DeepDebtAmount,
        Matcher::Text,
        Action::StoreAmount(Field::DebtPayment),
        FlowState::DeepProcessing,
    ),
    edge(
        FlowState::DeepResultShort,
        Matcher::Callback(callbacks::DEEP_FULL),
        Action::None,
        FlowState::DeepFullProcessing,
    ),
    // ── Goal Planning ───────────────────────────────────────────────
    edge(
        FlowState::GoalDescription,
        Matcher::Text,
        Action::StoreText {
            field: Field::GoalDescription,
            min_len: 2,
        },
        FlowState::GoalAmount,
    ),
    edge(
        FlowState::GoalAmount,
        Matcher::Text,
        Action::StoreAmount(Field::GoalAmount),
        FlowState::GoalTerm,
    ),
    edge(
        FlowState::GoalTerm,
        Matcher::Text,
        Action::StoreDuration(Field::GoalTerm),
        FlowState::GoalProcessing,
    ),
    // ── Statement Upload ────────────────────────────────────────────
    edge(
        FlowState::UploadWaiting,
        Matcher::TextOrAttachment,
        Action::None,
        FlowState::Idle,
    ),
];

/// Flow-start transitions. These fire from any state (the answer bag is
/// kept, which is what carries income from Quick into Deep).
pub const STARTS: &[(&str, FlowState)] = &[
    (callbacks::QUICK_START, FlowState::QuickIncome),
    (callbacks::DEEP_START, FlowState::DeepIncome),
    (callbacks::GOAL_START, FlowState::GoalDescription),
    (callbacks::UPLOAD_START, FlowState::UploadWaiting),
];

/// Text phrases that jump straight into the upload flow, checked before any
/// flow-scoped matching.
pub const UPLOAD_PHRASES: &[&str] = &["upload statement", "upload receipt"];

/// Find the first edge out of `state` matching `payload`, if any.
pub fn edge_for(state: FlowState, payload: &EventPayload) -> Option<&'static Edge> {
    EDGES
        .iter()
        .find(|e| e.from == state && e.on.matches(payload))
}

/// Resolve a flow-start callback tag to its start state.
pub fn flow_start(tag: &str) -> Option<FlowState> {
    STARTS
        .iter()
        .find(|(start_tag, _)| *start_tag == tag)
        .map(|(_, state)| *state)
}
