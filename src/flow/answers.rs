//! The answer bag: everything a flow has collected from one user.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Answer-bag keys, closed across all flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Income,
    Rent,
    Utilities,
    Transport,
    Subscriptions,
    DebtPayment,
    QuickCategories,
    GoalDescription,
    GoalAmount,
    GoalTerm,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Rent => "rent",
            Self::Utilities => "utilities",
            Self::Transport => "transport",
            Self::Subscriptions => "subscriptions",
            Self::DebtPayment => "debt_payment",
            Self::QuickCategories => "quick_categories",
            Self::GoalDescription => "goal_description",
            Self::GoalAmount => "goal_amount",
            Self::GoalTerm => "goal_term",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fixed spending-category set for Quick Analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Housing,
    Transport,
    Subscriptions,
    Shopping,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Food,
        Self::Housing,
        Self::Transport,
        Self::Subscriptions,
        Self::Shopping,
        Self::Other,
    ];

    /// Callback-tag suffix (`cat_<tag>` on the wire).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Housing => "housing",
            Self::Transport => "transport",
            Self::Subscriptions => "subscriptions",
            Self::Shopping => "shopping",
            Self::Other => "other",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }

    /// Human-readable button/summary label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Housing => "Housing",
            Self::Transport => "Transport",
            Self::Subscriptions => "Subscriptions",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }
}

/// A collected answer value.
///
/// Durations are stored as `Amount(months)` when the input parses as an
/// integer and verbatim as `Text` otherwise — no calendar validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    /// Non-negative integer amount. No upper bound.
    Amount(u64),
    /// Free text, stored trimmed.
    Text(String),
    /// Insertion-ordered category toggle set.
    Categories(Vec<Category>),
}

impl AnswerValue {
    /// Render for prompts and summaries.
    pub fn render(&self) -> String {
        match self {
            Self::Amount(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Categories(cats) => cats
                .iter()
                .map(|c| c.label())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// The per-session mapping of field to collected value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerBag {
    entries: BTreeMap<Field, AnswerValue>,
}

impl AnswerBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, value: AnswerValue) {
        self.entries.insert(field, value);
    }

    /// Merge a batch of parsed values, replacing existing entries.
    pub fn merge(&mut self, updates: impl IntoIterator<Item = (Field, AnswerValue)>) {
        for (field, value) in updates {
            self.entries.insert(field, value);
        }
    }

    pub fn get(&self, field: Field) -> Option<&AnswerValue> {
        self.entries.get(&field)
    }

    pub fn amount(&self, field: Field) -> Option<u64> {
        match self.entries.get(&field) {
            Some(AnswerValue::Amount(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        match self.entries.get(&field) {
            Some(AnswerValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Selected categories, in toggle-insertion order.
    pub fn categories(&self) -> &[Category] {
        match self.entries.get(&Field::QuickCategories) {
            Some(AnswerValue::Categories(cats)) => cats,
            _ => &[],
        }
    }

    /// Flip membership of a category: add if absent, remove if present.
    /// Returns whether the category is selected afterwards. Never rejects;
    /// toggling twice restores the original membership.
    pub fn toggle_category(&mut self, category: Category) -> bool {
        let mut cats = match self.entries.remove(&Field::QuickCategories) {
            Some(AnswerValue::Categories(cats)) => cats,
            _ => Vec::new(),
        };
        let now_selected = match cats.iter().position(|c| *c == category) {
            Some(idx) => {
                cats.remove(idx);
                false
            }
            None => {
                cats.push(category);
                true
            }
        };
        self.entries
            .insert(Field::QuickCategories, AnswerValue::Categories(cats));
        now_selected
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
