//! User-facing prompt texts and keyboard projections.
//!
//! Keyboards are built fresh from the answer bag on every emit — the
//! category keyboard in particular is a pure projection of the selected
//! set, never a mutated copy of a previous keyboard.

use crate::channels::{Button, Keyboard, Outbound};

use super::answers::{AnswerBag, Category, Field};
use super::graph::callbacks;
use super::state::FlowState;

pub const WELCOME: &str = "👋 Hi! I'm FinGuard — your no-nonsense financial mentor.\n\n\
I can help you:\n\
• Analyze your income and spending\n\
• Find where the money leaks out\n\
• Build a plan for your financial goals\n\
• Give concrete savings recommendations\n\n\
Pick a starting point:";

const MAIN_MENU_TEXT: &str = "Main menu:";

pub fn main_menu_kb() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![Button::new("⚡ Quick analysis", callbacks::QUICK_START)],
        vec![Button::new("🔍 Deep analysis", callbacks::DEEP_START)],
        vec![Button::new("🎯 Savings goal", callbacks::GOAL_START)],
        vec![Button::new("📄 Upload a statement", callbacks::UPLOAD_START)],
    ])
}

/// The main-menu message.
pub fn main_menu() -> Outbound {
    Outbound::text(MAIN_MENU_TEXT).with_keyboard(main_menu_kb())
}

/// The welcome message shown on `/start`.
pub fn welcome() -> Outbound {
    Outbound::text(WELCOME).with_keyboard(main_menu_kb())
}

fn debt_kb() -> Keyboard {
    Keyboard::from_rows(vec![vec![
        Button::new("Yes", callbacks::DEBT_YES),
        Button::new("No", callbacks::DEBT_NO),
    ]])
}

fn quick_summary_kb() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![Button::new(
            "Show recommendations",
            callbacks::QUICK_RECOMMENDATIONS,
        )],
        vec![Button::new("Deep analysis", callbacks::DEEP_START)],
        vec![Button::new("Back to menu", callbacks::MENU)],
    ])
}

fn quick_result_kb() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![Button::new("Deep analysis", callbacks::DEEP_START)],
        vec![Button::new("Back to menu", callbacks::MENU)],
    ])
}

fn deep_result_kb() -> Keyboard {
    Keyboard::from_rows(vec![
        vec![Button::new("Show full report", callbacks::DEEP_FULL)],
        vec![Button::new("Back to menu", callbacks::MENU)],
    ])
}

fn menu_only_kb() -> Keyboard {
    Keyboard::from_rows(vec![vec![Button::new("Back to menu", callbacks::MENU)]])
}

/// Category keyboard: a projection of the currently selected set.
fn category_kb(selected: &[Category]) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = Category::ALL
        .iter()
        .map(|cat| {
            let mark = if selected.contains(cat) { "✅" } else { "◻️" };
            vec![Button::new(
                format!("{mark} {}", cat.label()),
                format!("{}{}", callbacks::CATEGORY_PREFIX, cat.tag()),
            )]
        })
        .collect();
    rows.push(vec![Button::new("➡️ Done", callbacks::CATEGORIES_DONE)]);
    Keyboard::from_rows(rows)
}

/// The message emitted on entering a waiting state.
pub fn enter_prompt(state: FlowState, answers: &AnswerBag) -> Outbound {
    match state {
        FlowState::QuickIncome => {
            Outbound::text("⚡ Quick analysis\n\nYour monthly take-home income?")
        }
        FlowState::QuickCategories => {
            Outbound::text("Pick the spending categories that worry you (any number):")
                .with_keyboard(category_kb(answers.categories()))
        }
        FlowState::QuickSummary => {
            let income = answers
                .amount(Field::Income)
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            let categories = answers
                .categories()
                .iter()
                .map(|c| c.label())
                .collect::<Vec<_>>()
                .join(", ");
            Outbound::text(format!(
                "📊 Interim summary:\n\nIncome: {income} per month\nSpending categories: {categories}\n\nWhat next?"
            ))
            .with_keyboard(quick_summary_kb())
        }
        FlowState::DeepIncome => {
            Outbound::text("🔍 Deep analysis\n\nYour monthly take-home income?")
        }
        FlowState::DeepRent => Outbound::text("Housing costs (rent or mortgage) per month?"),
        FlowState::DeepUtilities => Outbound::text("Utility bills per month?"),
        FlowState::DeepTransport => Outbound::text("Transport spending per month?"),
        FlowState::DeepSubscriptions => Outbound::text(
            "How much goes to paid subscriptions? (List them with rough amounts, one per line.)",
        ),
        FlowState::DeepDebtPrompt => {
            Outbound::text("Any loans or installment plans? Tap Yes or No.")
                .with_keyboard(debt_kb())
        }
        FlowState::DeepDebtAmount => Outbound::text("Monthly payment across your loans?"),
        FlowState::GoalDescription => Outbound::text(
            "🎯 Savings goal\n\nDescribe your financial goal (a holiday, a new phone, renovation, a car):",
        ),
        FlowState::GoalAmount => Outbound::text("How much do you want to save for it?"),
        FlowState::GoalTerm => {
            Outbound::text("Over what period? (In months, or a date — e.g. '12' or '12.2025'.)")
        }
        FlowState::UploadWaiting => Outbound::text(
            "📄 Upload a statement\n\nSend a photo, a document, or the text of your spending statement.",
        ),
        // Processing and result states are emitted via working_notice /
        // result_message; idle via main_menu. Fall back to the menu.
        _ => main_menu(),
    }
}

/// Short notice emitted when a processing state is entered, before the
/// recommendation call.
pub fn working_notice(state: FlowState) -> &'static str {
    match state {
        FlowState::DeepFullProcessing => "📋 Putting together the detailed report…",
        FlowState::GoalProcessing => "🧮 Working out your action plan…",
        _ => "🔎 Analyzing your data…",
    }
}

/// The result message for a resolved processing state, wrapping the
/// recommendation (or the substituted error text).
pub fn result_message(processing_state: FlowState, recommendation: &str) -> Outbound {
    match processing_state {
        FlowState::QuickProcessing => {
            Outbound::text(format!("💡 Quick analysis recommendations:\n\n{recommendation}"))
                .with_keyboard(quick_result_kb())
        }
        FlowState::DeepProcessing => {
            Outbound::text(format!("📊 Short report:\n\n{recommendation}"))
                .with_keyboard(deep_result_kb())
        }
        FlowState::DeepFullProcessing => {
            Outbound::text(format!("📋 Detailed breakdown:\n\n{recommendation}"))
                .with_keyboard(menu_only_kb())
        }
        FlowState::GoalProcessing => {
            Outbound::text(format!("🎯 Your plan to reach the goal:\n\n{recommendation}"))
                .with_keyboard(main_menu_kb())
        }
        _ => Outbound::text(recommendation),
    }
}

/// Acknowledgement for a received statement, naming what arrived.
pub fn upload_ack(kind: &str) -> String {
    format!(
        "✅ {kind} received. Processing…\n\n\
         (Recognition and auto-categorization of spending will land here later.)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::answers::AnswerValue;

    #[test]
    fn category_keyboard_marks_selected_entries() {
        let kb = category_kb(&[Category::Food, Category::Transport]);
        // 6 categories + Done row
        assert_eq!(kb.rows.len(), 7);

        let labels: Vec<&str> = kb
            .rows
            .iter()
            .flat_map(|r| r.iter().map(|b| b.label.as_str()))
            .collect();
        assert!(labels.contains(&"✅ Food"));
        assert!(labels.contains(&"✅ Transport"));
        assert!(labels.contains(&"◻️ Housing"));
        assert!(labels.contains(&"◻️ Other"));
    }

    #[test]
    fn category_keyboard_is_a_pure_projection() {
        let before = category_kb(&[]);
        let _after = category_kb(&[Category::Food]);
        // Rendering with a selection does not disturb an earlier render.
        assert!(before
            .rows
            .iter()
            .flatten()
            .all(|b| b.label.starts_with("◻️") || b.label.starts_with("➡️")));
    }

    #[test]
    fn quick_summary_lists_categories_in_insertion_order() {
        let mut answers = AnswerBag::new();
        answers.insert(Field::Income, AnswerValue::Amount(80_000));
        answers.toggle_category(Category::Food);
        answers.toggle_category(Category::Transport);

        let out = enter_prompt(FlowState::QuickSummary, &answers);
        assert!(out.text.contains("80000"));
        assert!(out.text.contains("Food, Transport"));
    }

    #[test]
    fn every_waiting_state_has_a_nonempty_prompt() {
        let answers = AnswerBag::new();
        for state in FlowState::ALL {
            if state == FlowState::Idle || state.is_processing() {
                continue;
            }
            let out = enter_prompt(state, &answers);
            assert!(!out.text.is_empty(), "empty prompt for {state}");
        }
    }

    #[test]
    fn result_messages_embed_the_recommendation() {
        for state in [
            FlowState::QuickProcessing,
            FlowState::DeepProcessing,
            FlowState::DeepFullProcessing,
            FlowState::GoalProcessing,
        ] {
            let out = result_message(state, "cut the lattes");
            assert!(out.text.contains("cut the lattes"), "{state}");
            assert!(out.keyboard.is_some(), "{state} result should offer buttons");
        }
    }

    #[test]
    fn goal_result_returns_to_the_main_menu() {
        let out = result_message(FlowState::GoalProcessing, "save monthly");
        assert_eq!(out.keyboard, Some(main_menu_kb()));
    }
}
