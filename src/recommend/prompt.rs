//! Prompt construction for the recommendation generator.
//!
//! The user prompt has a fixed shape: every field is always present, with
//! `-` standing in for anything the active flow did not collect (the debt
//! payment defaults to `0`). The generator never has to guess which lines
//! exist.

use crate::flow::answers::{AnswerBag, Field};

use super::Section;

/// The mentor persona shared by every section.
pub const SYSTEM_PROMPT: &str = "\
You are a strict, confident financial mentor.

Your job is to analyze the user's personal finances from their data: income, \
fixed expenses (housing, utilities, transport, debt), subscriptions, everyday \
spending, and financial goals.

Working principles:
Clear, direct style, never insulting.
Short paragraphs and bullet lists.
Always give an order of actions: step 1, step 2, step 3.
Point out where money leaks, what can be cut without a real drop in quality of \
life, and how to reach the goal faster.
No investment advice on specific stocks, funds, or crypto. Work only with \
budget, spending, and savings.
If the data is thin or contradictory, ask 2-3 clarifying questions, then still \
give careful recommendations.

Always structure the answer as:
1. Brief assessment of the situation.
2. Main problems and budget holes.
3. Concrete saving steps with rough amounts or percentages.
4. A savings plan for the goal (when a goal is given).
5. A short, firm closing instruction.";

/// Extra steer for the requested section.
fn section_instruction(section: Section) -> &'static str {
    match section {
        Section::Quick => {
            "Section: quick look. Keep it to a compact first-pass assessment of the \
             income and the categories the user flagged."
        }
        Section::Deep => {
            "Section: short report. Summarize the full budget picture in a few tight \
             paragraphs."
        }
        Section::DeepFull => {
            "Section: detailed report. Go line by line through every expense with \
             concrete numbers."
        }
        Section::Goal => {
            "Section: goal plan. Focus on the monthly amount to put aside and how to \
             free it up."
        }
    }
}

fn rendered(answers: &AnswerBag, field: Field) -> String {
    answers
        .get(field)
        .map(|v| v.render())
        .unwrap_or_else(|| "-".to_string())
}

/// Build the fixed-shape user prompt from the answer bag.
pub fn build_user_prompt(answers: &AnswerBag, section: Section) -> String {
    let debt = answers
        .get(Field::DebtPayment)
        .map(|v| v.render())
        .unwrap_or_else(|| "0".to_string());

    format!(
        "{instruction}\n\n\
         User data for budget analysis:\n\n\
         Monthly take-home income: {income}\n\
         Housing (rent/mortgage): {rent}\n\
         Utility bills: {utilities}\n\
         Transport: {transport}\n\
         Paid subscriptions (list and amounts, as given):\n\
         {subscriptions}\n\
         Monthly debt payment: {debt}\n\
         Spending categories the user worries about: {categories}\n\
         Goal: {goal}\n\
         Amount to save: {goal_amount}\n\
         Desired timeframe: {goal_term} months",
        instruction = section_instruction(section),
        income = rendered(answers, Field::Income),
        rent = rendered(answers, Field::Rent),
        utilities = rendered(answers, Field::Utilities),
        transport = rendered(answers, Field::Transport),
        subscriptions = rendered(answers, Field::Subscriptions),
        debt = debt,
        categories = rendered(answers, Field::QuickCategories),
        goal = rendered(answers, Field::GoalDescription),
        goal_amount = rendered(answers, Field::GoalAmount),
        goal_term = rendered(answers, Field::GoalTerm),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::answers::{AnswerValue, Category};

    #[test]
    fn missing_fields_render_as_placeholders_never_omitted() {
        let prompt = build_user_prompt(&AnswerBag::new(), Section::Quick);
        assert!(prompt.contains("Monthly take-home income: -"));
        assert!(prompt.contains("Goal: -"));
        // Debt defaults to 0, not '-'.
        assert!(prompt.contains("Monthly debt payment: 0"));
    }

    #[test]
    fn prompt_shape_is_fixed_across_sections() {
        let mut answers = AnswerBag::new();
        answers.insert(Field::Income, AnswerValue::Amount(80_000));

        for section in [Section::Quick, Section::Deep, Section::DeepFull, Section::Goal] {
            let prompt = build_user_prompt(&answers, section);
            for line in [
                "Monthly take-home income:",
                "Housing (rent/mortgage):",
                "Utility bills:",
                "Transport:",
                "Paid subscriptions",
                "Monthly debt payment:",
                "Spending categories",
                "Goal:",
                "Amount to save:",
                "Desired timeframe:",
            ] {
                assert!(prompt.contains(line), "{section}: missing {line:?}");
            }
        }
    }

    #[test]
    fn collected_values_appear_verbatim() {
        let mut answers = AnswerBag::new();
        answers.insert(Field::Income, AnswerValue::Amount(80_000));
        answers.insert(
            Field::Subscriptions,
            AnswerValue::Text("netflix 15\nspotify 10".into()),
        );
        answers.toggle_category(Category::Food);
        answers.toggle_category(Category::Transport);

        let prompt = build_user_prompt(&answers, Section::Deep);
        assert!(prompt.contains("Monthly take-home income: 80000"));
        assert!(prompt.contains("netflix 15\nspotify 10"));
        assert!(prompt.contains("Food, Transport"));
    }

    #[test]
    fn section_instruction_differs_per_section() {
        let quick = build_user_prompt(&AnswerBag::new(), Section::Quick);
        let full = build_user_prompt(&AnswerBag::new(), Section::DeepFull);
        assert_ne!(quick, full);
    }
}
