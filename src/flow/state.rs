//! Flow state machine — one closed enumeration spanning all dialogues.

use serde::{Deserialize, Serialize};

/// The four guided dialogues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Quick,
    Deep,
    Goal,
    Upload,
}

/// Where a user currently is, across all flows.
///
/// `Idle` is the unique state every terminal transition returns to; it
/// accepts only flow-start events. Processing states are entered by side
/// effect (a recommendation call), never by a user event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Idle,

    // Quick Analysis
    QuickIncome,
    QuickCategories,
    QuickSummary,
    QuickProcessing,
    QuickResult,

    // Deep Analysis
    DeepIncome,
    DeepRent,
    DeepUtilities,
    DeepTransport,
    DeepSubscriptions,
    DeepDebtPrompt,
    DeepDebtAmount,
    DeepProcessing,
    DeepResultShort,
    DeepFullProcessing,
    DeepResultFull,

    // Goal Planning
    GoalDescription,
    GoalAmount,
    GoalTerm,
    GoalProcessing,

    // Statement Upload
    UploadWaiting,
}

impl FlowState {
    /// The flow this state belongs to, or `None` for `Idle`.
    ///
    /// A session stores only its state; the active flow is derived here, so
    /// the state-belongs-to-flow invariant holds by construction.
    pub fn flow(&self) -> Option<Flow> {
        use FlowState::*;
        match self {
            Idle => None,
            QuickIncome | QuickCategories | QuickSummary | QuickProcessing | QuickResult => {
                Some(Flow::Quick)
            }
            DeepIncome | DeepRent | DeepUtilities | DeepTransport | DeepSubscriptions
            | DeepDebtPrompt | DeepDebtAmount | DeepProcessing | DeepResultShort
            | DeepFullProcessing | DeepResultFull => Some(Flow::Deep),
            GoalDescription | GoalAmount | GoalTerm | GoalProcessing => Some(Flow::Goal),
            UploadWaiting => Some(Flow::Upload),
        }
    }

    /// Whether entering this state triggers a recommendation call.
    pub fn is_processing(&self) -> bool {
        matches!(
            self,
            Self::QuickProcessing
                | Self::DeepProcessing
                | Self::DeepFullProcessing
                | Self::GoalProcessing
        )
    }

    /// The single outbound edge of a processing state: the result state the
    /// session lands in once the recommendation call resolves (success or
    /// failure alike). `Idle` means the flow completes outright.
    pub fn after_processing(&self) -> Option<FlowState> {
        match self {
            Self::QuickProcessing => Some(Self::QuickResult),
            Self::DeepProcessing => Some(Self::DeepResultShort),
            Self::DeepFullProcessing => Some(Self::DeepResultFull),
            Self::GoalProcessing => Some(Self::Idle),
            _ => None,
        }
    }

    /// All states, for exhaustiveness checks in tests.
    pub const ALL: [FlowState; 22] = [
        Self::Idle,
        Self::QuickIncome,
        Self::QuickCategories,
        Self::QuickSummary,
        Self::QuickProcessing,
        Self::QuickResult,
        Self::DeepIncome,
        Self::DeepRent,
        Self::DeepUtilities,
        Self::DeepTransport,
        Self::DeepSubscriptions,
        Self::DeepDebtPrompt,
        Self::DeepDebtAmount,
        Self::DeepProcessing,
        Self::DeepResultShort,
        Self::DeepFullProcessing,
        Self::DeepResultFull,
        Self::GoalDescription,
        Self::GoalAmount,
        Self::GoalTerm,
        Self::GoalProcessing,
        Self::UploadWaiting,
    ];
}

impl Default for FlowState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::QuickIncome => "quick_income",
            Self::QuickCategories => "quick_categories",
            Self::QuickSummary => "quick_summary",
            Self::QuickProcessing => "quick_processing",
            Self::QuickResult => "quick_result",
            Self::DeepIncome => "deep_income",
            Self::DeepRent => "deep_rent",
            Self::DeepUtilities => "deep_utilities",
            Self::DeepTransport => "deep_transport",
            Self::DeepSubscriptions => "deep_subscriptions",
            Self::DeepDebtPrompt => "deep_debt_prompt",
            Self::DeepDebtAmount => "deep_debt_amount",
            Self::DeepProcessing => "deep_processing",
            Self::DeepResultShort => "deep_result_short",
            Self::DeepFullProcessing => "deep_full_processing",
            Self::DeepResultFull => "deep_result_full",
            Self::GoalDescription => "goal_description",
            Self::GoalAmount => "goal_amount",
            Self::GoalTerm => "goal_term",
            Self::GoalProcessing => "goal_processing",
            Self::UploadWaiting => "upload_waiting",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_has_no_flow() {
        for state in FlowState::ALL {
            if state == FlowState::Idle {
                assert!(state.flow().is_none());
            } else {
                assert!(state.flow().is_some(), "{state} should belong to a flow");
            }
        }
    }

    #[test]
    fn processing_states_have_exactly_one_outbound_edge() {
        for state in FlowState::ALL {
            assert_eq!(
                state.is_processing(),
                state.after_processing().is_some(),
                "processing marker and result edge disagree for {state}"
            );
        }
    }

    #[test]
    fn result_state_stays_in_the_same_flow() {
        for state in FlowState::ALL {
            if let Some(result) = state.after_processing() {
                if result != FlowState::Idle {
                    assert_eq!(state.flow(), result.flow(), "{state} -> {result}");
                }
            }
        }
    }

    #[test]
    fn goal_processing_completes_outright() {
        assert_eq!(
            FlowState::GoalProcessing.after_processing(),
            Some(FlowState::Idle)
        );
    }

    #[test]
    fn display_matches_serde() {
        for state in FlowState::ALL {
            let display = format!("{state}");
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(
                format!("\"{display}\""),
                json,
                "Display and serde should match for {state:?}"
            );
        }
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(FlowState::default(), FlowState::Idle);
    }
}
