//! The dispatcher: a single generic interpreter over the flow graph.

use std::sync::Arc;

use crate::channels::{EventPayload, Outbound};
use crate::recommend::{RecommendationProvider, Section};
use crate::session::{Session, SessionStore};

use super::answers::{AnswerValue, Category, Field};
use super::graph::{self, callbacks, Action};
use super::prompts;
use super::state::FlowState;
use super::validate;

/// Section tag for each processing state.
fn section_for(state: FlowState) -> Option<Section> {
    match state {
        FlowState::QuickProcessing => Some(Section::Quick),
        FlowState::DeepProcessing => Some(Section::Deep),
        FlowState::DeepFullProcessing => Some(Section::DeepFull),
        FlowState::GoalProcessing => Some(Section::Goal),
        _ => None,
    }
}

/// Per-user flow interpreter. Holds the session store and the
/// recommendation boundary; owns every state transition.
pub struct FlowEngine {
    sessions: SessionStore,
    provider: Arc<dyn RecommendationProvider>,
}

impl FlowEngine {
    pub fn new(provider: Arc<dyn RecommendationProvider>) -> Self {
        Self {
            sessions: SessionStore::new(),
            provider,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound event for one user and describe what to send back.
    ///
    /// Holds the user's session lock for the full duration, including the
    /// recommendation call — a second event from the same user queues behind
    /// it; other users are unaffected. Never fails: every outcome is an
    /// outbound description (possibly empty, for silently ignored events).
    pub async fn handle(&self, user_id: &str, payload: &EventPayload) -> Vec<Outbound> {
        let cell = self.sessions.session(user_id);
        let mut session = cell.lock().await;
        session.touch();

        // Global matchers run before any flow-scoped matching.
        if let Some(out) = self.handle_global(&mut session, payload) {
            return out;
        }

        let Some(edge) = graph::edge_for(session.state, payload) else {
            tracing::debug!(user = user_id, state = %session.state, "event matched no edge; ignoring");
            return Vec::new();
        };

        // Run the edge's validator. A rejection re-prompts and leaves the
        // session untouched.
        let mut updates: Vec<(Field, AnswerValue)> = Vec::new();
        match edge.action {
            Action::StoreAmount(field) => {
                let Some(raw) = payload.as_text() else {
                    return Vec::new();
                };
                match validate::parse_amount(raw) {
                    Ok(amount) => updates.push((field, AnswerValue::Amount(amount))),
                    Err(reject) => return vec![Outbound::text(reject.to_string())],
                }
            }
            Action::StoreText { field, min_len } => {
                let Some(raw) = payload.as_text() else {
                    return Vec::new();
                };
                match validate::parse_free_text(raw, min_len) {
                    Ok(text) => updates.push((field, AnswerValue::Text(text))),
                    Err(reject) => return vec![Outbound::text(reject.to_string())],
                }
            }
            Action::StoreDuration(field) => {
                let Some(raw) = payload.as_text() else {
                    return Vec::new();
                };
                updates.push((field, validate::parse_duration(raw)));
            }
            Action::ToggleCategory => {
                let tag = payload
                    .as_callback()
                    .and_then(|t| t.strip_prefix(callbacks::CATEGORY_PREFIX));
                let Some(category) = tag.and_then(Category::from_tag) else {
                    tracing::debug!(user = user_id, "unknown category tag; ignoring");
                    return Vec::new();
                };
                session.answers.toggle_category(category);
                // Self-loop: re-emit the selection prompt with the keyboard
                // projected from the updated set.
                return vec![prompts::enter_prompt(FlowState::QuickCategories, &session.answers)];
            }
            Action::RequireCategories => {
                if session.answers.categories().is_empty() {
                    return vec![Outbound::text(
                        validate::Reject::NoCategoriesSelected.to_string(),
                    )];
                }
            }
            Action::InjectAmount(field, value) => {
                updates.push((field, AnswerValue::Amount(value)));
            }
            Action::None => {}
        }

        if let Some(section) = section_for(edge.to) {
            return self
                .run_processing(&mut session, user_id, edge.to, section, updates)
                .await;
        }

        if edge.to == FlowState::Idle {
            // Statement upload is the one flow that completes without a
            // recommendation call: acknowledge and reset.
            session.clear();
            let kind = match payload {
                EventPayload::Attachment(crate::channels::AttachmentKind::Photo) => "Photo",
                EventPayload::Attachment(crate::channels::AttachmentKind::Document) => "Document",
                _ => "Text",
            };
            return vec![
                Outbound::text(prompts::upload_ack(kind)),
                prompts::main_menu(),
            ];
        }

        session.commit(edge.to, updates);
        tracing::info!(user = user_id, state = %session.state, "transition committed");
        vec![prompts::enter_prompt(edge.to, &session.answers)]
    }

    /// Commit the processing state, invoke the generator, and resolve to the
    /// result state whether the call succeeded or failed.
    async fn run_processing(
        &self,
        session: &mut Session,
        user_id: &str,
        processing: FlowState,
        section: Section,
        updates: Vec<(Field, AnswerValue)>,
    ) -> Vec<Outbound> {
        session.commit(processing, updates);
        let mut out = vec![Outbound::text(prompts::working_notice(processing))];

        let recommendation = match self.provider.recommend(&session.answers, section).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(user = user_id, %section, error = %e, "recommendation call failed");
                format!(
                    "⚠️ The recommendation service is unavailable right now: {e}\n\n\
                     You can try again from the menu."
                )
            }
        };
        out.push(prompts::result_message(processing, &recommendation));

        match processing.after_processing() {
            Some(FlowState::Idle) | None => session.clear(),
            Some(result_state) => session.commit(result_state, []),
        }
        tracing::info!(user = user_id, state = %session.state, "processing resolved");
        out
    }

    /// Global shortcuts, evaluated before flow-scoped matching: the /start
    /// and /ping commands, the menu callback, flow-start callbacks, and the
    /// upload shortcut phrases.
    fn handle_global(&self, session: &mut Session, payload: &EventPayload) -> Option<Vec<Outbound>> {
        match payload {
            EventPayload::Text(text) => {
                let lower = text.trim().to_lowercase();
                if lower == "/start" {
                    session.clear();
                    return Some(vec![prompts::welcome()]);
                }
                if lower == "/ping" {
                    return Some(vec![Outbound::text("pong")]);
                }
                if graph::UPLOAD_PHRASES.contains(&lower.as_str()) {
                    session.commit(FlowState::UploadWaiting, []);
                    return Some(vec![prompts::enter_prompt(
                        FlowState::UploadWaiting,
                        &session.answers,
                    )]);
                }
            }
            EventPayload::Callback(tag) => {
                if tag == callbacks::MENU {
                    session.clear();
                    return Some(vec![prompts::main_menu()]);
                }
                // Flow starts fire from any state; the answer bag is kept,
                // so income collected in Quick carries into Deep.
                if let Some(start) = graph::flow_start(tag) {
                    session.commit(start, []);
                    return Some(vec![prompts::enter_prompt(start, &session.answers)]);
                }
            }
            EventPayload::Attachment(_) => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecommendError;
    use crate::flow::answers::AnswerBag;
    use async_trait::async_trait;

    struct StubProvider {
        reply: &'static str,
    }

    #[async_trait]
    impl RecommendationProvider for StubProvider {
        async fn recommend(
            &self,
            _answers: &AnswerBag,
            _section: Section,
        ) -> Result<String, RecommendError> {
            Ok(self.reply.to_string())
        }
    }

    fn engine() -> FlowEngine {
        FlowEngine::new(Arc::new(StubProvider { reply: "stub advice" }))
    }

    async fn state_of(engine: &FlowEngine, user: &str) -> FlowState {
        engine.sessions().session(user).lock().await.state
    }

    #[tokio::test]
    async fn start_command_shows_welcome_and_clears() {
        let engine = engine();
        engine
            .handle("u1", &EventPayload::Callback("goal_start".into()))
            .await;
        assert_eq!(state_of(&engine, "u1").await, FlowState::GoalDescription);

        let out = engine
            .handle("u1", &EventPayload::Text("/start".into()))
            .await;
        assert_eq!(state_of(&engine, "u1").await, FlowState::Idle);
        assert!(out[0].text.contains("FinGuard"));
        assert!(out[0].keyboard.is_some());
    }

    #[tokio::test]
    async fn ping_replies_without_touching_state() {
        let engine = engine();
        engine
            .handle("u1", &EventPayload::Callback("quick_analyze".into()))
            .await;
        let out = engine.handle("u1", &EventPayload::Text("/ping".into())).await;
        assert_eq!(out[0].text, "pong");
        assert_eq!(state_of(&engine, "u1").await, FlowState::QuickIncome);
    }

    #[tokio::test]
    async fn unmatched_events_are_silently_ignored() {
        let engine = engine();
        let out = engine.handle("u1", &EventPayload::Text("hello".into())).await;
        assert!(out.is_empty());
        assert_eq!(state_of(&engine, "u1").await, FlowState::Idle);
    }

    #[tokio::test]
    async fn upload_phrase_enters_upload_flow_from_anywhere() {
        let engine = engine();
        engine
            .handle("u1", &EventPayload::Callback("deep_analyze".into()))
            .await;
        let out = engine
            .handle("u1", &EventPayload::Text("Upload Statement".into()))
            .await;
        assert_eq!(state_of(&engine, "u1").await, FlowState::UploadWaiting);
        assert!(out[0].text.contains("Upload a statement"));
    }

    #[tokio::test]
    async fn menu_callback_resets_mid_flow() {
        let engine = engine();
        engine
            .handle("u1", &EventPayload::Callback("deep_analyze".into()))
            .await;
        engine.handle("u1", &EventPayload::Text("50000".into())).await;

        let out = engine.handle("u1", &EventPayload::Callback("menu".into())).await;
        assert_eq!(state_of(&engine, "u1").await, FlowState::Idle);
        assert!(out[0].keyboard.is_some());

        let cell = engine.sessions().session("u1");
        assert!(cell.lock().await.answers.is_empty());
    }
}
