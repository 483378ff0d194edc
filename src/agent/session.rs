use crate::agent::capability::{self, Capability, CapabilityAction};
use crate::agent::prompt::AGENT_SYSTEM_PROMPT;
use crate::http::client::HttpClient;
use crate::llm::gemini::GeminiProvider;
use crate::llm::provider::{
    AssistantInput, AssistantMessage, AssistantRole, LlmError, LlmProvider,
};
use crate::memory::{ConversationMemory, Role};
use crate::rotation::{AnswerError, SessionFactory, TurnSession};

/// One request-answering session: a provider bound to a single credential plus
/// a snapshot of the shared conversation history taken at build time.
pub struct AgentSession<P> {
    provider: P,
    history: Vec<AssistantMessage>,
}

impl<P: LlmProvider> AgentSession<P> {
    pub fn new(provider: P, memory: &ConversationMemory) -> Self {
        let history = memory
            .turns()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => AssistantRole::User,
                    Role::Assistant => AssistantRole::Model,
                };
                AssistantMessage::text(role, turn.content.clone())
            })
            .collect();

        Self { provider, history }
    }

    async fn run_capability(&self, selected: Capability) -> Result<String, AnswerError> {
        match selected.action() {
            CapabilityAction::Static(text) => Ok(text.to_string()),
            CapabilityAction::FollowUp(prompt) => {
                let output = self
                    .provider
                    .generate(AssistantInput {
                        system_instruction: None,
                        messages: vec![AssistantMessage::text(AssistantRole::User, prompt)],
                        tools: vec![],
                    })
                    .await
                    .map_err(map_llm_error)?;

                non_empty_reply(output.text())
            }
        }
    }
}

impl<P: LlmProvider + Sync> TurnSession for AgentSession<P> {
    async fn answer(&self, user_input: &str) -> Result<String, AnswerError> {
        let mut messages = self.history.clone();
        messages.push(AssistantMessage::text(AssistantRole::User, user_input));

        let output = self
            .provider
            .generate(AssistantInput {
                system_instruction: Some(AGENT_SYSTEM_PROMPT.trim().to_string()),
                messages,
                tools: capability::declarations(),
            })
            .await
            .map_err(map_llm_error)?;

        // A capability's output is the reply; otherwise the model answered
        // directly in plain text.
        if let Some((name, args)) = output.first_function_call() {
            let selected = Capability::from_call(name, args).map_err(AnswerError::Fatal)?;
            return self.run_capability(selected).await;
        }

        non_empty_reply(output.text())
    }
}

fn non_empty_reply(text: String) -> Result<String, AnswerError> {
    if text.is_empty() {
        Err(AnswerError::Fatal(
            "assistant returned an empty reply".to_string(),
        ))
    } else {
        Ok(text)
    }
}

fn map_llm_error(err: LlmError) -> AnswerError {
    match err {
        LlmError::RateLimited => AnswerError::RateLimited,
        other => AnswerError::Fatal(other.to_string()),
    }
}

/// Builds a fresh Gemini-backed session per rotation attempt. Local credential
/// validation happens in `GeminiProvider::new`; a blank key yields `None` and
/// the rotation loop moves on without issuing a request.
pub struct GeminiSessionFactory {
    http: HttpClient,
    model: String,
    base_url: String,
}

impl GeminiSessionFactory {
    pub fn new(http: HttpClient, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            model: model.into(),
            base_url: base_url.into(),
        }
    }
}

impl SessionFactory for GeminiSessionFactory {
    type Session = AgentSession<GeminiProvider>;

    fn build(&self, credential: &str, memory: &ConversationMemory) -> Option<Self::Session> {
        let provider =
            GeminiProvider::new(self.http.clone(), credential, self.model.clone(), &self.base_url)
                .ok()?;
        Some(AgentSession::new(provider, memory))
    }
}
