use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{
    AssistantInput, AssistantMessage, AssistantOutput, AssistantPart, AssistantRole, LlmError,
    LlmProvider, LlmResult,
};
use crate::http::client::HttpClient;

/// Gemini `generateContent` client bound to exactly one API key. A fresh
/// instance is constructed for every rotation attempt; there is no shared
/// client configuration to toggle.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    /// Fails with `MissingApiKey` when the key is blank. This is the local,
    /// synchronous validation the rotation loop uses to skip a credential
    /// without spending a request.
    pub fn new(
        http: HttpClient,
        api_key: &str,
        model: impl Into<String>,
        base_url: &str,
    ) -> LlmResult<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(input: &AssistantInput) -> GeminiGenerateRequest {
        GeminiGenerateRequest {
            contents: input.messages.iter().map(to_content).collect(),
            system_instruction: input.system_instruction.as_ref().map(|text| {
                GeminiSystemInstruction {
                    parts: vec![GeminiPart {
                        text: Some(text.clone()),
                        ..GeminiPart::default()
                    }],
                }
            }),
            tools: if input.tools.is_empty() {
                Vec::new()
            } else {
                vec![GeminiTool {
                    function_declarations: input
                        .tools
                        .iter()
                        .map(|tool| GeminiFunctionDeclaration {
                            name: tool.name.clone(),
                            description: tool.description.clone(),
                            parameters: tool.parameters_json_schema.clone(),
                        })
                        .collect(),
                }]
            },
        }
    }

    fn extract_parts(resp: GeminiGenerateResponse) -> LlmResult<Vec<AssistantPart>> {
        for candidate in resp.candidates {
            let parts: Vec<AssistantPart> = candidate
                .content
                .parts
                .into_iter()
                .filter_map(from_part)
                .collect();
            if !parts.is_empty() {
                return Ok(parts);
            }
        }

        Err(LlmError::EmptyResponse)
    }
}

impl LlmProvider for GeminiProvider {
    async fn generate(&self, input: AssistantInput) -> LlmResult<AssistantOutput> {
        let payload = Self::build_request(&input);
        let resp = self
            .http
            .post_json(&self.endpoint(), &[("key", self.api_key.as_str())], &payload)
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if resp.status == 429 {
            return Err(LlmError::RateLimited);
        }
        if !(200..300).contains(&resp.status) {
            let body = resp.body.chars().take(400).collect::<String>();
            return Err(LlmError::HttpStatus {
                status: resp.status,
                body,
            });
        }

        let parsed = serde_json::from_str::<GeminiGenerateResponse>(&resp.body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        let parts = Self::extract_parts(parsed)?;
        Ok(AssistantOutput { parts })
    }
}

fn to_content(message: &AssistantMessage) -> GeminiContent {
    let role = match message.role {
        AssistantRole::User => "user",
        AssistantRole::Model => "model",
    };
    GeminiContent {
        role: role.to_string(),
        parts: message
            .parts
            .iter()
            .map(|part| match part {
                AssistantPart::Text { text } => GeminiPart {
                    text: Some(text.clone()),
                    ..GeminiPart::default()
                },
                AssistantPart::FunctionCall { name, args_json } => GeminiPart {
                    function_call: Some(GeminiFunctionCall {
                        name: name.clone(),
                        args: args_json.clone(),
                    }),
                    ..GeminiPart::default()
                },
                AssistantPart::FunctionResponse {
                    name,
                    response_json,
                } => GeminiPart {
                    function_response: Some(GeminiFunctionResponse {
                        name: name.clone(),
                        response: response_json.clone(),
                    }),
                    ..GeminiPart::default()
                },
            })
            .collect(),
    }
}

fn from_part(part: GeminiPart) -> Option<AssistantPart> {
    if let Some(call) = part.function_call {
        return Some(AssistantPart::FunctionCall {
            name: call.name,
            args_json: call.args,
        });
    }
    let text = part.text?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(AssistantPart::Text {
            text: trimmed.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
struct GeminiGenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiResponseContent,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}
