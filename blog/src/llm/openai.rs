use crate::llm;
use crate::{Error, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs, Role,
    },
};
use async_trait::async_trait;
use tracing::{debug, info};

/// Connection and request parameters for [`OpenAI`].
///
/// `temperature` and `max_tokens` are only sent when set, otherwise the
/// service defaults apply.
#[derive(Clone, Debug)]
pub struct OpenAISettings {
    pub model: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl OpenAISettings {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            api_base: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

pub struct OpenAI {
    settings: OpenAISettings,
    client: Client<OpenAIConfig>,
}

impl OpenAI {
    pub fn new(settings: OpenAISettings) -> std::sync::Arc<Self> {
        let mut config = OpenAIConfig::new().with_api_key(settings.api_key.clone());
        if let Some(base) = &settings.api_base {
            config = config.with_api_base(base.clone());
        }

        std::sync::Arc::new(Self {
            settings,
            client: Client::with_config(config),
        })
    }
}

impl From<&llm::Message> for ChatCompletionRequestMessage {
    fn from(msg: &llm::Message) -> Self {
        match msg {
            llm::Message::User(msg) => {
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(msg.clone()),
                    name: None,
                })
            }
            llm::Message::System(msg) => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.clone()),
                    name: None,
                })
            }
        }
    }
}

#[async_trait]
impl llm::LLM for OpenAI {
    async fn completion<'a>(
        &self,
        request: llm::CompletionRequest<'a>,
    ) -> Result<llm::CompletionResponse> {
        let mut completion = CreateChatCompletionRequestArgs::default();
        completion.model(&self.settings.model).messages(
            request
                .messages
                .iter()
                .map(ChatCompletionRequestMessage::from)
                .collect::<Vec<_>>(),
        );

        if let Some(temperature) = self.settings.temperature {
            completion.temperature(temperature);
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            completion.max_completion_tokens(max_tokens);
        }

        let completion = completion.build()?;

        info!(model = %self.settings.model, "requesting chat completion");
        let res = self.client.chat().create(completion).await?;

        let choice = res
            .choices
            .first()
            .ok_or(Error::LLMResponseError("choices is empty".to_string()))?;

        if choice.message.role != Role::Assistant {
            return Err(Error::LLMResponseError(
                "expected role to be assistant".to_string(),
            ));
        }

        let content = choice
            .message
            .content
            .as_ref()
            .ok_or(Error::LLMResponseError("content is empty".to_string()))?;

        debug!(bytes = content.len(), "received completion");

        Ok(llm::CompletionResponse {
            content: content.clone(),
        })
    }
}
