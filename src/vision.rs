// src/vision.rs

use crate::config::VisionSection;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

/// The instruction sent alongside the form image. The JSON template names
/// exactly the fields the validator requires; its single-quoted style is
/// the source of the single-quoted responses the parser repairs.
const EXTRACTION_PROMPT: &str = r#"这是一张报销单，请帮我提取以下信息：报销单号、日期、报销人、部门、费用明细（包含项目名称和金额）。请以JSON格式返回，格式为：{'报销单号':'xxx', '日期':'xxx', '报销人':'xxx', '部门':'xxx', '项目':[{'名称':'xxx', '金额':xxx}], '总金额':xxx}"#;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for an OpenAI-compatible vision endpoint (DashScope/Qwen by
/// default). Constructed once at startup and shared by reference.
pub struct VisionClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl VisionClient {
    /// Resolve the endpoint from config. Fails fast when the API key
    /// environment variable is not set.
    pub fn from_config(section: &VisionSection) -> Result<Self, Box<dyn std::error::Error>> {
        let api_key = std::env::var(&section.api_key_env)
            .map_err(|_| format!("{} env var required for vision backend", section.api_key_env))?;
        info!(
            url = %section.base_url,
            model = %section.model,
            "Using vision API backend"
        );
        Ok(Self {
            http: Client::new(),
            base_url: section.base_url.clone(),
            model: section.model.clone(),
            api_key,
        })
    }

    /// Send one prepared (PNG-encoded) form image to the model and return
    /// the raw response text for the pipeline to interpret.
    pub async fn recognize(&self, image_png: &[u8]) -> Result<String, Box<dyn std::error::Error>> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: encode_data_url(image_png),
                        },
                    },
                    ContentPart::Text {
                        text: EXTRACTION_PROMPT.to_string(),
                    },
                ],
            }],
        };

        let url = format!("{}/chat/completions", self.base_url);
        info!(image_bytes = image_png.len(), "Sending form image to vision API");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("vision API error {status}: {body}").into());
        }

        let chat_response: ChatResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or("empty response from vision API")?;

        info!(chars = content.len(), "Vision API response received");
        Ok(content)
    }
}

/// Inline the image as a base64 data URL, the form OpenAI-compatible
/// vision endpoints accept.
fn encode_data_url(image_png: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(image_png);
    format!("data:image/png;base64,{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_has_png_prefix() {
        let url = encode_data_url(&[0x89, b'P', b'N', b'G']);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn prompt_names_every_required_field() {
        for field in ["报销单号", "日期", "报销人", "部门", "项目", "名称", "金额", "总金额"] {
            assert!(EXTRACTION_PROMPT.contains(field), "prompt missing {field}");
        }
    }

    #[test]
    fn request_serializes_with_tagged_parts() {
        let request = ChatRequest {
            model: "qwen-vl-max-latest".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: vec![ContentPart::Text {
                    text: "hello".into(),
                }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "hello");
    }
}
