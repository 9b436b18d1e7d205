pub mod factory;
pub mod http_client;
pub mod huggingface;
pub mod openai_compat;
pub mod prompt;
pub mod scrub;
pub mod sse;
pub mod traits;

pub use factory::create_chat_model;
pub use huggingface::HuggingFaceModel;
pub use openai_compat::OpenAiCompatibleModel;
pub use prompt::{Conversation, Message, PromptOptions, Role, build_prompt, tool_preamble};
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use traits::{ChatModel, GenerationParams, RawStream};
