pub mod db;
pub mod generation_llm;
pub mod identity;
pub mod unconfigured;

pub use db::DbAdapter;
pub use generation_llm::OpenAiGenerationAdapter;
pub use identity::GoogleIdentityAdapter;
pub use unconfigured::Unconfigured;
