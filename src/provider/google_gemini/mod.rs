pub(crate) mod error;
pub mod provider;
pub(crate) mod request;
pub(crate) mod response;
pub(crate) mod types;

pub use provider::GoogleGeminiProvider;
