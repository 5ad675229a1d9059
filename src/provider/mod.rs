//! Backend wire layers and the shared retry primitives.

pub mod google_gemini;
pub(crate) mod retry;

pub use google_gemini::GoogleGeminiProvider;
