//! The two-stage question answering chain: standalone-question rewriting,
//! retrieval, then grounded answer synthesis.

pub mod pipeline;
pub mod prompts;
pub mod rewriter;
pub mod synthesizer;

pub use pipeline::{normalize_question, AnswerResponse, QueryRequest, RagPipeline};
pub use prompts::PromptSet;
pub use rewriter::QueryRewriter;
pub use synthesizer::AnswerSynthesizer;
