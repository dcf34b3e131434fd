pub mod handlers;
pub mod orchestrator;
pub mod prompt_builder;
pub mod prompts;
pub mod response_parser;

pub use orchestrator::InterviewOrchestrator;
