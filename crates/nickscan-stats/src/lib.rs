//! HTTP-backed stats lookup and analysis generation

mod analysis;
mod client;
pub mod prompt;

pub use analysis::OpenAiAnalysisService;
pub use client::HttpStatsService;
