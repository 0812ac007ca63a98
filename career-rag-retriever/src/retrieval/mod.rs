pub mod freshness;
pub mod indexing_pipeline;
pub mod prompt;
pub mod retriever;
