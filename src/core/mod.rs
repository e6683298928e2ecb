pub mod cleanup;
pub mod composition;
pub mod error;
pub mod fragment;
pub mod metadata;
pub mod pipeline;
pub mod prose;
pub mod recency;
pub mod selector;
pub mod template;
