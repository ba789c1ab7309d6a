//! Core projection engine: tokenizing, flattening, and initializer reshaping

pub mod flatten;
pub mod project;
pub mod tokenizer;

pub use flatten::{build_view_tree, check_embedding_cycles, Flattener};
pub use project::{parse_initializer, InitValue, Projector};
