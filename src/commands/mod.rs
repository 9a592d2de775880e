pub mod backends;
pub mod completions;
pub mod edit;
pub mod guess;
pub mod list;
pub mod query;
pub mod sync;
