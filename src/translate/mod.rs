pub mod context;
pub mod errors;
pub mod options;
pub mod read;
pub mod top_level_match;

pub use context::TranslationContext;
pub use errors::TranslateError;
pub use options::{parse_fulltext, FulltextArg, FulltextInput, QueryOptions};
pub use read::{translate_read, ReadTarget};
pub use top_level_match::{create_top_level_match, TopLevelMatch};
