//! Command implementations.

pub mod catalog;
pub mod compose;
pub mod parse;
pub mod prompt;

pub use self::catalog::execute_catalog;
pub use self::compose::execute_compose;
pub use self::parse::execute_parse;
pub use self::prompt::execute_prompt;
