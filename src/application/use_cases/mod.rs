mod batch;
pub mod column_normalizer;
pub mod comparer;
pub mod dedupe;
pub mod duplicate_resolver;
pub mod encoding_converter;
pub mod fixer;
pub mod line_endings;
pub mod report;
pub mod scanner;
pub mod validator;

pub use batch::Rewrite;
