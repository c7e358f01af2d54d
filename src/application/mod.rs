pub mod use_cases;

pub use use_cases::comparer::FolderComparer;
pub use use_cases::dedupe::DedupeService;
pub use use_cases::fixer::LocFixer;
pub use use_cases::scanner::KeyScanner;
pub use use_cases::validator::LocValidator;
