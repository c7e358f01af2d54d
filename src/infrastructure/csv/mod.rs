// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Localisation file parsing, key lists, and issue export

mod issue_export;
mod key_list;
mod loc_parser;

pub use issue_export::issues_to_csv;
pub use key_list::{parse_key_list, read_key_list};
pub use loc_parser::LocParser;
