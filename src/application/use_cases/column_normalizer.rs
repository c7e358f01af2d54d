// ============================================================
// COLUMN NORMALIZER
// ============================================================
// Force a record to the fixed column layout

use crate::domain::loc::{FormatConfig, LocRecord, DELIMITER, DELIMITER_STR};

/// What normalizing a record changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnChange {
    /// Column count before normalizing, when it differed from the target
    pub resized_from: Option<usize>,

    /// The terminator field had to be overwritten
    pub terminator_set: bool,
}

impl ColumnChange {
    pub fn is_change(&self) -> bool {
        self.resized_from.is_some() || self.terminator_set
    }
}

/// Truncate or pad `fields` to the configured width and force the terminator
pub fn normalize_fields(fields: &mut Vec<String>, config: &FormatConfig) -> ColumnChange {
    let mut change = ColumnChange::default();

    if fields.len() != config.columns {
        change.resized_from = Some(fields.len());
        fields.resize(config.columns, String::new());
    }

    if let Some(terminator) = fields.get_mut(config.terminator_index) {
        if *terminator != config.terminator_value {
            // A blank slot created by padding is not worth reporting on its own.
            change.terminator_set = change.resized_from.is_none() || !terminator.is_empty();
            *terminator = config.terminator_value.clone();
        }
    }

    change
}

pub fn normalize_record(record: &mut LocRecord, config: &FormatConfig) -> ColumnChange {
    normalize_fields(&mut record.fields, config)
}

/// Normalize one raw line
pub fn normalize_line(line: &str, config: &FormatConfig) -> String {
    let mut fields: Vec<String> = line.split(DELIMITER).map(str::to_string).collect();
    normalize_fields(&mut fields, config);
    fields.join(DELIMITER_STR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FormatConfig {
        FormatConfig::default()
    }

    fn count_fields(line: &str) -> usize {
        line.split(';').count()
    }

    #[test]
    fn test_pads_short_line() {
        let fixed = normalize_line("EVTNAME1;Hello;Hallo", &config());
        assert_eq!(count_fields(&fixed), 19);
        assert!(fixed.starts_with("EVTNAME1;Hello;Hallo;;"));
        assert_eq!(fixed.split(';').nth(14), Some("x"));
    }

    #[test]
    fn test_truncates_long_line() {
        let long = (0..25).map(|i| i.to_string()).collect::<Vec<_>>().join(";");
        let fixed = normalize_line(&long, &config());
        let fields: Vec<_> = fixed.split(';').collect();
        assert_eq!(fields.len(), 19);
        assert_eq!(fields[13], "13");
        assert_eq!(fields[14], "x");
        assert_eq!(fields[18], "18");
    }

    #[test]
    fn test_forces_terminator_value() {
        let mut fields: Vec<String> = (0..19).map(|_| String::new()).collect();
        fields[0] = "KEY".to_string();
        fields[14] = " x ".to_string();
        let change = normalize_fields(&mut fields, &config());
        assert_eq!(fields[14], "x");
        assert_eq!(change.resized_from, None);
        assert!(change.terminator_set);
    }

    #[test]
    fn test_padding_alone_reports_resize_only() {
        let mut fields = vec!["KEY".to_string(), "Hello".to_string()];
        let change = normalize_fields(&mut fields, &config());
        assert_eq!(change.resized_from, Some(2));
        assert!(!change.terminator_set);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "K",
            "K;a;b",
            "K;;;;;;;;;;;;;;x;;;;",
            "K;1;2;3;4;5;6;7;8;9;10;11;12;13;y;15;16;17;18;19;20",
            "K;é;ü;;;;;;;;;;;;;;;;",
        ];
        for input in inputs {
            let once = normalize_line(input, &config());
            let twice = normalize_line(&once, &config());
            assert_eq!(once, twice, "input {:?}", input);
        }
    }

    #[test]
    fn test_correct_line_is_untouched() {
        let correct = "K;a;;;;;;;;;;;;;x;;;;";
        let mut fields: Vec<String> = correct.split(';').map(str::to_string).collect();
        assert!(!normalize_fields(&mut fields, &config()).is_change());
        assert_eq!(fields.join(";"), correct);
    }
}
