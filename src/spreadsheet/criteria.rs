use glob::Pattern;
use std::collections::HashSet;

/// Cell texts read as missing values unless overridden, matching what pandas
/// `read_excel` treats as NaN.
pub const DEFAULT_NULLS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Criteria for selecting sheets and interpreting their cell values.
#[derive(Clone, Debug)]
pub struct Criteria {
    /// Sheet name patterns; `None` selects every sheet.
    pub sheet_name_patterns: Option<Vec<Pattern>>,

    /// Number of leading data rows used for type inference; `None` uses all rows.
    pub analyze_rows: Option<usize>,

    /// Exact cell texts treated as missing values.
    pub nulls: HashSet<String>,

    /// Treat error cells (`#DIV/0!`, ...) as missing values instead of text.
    pub error_as_null: bool,
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria {
            sheet_name_patterns: None,
            analyze_rows: None,
            nulls: DEFAULT_NULLS.iter().map(|null| null.to_string()).collect(),
            error_as_null: false,
        }
    }
}

impl Criteria {
    /// Returns true if no patterns are specified or if the name matches any of them.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_name_patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }

    pub(crate) fn is_null(&self, text: &str) -> bool {
        self.nulls.contains(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_sheets() {
        let criteria = Criteria {
            sheet_name_patterns: Some(vec![Pattern::new("2024-*").unwrap(), Pattern::new("People").unwrap()]),
            ..Criteria::default()
        };
        assert!(criteria.accept("People"));
        assert!(criteria.accept("2024-Q1"));
        assert!(!criteria.accept("Archive"));
        assert!(Criteria::default().accept("Archive"));
    }

    #[test]
    fn default_null_literals() {
        let criteria = Criteria::default();
        assert!(criteria.is_null(""));
        assert!(criteria.is_null("N/A"));
        assert!(criteria.is_null("None"));
        assert!(!criteria.is_null("none at all"));
    }
}
