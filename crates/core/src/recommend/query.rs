use serde::Serialize;
use thiserror::Error;

use crate::domain::item::Item;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query contains no items after cleaning")]
    Empty,
}

/// Cleaned query items plus whatever was cut off by the item cap.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    pub items: Vec<Item>,
    pub truncated: Vec<Item>,
}

impl ParsedQuery {
    pub fn was_truncated(&self) -> bool {
        !self.truncated.is_empty()
    }
}

/// Splits free-form input on `delimiter`, normalizes each piece, drops blanks
/// and keeps at most `max_items`, in input order.
pub fn parse_query(input: &str, delimiter: char, max_items: usize) -> Result<ParsedQuery, QueryError> {
    let mut items: Vec<Item> = input.split(delimiter).filter_map(Item::parse).collect();
    if items.is_empty() {
        return Err(QueryError::Empty);
    }

    let truncated = if items.len() > max_items { items.split_off(max_items) } else { Vec::new() };
    Ok(ParsedQuery { items, truncated })
}

#[cfg(test)]
mod tests {
    use super::{parse_query, QueryError};
    use crate::domain::item::Item;

    fn item(label: &str) -> Item {
        Item::parse(label).expect("valid label")
    }

    #[test]
    fn splits_trims_and_case_folds() {
        let parsed = parse_query(" Whole Milk , bread,, ", ',', 3).expect("two items");
        assert_eq!(parsed.items, vec![item("whole milk"), item("bread")]);
        assert!(!parsed.was_truncated());
    }

    #[test]
    fn caps_items_and_reports_the_rest() {
        let parsed = parse_query("a,b,c,d,e", ',', 3).expect("items");
        assert_eq!(parsed.items, vec![item("a"), item("b"), item("c")]);
        assert_eq!(parsed.truncated, vec![item("d"), item("e")]);
    }

    #[test]
    fn blank_input_is_rejected() {
        assert_eq!(parse_query(" , ,", ',', 3), Err(QueryError::Empty));
        assert_eq!(parse_query("", ',', 3), Err(QueryError::Empty));
    }

    #[test]
    fn custom_delimiter_is_honored() {
        let parsed = parse_query("eggs;butter", ';', 3).expect("items");
        assert_eq!(parsed.items, vec![item("eggs"), item("butter")]);
    }
}
