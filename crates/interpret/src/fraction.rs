//! Spoken fractions: `one half`, `three quarters`, `two thirds of ninety`.

use runbar_types::ExecutableCommand;

use crate::format::numeric_result;
use crate::number_words::{parse_exact, parse_number, tokenize};

fn denominator(word: &str) -> Option<f64> {
    let value = match word {
        "half" | "halves" => 2.0,
        "third" | "thirds" => 3.0,
        "quarter" | "quarters" | "fourth" | "fourths" => 4.0,
        "fifth" | "fifths" => 5.0,
        "sixth" | "sixths" => 6.0,
        "seventh" | "sevenths" => 7.0,
        "eighth" | "eighths" => 8.0,
        "ninth" | "ninths" => 9.0,
        "tenth" | "tenths" => 10.0,
        _ => return None,
    };
    Some(value)
}

pub fn parse_fraction(query: &str) -> Vec<ExecutableCommand> {
    evaluate(query).and_then(numeric_result).into_iter().collect()
}

/// `<count> <fraction word> [of <quantity>]`; the count may be a number, an
/// article, or omitted (`half of ten`).
pub fn evaluate(query: &str) -> Option<f64> {
    let tokens = tokenize(query);
    let (count, consumed) = match tokens.first().map(String::as_str)? {
        "a" | "an" => (1.0, 1),
        first if denominator(first).is_some() => (1.0, 0),
        _ => parse_number(&tokens)?,
    };

    let rest = &tokens[consumed..];
    let divisor = denominator(rest.first()?)?;

    match &rest[1..] {
        [] => Some(count / divisor),
        [of, quantity @ ..] if of == "of" && !quantity.is_empty() => Some(count * parse_exact(quantity)? / divisor),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_simple_fractions() {
        assert_eq!(evaluate("one half"), Some(0.5));
        assert_eq!(evaluate("a quarter"), Some(0.25));
        assert_eq!(evaluate("three quarters"), Some(0.75));
        assert_eq!(evaluate("2 fifths"), Some(0.4));
    }

    #[test]
    fn applies_fraction_to_quantity() {
        assert_eq!(evaluate("two thirds of ninety"), Some(60.0));
        assert_eq!(evaluate("half of ten"), Some(5.0));
        assert_eq!(evaluate("three quarters of 200"), Some(150.0));
    }

    #[test]
    fn formats_repeating_fractions() {
        let results = parse_fraction("one third");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value, "0.33");
    }

    #[test]
    fn rejects_incomplete_or_foreign_input() {
        assert_eq!(evaluate("two thirds of"), None);
        assert_eq!(evaluate("two thirds of pizza"), None);
        assert_eq!(evaluate("one"), None);
        assert_eq!(evaluate("quarterback"), None);
        assert_eq!(evaluate(""), None);
    }
}
