//! Shared rendering of computed answers.

use runbar_types::{AppMode, CommandHandler, ExecutableCommand, Priority};

/// Decimal places kept in every computed answer.
pub const DECIMAL_PLACES: i32 = 2;

pub fn round_to_precision(value: f64) -> f64 {
    let factor = 10f64.powi(DECIMAL_PLACES);
    (value * factor).round() / factor
}

/// Round to [`DECIMAL_PLACES`] and render without trailing zeros.
///
/// ```rust
/// use runbar_interpret::format::format_number;
///
/// assert_eq!(format_number(3.0), "3");
/// assert_eq!(format_number(6.213711), "6.21");
/// assert_eq!(format_number(-0.001), "0");
/// ```
pub fn format_number(value: f64) -> String {
    let rounded = round_to_precision(value);
    if rounded == 0.0 {
        return "0".to_string();
    }
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        return format!("{}", rounded as i64);
    }
    format!("{rounded}")
}

/// A synthetic answer: copyable, high confidence, listed above regular matches.
pub(crate) fn synthetic_result(label: impl Into<String>, value: impl Into<String>) -> ExecutableCommand {
    ExecutableCommand {
        label: label.into(),
        localized_label: None,
        value: value.into(),
        handler: CommandHandler::FormulaResult,
        metadata: None,
        app_modes: vec![AppMode::Initial],
        smart_match: true,
        priority: Priority::HIGH,
    }
}

/// Synthetic answer whose label and value are the formatted number.
pub(crate) fn numeric_result(value: f64) -> Option<ExecutableCommand> {
    if !value.is_finite() {
        return None;
    }
    let text = format_number(value);
    Some(synthetic_result(text.clone(), text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_render_without_decimals() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(76192.5699), "76192.57");
        assert_eq!(format_number(1.005e3), "1005");
    }

    #[test]
    fn non_finite_values_produce_no_result() {
        assert!(numeric_result(f64::INFINITY).is_none());
        assert!(numeric_result(f64::NAN).is_none());
    }

    #[test]
    fn synthetic_results_bypass_fuzzy_filtering() {
        let command = numeric_result(2.0).unwrap();
        assert!(command.smart_match);
        assert_eq!(command.handler, CommandHandler::FormulaResult);
        assert!(command.validate().is_ok());
    }
}
