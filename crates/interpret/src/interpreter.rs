//! Ordered chain of deterministic parsers; the first non-empty answer wins.

use std::sync::Arc;

use runbar_plugin::PluginContext;
use runbar_types::ExecutableCommand;
use tracing::debug;

use crate::currency::parse_currency_conversion;
use crate::fraction::parse_fraction;
use crate::relative_time::{Clock, SystemClock, parse_relative_time_at};
use crate::symbolic::parse_symbolic_arithmetic;
use crate::units::parse_unit_conversion;
use crate::worded::parse_worded_arithmetic;

type OfflineParser = fn(&str) -> Vec<ExecutableCommand>;

const ARITHMETIC: [(&str, OfflineParser); 2] =
    [("symbolic", parse_symbolic_arithmetic), ("worded", parse_worded_arithmetic)];
const UNITS: [(&str, OfflineParser); 1] = [("unit", parse_unit_conversion)];
const FRACTIONS: [(&str, OfflineParser); 1] = [("fraction", parse_fraction)];

#[derive(Debug, Clone)]
pub struct QueryInterpreter {
    clock: Arc<dyn Clock>,
}

impl Default for QueryInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryInterpreter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// symbolic → worded → currency → unit → relative time → fraction.
    pub async fn interpret(&self, query: &str, context: &PluginContext) -> Vec<ExecutableCommand> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        if let Some(found) = self.first_match(query, &ARITHMETIC) {
            return found;
        }
        let currency = parse_currency_conversion(query, context).await;
        if !currency.is_empty() {
            debug!(parser = "currency", "query interpreted");
            return currency;
        }
        self.interpret_tail(query)
    }

    /// The same chain without the currency stage, which needs the network.
    pub fn interpret_offline(&self, query: &str) -> Vec<ExecutableCommand> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.first_match(query, &ARITHMETIC)
            .unwrap_or_else(|| self.interpret_tail(query))
    }

    fn interpret_tail(&self, query: &str) -> Vec<ExecutableCommand> {
        if let Some(found) = self.first_match(query, &UNITS) {
            return found;
        }
        let relative = parse_relative_time_at(query, self.clock.now());
        if !relative.is_empty() {
            debug!(parser = "relative_time", "query interpreted");
            return relative;
        }
        self.first_match(query, &FRACTIONS).unwrap_or_default()
    }

    fn first_match(&self, query: &str, parsers: &[(&str, OfflineParser)]) -> Option<Vec<ExecutableCommand>> {
        parsers.iter().find_map(|(name, parse)| {
            let found = parse(query);
            if found.is_empty() {
                return None;
            }
            debug!(parser = *name, "query interpreted");
            Some(found)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relative_time::FixedClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use runbar_plugin::{FetchError, Fetcher, PluginServices, RecordedFailures};
    use runbar_types::{AppMode, CommandHandler, Settings};
    use serde_json::{Value, json};

    struct Rates;

    #[async_trait]
    impl Fetcher for Rates {
        async fn get_json(&self, _url: &str) -> Result<Value, FetchError> {
            Ok(json!({"usd": {"eur": 0.5}}))
        }
    }

    fn interpreter() -> QueryInterpreter {
        QueryInterpreter::with_clock(Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap())))
    }

    fn online_context() -> PluginContext {
        PluginServices::offline()
            .with_fetcher(Arc::new(Rates))
            .with_failures(Arc::new(RecordedFailures::new()))
            .snapshot("", AppMode::Initial, Arc::new(Settings::default()), Arc::from(Vec::new()))
    }

    fn first_value(results: Vec<ExecutableCommand>) -> Option<String> {
        results.into_iter().next().map(|command| command.value)
    }

    #[test]
    fn runs_parsers_in_order() {
        let interpreter = interpreter();
        assert_eq!(first_value(interpreter.interpret_offline("1 + 1")).as_deref(), Some("2"));
        assert_eq!(first_value(interpreter.interpret_offline("one plus one plus one")).as_deref(), Some("3"));
        assert_eq!(first_value(interpreter.interpret_offline("10 km")).as_deref(), Some("6.21"));
        assert_eq!(
            first_value(interpreter.interpret_offline("2 days ago")).as_deref(),
            Some("2025-01-08T08:00:00.000Z")
        );
        assert_eq!(first_value(interpreter.interpret_offline("one half")).as_deref(), Some("0.5"));
    }

    #[test]
    fn plain_text_and_empty_queries_produce_nothing() {
        let interpreter = interpreter();
        assert!(interpreter.interpret_offline("").is_empty());
        assert!(interpreter.interpret_offline("   ").is_empty());
        assert!(interpreter.interpret_offline("firefox").is_empty());
        assert!(interpreter.interpret_offline("23412").is_empty());
    }

    #[test]
    fn offline_chain_skips_currency() {
        assert!(interpreter().interpret_offline("10 usd to eur").is_empty());
    }

    #[tokio::test]
    async fn full_chain_includes_currency() {
        let results = interpreter().interpret("10 usd to eur", &online_context()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value, "€5.00");
        assert_eq!(results[0].handler, CommandHandler::FormulaResult);
    }

    #[tokio::test]
    async fn arithmetic_wins_before_currency_is_consulted() {
        let results = interpreter().interpret("2 * 3", &online_context()).await;
        assert_eq!(results[0].value, "6");
    }
}
