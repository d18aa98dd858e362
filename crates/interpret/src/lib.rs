//! Deterministic query interpretation.
//!
//! Each parser maps text to zero or one synthetic result. The
//! [`QueryInterpreter`] chains them; only currency conversion touches the
//! network, through the [`runbar_plugin::PluginContext`] it is handed.

pub mod currency;
pub mod format;
pub mod fraction;
pub mod interpreter;
pub mod number_words;
pub mod relative_time;
pub mod symbolic;
pub mod units;
pub mod worded;

pub use currency::{format_currency, parse_currency_conversion, parse_currency_query, CurrencyQuery};
pub use format::format_number;
pub use fraction::parse_fraction;
pub use interpreter::QueryInterpreter;
pub use relative_time::{Clock, FixedClock, SystemClock, parse_relative_time, parse_relative_time_at};
pub use symbolic::parse_symbolic_arithmetic;
pub use units::parse_unit_conversion;
pub use worded::parse_worded_arithmetic;
