//! Exposes the query interpreter, currency stage included, as a deferred
//! producer.

use std::sync::Arc;

use async_trait::async_trait;
use runbar_interpret::{Clock, QueryInterpreter};
use runbar_plugin::{Dispatch, Plugin, PluginContext, PluginError, SearchResultsProvider};
use runbar_types::ExecutableCommand;

#[derive(Debug, Clone, Default)]
pub struct NlpPlugin {
    interpreter: QueryInterpreter,
}

impl NlpPlugin {
    pub fn new(interpreter: QueryInterpreter) -> Self {
        Self { interpreter }
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(QueryInterpreter::with_clock(clock))
    }
}

#[async_trait]
impl SearchResultsProvider for NlpPlugin {
    async fn add_search_results(&self, query: &str, context: &PluginContext) -> Result<Vec<ExecutableCommand>, PluginError> {
        Ok(self.interpreter.interpret(query, context).await)
    }
}

impl Plugin for NlpPlugin {
    fn name(&self) -> &str {
        "Nlp"
    }

    fn dispatch(&self) -> Dispatch {
        Dispatch::Deferred
    }

    fn search_results_provider(&self) -> Option<&dyn SearchResultsProvider> {
        Some(self)
    }
}
