//! A plugin bound to a context.

use std::sync::Arc;

use runbar_types::{AppMode, ExecutableCommand};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::context::PluginContext;
use crate::contract::{HandleOutcome, Plugin, PluginError};

/// The `(context) -> instance` side of the contract.
///
/// Every operation is always callable; segments the plugin does not implement
/// resolve to no-op defaults.
pub struct PluginInstance {
    plugin: Arc<dyn Plugin>,
    context: PluginContext,
    registered: OnceCell<()>,
}

impl PluginInstance {
    pub fn new(plugin: Arc<dyn Plugin>, context: PluginContext) -> Self {
        Self {
            plugin,
            context,
            registered: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    /// Run the plugin's setup hook once; later calls return immediately.
    pub async fn register(&self) -> Result<&Self, PluginError> {
        self.registered
            .get_or_try_init(|| async {
                if let Some(hook) = self.plugin.register_hook() {
                    debug!(plugin = self.name(), "registering plugin");
                    hook.on_register(&self.context).await?;
                }
                Ok::<(), PluginError>(())
            })
            .await?;
        Ok(self)
    }

    pub fn is_registered(&self) -> bool {
        self.registered.initialized()
    }

    pub async fn handle_command(&self, command: &ExecutableCommand) -> Result<HandleOutcome, PluginError> {
        match self.plugin.command_interceptor() {
            Some(interceptor) => interceptor.handle_command(command, &self.context).await,
            None => Ok(HandleOutcome::UNMATCHED),
        }
    }

    pub async fn add_app_modes(&self) -> Result<Vec<AppMode>, PluginError> {
        match self.plugin.app_mode_contributor() {
            Some(contributor) => contributor.add_app_modes(&self.context).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn add_search_results(&self, query: &str) -> Result<Vec<ExecutableCommand>, PluginError> {
        match self.plugin.search_results_provider() {
            Some(provider) => {
                let results = provider.add_search_results(query, &self.context).await?;
                results.iter().try_for_each(ExecutableCommand::validate)?;
                Ok(results)
            }
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{AppModeContributor, CommandInterceptor, RegisterHook, SearchResultsProvider};
    use async_trait::async_trait;
    use runbar_types::CommandHandler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FullPlugin {
        registrations: AtomicUsize,
    }

    #[async_trait]
    impl RegisterHook for FullPlugin {
        async fn on_register(&self, _context: &PluginContext) -> Result<(), PluginError> {
            self.registrations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl CommandInterceptor for FullPlugin {
        async fn handle_command(&self, command: &ExecutableCommand, _context: &PluginContext) -> Result<HandleOutcome, PluginError> {
            Ok(HandleOutcome {
                matched: command.handler == CommandHandler::System,
            })
        }
    }

    #[async_trait]
    impl AppModeContributor for FullPlugin {
        async fn add_app_modes(&self, _context: &PluginContext) -> Result<Vec<AppMode>, PluginError> {
            Ok(vec![AppMode::custom("mode1")?, AppMode::custom("mode2")?])
        }
    }

    #[async_trait]
    impl SearchResultsProvider for FullPlugin {
        async fn add_search_results(&self, query: &str, _context: &PluginContext) -> Result<Vec<ExecutableCommand>, PluginError> {
            Ok(vec![ExecutableCommand::builder(query, query, CommandHandler::System).build()?])
        }
    }

    impl Plugin for FullPlugin {
        fn name(&self) -> &str {
            "Full"
        }

        fn register_hook(&self) -> Option<&dyn RegisterHook> {
            Some(self)
        }

        fn command_interceptor(&self) -> Option<&dyn CommandInterceptor> {
            Some(self)
        }

        fn app_mode_contributor(&self) -> Option<&dyn AppModeContributor> {
            Some(self)
        }

        fn search_results_provider(&self) -> Option<&dyn SearchResultsProvider> {
            Some(self)
        }
    }

    struct BarePlugin;

    impl Plugin for BarePlugin {
        fn name(&self) -> &str {
            "Bare"
        }
    }

    fn system_command() -> ExecutableCommand {
        ExecutableCommand::builder("Exit", "EXIT", CommandHandler::System).build().unwrap()
    }

    #[tokio::test]
    async fn register_runs_hook_once() {
        let plugin = Arc::new(FullPlugin::default());
        let instance = PluginInstance::new(plugin.clone(), PluginContext::offline("", AppMode::Initial));

        let returned = instance.register().await.unwrap();
        assert_eq!(returned.name(), "Full");
        instance.register().await.unwrap();

        assert!(instance.is_registered());
        assert_eq!(plugin.registrations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn present_segments_are_dispatched() {
        let instance = PluginInstance::new(Arc::new(FullPlugin::default()), PluginContext::offline("", AppMode::Initial));

        assert!(instance.handle_command(&system_command()).await.unwrap().matched);
        let modes = instance.add_app_modes().await.unwrap();
        assert_eq!(modes, vec![AppMode::Custom("mode1".into()), AppMode::Custom("mode2".into())]);
        let results = instance.add_search_results("hello").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "hello");
    }

    #[tokio::test]
    async fn missing_segments_default_to_no_ops() {
        let instance = PluginInstance::new(Arc::new(BarePlugin), PluginContext::offline("", AppMode::Initial));

        instance.register().await.unwrap();
        assert_eq!(instance.handle_command(&system_command()).await.unwrap(), HandleOutcome::UNMATCHED);
        assert!(instance.add_app_modes().await.unwrap().is_empty());
        assert!(instance.add_search_results("hello").await.unwrap().is_empty());
    }
}
