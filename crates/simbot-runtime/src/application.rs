//! Application lifecycle: register bots from configuration, start them, and
//! cancel them on shutdown.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use simbot_runtime::SimbotApplication;
//!
//! let app = SimbotApplication::builder()
//!     .config_file("simbot.yaml")
//!     .build()?;
//! app.register_manager(mirai_manager).await;
//! app.run().await?;
//! ```

use std::future::Future;

use simbot_core::{BoxedBot, BoxedBotManager};
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigLoader, ConfigResult, SimbotConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Registers bots from configuration and drives their lifecycle.
pub struct SimbotApplication {
    config: SimbotConfig,
    managers: RwLock<Vec<BoxedBotManager>>,
    bots: RwLock<Vec<BoxedBot>>,
    running: RwLock<bool>,
}

impl SimbotApplication {
    /// Loads configuration from the current directory, falling back to
    /// defaults when it cannot be loaded.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                SimbotConfig::default()
            });
        Self::from_config(&config)
    }

    /// Creates a builder for custom configuration loading.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Creates an application and initializes logging from `config`.
    pub fn from_config(config: &SimbotConfig) -> Self {
        logging::init_from_config(&config.logging);
        info!(
            log_level = %config.logging.level,
            bots = config.bots.len(),
            auto_start_bots = config.auto_start_bots,
            "Application initialized from configuration"
        );

        Self {
            config: config.clone(),
            managers: RwLock::new(Vec::new()),
            bots: RwLock::new(Vec::new()),
            running: RwLock::new(false),
        }
    }

    /// The effective configuration.
    pub fn config(&self) -> &SimbotConfig {
        &self.config
    }

    /// Adds a bot manager. Verify info is offered to managers in
    /// registration order.
    pub async fn register_manager(&self, manager: BoxedBotManager) {
        info!(component = manager.component(), "Registered bot manager");
        self.managers.write().await.push(manager);
    }

    /// Registered managers.
    pub async fn managers(&self) -> Vec<BoxedBotManager> {
        self.managers.read().await.clone()
    }

    /// Bots registered so far.
    pub async fn bots(&self) -> Vec<BoxedBot> {
        self.bots.read().await.clone()
    }

    /// Returns whether the application is started.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Hands every enabled bot entry to the first manager supporting it.
    ///
    /// Entries no manager supports are skipped. A manager refusing an entry
    /// fails the whole call.
    pub async fn register_bots(&self) -> RuntimeResult<Vec<BoxedBot>> {
        let managers = self.managers().await;
        let mut registered = Vec::new();

        for info in &self.config.bots {
            let name = info.display_name();
            if !info.enabled {
                debug!(bot = name, "Bot disabled, skipping");
                continue;
            }
            let Some(manager) = managers.iter().find(|m| m.is_supported(info)) else {
                debug!(
                    bot = name,
                    component = %info.component,
                    "No manager supports this component, skipping"
                );
                continue;
            };

            let bot = manager
                .register(info)
                .await
                .map_err(|source| RuntimeError::Registration {
                    name: name.to_string(),
                    source,
                })?;
            info!(bot = name, id = %bot.id(), component = bot.component(), "Bot registered");
            registered.push(bot);
        }

        self.bots.write().await.extend(registered.iter().cloned());
        Ok(registered)
    }

    /// Starts registered bots, unless `auto_start_bots` is off. A bot that
    /// fails to start is logged and skipped.
    pub async fn start(&self) -> RuntimeResult<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                warn!("Application is already running");
                return Ok(());
            }
            *running = true;
        }

        if !self.config.auto_start_bots {
            info!("Automatic bot start disabled");
            return Ok(());
        }

        for bot in self.bots().await {
            match bot.start().await {
                Ok(true) => info!(id = %bot.id(), "Bot started"),
                Ok(false) => debug!(id = %bot.id(), "Bot was not started"),
                Err(e) => error!(id = %bot.id(), error = %e, "Failed to start bot"),
            }
        }
        Ok(())
    }

    /// Cancels every bot of every manager.
    pub async fn stop(&self) -> RuntimeResult<()> {
        {
            let mut running = self.running.write().await;
            if !*running {
                warn!("Application is not running");
                return Ok(());
            }
            *running = false;
        }

        for manager in self.managers().await {
            if let Err(e) = manager.cancel().await {
                error!(component = manager.component(), error = %e, "Error while cancelling bots");
            }
        }
        info!("Application stopped");
        Ok(())
    }

    /// Registers bots, starts, waits for Ctrl+C or SIGTERM, then stops.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Like [`run`](Self::run), stopping when `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.register_bots().await?;
        self.start().await?;
        info!("Application is running");

        shutdown.await;
        self.stop().await
    }
}

impl Default for SimbotApplication {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Cannot listen for SIGTERM"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Cannot listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// ApplicationBuilder
// =============================================================================

/// Builder for creating a [`SimbotApplication`] with custom configuration.
pub struct ApplicationBuilder {
    config_loader: ConfigLoader,
    managers: Vec<BoxedBotManager>,
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            managers: Vec::new(),
        }
    }

    /// Loads this configuration file.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration over the loaded sources.
    pub fn merge(mut self, config: SimbotConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Adds a bot manager.
    pub fn manager(mut self, manager: BoxedBotManager) -> Self {
        self.managers.push(manager);
        self
    }

    /// Loads configuration and builds the application.
    pub fn build(self) -> ConfigResult<SimbotApplication> {
        let config = self.config_loader.load()?;
        let mut app = SimbotApplication::from_config(&config);
        app.managers.get_mut().extend(self.managers);
        Ok(app)
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use simbot_core::{
        Bot, BotError, BotManager, BotResult, BotVerifyInfo, Contact, Element, Friend, Group, Id,
    };
    use std::any::Any;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio_test::assert_ok;

    struct StubBot {
        code: i64,
        active: AtomicBool,
        fail_start: bool,
    }

    #[async_trait]
    impl Bot for StubBot {
        fn id(&self) -> Id {
            Id::from(self.code)
        }
        fn username(&self) -> String {
            format!("stub-{}", self.code)
        }
        fn avatar(&self) -> String {
            String::new()
        }
        fn component(&self) -> &'static str {
            "stub"
        }
        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
        async fn start(&self) -> BotResult<bool> {
            if self.fail_start {
                return Err(BotError::login("stub refuses"));
            }
            Ok(!self.active.swap(true, Ordering::SeqCst))
        }
        async fn cancel(&self) -> BotResult<bool> {
            Ok(self.active.swap(false, Ordering::SeqCst))
        }
        async fn join(&self) {}
        async fn friend(&self, _: &Id) -> BotResult<Option<Arc<dyn Friend>>> {
            Ok(None)
        }
        async fn friends(&self) -> BotResult<Vec<Arc<dyn Friend>>> {
            Ok(Vec::new())
        }
        async fn group(&self, _: &Id) -> BotResult<Option<Arc<dyn Group>>> {
            Ok(None)
        }
        async fn groups(&self) -> BotResult<Vec<Arc<dyn Group>>> {
            Ok(Vec::new())
        }
        async fn contact(&self, _: &Id) -> BotResult<Option<Arc<dyn Contact>>> {
            Ok(None)
        }
        async fn contacts(&self) -> BotResult<Vec<Arc<dyn Contact>>> {
            Ok(Vec::new())
        }
        async fn resolve_image(&self, _: &Id) -> BotResult<Element> {
            Err(BotError::unsupported("images"))
        }
        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    #[derive(Default)]
    struct StubManager {
        bots: parking_lot::Mutex<Vec<Arc<StubBot>>>,
    }

    #[async_trait]
    impl BotManager for StubManager {
        fn component(&self) -> &'static str {
            "stub"
        }
        async fn register(&self, info: &BotVerifyInfo) -> BotResult<BoxedBot> {
            let code = info.config["code"]
                .as_i64()
                .ok_or_else(|| BotError::verify("code missing"))?;
            let bot = Arc::new(StubBot {
                code,
                active: AtomicBool::new(false),
                fail_start: info.config["fail"].as_bool().unwrap_or(false),
            });
            self.bots.lock().push(bot.clone());
            Ok(bot)
        }
        fn get(&self, id: &Id) -> Option<BoxedBot> {
            let code = id.to_long()?;
            self.bots
                .lock()
                .iter()
                .find(|b| b.code == code)
                .map(|b| b.clone() as BoxedBot)
        }
        fn all(&self) -> Vec<BoxedBot> {
            self.bots.lock().iter().map(|b| b.clone() as BoxedBot).collect()
        }
        async fn start(&self) -> BotResult<()> {
            Ok(())
        }
        async fn cancel(&self) -> BotResult<()> {
            for bot in self.all() {
                bot.cancel().await?;
            }
            Ok(())
        }
    }

    fn app(bots: Vec<BotVerifyInfo>, auto_start_bots: bool) -> SimbotApplication {
        SimbotApplication::from_config(&SimbotConfig {
            bots,
            auto_start_bots,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_register_bots_by_component() {
        let mut disabled = BotVerifyInfo::new("stub", json!({"code": 3}));
        disabled.enabled = false;
        let app = app(
            vec![
                BotVerifyInfo::new("stub", json!({"code": 1})),
                BotVerifyInfo::new("other", json!({"code": 2})),
                disabled,
            ],
            true,
        );
        let manager = Arc::new(StubManager::default());
        app.register_manager(manager.clone()).await;

        let bots = assert_ok!(app.register_bots().await);
        assert_eq!(bots.len(), 1);
        assert_eq!(bots[0].id(), Id::from(1_i64));
        assert_eq!(manager.all().len(), 1);
    }

    #[tokio::test]
    async fn test_register_failure_names_the_bot() {
        let app = app(
            vec![BotVerifyInfo::new("stub", json!({})).with_name("broken")],
            true,
        );
        app.register_manager(Arc::new(StubManager::default())).await;

        let Err(err) = app.register_bots().await else {
            panic!("registration should fail");
        };
        assert!(matches!(err, RuntimeError::Registration { name, .. } if name == "broken"));
    }

    #[tokio::test]
    async fn test_run_until_starts_and_cancels() {
        let app = app(
            vec![
                BotVerifyInfo::new("stub", json!({"code": 1})),
                BotVerifyInfo::new("stub", json!({"code": 2, "fail": true})),
            ],
            true,
        );
        let manager = Arc::new(StubManager::default());
        app.register_manager(manager.clone()).await;

        let observed = async {
            let bots = manager.all();
            assert!(bots[0].is_active());
            assert!(!bots[1].is_active());
        };
        assert_ok!(app.run_until(observed).await);
        assert!(manager.all().iter().all(|b| !b.is_active()));
        assert!(!app.is_running().await);
    }

    #[tokio::test]
    async fn test_auto_start_disabled() {
        let app = app(vec![BotVerifyInfo::new("stub", json!({"code": 1}))], false);
        let manager = Arc::new(StubManager::default());
        app.register_manager(manager.clone()).await;

        app.register_bots().await.unwrap();
        app.start().await.unwrap();
        assert!(app.is_running().await);
        assert!(!manager.all()[0].is_active());
    }
}
