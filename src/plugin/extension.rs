//! Registration with the host.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::HandlerError;

use super::registry::HandlerRegistry;

/// A loaded set of I/O handlers.
///
/// The host calls [`Extension::load`] once when the plugin is enabled and
/// [`Extension::close`] when it is disabled. Nothing outlives the value.
#[derive(Debug)]
pub struct Extension {
    config: Config,
    registry: HandlerRegistry,
}

impl Extension {
    pub const NAME: &'static str = "hyperstack-io";

    /// Validate the configuration, set up logging and register the handlers.
    pub fn load(config: Config) -> Result<Self, HandlerError> {
        config.validate().map_err(HandlerError::Config)?;
        init_logging(config.verbose);

        let registry = HandlerRegistry::with_defaults(&config);
        info!(
            handlers = ?registry.ids(),
            embed_metadata = config.embed_metadata,
            "Loaded {}",
            Self::NAME
        );
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Unregister all handlers.
    pub fn close(self) {
        info!(handlers = self.registry.len(), "Closing {}", Self::NAME);
    }
}

/// Install the global subscriber, unless the host already has one.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "hyperstack_io=debug"
    } else {
        "hyperstack_io=info"
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
