//! Session context: Zenoh configuration and endpoint factories.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use zenoh::{Result, Session, Wait};

use crate::Builder;
use crate::msg::ZMessage;
use crate::parameter::client::ParameterClientBuilder;
use crate::parameter::server::ParameterServerBuilder;
use crate::pubsub::{ZPubBuilder, ZSubBuilder};

pub struct ZContextBuilder {
    domain_id: usize,
    config_file: Option<PathBuf>,
    config_overrides: Vec<(String, serde_json::Value)>,
}

impl Default for ZContextBuilder {
    fn default() -> Self {
        Self {
            domain_id: 0,
            config_file: None,
            config_overrides: Vec::new(),
        }
    }
}

impl ZContextBuilder {
    /// Set the domain ID. Endpoints only see traffic within their own domain.
    pub fn with_domain_id(mut self, domain_id: usize) -> Self {
        self.domain_id = domain_id;
        self
    }

    /// Load the Zenoh configuration from a JSON file.
    pub fn with_config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Add a JSON configuration override.
    ///
    /// ```rust,ignore
    /// let ctx = ZContextBuilder::default()
    ///     .with_json("scouting/multicast/enabled", json!(false))
    ///     .with_json("connect/endpoints", json!(["tcp/127.0.0.1:7447"]))
    ///     .build()?;
    /// ```
    pub fn with_json<K: Into<String>, V: serde::Serialize>(mut self, key: K, value: V) -> Self {
        let key = key.into();
        let value_json = serde_json::to_value(&value)
            .unwrap_or_else(|_| panic!("Failed to serialize value for key: {}", key));
        self.config_overrides.push((key, value_json));
        self
    }

    /// Convenience method: disable multicast scouting.
    pub fn disable_multicast_scouting(self) -> Self {
        self.with_json("scouting/multicast/enabled", json!(false))
    }

    /// Convenience method: connect to specific endpoints.
    pub fn with_connect_endpoints<I, S>(self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints: Vec<String> = endpoints.into_iter().map(|s| s.into()).collect();
        self.with_json("connect/endpoints", json!(endpoints))
    }

    /// Convenience method: set the session mode (peer, client, router).
    pub fn with_mode<S: Into<String>>(self, mode: S) -> Self {
        self.with_json("mode", json!(mode.into()))
    }

    /// Parse and apply overrides from `PARAMZ_CONFIG_OVERRIDE`.
    ///
    /// Expected format: `key1=value1;key2=value2`, values in JSON.
    fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(overrides_str) = std::env::var("PARAMZ_CONFIG_OVERRIDE") {
            tracing::debug!(
                "Applying config overrides from PARAMZ_CONFIG_OVERRIDE: {}",
                overrides_str
            );

            for pair in overrides_str.split(';') {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }

                // Split on the first '=' only
                if let Some((key, value)) = pair.split_once('=') {
                    let key = key.trim();
                    let value = value.trim();

                    match serde_json::from_str::<serde_json::Value>(value) {
                        Ok(json_value) => {
                            tracing::debug!("Override: {} = {}", key, json_value);
                            self.config_overrides.push((key.to_string(), json_value));
                        }
                        Err(e) => {
                            return Err(format!(
                                "Failed to parse PARAMZ_CONFIG_OVERRIDE value for key '{}': {} (value: {})",
                                key, e, value
                            )
                            .into());
                        }
                    }
                } else {
                    return Err(format!(
                        "Invalid PARAMZ_CONFIG_OVERRIDE format: '{}'. Expected 'key=value'",
                        pair
                    )
                    .into());
                }
            }
        }

        Ok(self)
    }
}

impl Builder for ZContextBuilder {
    type Output = ZContext;

    fn build(mut self) -> Result<ZContext> {
        // Priority order:
        // 1. Config file passed via with_config_file()
        // 2. PARAMZ_CONFIG_FILE environment variable
        // 3. Default config
        let mut config = if let Some(ref config_file) = self.config_file {
            zenoh::Config::from_file(config_file)?
        } else if let Ok(path) = std::env::var("PARAMZ_CONFIG_FILE") {
            zenoh::Config::from_file(path)?
        } else {
            zenoh::Config::default()
        };

        self = self.apply_env_overrides()?;

        for (key, value) in self.config_overrides {
            let value_str = serde_json::to_string(&value)
                .map_err(|e| format!("Failed to serialize value for key '{}': {}", key, e))?;

            config.insert_json5(&key, &value_str).map_err(|e| {
                format!(
                    "Failed to apply config override '{}' = '{}': {}",
                    key, value_str, e
                )
            })?;
        }

        let session = zenoh::open(config).wait()?;

        Ok(ZContext {
            session: Arc::new(session),
            domain_id: self.domain_id,
        })
    }
}

/// Shared session handle. Cloning is cheap; all clones use one Zenoh session.
#[derive(Clone)]
pub struct ZContext {
    session: Arc<Session>,
    domain_id: usize,
}

impl ZContext {
    /// Create a publisher for the given topic.
    pub fn create_pub<T: ZMessage>(&self, topic: &str) -> ZPubBuilder<T> {
        ZPubBuilder::new(self.session.clone(), self.domain_id, topic)
    }

    /// Create a subscriber for the given topic.
    pub fn create_sub<T: ZMessage>(&self, topic: &str) -> ZSubBuilder<T> {
        ZSubBuilder::new(self.session.clone(), self.domain_id, topic)
    }

    /// Create a parameter server bound to the given node identity.
    pub fn create_param_server<S: AsRef<str>>(&self, node_id: S) -> ParameterServerBuilder {
        ParameterServerBuilder::new(
            self.session.clone(),
            self.domain_id,
            node_id.as_ref().to_owned(),
        )
    }

    /// Create a parameter client able to address any node in the domain.
    pub fn create_param_client(&self) -> ParameterClientBuilder {
        ParameterClientBuilder::new(self.session.clone(), self.domain_id)
    }

    pub fn domain_id(&self) -> usize {
        self.domain_id
    }

    pub fn shutdown(&self) -> Result<()> {
        self.session.close().wait()
    }
}
