use crate::error::ConfigurationError;
use crate::util;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

fn default_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|it| it.parse().ok())
        .unwrap_or(5000)
}

fn default_address() -> String {
    env::var("ADDRESS").unwrap_or("0.0.0.0".to_string())
}

fn default_mongodb_uri() -> String {
    compose_mongodb_uri(
        env::var("MONGODB_URI").ok(),
        env::var("DB_USER").ok(),
        env::var("DB_PASS").ok(),
        env::var("MONGODB_CLUSTER").ok(),
    )
}

fn default_mongodb_db() -> String {
    env::var("MONGODB_DB_NAME").unwrap_or("sportsDB".to_string())
}

fn default_access_token_secret() -> SecretString {
    SecretString::new(env::var("ACCESS_TOKEN_SECRET").unwrap_or_default())
}

fn default_payment_secret_key() -> SecretString {
    SecretString::new(env::var("PAYMENT_SECRET_KEY").unwrap_or_default())
}

fn default_stripe_api_base() -> String {
    env::var("STRIPE_API_BASE").unwrap_or("https://api.stripe.com".to_string())
}

/// An explicit URI wins; credentials plus a cluster host build an SRV URI for Atlas.
pub fn compose_mongodb_uri(
    uri: Option<String>,
    user: Option<String>,
    pass: Option<String>,
    cluster: Option<String>,
) -> String {
    match (uri, user, pass, cluster) {
        (Some(uri), _, _, _) if !uri.is_empty() => uri,
        (_, Some(user), Some(pass), Some(cluster)) => format!(
            "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority",
            user, pass, cluster
        ),
        _ => "mongodb://localhost:27017".to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_db")]
    pub mongodb_db: String,

    #[serde(default = "default_access_token_secret")]
    pub access_token_secret: SecretString,
    #[serde(default = "default_payment_secret_key")]
    pub payment_secret_key: SecretString,
    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: default_port(),
            address: default_address(),
            mongodb_uri: default_mongodb_uri(),
            mongodb_db: default_mongodb_db(),
            access_token_secret: default_access_token_secret(),
            payment_secret_key: default_payment_secret_key(),
            stripe_api_base: default_stripe_api_base(),
        }
    }
}

#[inline]
fn config_dir() -> PathBuf {
    PathBuf::from(env::var("CONFIG_DIR").unwrap_or("./config".to_string()))
}

impl Config {
    pub fn load() -> Result<Config, ConfigurationError> {
        let config_file = util::find_first_subpath(
            config_dir(),
            &["settings.yml", "settings.yaml"],
            Path::exists,
        )
        .ok_or_else(|| ConfigurationError::NotFound(config_dir()))?;

        let file = File::open(config_file)?;
        let config = serde_yaml::from_reader(BufReader::new(file))?;

        Ok(config)
    }

    /// Both secrets are needed before any route can work.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.access_token_secret.expose_secret().is_empty() {
            return Err(ConfigurationError::MissingSecret("ACCESS_TOKEN_SECRET"));
        }
        if self.payment_secret_key.expose_secret().is_empty() {
            return Err(ConfigurationError::MissingSecret("PAYMENT_SECRET_KEY"));
        }
        Ok(())
    }
}
