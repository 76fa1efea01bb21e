use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub private_key_pem: String,
    pub public_key_pem: String,
}

/// Argon2 work factor. Defaults match the argon2 crate's recommended parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            private_key_pem: std::env::var("PRIVATE_CERT").context("PRIVATE_CERT is not set")?,
            public_key_pem: std::env::var("PUBLIC_CERT").context("PUBLIC_CERT is not set")?,
        };
        let defaults = HashConfig::default();
        let hash = HashConfig {
            memory_kib: env_u32("HASH_MEMORY_KIB").unwrap_or(defaults.memory_kib),
            iterations: env_u32("HASH_ITERATIONS").unwrap_or(defaults.iterations),
            parallelism: env_u32("HASH_PARALLELISM").unwrap_or(defaults.parallelism),
        };
        Ok(Self {
            database_url,
            jwt,
            hash,
        })
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse::<u32>().ok())
}
