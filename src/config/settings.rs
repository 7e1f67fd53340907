use std::env;

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::warn;

/// Token lifetime when `TOKEN_TTL_SECS` is not set: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

/// Verification codes expire after this many minutes unless overridden.
pub const DEFAULT_OTP_EXPIRY_MINUTES: i64 = 10;

/// Process-wide configuration, read once at startup and handed to the
/// services that need it. Secrets never travel through hidden globals.
#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// Raw 32-byte AES-256 key for message storage, decoded from base64.
    pub encryption_key: Vec<u8>,
    pub otp_expiry_minutes: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("encryption_key", &"[REDACTED]")
            .field("otp_expiry_minutes", &self.otp_expiry_minutes)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET_KEY").unwrap_or_else(|_| {
            warn!("JWT_SECRET_KEY not set, using default secret (INSECURE!)");
            "jwt-secret-key-change-in-production".to_string()
        });

        let token_ttl_secs = match env::var("TOKEN_TTL_SECS") {
            Ok(raw) => raw
                .parse::<i64>()
                .map_err(|_| anyhow!("Invalid TOKEN_TTL_SECS: {}", raw))?,
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };
        if token_ttl_secs <= 0 {
            return Err(anyhow!("TOKEN_TTL_SECS must be positive"));
        }

        let key_str = env::var("ENCRYPTION_KEY").unwrap_or_else(|_| {
            warn!("ENCRYPTION_KEY not set, using default key (INSECURE!)");
            BASE64.encode(&b"ThisKeyIsForLocalDevelopmentOnly!!!"[..32])
        });
        let encryption_key = BASE64
            .decode(key_str.trim())
            .map_err(|e| anyhow!("Invalid ENCRYPTION_KEY encoding: {}", e))?;
        if encryption_key.len() != 32 {
            return Err(anyhow!(
                "ENCRYPTION_KEY must decode to exactly 32 bytes, got {}",
                encryption_key.len()
            ));
        }

        let otp_expiry_minutes = match env::var("OTP_EXPIRY_MINUTES") {
            Ok(raw) => raw
                .parse::<i64>()
                .map_err(|_| anyhow!("Invalid OTP_EXPIRY_MINUTES: {}", raw))?,
            Err(_) => DEFAULT_OTP_EXPIRY_MINUTES,
        };
        if otp_expiry_minutes <= 0 {
            return Err(anyhow!("OTP_EXPIRY_MINUTES must be positive"));
        }

        Ok(Self {
            jwt_secret,
            token_ttl_secs,
            encryption_key,
            otp_expiry_minutes,
        })
    }
}

/// Refuses to start a production process on development fallbacks.
pub fn validate_production_config(config: &AppConfig) {
    if current_environment() != "production" {
        return;
    }

    if config.jwt_secret.contains("change-in-production") || config.jwt_secret.len() < 32 {
        panic!("FATAL: JWT_SECRET_KEY must be set to a strong value in production");
    }

    if env::var("ENCRYPTION_KEY").is_err() {
        panic!("FATAL: ENCRYPTION_KEY must be set in production");
    }
}

fn current_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
}
