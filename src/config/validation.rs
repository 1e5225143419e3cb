//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{CampusWallError, Result};
use super::Settings;

/// Minimum accepted length of the token signing secret in production
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_auth_config(&settings.auth, settings.is_production())?;
    validate_logging_config(&settings.logging)?;

    if settings.redis.enabled {
        validate_redis_config(&settings.redis)?;
    }

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(CampusWallError::Config(
            "Server host is required".to_string()
        ));
    }

    if config.port == 0 {
        return Err(CampusWallError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CampusWallError::Config(
            "Database URL is required".to_string()
        ));
    }

    let url = url::Url::parse(&config.url)?;
    if !matches!(url.scheme(), "postgres" | "postgresql" | "memory") {
        return Err(CampusWallError::Config(
            format!("Unsupported database scheme: {}", url.scheme())
        ));
    }

    if config.max_connections == 0 {
        return Err(CampusWallError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(CampusWallError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CampusWallError::Config(
            "Redis URL is required".to_string()
        ));
    }

    let url = url::Url::parse(&config.url)?;
    if !matches!(url.scheme(), "redis" | "rediss") {
        return Err(CampusWallError::Config(
            format!("Unsupported Redis scheme: {}", url.scheme())
        ));
    }

    if config.flush_interval_seconds == 0 {
        return Err(CampusWallError::Config(
            "View count flush interval must be greater than 0".to_string()
        ));
    }

    if config.ttl_seconds == 0 {
        return Err(CampusWallError::Config(
            "Redis TTL must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate token configuration
fn validate_auth_config(config: &super::AuthConfig, production: bool) -> Result<()> {
    if config.jwt_secret.is_empty() {
        return Err(CampusWallError::Config(
            "JWT secret is required".to_string()
        ));
    }

    if production && config.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
        return Err(CampusWallError::Config(
            format!("JWT secret must be at least {} bytes in production", MIN_PRODUCTION_SECRET_LEN)
        ));
    }

    if config.token_ttl_hours <= 0 {
        return Err(CampusWallError::Config(
            "Token TTL must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CampusWallError::Config(
            "Log level is required".to_string()
        ));
    }

    // Accept plain levels and env-filter directives such as "campus_wall=debug,info"
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    let is_directive = config.level.contains('=') || config.level.contains(',');
    if !is_directive && !valid_levels.contains(&config.level.as_str()) {
        return Err(CampusWallError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
