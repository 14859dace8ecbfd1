//! Environment variable based runtime configuration.
//!
//! ## Environment Variables
//!
//! ### `PORT`
//!
//! The listening port. Default: `3333`.
//!
//! ### `WAYPOINT_STACK_SIZE`
//!
//! Stack size for connection coroutines, in decimal (`16384`) or
//! hexadecimal (`0x4000`). Default: `0x4000` (16 KB).
//!
//! ## Usage
//!
//! ```rust
//! use waypoint::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("listening on port {}", config.port);
//! ```

use std::env;

const DEFAULT_PORT: u16 = 3333;
const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded once at startup.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Listening port (default 3333).
    pub port: u16,
    /// Coroutine stack size in bytes (default 16 KB).
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults on absent or unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let stack_size = env::var("WAYPOINT_STACK_SIZE")
            .map(|v| parse_stack_size(&v))
            .unwrap_or(DEFAULT_STACK_SIZE);
        RuntimeConfig { port, stack_size }
    }
}

fn parse_stack_size(val: &str) -> usize {
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).unwrap_or(DEFAULT_STACK_SIZE)
    } else {
        val.parse().unwrap_or(DEFAULT_STACK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stack_size_decimal() {
        assert_eq!(parse_stack_size("32768"), 32768);
    }

    #[test]
    fn test_parse_stack_size_hex() {
        assert_eq!(parse_stack_size("0x8000"), 0x8000);
    }

    #[test]
    fn test_parse_stack_size_invalid_falls_back() {
        assert_eq!(parse_stack_size("lots"), DEFAULT_STACK_SIZE);
        assert_eq!(parse_stack_size("0xzz"), DEFAULT_STACK_SIZE);
    }
}
