//! TCP listener binding with bind-conflict fallback.
//!
//! # Responsibilities
//! - Bind the configured `host:port`
//! - On "address already in use", retry after a short delay with an
//!   OS-assigned ephemeral port (port 0)
//! - Bound retries: a persistent conflict surfaces as a fatal error

use std::io::ErrorKind;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::ServeConfig;

/// Delay between bind attempts after a conflict.
pub const BIND_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Total bind attempts before a conflict is treated as fatal.
pub const MAX_BIND_ATTEMPTS: u32 = 3;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Every bind attempt found the address in use.
    AddressInUse { attempts: u32 },
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::AddressInUse { attempts } => {
                write!(f, "Address in use after {} bind attempts", attempts)
            }
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bind the configured address, falling back to an ephemeral port on conflict.
///
/// The first attempt uses `config.port`. If that port is already bound, later
/// attempts ask the OS for an ephemeral port instead of failing permanently.
pub async fn bind_with_fallback(config: &ServeConfig) -> Result<TcpListener, ListenerError> {
    let mut port = config.port;

    for attempt in 1..=MAX_BIND_ATTEMPTS {
        let addr = format!("{}:{}", config.host, port);
        match TcpListener::bind(&addr).await {
            Ok(listener) => {
                let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
                tracing::info!(address = %local_addr, attempt, "Listener bound");
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse && attempt < MAX_BIND_ATTEMPTS => {
                tracing::warn!(
                    address = %addr,
                    attempt,
                    "Address in use, retrying on an ephemeral port"
                );
                port = 0;
                tokio::time::sleep(BIND_RETRY_DELAY).await;
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                return Err(ListenerError::AddressInUse {
                    attempts: MAX_BIND_ATTEMPTS,
                });
            }
            Err(e) => return Err(ListenerError::Bind(e)),
        }
    }

    Err(ListenerError::AddressInUse {
        attempts: MAX_BIND_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let mut config = ServeConfig::new("/tmp");
        config.host = "127.0.0.1".to_string();
        config.port = 0;
        let listener = bind_with_fallback(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn falls_back_when_port_taken() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken_port = occupied.local_addr().unwrap().port();

        let mut config = ServeConfig::new("/tmp");
        config.host = "127.0.0.1".to_string();
        config.port = taken_port;

        let listener = bind_with_fallback(&config).await.unwrap();
        let bound_port = listener.local_addr().unwrap().port();
        assert_ne!(bound_port, taken_port);
    }
}
