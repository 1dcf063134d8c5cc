//! TLS material loading for the listener.

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Load rustls configuration from the configured certificate and key files.
///
/// Certificate provisioning is out of scope; the files must already exist
/// (validation checks this before a run starts).
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, std::io::Error> {
    if !tls.cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", tls.cert_path),
        ));
    }
    if !tls.key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", tls.key_path),
        ));
    }

    RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await
}
