use ntex::web;

/// Configures the WhatsApp Flows endpoint routes.
///
/// These routes are public, requests are authenticated by their signature
/// and by the encryption itself.
///
/// # Routes
/// - `GET /` - liveness check and challenge signing
/// - `POST /` - encrypted data exchange
pub fn flows(cfg: &mut web::ServiceConfig) {
    cfg.service((super::flows::challenge, super::flows::exchange));
}
