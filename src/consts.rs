use ntex::http::StatusCode;

/// Header carrying the HMAC-SHA256 of the raw request body
pub const SIGNATURE_HEADER_NAME: &str = "x-hub-signature-256";
pub const SIGNATURE_HEADER_PREFIX: &str = "sha256=";

/// Length of the AES-GCM authentication tag appended to every ciphertext
pub const GCM_TAG_LEN: usize = 16;

pub const ALLOWED_METHODS: &str = "GET, POST";

// Endpoint error codes defined by WhatsApp Flows:
// https://developers.facebook.com/docs/whatsapp/flows/reference/error-codes#endpoint_error_codes
pub const STATUS_SIGNATURE_MISMATCH: u16 = 432;
pub const STATUS_KEY_UNWRAP_FAILED: u16 = 421;
pub const STATUS_FLOW_TOKEN_INVALID: u16 = 427;

/// Builds a status code that `ntex::http::StatusCode` has no constant for
pub fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
