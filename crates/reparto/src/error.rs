//! Error taxonomy for everything that talks to the backend.
//!
//! Screens never show `Display` output to users. They call
//! [`ApiError::user_message`], which maps status codes and a few backend
//! keywords onto fixed Spanish strings.

use thiserror::Error;

/// Error type for API calls and cart persistence.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response at all (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 401. The session has already been cleared when this is returned.
    #[error("session expired")]
    SessionExpired,

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local cart storage could not be read or written.
    #[error("local storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub mod messages {
    pub const NETWORK: &str = "No se pudo conectar con el servidor. Verifica tu conexión a internet.";
    pub const BAD_REQUEST: &str = "La solicitud no es válida. Revisa los datos ingresados.";
    pub const SESSION_EXPIRED: &str = "Tu sesión ha expirado. Inicia sesión nuevamente.";
    pub const FORBIDDEN: &str = "No tienes permisos para realizar esta acción.";
    pub const NOT_FOUND: &str = "El recurso solicitado no existe.";
    pub const CONFLICT: &str = "La operación entra en conflicto con datos existentes. Actualiza e intenta de nuevo.";
    pub const VALIDATION: &str = "Los datos enviados no son válidos.";
    pub const SERVER: &str = "Error interno del servidor. Intenta más tarde.";
    pub const UNAVAILABLE: &str = "El servicio no está disponible en este momento. Intenta más tarde.";
    pub const STOCK: &str = "No hay stock suficiente para uno o más productos.";
    pub const CREDIT: &str = "El pedido excede tu límite de crédito disponible.";
    pub const MINIMUM_AMOUNT: &str = "El pedido no alcanza el monto mínimo requerido.";
    pub const STORAGE: &str = "No se pudo guardar el carrito en el dispositivo.";
    pub const GENERIC: &str = "Ocurrió un error inesperado. Intenta nuevamente.";
}

impl ApiError {
    /// HTTP status, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::SessionExpired => Some(401),
            _ => None,
        }
    }

    /// The one error with a forced side effect (sign-out + navigation reset).
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }

    /// Fixed user-facing message for this error.
    ///
    /// Business-rule keywords in the backend message win over the status
    /// code: an out-of-stock 409 and an out-of-stock 422 read the same.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => messages::NETWORK.to_string(),
            ApiError::SessionExpired => messages::SESSION_EXPIRED.to_string(),
            ApiError::Decode(_) => messages::GENERIC.to_string(),
            ApiError::Storage(_) => messages::STORAGE.to_string(),
            ApiError::Status { status, message } => {
                if let Some(known) = keyword_message(message) {
                    return known.to_string();
                }
                status_message(*status, message)
            }
        }
    }
}

fn keyword_message(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    if lower.contains("stock") {
        Some(messages::STOCK)
    } else if ["crédito", "credito", "credit"].iter().any(|k| lower.contains(k)) {
        Some(messages::CREDIT)
    } else if ["monto mínimo", "monto minimo", "minimum"].iter().any(|k| lower.contains(k)) {
        Some(messages::MINIMUM_AMOUNT)
    } else {
        None
    }
}

fn status_message(status: u16, backend_message: &str) -> String {
    match status {
        400 => messages::BAD_REQUEST.to_string(),
        401 => messages::SESSION_EXPIRED.to_string(),
        403 => messages::FORBIDDEN.to_string(),
        404 => messages::NOT_FOUND.to_string(),
        409 => messages::CONFLICT.to_string(),
        422 if backend_message.trim().is_empty() => messages::VALIDATION.to_string(),
        422 => format!("{} {}", messages::VALIDATION, backend_message.trim()),
        500 => messages::SERVER.to_string(),
        502..=504 => messages::UNAVAILABLE.to_string(),
        _ => messages::GENERIC.to_string(),
    }
}
