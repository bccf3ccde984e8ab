//! Translation of raw bridge status strings into [`ConnectionEvent`]s.
//!
//! The bridge reports its lifecycle as free-form strings (WPPConnect's
//! `statusFind` values). Only the strings below are understood; anything
//! else maps to `None` and is ignored by the caller.

use tracing::{debug, warn};

use super::connection::ConnectionState;
use super::event::ConnectionEvent;

pub const QR_READ_FAILED: &str = "Falha ao ler QR Code";
pub const QR_EXPIRED: &str = "QR Code expirou";
pub const AUTOCLOSED: &str = "Sessão encerrada automaticamente";
pub const DISCONNECTED_FROM_PHONE: &str = "Desconectado do celular";
pub const BROWSER_CLOSED: &str = "Navegador fechado";
pub const SERVER_CLOSED: &str = "Servidor encerrou a sessão";
pub const TOKEN_DELETED: &str = "Sessão removida";
pub const WHATSAPP_PAGE_ERROR: &str = "Erro ao carregar o WhatsApp Web";
pub const BROWSER_UNAVAILABLE: &str = "Não foi possível abrir o navegador";
pub const WHATSAPP_SERVER_UNAVAILABLE: &str = "Servidor do WhatsApp indisponível";

/// Map a raw status string to an event.
///
/// `CONNECTED` and the other "logged in" statuses return
/// `None`: they carry no account identity, so the connected transition is
/// driven by the `ready` event instead.
pub fn map_status(raw: &str, current: &ConnectionState) -> Option<ConnectionEvent> {
    let event = match raw {
        "initBrowser" | "openBrowser" | "initWhatsapp" | "connectBrowserWs" | "notLogged" => {
            ConnectionEvent::Initialize
        }

        "qrReadSuccess" => ConnectionEvent::QrScanned,
        "qrReadFail" | "qrReadError" => ConnectionEvent::Error {
            error: QR_READ_FAILED.to_string(),
            recoverable: Some(true),
        },

        "autocloseCalled" => match current {
            ConnectionState::QrAvailable { .. } => ConnectionEvent::disconnected(QR_EXPIRED),
            _ => ConnectionEvent::disconnected(AUTOCLOSED),
        },
        "desconnectedMobile" => ConnectionEvent::disconnected(DISCONNECTED_FROM_PHONE),
        "browserClose" => ConnectionEvent::disconnected(BROWSER_CLOSED),
        "serverClose" => ConnectionEvent::disconnected(SERVER_CLOSED),
        "deleteToken" => ConnectionEvent::disconnected(TOKEN_DELETED),
        "DISCONNECTED" | "disconnected" => ConnectionEvent::Disconnected { reason: None },

        "erroPageWhatsapp" => ConnectionEvent::Error {
            error: WHATSAPP_PAGE_ERROR.to_string(),
            recoverable: Some(true),
        },
        "noOpenBrowser" => ConnectionEvent::fatal(BROWSER_UNAVAILABLE),
        "serverWssNotConnected" => ConnectionEvent::Error {
            error: WHATSAPP_SERVER_UNAVAILABLE.to_string(),
            recoverable: Some(true),
        },

        "CONNECTED" | "isLogged" | "inChat" | "successChat" => {
            debug!(
                status = raw,
                state = current.name(),
                "status carries no account, waiting for ready event"
            );
            return None;
        }

        _ => {
            warn!(status = raw, state = current.name(), "unrecognized bridge status");
            return None;
        }
    };

    Some(event)
}
