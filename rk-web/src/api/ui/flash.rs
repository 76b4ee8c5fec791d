//! One-shot flash messages
//!
//! A form post stores its outcome in the `rk_flash` cookie and redirects.
//! The next page render reads the cookie, shows the message and expires the
//! cookie in the same response. The value is base64url-encoded JSON.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

pub const FLASH_COOKIE: &str = "rk_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    pub fn encode(&self) -> String {
        // serializing two plain fields cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Read the flash cookie from request headers
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == FLASH_COOKIE)
            .and_then(|(_, value)| Flash::decode(value))
    }

    /// 303 redirect carrying this message
    pub fn redirect(self, location: &str) -> Response {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            FLASH_COOKIE,
            self.encode()
        );
        let mut response = (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, location.to_string())],
        )
            .into_response();
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        response
    }
}

/// The flash message carried by the current request, if any
#[derive(Debug, Default)]
pub struct IncomingFlash(pub Option<Flash>);

impl IncomingFlash {
    pub fn current(&self) -> Option<&Flash> {
        self.0.as_ref()
    }

    /// Render a page, expiring the cookie when a message was shown
    pub fn render(&self, html: String) -> Response {
        let mut response = Html(html).into_response();
        if self.0.is_some() {
            let clear = format!("{}=; Path=/; Max-Age=0", FLASH_COOKIE);
            if let Ok(value) = HeaderValue::from_str(&clear) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
        response
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for IncomingFlash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IncomingFlash(Flash::from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let flash = Flash::success("Weather updated for Atlanta: 48.0°F");
        assert_eq!(Flash::decode(&flash.encode()), Some(flash));
        assert_eq!(Flash::decode("%%%"), None);
    }

    #[test]
    fn test_read_from_cookie_header() {
        let flash = Flash::error("Ticker not found.");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", FLASH_COOKIE, flash.encode())).unwrap(),
        );
        assert_eq!(Flash::from_headers(&headers), Some(flash));
    }

    #[test]
    fn test_redirect_sets_cookie() {
        let response = Flash::success("ok").redirect("/tickers");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/tickers");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("rk_flash="));
    }

    #[test]
    fn test_render_clears_cookie_only_when_shown() {
        let shown = IncomingFlash(Some(Flash::success("hi"))).render("<p></p>".into());
        assert!(shown.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        let none = IncomingFlash(None).render("<p></p>".into());
        assert!(none.headers().get(header::SET_COOKIE).is_none());
    }
}
