//! Request-derived client details: cookies, client IP and a readable device name.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};

use crate::db::dao::DeviceMeta;

pub const ACCESS_COOKIE_NAME: &str = "access_token";
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}

/// Maps a user agent to "iPhone", "iPad", "Android Phone", "Android Tablet"
/// or "<Browser> / <OS>".
pub fn parse_device_name(user_agent: &str) -> String {
    if user_agent.contains("iPhone") {
        return "iPhone".to_string();
    }
    if user_agent.contains("iPad") {
        return "iPad".to_string();
    }
    if user_agent.contains("Android") {
        return if user_agent.contains("Mobile") {
            "Android Phone".to_string()
        } else {
            "Android Tablet".to_string()
        };
    }

    let browser = if user_agent.contains("Edg") {
        "Edge"
    } else if user_agent.contains("Chrome") {
        "Chrome"
    } else if user_agent.contains("Firefox") {
        "Firefox"
    } else if user_agent.contains("Safari") {
        "Safari"
    } else {
        "Unknown Browser"
    };

    let os = if user_agent.contains("Windows") {
        "Windows"
    } else if user_agent.contains("Mac OS") || user_agent.contains("Macintosh") {
        "macOS"
    } else if user_agent.contains("Linux") {
        "Linux"
    } else {
        "Unknown OS"
    };

    format!("{browser} / {os}")
}

pub fn device_meta_from_parts(parts: &Parts) -> DeviceMeta {
    let user_agent = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    let ip_address = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    DeviceMeta {
        device_name: user_agent.as_deref().map(parse_device_name),
        ip_address,
        user_agent,
    }
}

/// Extractor yielding the caller's [`DeviceMeta`].
pub struct ClientDevice(pub DeviceMeta);

impl<S: Send + Sync> FromRequestParts<S> for ClientDevice {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(device_meta_from_parts(parts)))
    }
}
