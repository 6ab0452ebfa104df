//! HttpRequest - 외부 HTTP 요청 도구
//!
//! - http/https만 허용, 메서드 allow-list
//! - anti-SSRF: 호스트를 먼저 resolve해서 공인 주소인지 확인하고,
//!   클라이언트를 그 주소에 고정 (DNS rebinding 방지)
//! - redirect 미추적
//! - 전체 교환에 하드 타임아웃, 응답 body 크기 제한

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{redirect, Method};
use serde_json::{json, Map, Value};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use url::{Host, Url};
use toolgate_foundation::{Capability, Error, ErrorKind, HttpConfig, Result};
use tracing::{debug, warn};

use crate::tool::{Tool, ToolArgs, ToolContext, ToolResult, ToolSchema};

/// 허용 메서드
pub const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// HttpRequest 도구
#[derive(Debug, Default)]
pub struct HttpTool;

impl HttpTool {
    pub const NAME: &'static str = "HttpRequest";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for HttpTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Send an HTTP request to a public address"
    }

    fn capability(&self) -> Capability {
        Capability::NetworkOutbound
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::builder()
            .string_param("url", "Absolute http(s) URL", true)
            .string_param("method", "GET (default), POST, PUT, DELETE, PATCH, HEAD or OPTIONS", false)
            .string_map_param("headers", "Request headers", false)
            .any_param("body", "Request body; objects and arrays are sent as JSON", false)
            .integer_param("timeout", "Timeout in seconds (default: 30)", false)
            .build()
    }

    async fn execute(&self, args: ToolArgs, ctx: &ToolContext) -> Result<ToolResult> {
        let settings = &ctx.config.http;

        let url = match Url::parse(args.str("url")?) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                return Ok(ToolResult::failure(
                    ErrorKind::InvalidInput,
                    format!("Unsupported URL scheme: {}", url.scheme()),
                ));
            }
            Err(e) => {
                return Ok(ToolResult::failure(
                    ErrorKind::InvalidInput,
                    format!("Invalid URL: {}", e),
                ));
            }
        };

        let method_name = args.opt_str("method").unwrap_or("GET").to_ascii_uppercase();
        if !ALLOWED_METHODS.contains(&method_name.as_str()) {
            return Ok(ToolResult::failure(
                ErrorKind::InvalidInput,
                format!("Unsupported HTTP method: {}", method_name),
            ));
        }
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        let headers = build_headers(&args.string_map("headers"))?;

        let timeout = match args.opt_positive("timeout")? {
            Some(secs) => settings.clamp_timeout(secs),
            None => settings.clamp_timeout(settings.default_timeout_secs),
        };

        let request = PreparedRequest {
            url,
            method,
            headers,
            body: args.get("body").cloned(),
        };

        // 타임아웃이 나면 교환 future가 drop되어 연결도 닫힌다
        let outcome = tokio::select! {
            r = tokio::time::timeout(timeout, request.send(settings, &ctx.principal)) => Some(r),
            _ = ctx.cancel.cancelled() => None,
        };

        match outcome {
            Some(Ok(result)) => result,
            Some(Err(_)) => Ok(ToolResult::failure(
                ErrorKind::NetworkError,
                format!("Request timed out after {} s", timeout.as_secs()),
            )
            .with_details(json!({ "timed_out": true }))),
            None => Ok(ToolResult::failure(ErrorKind::Timeout, "Request cancelled by caller")
                .with_details(json!({ "cancelled": true }))),
        }
    }
}

// ============================================================================
// Request
// ============================================================================

struct PreparedRequest {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<Value>,
}

impl PreparedRequest {
    async fn send(self, settings: &HttpConfig, principal: &str) -> Result<ToolResult> {
        let host = match self.url.host() {
            Some(host) => host.to_owned(),
            None => {
                return Ok(ToolResult::failure(ErrorKind::InvalidInput, "URL has no host"));
            }
        };
        let port = self.url.port_or_known_default().unwrap_or(80);

        let addrs = match resolve_host(&host, port).await {
            Ok(addrs) if !addrs.is_empty() => addrs,
            Ok(_) => {
                return Ok(ToolResult::failure(
                    ErrorKind::NetworkError,
                    format!("Host resolved to no addresses: {}", host),
                ));
            }
            Err(e) => {
                return Ok(ToolResult::failure(
                    ErrorKind::NetworkError,
                    format!("Failed to resolve {}: {}", host, e),
                ));
            }
        };

        if !settings.allow_private_networks {
            if let Some(blocked) = addrs.iter().find(|a| !is_public(a.ip())) {
                warn!(
                    principal = %principal,
                    host = %host,
                    address = %blocked.ip(),
                    "Blocked request to non-public address"
                );
                return Ok(ToolResult::failure(
                    ErrorKind::NetworkError,
                    format!(
                        "Destination {} resolves to non-public address {}",
                        host,
                        blocked.ip()
                    ),
                ));
            }
        }

        let mut builder = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .no_proxy()
            .user_agent(settings.user_agent.as_str());
        if let Host::Domain(domain) = &host {
            builder = builder.resolve_to_addrs(domain, &addrs);
        }
        let client = builder.build().map_err(|e| Error::Http(e.to_string()))?;

        let mut request = client
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers);
        request = match self.body {
            Some(body @ (Value::Object(_) | Value::Array(_))) => request.json(&body),
            Some(Value::String(text)) => request.body(text),
            Some(other) => request.body(other.to_string()),
            None => request,
        };

        debug!(method = %self.method, url = %self.url, "Sending request");

        let mut response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return Ok(ToolResult::failure(
                    ErrorKind::NetworkError,
                    format!("Request failed: {}", e),
                )
                .with_details(json!({ "timed_out": e.is_timeout() })));
            }
        };

        let status = response.status();
        let response_headers = headers_to_json(response.headers());
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);

        let mut bytes = Vec::new();
        let mut truncated = false;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = settings.max_body_bytes.saturating_sub(bytes.len());
                    if chunk.len() > room {
                        bytes.extend_from_slice(&chunk[..room]);
                        truncated = true;
                        break;
                    }
                    bytes.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    return Ok(ToolResult::failure(
                        ErrorKind::NetworkError,
                        format!("Failed to read response body: {}", e),
                    )
                    .with_details(json!({ "timed_out": e.is_timeout() })));
                }
            }
        }

        debug!(status = status.as_u16(), bytes = bytes.len(), truncated, "Response received");

        Ok(ToolResult::success(json!({
            "status_code": status.as_u16(),
            "headers": response_headers,
            "body": parse_body(&bytes, is_json),
            "url": self.url.as_str(),
            "truncated": truncated,
        })))
    }
}

fn build_headers(raw: &std::collections::HashMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in raw {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("Invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidInput(format!("Invalid value for header {}", name)))?;
        headers.append(name, value);
    }
    Ok(headers)
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map: Map<String, Value> = Map::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match map.get_mut(name.as_str()) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            _ => {
                map.insert(name.as_str().to_string(), Value::String(value));
            }
        }
    }
    Value::Object(map)
}

/// JSON이면 구조화된 값, 아니면 텍스트
fn parse_body(bytes: &[u8], is_json: bool) -> Value {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim_start();
    if is_json || trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            if is_json || value.is_object() || value.is_array() {
                return value;
            }
        }
    }
    Value::String(text.into_owned())
}

// ============================================================================
// Address checks
// ============================================================================

async fn resolve_host(host: &Host<String>, port: u16) -> std::io::Result<Vec<SocketAddr>> {
    match host {
        Host::Ipv4(ip) => Ok(vec![SocketAddr::new(IpAddr::V4(*ip), port)]),
        Host::Ipv6(ip) => Ok(vec![SocketAddr::new(IpAddr::V6(*ip), port)]),
        Host::Domain(domain) => Ok(tokio::net::lookup_host((domain.as_str(), port))
            .await?
            .collect()),
    }
}

/// 공인 unicast 주소인지 확인
pub fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        || ip.is_documentation()
        || a == 0
        // 100.64.0.0/10 shared address space
        || (a == 100 && (b & 0xc0) == 64)
        // 198.18.0.0/15 benchmarking
        || (a == 198 && (b & 0xfe) == 18)
        // 240.0.0.0/4 reserved
        || a >= 240)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(v4);
    }
    let segments = ip.segments();
    !(ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        // fc00::/7 unique local
        || (segments[0] & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (segments[0] & 0xffc0) == 0xfe80
        // 2001:db8::/32 documentation
        || (segments[0] == 0x2001 && segments[1] == 0x0db8))
}
