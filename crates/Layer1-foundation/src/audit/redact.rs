//! 감사 로그용 인자 마스킹

use serde_json::{Map, Value};

/// 마스킹 값
pub const REDACTED: &str = "***";

/// 값 전체를 가리는 최상위 키 (대소문자 무시)
const SENSITIVE_KEYS: [&str; 8] = [
    "content",
    "password",
    "token",
    "secret",
    "key",
    "auth",
    "api_key",
    "authorization",
];

/// 가리는 HTTP 헤더 이름 (대소문자 무시)
const SENSITIVE_HEADERS: [&str; 4] = ["authorization", "proxy-authorization", "cookie", "x-api-key"];

/// 이 단어를 포함하는 환경 변수 이름은 값을 가린다
const SENSITIVE_ENV_WORDS: [&str; 4] = ["token", "secret", "password", "key"];

/// 인자 맵에서 민감 필드를 가린 사본을 만든다
pub fn redact_args(args: &Map<String, Value>) -> Value {
    let redacted = args
        .iter()
        .map(|(key, value)| {
            let lower = key.to_ascii_lowercase();
            let value = if SENSITIVE_KEYS.contains(&lower.as_str()) {
                Value::String(REDACTED.to_string())
            } else if lower == "headers" {
                redact_map(value, |name| SENSITIVE_HEADERS.contains(&name))
            } else if lower == "env" {
                redact_map(value, |name| {
                    SENSITIVE_ENV_WORDS.iter().any(|w| name.contains(w))
                })
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect();

    Value::Object(redacted)
}

fn redact_map(value: &Value, is_sensitive: impl Fn(&str) -> bool) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    if is_sensitive(&k.to_ascii_lowercase()) {
                        (k.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (k.clone(), v.clone())
                    }
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn redact(value: Value) -> Value {
        redact_args(value.as_object().unwrap())
    }

    #[test]
    fn test_content_and_authorization() {
        let out = redact(json!({
            "path": "a.txt",
            "content": "top secret body",
            "headers": { "Authorization": "Bearer abc", "Accept": "text/plain" }
        }));

        assert_eq!(out["path"], "a.txt");
        assert_eq!(out["content"], REDACTED);
        assert_eq!(out["headers"]["Authorization"], REDACTED);
        assert_eq!(out["headers"]["Accept"], "text/plain");
    }

    #[test]
    fn test_generic_sensitive_names() {
        let out = redact(json!({ "Password": "x", "token": "y", "url": "https://a" }));
        assert_eq!(out["Password"], REDACTED);
        assert_eq!(out["token"], REDACTED);
        assert_eq!(out["url"], "https://a");
    }

    #[test]
    fn test_env_values() {
        let out = redact(json!({ "env": { "GITHUB_TOKEN": "ghp", "LANG": "C" } }));
        assert_eq!(out["env"]["GITHUB_TOKEN"], REDACTED);
        assert_eq!(out["env"]["LANG"], "C");
    }
}
