use reqwest::Url;
use serde_json::Value;
use tracing::trace;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::transport::{Request, Response, Transport};

/// [`Transport`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        config.validate()?;
        let base = Url::parse(config.base_url.trim()).map_err(|err| {
            BridgeError::invalid_config(format!("base URL `{}`: {err}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(BridgeError::invalid_config(format!(
                "base URL `{}` cannot carry a path",
                config.base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| BridgeError::Http {
            operation: "connect",
            source,
        })?;
        Ok(Self { client, base })
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `request`. Segments are percent-encoded.
    pub fn url_for(&self, request: &Request) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BridgeError::invalid_config("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            );
        }
        Ok(url)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let operation = request.operation;
        let url = self.url_for(&request)?;
        trace!(operation, method = request.method.as_str(), %url, "request");

        let mut builder = self.client.request(request.method.into(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|source| BridgeError::Http { operation, source })?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|source| BridgeError::Http { operation, source })?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(source) if (200..300).contains(&status) => {
                    return Err(BridgeError::Decode { operation, source });
                }
                Err(_) => Value::String(text),
            }
        };
        trace!(operation, status, "response");
        Ok(Response { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(&BridgeConfig::default().with_base_url(base)).unwrap()
    }

    #[test]
    fn joins_segments_onto_base_path() {
        let http = transport("http://localhost:8000/api");
        let url = http
            .url_for(&Request::get("fetch_overlay_state", ["overlay", "state"]))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/overlay/state");

        let http = transport("http://localhost:8000/api/");
        let url = http.url_for(&Request::get("fetch_teams", ["teams"])).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/teams");
    }

    #[test]
    fn encodes_ids_and_query() {
        let http = transport("http://localhost:8000/api");
        let url = http
            .url_for(&Request::post("show_overlay", ["overlay", "show"]).with_query("team_id", "a b&c"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/overlay/show?team_id=a+b%26c"
        );

        let url = http
            .url_for(&Request::get("fetch_team", ["teams", "x/y"]))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/teams/x%2Fy");
    }

    #[test]
    fn rejects_bad_base() {
        for base in ["not a url", "mailto:ops@example.com"] {
            let err = HttpTransport::new(&BridgeConfig::default().with_base_url(base)).unwrap_err();
            assert!(matches!(err, BridgeError::InvalidConfig { .. }), "{base}: {err}");
        }
    }
}
