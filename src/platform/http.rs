//! reqwest-based prediction platform client.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::client::PredictionClient;
use super::error::{ClientError, ClientErrorKind};
use super::types::{Acceleration, NativePrediction, PredictionRequest, Predictor};
use super::wire::{decode_data_url, from_remote, to_remote, RemoteValue};
use crate::types::{PlatformConfig, PredictionId, PredictorTag};

#[derive(Debug, Serialize)]
struct CreatePredictionBody<'a> {
    tag: &'a str,
    inputs: BTreeMap<&'a str, RemoteValue>,
    acceleration: Acceleration,
}

#[derive(Debug, Deserialize)]
struct RemotePrediction {
    id: String,
    tag: String,
    #[serde(default)]
    results: Option<Vec<RemoteValue>>,
    #[serde(default)]
    latency: f64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    logs: Option<String>,
    #[serde(default)]
    created: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Option<Vec<ErrorEntry>>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .errors
        .and_then(|errors| errors.into_iter().next().map(|e| e.message))
        .or(parsed.message)
}

#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: Client,
    base_url: String,
    access_key: Option<String>,
}

impl HttpPredictionClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: PlatformConfig::default().api_url,
            access_key: None,
        }
    }

    pub fn from_config(config: &PlatformConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ClientError::from)?;
        let mut this = Self::new(client).with_base_url(config.api_url.clone());
        this.access_key = config.access_key.clone();
        Ok(this)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn parse_error(response: Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("platform request failed with status {status}"));

        let kind = match status {
            StatusCode::NOT_FOUND => ClientErrorKind::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientErrorKind::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => ClientErrorKind::RateLimited,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ClientErrorKind::Timeout,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientErrorKind::InvalidRequest
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                ClientErrorKind::Unavailable
            }
            _ => ClientErrorKind::Transport,
        };
        ClientError::new(kind, message)
    }

    async fn checked(response: Response) -> Result<Response, ClientError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::parse_error(response).await)
        }
    }

    /// Fetch a value payload from a `data:` or `http(s)` URL.
    async fn fetch_payload(&self, url: &str) -> Result<Bytes, ClientError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        let response = Self::checked(self.client.get(url).send().await?).await?;
        Ok(response.bytes().await?)
    }

    async fn submit(
        &self,
        path: &str,
        request: PredictionRequest,
    ) -> Result<NativePrediction, ClientError> {
        let inputs = request
            .inputs
            .iter()
            .map(|(name, value)| to_remote(value).map(|remote| (name.as_str(), remote)))
            .collect::<Result<BTreeMap<_, _>, ClientError>>()?;
        let body = CreatePredictionBody {
            tag: request.tag.as_str(),
            inputs,
            acceleration: request.acceleration,
        };

        let builder = self.client.post(self.endpoint(path)).json(&body);
        let response = Self::checked(self.authorize(builder).send().await?).await?;
        let remote: RemotePrediction = response.json().await?;
        self.resolve_prediction(remote).await
    }

    async fn resolve_prediction(
        &self,
        remote: RemotePrediction,
    ) -> Result<NativePrediction, ClientError> {
        let results = match remote.results {
            Some(values) => {
                let mut natives = Vec::with_capacity(values.len());
                for value in &values {
                    let payload = match &value.data {
                        Some(url) => Some(self.fetch_payload(url).await?),
                        None => None,
                    };
                    natives.push(from_remote(value, payload)?);
                }
                Some(natives)
            }
            None => None,
        };

        Ok(NativePrediction {
            id: PredictionId::from_string(remote.id)
                .map_err(|e| ClientError::decode(e.to_string()))?,
            tag: PredictorTag::from_string(remote.tag)
                .map_err(|e| ClientError::decode(e.to_string()))?,
            results,
            latency: remote.latency,
            error: remote.error,
            logs: remote.logs,
            created: remote.created,
        })
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn retrieve(&self, tag: &str) -> Result<Predictor, ClientError> {
        let builder = self.client.get(self.endpoint(&format!("predictors/{}", tag)));
        let response = Self::checked(self.authorize(builder).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn create(&self, request: PredictionRequest) -> Result<NativePrediction, ClientError> {
        self.submit("predictions", request).await
    }

    async fn create_remote(
        &self,
        request: PredictionRequest,
    ) -> Result<NativePrediction, ClientError> {
        self.submit("predictions/remote", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::NativeValue;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the request line and body.
    async fn serve_once(
        status: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<(String, String, Option<String>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).await.unwrap();
            let mut content_length = 0usize;
            let mut authorization = None;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).await.unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                let (name, value) = header.split_once(':').unwrap();
                match name.to_ascii_lowercase().as_str() {
                    "content-length" => content_length = value.trim().parse().unwrap(),
                    "authorization" => authorization = Some(value.trim().to_string()),
                    _ => {}
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).await.unwrap();

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            write_half.write_all(response.as_bytes()).await.unwrap();
            write_half.shutdown().await.unwrap();
            (
                request_line.trim_end().to_string(),
                String::from_utf8(request_body).unwrap(),
                authorization,
            )
        });
        (base_url, handle)
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let client = HttpPredictionClient::new(Client::new()).with_base_url("http://host/v1/");
        assert_eq!(client.endpoint("predictions"), "http://host/v1/predictions");
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"errors": [{"message": "Predictor not found"}]}"#),
            Some("Predictor not found".to_string())
        );
        assert_eq!(
            extract_error_message(r#"{"message": "bad key"}"#),
            Some("bad key".to_string())
        );
        assert_eq!(extract_error_message("<html>"), None);
    }

    #[test]
    fn test_from_config_carries_key() {
        let config = PlatformConfig {
            api_url: "http://localhost:1234".into(),
            access_key: Some("secret".into()),
            ..PlatformConfig::default()
        };
        let client = HttpPredictionClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:1234");
        assert_eq!(client.access_key.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_retrieve_not_found_maps_kind_and_message() {
        let body = json!({"errors": [{"message": "Predictor @a/b was not found"}]}).to_string();
        let (base_url, server) = serve_once("404 Not Found", body).await;
        let client = HttpPredictionClient::new(Client::new())
            .with_base_url(base_url)
            .with_access_key("key-123");

        let err = client.retrieve("@a/b").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message, "Predictor @a/b was not found");

        let (request_line, _, authorization) = server.await.unwrap();
        assert_eq!(request_line, "GET /v1/predictors/@a/b HTTP/1.1");
        assert_eq!(authorization.as_deref(), Some("Bearer key-123"));
    }

    #[tokio::test]
    async fn test_create_sends_data_urls_and_decodes_results() {
        let body = json!({
            "id": "pred_1",
            "tag": "@fxn/greeting",
            "results": [{"type": "string", "data": data_url_for("Hey there Ada!")}],
            "latency": 12.5,
            "created": "2024-01-01T00:00:00Z"
        })
        .to_string();
        let (base_url, server) = serve_once("200 OK", body).await;
        let client = HttpPredictionClient::new(Client::new()).with_base_url(base_url);

        let request = PredictionRequest {
            tag: PredictorTag::from_string("@fxn/greeting".into()).unwrap(),
            inputs: BTreeMap::from([("name".to_string(), NativeValue::Text("Ada".into()))]),
            acceleration: Acceleration::Cpu,
        };
        let prediction = client.create(request).await.unwrap();
        assert_eq!(prediction.id.as_str(), "pred_1");
        assert_eq!(
            prediction.results,
            Some(vec![NativeValue::Text("Hey there Ada!".into())])
        );
        assert_eq!(prediction.latency, 12.5);
        assert!(prediction.error.is_none());

        let (request_line, request_body, authorization) = server.await.unwrap();
        assert_eq!(request_line, "POST /v1/predictions HTTP/1.1");
        assert!(authorization.is_none());
        let sent: serde_json::Value = serde_json::from_str(&request_body).unwrap();
        assert_eq!(sent["tag"], json!("@fxn/greeting"));
        assert_eq!(sent["acceleration"], json!("cpu"));
        assert_eq!(sent["inputs"]["name"]["type"], json!("string"));
        assert_eq!(
            sent["inputs"]["name"]["data"],
            json!(data_url_for("Ada"))
        );
    }

    fn data_url_for(text: &str) -> String {
        super::super::wire::data_url("text/plain", text.as_bytes())
    }
}
