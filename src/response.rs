use reqwest::Response;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// A response read to completion. Owned by the test that sent the request.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body_text: String,
    pub body_json: Option<serde_json::Value>,
}

impl CapturedResponse {
    pub async fn from_response(resp: Response) -> Result<Self, reqwest::Error> {
        let status = resp.status();
        let headers = resp.headers().clone();

        // Consume the body exactly once
        let body_text = resp.text().await?;

        Ok(Self::from_parts(status, headers, body_text))
    }

    pub fn from_parts(status: StatusCode, headers: HeaderMap, body_text: String) -> Self {
        // Attempt to parse JSON, but don't fail on other bodies
        let body_json = serde_json::from_str::<serde_json::Value>(&body_text).ok();

        Self {
            status,
            headers,
            body_text,
            body_json,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }
}
