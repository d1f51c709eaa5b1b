//! Named remote functions.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Backend, parse_json};
use crate::error::MeetPrepResult;

pub const FETCH_MEETINGS: &str = "fetch-meetings";
pub const FETCH_PARTICIPANTS: &str = "fetch-participants";
pub const GENERATE_BRIEF: &str = "generate-brief";
pub const GET_OAUTH_URL: &str = "get-oauth-url";

impl Backend {
    /// Invoke a remote function by name and decode whatever JSON it returns.
    pub async fn invoke<B, T>(&self, name: &str, body: &B, access_token: &str) -> MeetPrepResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(&format!("functions/v1/{name}"))?;
        let response = self
            .authed(Method::POST, url, access_token)
            .json(body)
            .send()
            .await?;

        parse_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeetPrepError;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_body_and_decodes_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/echo"))
            .and(header("authorization", "Bearer token"))
            .and(header("apikey", "anon"))
            .and(body_json(serde_json::json!({ "value": 7 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "doubled": 14 })))
            .mount(&server)
            .await;

        let backend = Backend::new(&server.uri(), "anon").unwrap();
        let result: serde_json::Value = backend
            .invoke("echo", &serde_json::json!({ "value": 7 }), "token")
            .await
            .unwrap();
        assert_eq!(result["doubled"], 14);
    }

    #[tokio::test]
    async fn function_failure_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/generate-brief"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "model unavailable"
            })))
            .mount(&server)
            .await;

        let backend = Backend::new(&server.uri(), "anon").unwrap();
        let err = backend
            .invoke::<_, serde_json::Value>(GENERATE_BRIEF, &serde_json::json!({}), "token")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MeetPrepError::Backend { status: 500, ref message } if message == "model unavailable"
        ));
    }
}
