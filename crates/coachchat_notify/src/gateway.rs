//! HTTP remote push gateway.
//!
//! Posts a notification to a configured dispatch endpoint and returns the
//! provider acknowledgment id. The dispatcher treats that id as the only
//! proof of remote delivery.

use coachchat_common::http::client::create_client;
use coachchat_common::models::LocalNotification;
use coachchat_common::services::{BoxFuture, RemotePushGateway};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Default deadline for a dispatch call.
const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur when dispatching through the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Error during the HTTP request to the gateway
    #[error("Gateway request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The gateway rejected the dispatch
    #[error("Gateway API error: {0}")]
    ApiError(String),
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DispatchRequest<'a> {
    user_id: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a HashMap<String, String>,
}

#[derive(Deserialize, Debug)]
struct DispatchResponse {
    /// Acknowledgment id assigned by the push service.
    id: String,
}

/// Remote push gateway over a plain HTTP endpoint.
pub struct HttpPushGateway {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpPushGateway {
    /// Create a gateway for the given dispatch endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        endpoint: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, reqwest::Error> {
        let client = create_client(
            timeout_secs.unwrap_or(DEFAULT_DISPATCH_TIMEOUT_SECS),
            true,
        )?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    async fn dispatch_inner(
        &self,
        user_id: &str,
        notification: &LocalNotification,
    ) -> Result<String, GatewayError> {
        debug!("Dispatching remote push for user: {}", user_id);

        let request = DispatchRequest {
            user_id,
            title: &notification.title,
            body: &notification.body,
            data: &notification.data,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::ApiError(format!("{}: {}", status, body)));
        }

        let ack: DispatchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ApiError(format!("invalid response body: {}", e)))?;
        Ok(ack.id)
    }
}

impl RemotePushGateway for HttpPushGateway {
    type Error = GatewayError;

    fn dispatch(
        &self,
        user_id: &str,
        notification: &LocalNotification,
    ) -> BoxFuture<'_, String, Self::Error> {
        let user_id = user_id.to_string();
        let notification = notification.clone();
        Box::pin(async move { self.dispatch_inner(&user_id, &notification).await })
    }
}
