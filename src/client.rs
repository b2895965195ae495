use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use crate::error::FailureKind;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    endpoint, get_attributes_body, GetResponse, SetPayload, SetResponse, ACTION_HEADER,
    GET_ATTRIBUTES, RESULT_OK, SET_ATTRIBUTES,
};
use crate::vars::Variables;
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// The two remote operations the proxy needs. Implementations never fail:
/// reads degrade to an empty variable set and writes only log.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_data(&self) -> Variables;
    async fn set_data(&self, payload: &SetPayload);
}

pub struct UponorClientBuilder {
    host: String,
    protocol: String,
    timeout: Duration,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl UponorClientBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            protocol: "http".to_string(),
            timeout: DEFAULT_TIMEOUT,
            log_mode: None,
            log_path: None,
        }
    }

    pub fn protocol(mut self, proto: &str) -> Self {
        self.protocol = proto.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<UponorClient> {
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Mutex::new(MessageLogger::new(mode, &path)?)),
            _ => None,
        };

        Ok(UponorClient {
            http,
            endpoint: endpoint(&self.protocol, &self.host),
            logger,
        })
    }
}

pub struct UponorClient {
    http: reqwest::Client,
    endpoint: String,
    logger: Option<Mutex<MessageLogger>>,
}

impl UponorClient {
    pub fn builder(host: impl Into<String>) -> UponorClientBuilder {
        UponorClientBuilder::new(host)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Read every variable. A non-"OK" result is logged but whatever vars
    /// arrived are still returned.
    pub async fn fetch_variables(&self) -> Result<Variables> {
        let id = Uuid::new_v4().to_string();
        let body = get_attributes_body();
        let json = self.exchange(&id, GET_ATTRIBUTES, &body).await?;

        let response = GetResponse::deserialize(&json)?;
        if response.result != RESULT_OK {
            error!(result = %response.result, body = %json, "error response from Uponor API");
        }

        let vars = Variables::from_response(response.output.vars);
        trace!(count = vars.len(), "received variables");
        self.log(|l| l.log_read(&id, &json, &vars));
        Ok(vars)
    }

    /// Write the payload's variables. A non-"OK" result is an
    /// [`Error::Rejected`].
    pub async fn push_variables(&self, payload: &SetPayload) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_value(payload)?;
        let json = self.exchange(&id, SET_ATTRIBUTES, &body).await?;
        self.log(|l| l.log_response(&id, &json));

        let response = SetResponse::deserialize(&json)?;
        if response.result != RESULT_OK {
            return Err(Error::Rejected {
                result: response.result,
                body: json.to_string(),
            });
        }
        Ok(())
    }

    async fn exchange(&self, id: &str, action: &str, body: &Value) -> Result<Value> {
        debug!(endpoint = %self.endpoint, action, "sending JNAP request");
        self.log(|l| l.log_request(id, action, body));

        let result = self.post(action, body).await;
        if let Err(ref e) = result {
            self.log(|l| l.log_failure(id, &e.to_string()));
        }
        result
    }

    async fn post(&self, action: &str, body: &Value) -> Result<Value> {
        let text = self
            .http
            .post(&self.endpoint)
            .header(ACTION_HEADER, action)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn log(&self, f: impl FnOnce(&mut MessageLogger)) {
        if let Some(ref logger) = self.logger {
            let mut guard = logger.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard);
        }
    }
}

#[async_trait]
impl Transport for UponorClient {
    async fn get_data(&self) -> Variables {
        match self.fetch_variables().await {
            Ok(vars) => vars,
            Err(e) => {
                report_failure(&e, "getting data from");
                Variables::empty()
            }
        }
    }

    async fn set_data(&self, payload: &SetPayload) {
        if let Err(e) = self.push_variables(payload).await {
            report_failure(&e, "setting data on");
        }
    }
}

fn report_failure(err: &Error, doing: &str) {
    let kind = FailureKind::of(err);
    match kind {
        FailureKind::ConnectionReset => {
            warn!(?kind, "connection reset by Uponor API while {doing} it, the device may be busy")
        }
        FailureKind::ConnectionRefused => error!(
            ?kind,
            "connection refused by Uponor API, check that the device is online and the address is correct"
        ),
        FailureKind::Timeout => warn!(
            ?kind,
            "request to Uponor API timed out while {doing} it, the device may be slow or unreachable"
        ),
        FailureKind::Rejected => error!(?kind, error = %err, "error response from Uponor API"),
        FailureKind::Other => error!(?kind, error = %err, "error {doing} Uponor API"),
    }
}
