//! REST-backed datasource for Formodel.
//!
//! [`RestDatasource`] implements the [`Datasource`] trait against a remote
//! resource collection:
//!
//! - `GET {endpoint}/{pk}/` fetches one record
//! - `GET {endpoint}/?{query_string}` finds records
//! - `PUT {endpoint}/{pk}/` saves a persisted record, `PUT {endpoint}/`
//!   saves a new one (the assigned primary key is read from the response)
//! - `DELETE {endpoint}/{pk}/` destroys a record
//!
//! Bodies are JSON objects mapped to and from [`Record`]s. The HTTP client
//! itself sits behind the [`HttpTransport`] trait; see [`transport`].

pub mod transport;

pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

use formodel_core::{
    Datasource, Error, OperationalError, OperationalErrorKind, Query, Record, RecordNotFound,
    Result, Value,
};

/// Behavior switches for [`RestDatasource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RestOptions {
    /// Emit a debug log line per outgoing request.
    pub log_requests: bool,
}

impl RestOptions {
    pub const fn new() -> Self {
        Self {
            log_requests: false,
        }
    }
}

/// A datasource persisting records to a REST resource collection.
#[derive(Debug)]
pub struct RestDatasource<T: HttpTransport> {
    endpoint: String,
    transport: T,
    options: RestOptions,
}

impl<T: HttpTransport> RestDatasource<T> {
    /// Create a datasource for one resource endpoint.
    ///
    /// A trailing slash on the endpoint is optional; URLs are always built
    /// with one.
    pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            endpoint,
            transport,
            options: RestOptions::new(),
        }
    }

    /// Override the behavior switches.
    pub fn with_options(mut self, options: RestOptions) -> Self {
        self.options = options;
        self
    }

    /// The normalized endpoint (no trailing slash).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn collection_url(&self) -> String {
        format!("{}/", self.endpoint)
    }

    fn record_url(&self, pk: &Value) -> String {
        format!("{}/{}/", self.endpoint, pk)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        if self.options.log_requests {
            tracing::debug!(method = %request.method, url = %request.url, "rest request");
        }
        self.transport.execute(request)
    }

    fn parse_object(&self, body: &str) -> Result<Record> {
        let json: serde_json::Value = serde_json::from_str(body).map_err(|e| {
            Error::Operational(OperationalError::with_source(
                OperationalErrorKind::Decode,
                "response body is not valid JSON",
                Box::new(e),
            ))
        })?;
        Record::from_json(&json).map_err(|_| {
            Error::Operational(OperationalError::new(
                OperationalErrorKind::Decode,
                "response body is not a JSON object record",
            ))
        })
    }

    fn protocol_error(status: u16, url: &str) -> Error {
        Error::Operational(OperationalError::new(
            OperationalErrorKind::Protocol,
            format!("unexpected HTTP status {status} from {url}"),
        ))
    }
}

impl<T: HttpTransport> Datasource for RestDatasource<T> {
    fn get_record(&self, model: &str, pk: &Value) -> Result<Record> {
        let url = self.record_url(pk);
        let response = self.send(HttpRequest::new(HttpMethod::Get, &url))?;
        if response.status == 404 {
            return Err(RecordNotFound::new(model, pk.clone()).into());
        }
        if !response.is_success() {
            return Err(Self::protocol_error(response.status, &url));
        }
        self.parse_object(&response.body)
    }

    fn find_records(&self, _model: &str, query: &Query) -> Result<Vec<Record>> {
        let mut url = self.collection_url();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.to_query_string());
        }
        let response = self.send(HttpRequest::new(HttpMethod::Get, &url))?;
        if !response.is_success() {
            return Err(Self::protocol_error(response.status, &url));
        }
        let json: serde_json::Value = serde_json::from_str(&response.body).map_err(|e| {
            Error::Operational(OperationalError::with_source(
                OperationalErrorKind::Decode,
                "response body is not valid JSON",
                Box::new(e),
            ))
        })?;
        let serde_json::Value::Array(items) = json else {
            return Err(Error::Operational(OperationalError::new(
                OperationalErrorKind::Decode,
                "find response is not a JSON array",
            )));
        };
        items
            .iter()
            .map(|item| {
                Record::from_json(item).map_err(|_| {
                    Error::Operational(OperationalError::new(
                        OperationalErrorKind::Decode,
                        "find response element is not a JSON object record",
                    ))
                })
            })
            .collect()
    }

    fn save_record(&self, _model: &str, pk_field: &str, attrs: Record) -> Result<Value> {
        let current_pk = attrs.get(pk_field).cloned().unwrap_or(Value::Null);
        let url = if current_pk.is_null() {
            self.collection_url()
        } else {
            self.record_url(&current_pk)
        };

        let body = attrs.to_json().to_string();
        let response = self.send(HttpRequest::new(HttpMethod::Put, &url).with_body(body))?;
        if !response.is_success() {
            return Err(Self::protocol_error(response.status, &url));
        }

        // The server echoes the record back; for a fresh record the echoed
        // primary key is the assignment we report upward.
        if let Ok(record) = self.parse_object(&response.body) {
            if let Some(pk) = record.get(pk_field) {
                if !pk.is_null() {
                    return Ok(pk.clone());
                }
            }
        }
        if current_pk.is_null() {
            return Err(Error::Operational(OperationalError::new(
                OperationalErrorKind::Decode,
                format!("save response did not include the assigned '{pk_field}'"),
            )));
        }
        Ok(current_pk)
    }

    fn destroy_record(&self, _model: &str, pk: &Value) -> Result<bool> {
        let url = self.record_url(pk);
        let response = self.send(HttpRequest::new(HttpMethod::Delete, &url))?;
        if response.status == 404 {
            return Ok(false);
        }
        if !response.is_success() {
            return Err(Self::protocol_error(response.status, &url));
        }
        Ok(true)
    }
}
