//! Opening connections to the Cosmos DB Gremlin endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use url::Url;

use crate::config::GraphConfig;
use crate::gremlin::connection::{Connection, WsConnection};
use crate::gremlin::error::{GremlinError, GremlinResult};

/// Username/password pair presented during SASL authentication.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Cosmos DB expects `/dbs/{database}/colls/{collection}` as the username
    /// and the account key as the password.
    pub fn for_collection(database: &str, collection: &str, key: &str) -> Self {
        Self::new(format!("/dbs/{}/colls/{}", database, collection), key)
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Factory for upstream connections.
///
/// Every call yields a fresh handle targeting the same endpoint with the same
/// credentials.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> GremlinResult<Arc<dyn Connection>>;

    /// Endpoint description for logs.
    fn endpoint(&self) -> &str;
}

/// Connector for a Gremlin-over-WebSocket endpoint.
pub struct CosmosConnector {
    url: Url,
    credentials: Credentials,
    traversal_source: String,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl CosmosConnector {
    pub fn new(
        config: &GraphConfig,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> GremlinResult<Self> {
        let url = gremlin_url(&config.endpoint)?;
        Ok(Self {
            url,
            credentials: Credentials::for_collection(
                &config.database,
                &config.collection,
                &config.key,
            ),
            traversal_source: config.traversal_source.clone(),
            connect_timeout,
            request_timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

#[async_trait]
impl Connector for CosmosConnector {
    async fn connect(&self) -> GremlinResult<Arc<dyn Connection>> {
        let connect_err = |message: String| GremlinError::Connect {
            endpoint: self.url.to_string(),
            message,
        };

        let (stream, _response) =
            match timeout(self.connect_timeout, tokio_tungstenite::connect_async(self.url.as_str())).await {
                Ok(Ok(pair)) => pair,
                Ok(Err(e)) => return Err(connect_err(e.to_string())),
                Err(_) => {
                    return Err(connect_err(format!(
                        "handshake timed out after {:?}",
                        self.connect_timeout
                    )))
                }
            };

        let connection = WsConnection::spawn(
            stream,
            self.credentials.clone(),
            self.traversal_source.clone(),
            self.request_timeout,
        );

        tracing::info!(
            endpoint = %self.url,
            connection = %connection.id(),
            username = %self.credentials.username,
            "Connected to Gremlin endpoint"
        );

        Ok(Arc::new(connection))
    }

    fn endpoint(&self) -> &str {
        self.url.as_str()
    }
}

/// Normalize a configured endpoint into a WebSocket URL ending in `/gremlin`.
pub fn gremlin_url(endpoint: &str) -> GremlinResult<Url> {
    let mut url = Url::parse(endpoint.trim())
        .map_err(|e| GremlinError::Protocol(format!("invalid endpoint '{}': {}", endpoint, e)))?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(GremlinError::Protocol(format!(
                "unsupported endpoint scheme '{}'",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| GremlinError::Protocol(format!("cannot use scheme '{}'", scheme)))?;

    let path = url.path().trim_end_matches('/').to_string();
    if !path.ends_with("/gremlin") {
        url.set_path(&format!("{}/gremlin", path));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_endpoint_becomes_wss() {
        let url = gremlin_url("https://acct.gremlin.cosmos.azure.com:443/").unwrap();
        assert_eq!(url.as_str(), "wss://acct.gremlin.cosmos.azure.com/gremlin");
    }

    #[test]
    fn test_existing_gremlin_path_kept() {
        let url = gremlin_url("wss://acct.gremlin.cosmos.azure.com:443/gremlin").unwrap();
        assert_eq!(url.path(), "/gremlin");

        let url = gremlin_url("ws://127.0.0.1:8182").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8182/gremlin");
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        assert!(gremlin_url("ftp://example.com").is_err());
        assert!(gremlin_url("not a url").is_err());
    }

    #[test]
    fn test_credentials_are_redacted() {
        let creds = Credentials::for_collection("graphdb", "RelationshipGraph", "s3cret");
        assert_eq!(creds.username, "/dbs/graphdb/colls/RelationshipGraph");
        assert_eq!(creds.password(), "s3cret");
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }

    #[test]
    fn test_connector_derives_url_and_username_from_config() {
        let config = GraphConfig {
            endpoint: "https://acct.gremlin.cosmos.azure.com:443/".into(),
            database: "graphdb".into(),
            key: "s3cret".into(),
            ..GraphConfig::default()
        };
        let connector =
            CosmosConnector::new(&config, Duration::from_secs(2), Duration::from_secs(2)).unwrap();

        assert_eq!(connector.url().scheme(), "wss");
        assert_eq!(connector.endpoint(), connector.url().as_str());
        assert_eq!(
            connector.credentials().username,
            "/dbs/graphdb/colls/RelationshipGraph"
        );
        assert_eq!(connector.credentials().password(), "s3cret");
    }

    #[tokio::test]
    async fn test_connect_failure_is_connect_error() {
        let config = GraphConfig {
            endpoint: "ws://127.0.0.1:1".into(),
            ..GraphConfig::default()
        };
        let connector =
            CosmosConnector::new(&config, Duration::from_secs(2), Duration::from_secs(2)).unwrap();
        let err = match connector.connect().await {
            Ok(_) => panic!("connection to a closed port should fail"),
            Err(e) => e,
        };
        assert_eq!(err.kind(), crate::gremlin::ErrorKind::Connect);
    }
}
