use crate::error::EndpointError;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where and under which name a service is exposed.
///
/// ```
/// use soapwire_wsdl::ServiceConfig;
///
/// let config = ServiceConfig::for_endpoint("localhost", 8080, "Calculator");
/// assert_eq!(config.location(), "http://localhost:8080/Calculator");
/// assert_eq!(config.namespace_for("add"), "http://localhost:8080/Calculator/add");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct ServiceConfig {
    service_name: String,
    /// endpoint URI, also used as the `soapAction`
    location: String,
    #[serde(default)]
    target_namespace: Option<String>,
    /// a static WSDL file served instead of the generated document
    #[serde(default)]
    wsdl_override: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn new(service_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            location: location.into(),
            target_namespace: None,
            wsdl_override: None,
        }
    }

    /// `http://<address>:<port>/<service_name>`
    pub fn for_endpoint(address: &str, port: u16, service_name: &str) -> Self {
        Self::new(
            service_name,
            format!("http://{}:{}/{}", address, port, service_name),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, EndpointError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EndpointError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_target_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.target_namespace = Some(namespace.into());
        self
    }

    pub fn with_wsdl_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.wsdl_override = Some(path.into());
        self
    }

    /// The configured target namespace, or `<location>/<operation>`.
    pub fn namespace_for(&self, operation: &str) -> String {
        match &self.target_namespace {
            Some(namespace) => namespace.clone(),
            None => format!("{}/{}", self.location.trim_end_matches('/'), operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_with_defaults() {
        let config = ServiceConfig::from_json_str(
            r#"{"service_name": "Calculator", "location": "http://h:80/Calculator/"}"#,
        )
        .unwrap();
        assert_eq!(config.target_namespace(), &None);
        assert_eq!(config.namespace_for("add"), "http://h:80/Calculator/add");
    }

    #[test]
    fn test_explicit_namespace_wins() {
        let config = ServiceConfig::for_endpoint("h", 80, "Calculator")
            .with_target_namespace("urn:calc");
        assert_eq!(config.namespace_for("add"), "urn:calc");
    }

    #[test]
    fn test_bad_json_is_a_config_error() {
        assert!(matches!(
            ServiceConfig::from_json_str("{"),
            Err(EndpointError::Config(_))
        ));
    }
}
