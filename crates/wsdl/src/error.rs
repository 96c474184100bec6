use soapwire_schema::MarshalError;
use soapwire_xml::Fault;
use thiserror::Error;

/// Failures while serving a request or loading configuration.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// Reading the static WSDL or a configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid service configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Raised by the operation handler itself
    #[error("{0}")]
    Operation(#[from] anyhow::Error),
}

impl EndpointError {
    pub fn to_fault(&self) -> Fault {
        Fault::server(self)
    }
}
