//! Transport-agnostic request handling: a web framework passes the query
//! string and the raw request body in and writes the returned text out.

use crate::assembler::WsdlAssembler;
use crate::config::ServiceConfig;
use crate::error::EndpointError;
use crate::message::{OperationInput, OperationOutput};
use crate::shape::OperationDescriptor;
use soapwire_schema::MarshalError;
use soapwire_xml::{render_envelope, SoapMessage};
use std::fmt;
use tracing::{debug, warn};

/// Application code behind an endpoint.
pub trait SoapOperation: Send + Sync {
    fn descriptor(&self) -> &OperationDescriptor;

    fn invoke(&self, input: OperationInput) -> anyhow::Result<OperationOutput>;
}

/// Whether a GET query string asks for the service description.
pub fn is_wsdl_query(query: &str) -> bool {
    query
        .trim_start_matches('?')
        .split('&')
        .any(|part| part.eq_ignore_ascii_case("wsdl"))
}

/// A [`SoapOperation`] backed by a closure.
pub struct FnOperation<F> {
    descriptor: OperationDescriptor,
    handler: F,
}

impl<F> FnOperation<F>
where
    F: Fn(OperationInput) -> anyhow::Result<OperationOutput> + Send + Sync,
{
    pub fn new(descriptor: OperationDescriptor, handler: F) -> Self {
        Self {
            descriptor,
            handler,
        }
    }
}

impl<F> SoapOperation for FnOperation<F>
where
    F: Fn(OperationInput) -> anyhow::Result<OperationOutput> + Send + Sync,
{
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn invoke(&self, input: OperationInput) -> anyhow::Result<OperationOutput> {
        (self.handler)(input)
    }
}

impl<F> fmt::Debug for FnOperation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperation")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// One service exposing one operation.
pub struct SoapEndpoint<O> {
    config: ServiceConfig,
    operation: O,
}

impl<O: SoapOperation> SoapEndpoint<O> {
    pub fn new(config: ServiceConfig, operation: O) -> Self {
        Self { config, operation }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn operation(&self) -> &O {
        &self.operation
    }

    /// The WSDL: the override file verbatim when one is configured, the
    /// generated document otherwise.
    pub fn describe(&self) -> Result<String, EndpointError> {
        if let Some(path) = self.config.wsdl_override() {
            debug!("serving static WSDL from {}", path.display());
            return Ok(std::fs::read_to_string(path)?);
        }
        let descriptor = self.operation.descriptor();
        let wsdl = WsdlAssembler::assemble(
            descriptor,
            self.config.service_name(),
            &self.config.namespace_for(descriptor.name()),
            self.config.location(),
        )?;
        Ok(wsdl.to_string())
    }

    /// Answer a SOAP request, with a fault envelope on any failure.
    pub fn handle(&self, body: &str) -> String {
        match self.try_handle(body) {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    "{} failed: {}",
                    self.operation.descriptor().name(),
                    err
                );
                err.to_fault().envelope()
            }
        }
    }

    /// Answer a SOAP request, returning the failure instead of a fault.
    pub fn try_handle(&self, body: &str) -> Result<String, EndpointError> {
        let descriptor = self.operation.descriptor();
        let request = SoapMessage::parse(body)?;
        let root = request
            .body_root()
            .ok_or_else(|| MarshalError::schema_mismatch("SOAP Body is empty"))?;
        debug!(
            "dispatching <{}> to {}",
            root.qualified_name(),
            descriptor.name()
        );

        let input = OperationInput::parse(root, descriptor)?;
        let output = self.operation.invoke(input)?;
        Ok(render_envelope("", &output.to_xml(descriptor)?))
    }
}

impl<O: fmt::Debug> fmt::Debug for SoapEndpoint<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoapEndpoint")
            .field("config", &self.config)
            .field("operation", &self.operation)
            .finish()
    }
}
