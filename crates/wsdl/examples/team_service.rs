//! A one-operation team service: prints its WSDL, then answers a request
//! and a malformed request.
//!
//! Run with `RUST_LOG=debug` to see the dispatch.

use soapwire_schema::ToRecordType;
use soapwire_schema_derive::XmlRecord;
use soapwire_wsdl::{
    OperationDescriptor, OperationInput, OperationOutput, ServiceConfig, Shape, SoapEndpoint,
    SoapOperation,
};

#[derive(XmlRecord, Debug, Clone, PartialEq)]
struct Person {
    name: String,
    age: i64,
}

#[derive(XmlRecord, Debug, Clone, PartialEq)]
struct Team {
    #[xml(min_occurs = 1)]
    members: Vec<Person>,
}

#[derive(XmlRecord, Debug, Clone, PartialEq)]
struct TeamSummary {
    size: i64,
    average_age: f64,
    oldest: Option<Person>,
}

struct Summarize {
    descriptor: OperationDescriptor,
}

impl SoapOperation for Summarize {
    fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    fn invoke(&self, input: OperationInput) -> anyhow::Result<OperationOutput> {
        let team: Team = input.decode()?;
        let size = team.members.len() as i64;
        let total: i64 = team.members.iter().map(|p| p.age).sum();
        let summary = TeamSummary {
            size,
            average_age: if size == 0 { 0.0 } else { total as f64 / size as f64 },
            oldest: team.members.iter().max_by_key(|p| p.age).cloned(),
        };
        Ok(OperationOutput::record(&summary))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let endpoint = SoapEndpoint::new(
        ServiceConfig::for_endpoint("localhost", 8080, "TeamService"),
        Summarize {
            descriptor: OperationDescriptor::new(
                "summarize",
                Shape::record::<Team>(),
                Shape::record::<TeamSummary>(),
            ),
        },
    );

    println!("=== XSD of {} ===\n", Team::record_type().name());
    println!("{}\n", Team::xsd());

    println!("=== WSDL ===\n");
    println!("{}\n", endpoint.describe()?);

    let request = concat!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">"#,
        "<soapenv:Header/><soapenv:Body><Team>",
        "<members><name>Steve</name><age>38</age></members>",
        "<members><name>Ann</name><age>41</age></members>",
        "</Team></soapenv:Body></soapenv:Envelope>"
    );
    println!("=== Response ===\n");
    println!("{}\n", endpoint.handle(request));

    let bad = request.replace("<age>41</age>", "<age>forty-one</age>");
    println!("=== Fault ===\n");
    println!("{}", endpoint.handle(&bad));
    Ok(())
}
