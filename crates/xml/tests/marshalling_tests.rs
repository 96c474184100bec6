//! End-to-end marshalling: record types declared with the derive macro,
//! serialized with `to_xml` and read back through the schema index.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use soapwire_schema::{
    schema_document, ElementType, FromRecordInstance, MarshalError, MaxOccurs, Occurs,
    RecordType, ScalarKind, ToRecordInstance, ToRecordType, XsdDuration,
};
use soapwire_schema_derive::XmlRecord;
use soapwire_xml::{from_xml, xml_to_record, Marshaller, SchemaIndex, SoapMessage};
use std::str::FromStr;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

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
struct Measurement {
    label: String,
    price: Decimal,
    ratio: f64,
    weight: f32,
    valid: bool,
    taken_on: NaiveDate,
    taken_at: NaiveTime,
    lasted: XsdDuration,
    note: Option<String>,
    readings: Vec<i32>,
    owner: Option<Person>,
}

#[derive(XmlRecord, Debug, Clone, PartialEq)]
struct Appointment {
    title: String,
    starts: NaiveDateTime,
    booked_at: DateTime<Utc>,
    reminders: Vec<NaiveDateTime>,
}

#[derive(XmlRecord, Debug, Clone, PartialEq)]
#[xml(name = "Item")]
struct CountedItem {
    x: i64,
}

#[derive(XmlRecord, Debug, Clone, PartialEq)]
#[xml(name = "Item")]
struct LabelledItem {
    y: String,
}

fn steve() -> Person {
    Person {
        name: "Steve".to_string(),
        age: 38,
    }
}

#[test]
fn test_person_example() {
    init_tracing();
    let xml = steve().to_xml();
    assert_eq!(xml, "<Person><name>Steve</name><age>38</age></Person>");
    assert_eq!(xml_to_record::<Person>(&xml), Ok(steve()));
}

#[test]
fn test_team_round_trip_keeps_member_order() {
    init_tracing();
    let team = Team {
        members: vec![
            steve(),
            Person {
                name: "Ada".to_string(),
                age: 36,
            },
        ],
    };
    let xml = team.to_xml();
    assert_eq!(
        xml,
        concat!(
            "<Team><members><name>Steve</name><age>38</age></members>",
            "<members><name>Ada</name><age>36</age></members></Team>"
        )
    );
    assert_eq!(xml_to_record::<Team>(&xml), Ok(team));
}

#[test]
fn test_unknown_element_is_a_schema_mismatch() {
    let err = xml_to_record::<Person>(
        "<Person><name>Steve</name><age>38</age><height>180</height></Person>",
    )
    .unwrap_err();
    assert!(matches!(err, MarshalError::SchemaMismatch(_)), "{:?}", err);
}

#[test]
fn test_round_trip_through_generated_xsd() {
    init_tracing();
    let value = Measurement {
        label: "  spaced & <escaped>  ".to_string(),
        price: Decimal::from_str("-12.500").unwrap(),
        ratio: -3.25e-10,
        weight: 0.1,
        valid: true,
        taken_on: NaiveDate::from_ymd_opt(2011, 3, 4).unwrap(),
        taken_at: NaiveTime::from_hms_milli_opt(10, 15, 30, 250).unwrap(),
        lasted: XsdDuration::parse("P1DT2H").unwrap(),
        note: None,
        readings: vec![3, -1, 0],
        owner: Some(steve()),
    };

    let record = Measurement::record_type();
    let xsd = schema_document(&record.to_xsd().to_string(), None);
    let index = SchemaIndex::from_xsd(&xsd).unwrap();
    let instance = from_xml(&value.to_xml(), &index, &record).unwrap();

    assert_eq!(instance, value.to_instance());
    assert_eq!(Measurement::from_instance(&instance), Ok(value));
}

#[test]
fn test_empty_repeated_and_absent_optional() {
    let team: Team = xml_to_record("<Team></Team>").unwrap();
    assert!(team.members.is_empty());

    let xml = "<Measurement><label/><price>1</price><ratio>INF</ratio><weight>NaN</weight>\
               <valid>0</valid><taken_on>2020-01-01</taken_on><taken_at>00:00:00</taken_at>\
               <lasted>PT1S</lasted></Measurement>";
    let value: Measurement = xml_to_record(xml).unwrap();
    assert_eq!(value.label, "");
    assert_eq!(value.ratio, f64::INFINITY);
    assert!(value.weight.is_nan());
    assert!(!value.valid);
    assert_eq!(value.note, None);
    assert_eq!(value.owner, None);
    assert!(value.readings.is_empty());
}

#[test]
fn test_bad_scalar_text_is_a_coercion_error() {
    let err = xml_to_record::<Person>("<Person><name>Steve</name><age>old</age></Person>")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot read \"old\" as xsd:integer"
    );
}

#[test]
fn test_prefixed_root_inside_envelope() {
    let request = SoapMessage::parse(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:tns="urn:people">
             <soapenv:Header/>
             <soapenv:Body>
               <tns:Person><name>Steve</name><age>38</age></tns:Person>
             </soapenv:Body>
           </soapenv:Envelope>"#,
    )
    .unwrap();
    let body = request.body_root().unwrap();
    let person = Marshaller::of::<Person>().from_element(body).unwrap();
    assert_eq!(Person::from_instance(&person), Ok(steve()));
}

#[test]
fn test_date_time_round_trip_through_generated_xsd() {
    init_tracing();
    let starts = NaiveDate::from_ymd_opt(2011, 3, 4)
        .and_then(|day| day.and_hms_milli_opt(10, 30, 0, 125))
        .unwrap();
    let value = Appointment {
        title: "review".to_string(),
        starts,
        booked_at: Utc.with_ymd_and_hms(2011, 2, 28, 23, 59, 59).unwrap(),
        reminders: vec![starts - chrono::Duration::hours(1), starts],
    };

    let record = Appointment::record_type();
    let xsd = schema_document(&record.to_xsd().to_string(), None);
    assert!(xsd.contains(r#"<xsd:element name="starts" type="xsd:dateTime"/>"#));
    assert!(xsd.contains(
        r#"<xsd:element name="reminders" type="xsd:dateTime" minOccurs="0" maxOccurs="unbounded"/>"#
    ));

    let xml = value.to_xml();
    assert!(xml.contains("<starts>2011-03-04T10:30:00.125</starts>"));
    assert!(xml.contains("<booked_at>2011-02-28T23:59:59Z</booked_at>"));

    let index = SchemaIndex::from_xsd(&xsd).unwrap();
    let instance = from_xml(&xml, &index, &record).unwrap();
    assert_eq!(Appointment::from_instance(&instance), Ok(value));
}

#[test]
fn test_same_named_nested_types_are_rejected() {
    let err = RecordType::builder("Outer")
        .record("a", CountedItem::record_type())
        .record("b", LabelledItem::record_type())
        .build()
        .unwrap_err();
    assert!(matches!(err, MarshalError::InvalidDeclaration(_)), "{:?}", err);

    let err = RecordType::builder("Outer")
        .record("a", CountedItem::record_type())
        .repeated(
            "b",
            ElementType::Record(LabelledItem::record_type()),
            Occurs::default(),
        )
        .build()
        .unwrap_err();
    assert!(matches!(err, MarshalError::InvalidDeclaration(_)), "{:?}", err);
}

#[test]
fn test_names_that_would_break_the_xml_are_rejected() {
    let err = RecordType::builder("Person")
        .scalar("first name", ScalarKind::String)
        .build()
        .unwrap_err();
    assert!(matches!(err, MarshalError::InvalidDeclaration(_)), "{:?}", err);

    let err = RecordType::builder("<Person>").build().unwrap_err();
    assert!(matches!(err, MarshalError::InvalidDeclaration(_)), "{:?}", err);
}

#[test]
fn test_unsatisfiable_occurrence_bounds_are_rejected() {
    for occurs in [
        Occurs::new(3, MaxOccurs::Bounded(0)),
        Occurs::new(0, MaxOccurs::Bounded(0)),
        Occurs::new(4, MaxOccurs::Bounded(3)),
    ] {
        let err = RecordType::builder("Readings")
            .repeated("v", ElementType::Scalar(ScalarKind::Integer), occurs)
            .build()
            .unwrap_err();
        assert!(matches!(err, MarshalError::InvalidDeclaration(_)), "{:?}", err);
    }
}

#[test]
fn test_scalar_element_with_children_is_a_schema_mismatch() {
    let err = xml_to_record::<Person>(
        "<Person><name><given>Steve</given></name><age>38</age></Person>",
    )
    .unwrap_err();
    assert!(matches!(err, MarshalError::SchemaMismatch(_)), "{:?}", err);
}

#[test]
fn test_integer_beyond_64_bits_is_a_coercion_error() {
    let err = xml_to_record::<Person>(
        "<Person><name>Steve</name><age>123456789012345678901</age></Person>",
    )
    .unwrap_err();
    assert!(matches!(err, MarshalError::TypeCoercion { .. }), "{:?}", err);
}
