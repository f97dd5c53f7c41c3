//! Shared test support utilities for integration tests

#![allow(dead_code)]

use apicheck_core::{Action, Body, ParamType, ParameterDef, Resource, ResponseDef, SpecModel};
use bigdecimal::BigDecimal;
use std::str::FromStr;

pub const STRING_SCHEMA: &str = r#"{"type":"string"}"#;

pub const USER_SCHEMA: &str = r#"{
    "type": "object",
    "required": ["id", "name"],
    "properties": {
        "id": {"type": "integer"},
        "name": {"type": "string"}
    }
}"#;

pub const USER_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="user">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="id" type="xs:integer"/>
                <xs:element name="name" type="xs:string"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

pub fn decimal(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).expect("valid decimal")
}

/// `GET /data` without query parameters, answering 200 with a JSON string
pub fn data_model() -> SpecModel {
    SpecModel::default().with_resource(
        Resource::new("/data").with_action(Action::new("GET").with_response(
            200,
            ResponseDef::default().with_body(Body::new("application/json").with_schema(STRING_SCHEMA)),
        )),
    )
}

/// A small users API with nested resources, typed parameters, headers,
/// negotiated bodies and a named schema table
pub fn users_model() -> SpecModel {
    let mut model = SpecModel {
        base_uri: Some("http://api.example.com/{version}".to_string()),
        protocols: vec!["HTTP".to_string(), "HTTPS".to_string()],
        base_uri_parameters: vec![ParameterDef::new("version", ParamType::String).enumeration(["v1", "v2"])],
        ..SpecModel::default()
    };
    model.schemas.insert("user".to_string(), USER_SCHEMA.to_string());
    model.schemas.insert("user-xml".to_string(), USER_XSD.to_string());

    let user_response = ResponseDef::default()
        .with_header(ParameterDef::new("ETag", ParamType::String).required())
        .with_body(Body::new("application/json").with_schema("user"))
        .with_body(Body::new("application/xml").with_schema("user-xml"));

    let users = Resource::new("/users")
        .with_action(
            Action::new("GET")
                .with_query_parameter(
                    ParameterDef::new("page", ParamType::Integer)
                        .minimum(decimal("1"))
                        .maximum(decimal("100")),
                )
                .with_query_parameter(ParameterDef::new("tag", ParamType::String).repeat())
                .with_response(200, ResponseDef::default().with_body(Body::new("application/json"))),
        )
        .with_action(
            Action::new("POST")
                .with_header(ParameterDef::new("X-Request-Id", ParamType::String).required())
                .with_body(Body::new("application/json").with_schema("user"))
                .with_body(
                    Body::new("application/x-www-form-urlencoded")
                        .with_form_parameter(ParameterDef::new("name", ParamType::String).required())
                        .with_form_parameter(ParameterDef::new("age", ParamType::Integer)),
                )
                .with_response(201, ResponseDef::default())
                .with_response(400, ResponseDef::default().with_body(Body::new("application/json").with_schema("error"))),
        )
        .with_resource(
            Resource::new("/{id}")
                .with_uri_parameter(ParameterDef::new("id", ParamType::Integer).minimum(decimal("1")))
                .with_action(Action::new("GET").with_response(200, user_response))
                .with_action(Action::new("DELETE").with_protocols(["HTTPS"]).with_response(204, ResponseDef::default())),
        );
    model.resources.push(users);
    model
}
