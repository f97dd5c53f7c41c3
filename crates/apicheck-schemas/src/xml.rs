//! XML Schema engine
//!
//! Supports the part of W3C XML Schema that API contracts use in practice:
//! global and local element declarations (`name`, `ref`, `type`, `minOccurs`,
//! `maxOccurs`), named and anonymous `complexType`s with `sequence`, `all` and
//! `choice` groups, attribute declarations with `use="required"`, `mixed`
//! content, and the numeric, boolean and string built-in simple types. Other
//! built-in types are accepted without checking their lexical form.
//!
//! Element names are matched by local name; namespaces in the content are not
//! checked against `targetNamespace`.
//!
//! Copyright (c) 2025 Apicheck Team
//! Licensed under the Apache-2.0 license

use crate::cache::{CacheConfig, SchemaCache};
use crate::error::{SchemaError, SchemaResult, SchemaViolation};
use crate::SchemaEngine;
use roxmltree::{Document, Node};
use std::collections::HashMap;

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Validates XML bodies against XML Schema documents
#[derive(Debug, Default)]
pub struct XmlSchemaEngine {
    cache: SchemaCache<XsdSchema>,
}

impl XmlSchemaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_config(config: CacheConfig) -> Self {
        Self {
            cache: SchemaCache::with_config(config),
        }
    }

    pub fn cached_schemas(&self) -> usize {
        self.cache.len()
    }
}

impl SchemaEngine for XmlSchemaEngine {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn validate(&self, content: &str, schema: &str) -> SchemaResult<Vec<SchemaViolation>> {
        let compiled = self.cache.get_or_try_insert_with(schema, || XsdSchema::parse(schema))?;
        let doc = Document::parse(content)
            .map_err(|e| SchemaError::invalid_content(format!("content is not well-formed XML: {}", e)))?;

        let mut validation = Validation {
            schema: &compiled,
            doc: &doc,
            findings: Vec::new(),
        };
        validation.validate_root(doc.root_element());
        Ok(validation.findings)
    }
}

/// Built-in simple types whose lexical form is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    String,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    Decimal,
    Boolean,
    AnySimple,
}

impl Builtin {
    fn from_local_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "string" | "normalizedString" | "token" | "anyURI" | "NMTOKEN" | "Name" | "NCName"
            | "ID" | "IDREF" | "language" => Self::String,
            "integer" | "int" | "long" | "short" | "byte" | "negativeInteger"
            | "nonPositiveInteger" => Self::Integer,
            "nonNegativeInteger" | "unsignedInt" | "unsignedLong" | "unsignedShort"
            | "unsignedByte" => Self::NonNegativeInteger,
            "positiveInteger" => Self::PositiveInteger,
            "decimal" | "float" | "double" => Self::Decimal,
            "boolean" => Self::Boolean,
            "anySimpleType" | "date" | "dateTime" | "time" | "duration" | "base64Binary"
            | "hexBinary" | "QName" | "gYear" | "gYearMonth" | "gMonth" | "gMonthDay" | "gDay" => {
                Self::AnySimple
            }
            _ => return None,
        };
        Some(builtin)
    }

    fn describe(self) -> &'static str {
        match self {
            Self::String | Self::AnySimple => "string",
            Self::Integer => "integer",
            Self::NonNegativeInteger => "non-negative integer",
            Self::PositiveInteger => "positive integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
        }
    }

    fn accepts(self, raw: &str) -> bool {
        let value = raw.trim();
        match self {
            Self::String | Self::AnySimple => true,
            Self::Integer => is_integer(value),
            Self::NonNegativeInteger => is_integer(value) && !value.starts_with('-'),
            Self::PositiveInteger => {
                is_integer(value)
                    && !value.starts_with('-')
                    && value.trim_start_matches('+').chars().any(|c| c != '0')
            }
            Self::Decimal => is_decimal(value),
            Self::Boolean => matches!(value, "true" | "false" | "1" | "0"),
        }
    }
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal(value: &str) -> bool {
    if matches!(value, "INF" | "-INF" | "NaN") {
        return true;
    }
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let mantissa = match unsigned.find(['e', 'E']) {
        Some(pos) => {
            if !is_integer(&unsigned[pos + 1..]) {
                return false;
            }
            &unsigned[..pos]
        }
        None => unsigned,
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    (!whole.is_empty() || !fraction.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone)]
enum TypeRef {
    Builtin(Builtin),
    Named(String),
    Anonymous(Box<ComplexType>),
    /// `ref="..."` to a global element declaration
    Global(String),
    Any,
}

#[derive(Debug, Clone)]
struct ElementDecl {
    name: String,
    ty: TypeRef,
    min_occurs: u32,
    max_occurs: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Sequence,
    All,
    Choice,
}

#[derive(Debug, Clone)]
struct Group {
    kind: GroupKind,
    particles: Vec<ElementDecl>,
    min_occurs: u32,
}

#[derive(Debug, Clone)]
struct AttributeDecl {
    name: String,
    required: bool,
    ty: Builtin,
}

#[derive(Debug, Clone, Default)]
struct ComplexType {
    group: Option<Group>,
    attributes: Vec<AttributeDecl>,
    any_attribute: bool,
    mixed: bool,
    /// Simple content (`xs:simpleContent/xs:extension base=...`)
    text: Option<Builtin>,
}

/// Owned, compiled form of an XML Schema document
#[derive(Debug)]
pub struct XsdSchema {
    elements: HashMap<String, ElementDecl>,
    complex_types: HashMap<String, ComplexType>,
    simple_types: HashMap<String, Builtin>,
}

impl XsdSchema {
    /// Parse an XML Schema text into its compiled form
    pub fn parse(text: &str) -> SchemaResult<Self> {
        let doc = Document::parse(text)
            .map_err(|e| SchemaError::invalid_schema(format!("schema is not well-formed XML: {}", e)))?;
        let root = doc.root_element();
        if !is_xsd(&root, "schema") {
            return Err(SchemaError::invalid_schema(format!(
                "root element must be 'schema' in namespace {}, found '{}'",
                XSD_NAMESPACE,
                root.tag_name().name()
            )));
        }

        let mut schema = Self {
            elements: HashMap::new(),
            complex_types: HashMap::new(),
            simple_types: HashMap::new(),
        };

        // Simple types first so complex types can refer to them by name
        for child in root.children().filter(|n| is_xsd(n, "simpleType")) {
            let name = required_attribute(&child, "name")?;
            let base = schema.restriction_base(&child);
            schema.simple_types.insert(name.to_string(), base);
        }
        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "element" if is_xsd(&child, "element") => {
                    if child.has_attribute("ref") {
                        return Err(SchemaError::invalid_schema(
                            "global element declaration must have 'name', not 'ref'",
                        ));
                    }
                    let decl = schema.parse_element(&child)?;
                    schema.elements.insert(decl.name.clone(), decl);
                }
                "complexType" if is_xsd(&child, "complexType") => {
                    let name = required_attribute(&child, "name")?;
                    let ty = schema.parse_complex_type(&child)?;
                    schema.complex_types.insert(name.to_string(), ty);
                }
                _ => {}
            }
        }

        if schema.elements.is_empty() {
            return Err(SchemaError::invalid_schema("schema declares no global element"));
        }
        Ok(schema)
    }

    fn parse_element(&self, node: &Node) -> SchemaResult<ElementDecl> {
        let min_occurs = parse_occurs(node, "minOccurs")?.unwrap_or(1);
        let max_occurs = match node.attribute("maxOccurs") {
            Some("unbounded") => None,
            _ => Some(parse_occurs(node, "maxOccurs")?.unwrap_or(1)),
        };

        if let Some(reference) = node.attribute("ref") {
            let name = local_part(reference).to_string();
            return Ok(ElementDecl {
                ty: TypeRef::Global(name.clone()),
                name,
                min_occurs,
                max_occurs,
            });
        }

        let name = required_attribute(node, "name")?.to_string();
        let ty = if let Some(type_name) = node.attribute("type") {
            self.resolve_type_name(type_name)
        } else if let Some(inline) = node.children().find(|n| is_xsd(n, "complexType")) {
            TypeRef::Anonymous(Box::new(self.parse_complex_type(&inline)?))
        } else if let Some(inline) = node.children().find(|n| is_xsd(n, "simpleType")) {
            TypeRef::Builtin(self.restriction_base(&inline))
        } else {
            TypeRef::Any
        };

        Ok(ElementDecl {
            name,
            ty,
            min_occurs,
            max_occurs,
        })
    }

    fn resolve_type_name(&self, type_name: &str) -> TypeRef {
        let local = local_part(type_name);
        if let Some(builtin) = self.simple_types.get(local) {
            return TypeRef::Builtin(*builtin);
        }
        match Builtin::from_local_name(local) {
            Some(builtin) if !self.complex_types.contains_key(local) => TypeRef::Builtin(builtin),
            _ if local == "anyType" => TypeRef::Any,
            _ => TypeRef::Named(local.to_string()),
        }
    }

    fn parse_complex_type(&self, node: &Node) -> SchemaResult<ComplexType> {
        let mut ty = ComplexType {
            mixed: node.attribute("mixed") == Some("true"),
            ..ComplexType::default()
        };

        for child in node.children().filter(Node::is_element) {
            if !is_xsd_node(&child) {
                continue;
            }
            match child.tag_name().name() {
                "sequence" => ty.group = Some(self.parse_group(&child, GroupKind::Sequence)?),
                "all" => ty.group = Some(self.parse_group(&child, GroupKind::All)?),
                "choice" => ty.group = Some(self.parse_group(&child, GroupKind::Choice)?),
                "attribute" => ty.attributes.push(self.parse_attribute(&child)?),
                "anyAttribute" => ty.any_attribute = true,
                "simpleContent" => {
                    if let Some(extension) = child
                        .children()
                        .find(|n| is_xsd(n, "extension") || is_xsd(n, "restriction"))
                    {
                        ty.text = Some(self.simple_type(extension.attribute("base")));
                        for attribute in extension.children().filter(|n| is_xsd(n, "attribute")) {
                            ty.attributes.push(self.parse_attribute(&attribute)?);
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(ty)
    }

    fn parse_group(&self, node: &Node, kind: GroupKind) -> SchemaResult<Group> {
        let mut particles = Vec::new();
        for child in node.children().filter(Node::is_element) {
            if is_xsd(&child, "element") {
                particles.push(self.parse_element(&child)?);
            } else if is_xsd(&child, "sequence") || is_xsd(&child, "choice") {
                // Nested groups are flattened; alternatives of a nested choice become optional
                let nested_kind = if is_xsd(&child, "choice") {
                    GroupKind::Choice
                } else {
                    GroupKind::Sequence
                };
                let nested = self.parse_group(&child, nested_kind)?;
                for mut particle in nested.particles {
                    if nested_kind == GroupKind::Choice || nested.min_occurs == 0 {
                        particle.min_occurs = 0;
                    }
                    particles.push(particle);
                }
            }
        }
        Ok(Group {
            kind,
            particles,
            min_occurs: parse_occurs(node, "minOccurs")?.unwrap_or(1),
        })
    }

    /// Follows an element `ref` to the global declaration. Global declarations
    /// never carry a `ref` themselves, so one step always ends on a concrete type.
    fn dereference<'a>(&'a self, ty: &'a TypeRef) -> Option<&'a TypeRef> {
        match ty {
            TypeRef::Global(name) => self
                .elements
                .get(name)
                .map(|decl| &decl.ty)
                .filter(|target| !matches!(target, TypeRef::Global(_))),
            other => Some(other),
        }
    }

    fn complex_type<'a>(&'a self, ty: &'a TypeRef) -> Option<&'a ComplexType> {
        match self.dereference(ty)? {
            TypeRef::Anonymous(inline) => Some(inline),
            TypeRef::Named(name) => self.complex_types.get(name),
            TypeRef::Builtin(_) | TypeRef::Global(_) | TypeRef::Any => None,
        }
    }

    fn builtin(&self, ty: &TypeRef) -> Option<Builtin> {
        match self.dereference(ty)? {
            TypeRef::Builtin(builtin) => Some(*builtin),
            _ => None,
        }
    }

    fn parse_attribute(&self, node: &Node) -> SchemaResult<AttributeDecl> {
        let name = node
            .attribute("name")
            .or_else(|| node.attribute("ref").map(local_part))
            .ok_or_else(|| SchemaError::invalid_schema("attribute declaration without 'name' or 'ref'"))?;
        let ty = match node.attribute("type") {
            Some(type_name) => self.simple_type(Some(type_name)),
            None => node
                .children()
                .find(|n| is_xsd(n, "simpleType"))
                .map_or(Builtin::AnySimple, |inline| self.restriction_base(&inline)),
        };
        Ok(AttributeDecl {
            name: name.to_string(),
            required: node.attribute("use") == Some("required"),
            ty,
        })
    }

    /// Base type of a `simpleType` node's `restriction`
    fn restriction_base(&self, simple_type: &Node) -> Builtin {
        let base = simple_type
            .children()
            .find(|n| is_xsd(n, "restriction"))
            .and_then(|r| r.attribute("base"));
        self.simple_type(base)
    }

    /// Resolves a simple type name against the declared simple types and the
    /// built-ins. Unknown names are accepted without lexical checks.
    fn simple_type(&self, type_name: Option<&str>) -> Builtin {
        let Some(type_name) = type_name else {
            return Builtin::AnySimple;
        };
        let local = local_part(type_name);
        if let Some(builtin) = self.simple_types.get(local) {
            return *builtin;
        }
        Builtin::from_local_name(local).unwrap_or_else(|| {
            log::warn!("Unsupported simple type '{}', values are not checked", type_name);
            Builtin::AnySimple
        })
    }
}

fn parse_occurs(node: &Node, attribute: &str) -> SchemaResult<Option<u32>> {
    node.attribute(attribute)
        .map(|raw| {
            raw.trim().parse::<u32>().map_err(|_| {
                SchemaError::invalid_schema(format!("invalid {} value '{}'", attribute, raw))
            })
        })
        .transpose()
}

fn required_attribute<'a>(node: &Node<'a, '_>, name: &str) -> SchemaResult<&'a str> {
    node.attribute(name).ok_or_else(|| {
        SchemaError::invalid_schema(format!(
            "'{}' declaration without '{}' attribute",
            node.tag_name().name(),
            name
        ))
    })
}

fn is_xsd_node(node: &Node) -> bool {
    node.tag_name().namespace() == Some(XSD_NAMESPACE)
}

fn is_xsd(node: &Node, local: &str) -> bool {
    node.is_element() && is_xsd_node(node) && node.tag_name().name() == local
}

fn local_part(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

struct Validation<'s, 'd, 'input> {
    schema: &'s XsdSchema,
    doc: &'d Document<'input>,
    findings: Vec<SchemaViolation>,
}

impl<'s, 'd, 'input> Validation<'s, 'd, 'input> {
    fn report(&mut self, node: &Node, message: String) {
        let pos = self.doc.text_pos_at(node.range().start);
        self.findings.push(SchemaViolation::at_position(message, pos.row, pos.col));
    }

    fn validate_root(&mut self, root: Node) {
        let schema = self.schema;
        let name = root.tag_name().name();
        match schema.elements.get(name) {
            Some(decl) => self.validate_element(root, &decl.ty),
            None => self.report(&root, format!("cannot find the declaration of element '{}'", name)),
        }
    }

    fn validate_element(&mut self, node: Node, ty: &TypeRef) {
        let schema = self.schema;
        if let Some(builtin) = schema.builtin(ty) {
            self.validate_simple_element(node, builtin);
        } else if let Some(complex) = schema.complex_type(ty) {
            self.validate_complex_element(node, complex);
        } else if let TypeRef::Named(name) = ty {
            self.report(&node, format!("type '{}' of element '{}' is not declared", name, node.tag_name().name()));
        }
    }

    fn validate_simple_element(&mut self, node: Node, builtin: Builtin) {
        let name = node.tag_name().name();
        if let Some(child) = node.children().find(Node::is_element) {
            self.report(
                &child,
                format!("element '{}' must not contain element children", name),
            );
            return;
        }
        let text: String = node.children().filter_map(|n| n.text()).collect();
        if !builtin.accepts(&text) {
            self.report(
                &node,
                format!("value '{}' of element '{}' is not a valid {}", text.trim(), name, builtin.describe()),
            );
        }
    }

    fn validate_complex_element(&mut self, node: Node, ty: &ComplexType) {
        let name = node.tag_name().name().to_string();
        self.validate_attributes(node, ty, &name);

        if let Some(builtin) = ty.text {
            self.validate_simple_element(node, builtin);
            return;
        }

        if !ty.mixed {
            if let Some(text) = node
                .children()
                .filter(|n| n.is_text())
                .find(|n| n.text().is_some_and(|t| !t.trim().is_empty()))
            {
                self.report(&text, format!("element '{}' must not contain text", name));
            }
        }

        let children: Vec<Node> = node.children().filter(Node::is_element).collect();
        let Some(group) = &ty.group else {
            if let Some(child) = children.first() {
                self.report(
                    child,
                    format!("element '{}' is not allowed in '{}'", child.tag_name().name(), name),
                );
            }
            return;
        };

        let mut counts = vec![0u32; group.particles.len()];
        let mut last_index = 0;
        for child in &children {
            let child_name = child.tag_name().name();
            let Some(index) = group.particles.iter().position(|p| p.name == child_name) else {
                self.report(child, format!("element '{}' is not allowed in '{}'", child_name, name));
                continue;
            };
            if group.kind == GroupKind::Sequence && index < last_index {
                self.report(child, format!("element '{}' is out of order in '{}'", child_name, name));
            }
            last_index = last_index.max(index);
            counts[index] += 1;

            self.validate_element(*child, &group.particles[index].ty);
        }

        match group.kind {
            GroupKind::Choice => {
                let present = counts.iter().filter(|c| **c > 0).count();
                if present == 0 && group.min_occurs > 0 && !group.particles.is_empty() {
                    let names: Vec<_> = group.particles.iter().map(|p| format!("'{}'", p.name)).collect();
                    self.report(&node, format!("element '{}' must contain one of {}", name, names.join(", ")));
                } else if present > 1 {
                    let names: Vec<_> = group.particles.iter().map(|p| format!("'{}'", p.name)).collect();
                    self.report(&node, format!("element '{}' must contain only one of {}", name, names.join(", ")));
                }
            }
            GroupKind::Sequence | GroupKind::All => {
                let optional_group = group.min_occurs == 0 && children.is_empty();
                for (particle, count) in group.particles.iter().zip(&counts) {
                    if *count < particle.min_occurs && !optional_group {
                        self.report(
                            &node,
                            format!(
                                "element '{}' must contain at least {} '{}' element(s), found {}",
                                name, particle.min_occurs, particle.name, count
                            ),
                        );
                    }
                    if let Some(max) = particle.max_occurs {
                        if *count > max {
                            self.report(
                                &node,
                                format!(
                                    "element '{}' must contain at most {} '{}' element(s), found {}",
                                    name, max, particle.name, count
                                ),
                            );
                        }
                    }
                }
            }
        }
    }

    fn validate_attributes(&mut self, node: Node, ty: &ComplexType, element: &str) {
        for declared in &ty.attributes {
            match node.attribute(declared.name.as_str()) {
                Some(value) if !declared.ty.accepts(value) => self.report(
                    &node,
                    format!(
                        "value '{}' of attribute '{}' on element '{}' is not a valid {}",
                        value,
                        declared.name,
                        element,
                        declared.ty.describe()
                    ),
                ),
                None if declared.required => self.report(
                    &node,
                    format!("attribute '{}' is required on element '{}'", declared.name, element),
                ),
                _ => {}
            }
        }

        if ty.any_attribute {
            return;
        }
        for attribute in node.attributes() {
            // Namespaced attributes (xsi:schemaLocation and friends) are not declared in the schema
            if attribute.namespace().is_some() {
                continue;
            }
            if !ty.attributes.iter().any(|a| a.name == attribute.name()) {
                self.report(
                    &node,
                    format!("attribute '{}' is not allowed on element '{}'", attribute.name(), element),
                );
            }
        }
    }
}
