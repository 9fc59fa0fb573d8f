//! Reads XML Schema documents into the [`Schema`] model.

use dictforge_core::ScalarType;
use tracing::warn;
use xmltree::{Element, XMLNode};

use super::schema::{
    Annotation, AttributeDecl, ComplexType, ElementDecl, Facet, FacetKind, Group, GroupKind,
    MaxOccurs, Particle, Schema, SimpleDerivation, SimpleType, TypeDef,
};
use crate::{Error, ValidationError, raw::RawAttribute};

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

fn unsupported(message: impl Into<String>) -> Error {
    Error::UnsupportedSchema(message.into())
}

fn children(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) => Some(child),
        _ => None,
    })
}

fn find_child<'e>(element: &'e Element, name: &str) -> Option<&'e Element> {
    children(element).find(|child| child.name == name)
}

fn attr<'e>(element: &'e Element, name: &str) -> Option<&'e str> {
    element.attributes.get(name).map(String::as_str)
}

fn owned_attr(element: &Element, name: &str) -> Option<String> {
    attr(element, name).map(str::to_owned)
}

fn text(element: &Element) -> Option<String> {
    element
        .get_text()
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Parses an XML Schema document.
pub fn read_schema(xsd: &str) -> Result<Schema, Error> {
    let root = Element::parse(xsd.as_bytes())?;
    if root.name != "schema" || root.namespace.as_deref() != Some(XSD_NAMESPACE) {
        return Err(unsupported(format!(
            "root element {} is not an XML Schema",
            root.name
        )));
    }

    let mut schema = Schema {
        target_namespace: owned_attr(&root, "targetNamespace"),
        xsd_prefix: root.prefix.clone(),
        ..Schema::default()
    };

    for child in children(&root) {
        match child.name.as_str() {
            "annotation" => schema.annotation = read_annotation(child)?,
            "element" => schema.elements.push(read_element(child)?),
            "complexType" => {
                let complex_type = read_complex_type(child)?;
                let name = complex_type
                    .name
                    .clone()
                    .ok_or_else(|| unsupported("global complexType without name"))?;
                if schema.complex_types.insert(name.clone(), complex_type).is_some() {
                    return Err(Error::Validation(ValidationError::DuplicatedId(name)));
                }
            }
            "simpleType" => {
                let simple_type = read_simple_type(child)?;
                let name = simple_type
                    .name
                    .clone()
                    .ok_or_else(|| unsupported("global simpleType without name"))?;
                if schema.simple_types.insert(name.clone(), simple_type).is_some() {
                    return Err(Error::Validation(ValidationError::DuplicatedId(name)));
                }
            }
            other => warn!(construct = other, "unsupported schema construct ignored"),
        }
    }

    Ok(schema)
}

fn read_annotation(element: &Element) -> Result<Annotation, Error> {
    let mut annotation = Annotation::default();
    for child in children(element) {
        match child.name.as_str() {
            "documentation" => {
                if annotation.documentation.is_none() {
                    annotation.documentation = text(child);
                }
            }
            "appinfo" => {
                for entry in children(child).filter(|entry| entry.name == "attribute") {
                    annotation.attributes.push(read_appinfo_attribute(entry)?);
                }
            }
            _ => {}
        }
    }
    Ok(annotation)
}

fn read_appinfo_attribute(element: &Element) -> Result<RawAttribute, Error> {
    let name = owned_attr(element, "name")
        .ok_or_else(|| unsupported("appinfo attribute without name"))?;
    let scalar_type = match attr(element, "type") {
        Some(scalar_type) => scalar_type
            .parse::<ScalarType>()
            .map_err(|err| unsupported(format!("appinfo attribute {name}: {err}")))?,
        None => ScalarType::String,
    };

    Ok(RawAttribute {
        name,
        value: text(element),
        scalar_type,
    })
}

fn read_child_annotation(element: &Element) -> Result<Annotation, Error> {
    Ok(find_child(element, "annotation")
        .map(read_annotation)
        .transpose()?
        .unwrap_or_default())
}

fn read_occurs(element: &Element) -> Result<(u32, MaxOccurs), Error> {
    let min_occurs = match attr(element, "minOccurs") {
        Some(min) => min
            .parse()
            .map_err(|_| unsupported(format!("invalid minOccurs {min}")))?,
        None => 1,
    };
    let max_occurs = match attr(element, "maxOccurs") {
        Some("unbounded") => MaxOccurs::Unbounded,
        Some(max) => MaxOccurs::Bounded(
            max.parse()
                .map_err(|_| unsupported(format!("invalid maxOccurs {max}")))?,
        ),
        None => MaxOccurs::default(),
    };
    Ok((min_occurs, max_occurs))
}

fn read_element(element: &Element) -> Result<ElementDecl, Error> {
    let (min_occurs, max_occurs) = read_occurs(element)?;
    let inline_type = match (
        find_child(element, "complexType"),
        find_child(element, "simpleType"),
    ) {
        (Some(complex_type), _) => Some(Box::new(TypeDef::Complex(read_complex_type(
            complex_type,
        )?))),
        (None, Some(simple_type)) => {
            Some(Box::new(TypeDef::Simple(read_simple_type(simple_type)?)))
        }
        (None, None) => None,
    };

    let declaration = ElementDecl {
        name: owned_attr(element, "name"),
        reference: owned_attr(element, "ref"),
        type_name: owned_attr(element, "type"),
        inline_type,
        min_occurs,
        max_occurs,
        default_value: owned_attr(element, "default").or_else(|| owned_attr(element, "fixed")),
        annotation: read_child_annotation(element)?,
    };
    if declaration.name.is_none() && declaration.reference.is_none() {
        return Err(unsupported("element without name or ref"));
    }
    Ok(declaration)
}

fn group_kind(name: &str) -> Option<GroupKind> {
    match name {
        "sequence" => Some(GroupKind::Sequence),
        "choice" => Some(GroupKind::Choice),
        "all" => Some(GroupKind::All),
        _ => None,
    }
}

fn read_group(element: &Element, kind: GroupKind) -> Result<Group, Error> {
    let (min_occurs, max_occurs) = read_occurs(element)?;
    let mut particles = Vec::new();
    for child in children(element) {
        match child.name.as_str() {
            "element" => particles.push(Particle::Element(read_element(child)?)),
            "any" => particles.push(Particle::Any),
            "annotation" => {}
            name => match group_kind(name) {
                Some(kind) => particles.push(Particle::Group(read_group(child, kind)?)),
                None => warn!(construct = name, "unsupported particle ignored"),
            },
        }
    }

    Ok(Group {
        kind,
        min_occurs,
        max_occurs,
        particles,
    })
}

/// Reads particle and attributes of a complex type or of its extension.
fn read_content(element: &Element, complex_type: &mut ComplexType) -> Result<(), Error> {
    for child in children(element) {
        match child.name.as_str() {
            "attribute" => {
                if let Some(attribute) = read_attribute(child)? {
                    complex_type.attributes.push(attribute);
                }
            }
            "annotation" => {}
            name => match group_kind(name) {
                Some(kind) => complex_type.particle = Some(read_group(child, kind)?),
                None => warn!(construct = name, "unsupported complex type content ignored"),
            },
        }
    }
    Ok(())
}

fn read_complex_type(element: &Element) -> Result<ComplexType, Error> {
    let mut complex_type = ComplexType {
        name: owned_attr(element, "name"),
        annotation: read_child_annotation(element)?,
        ..ComplexType::default()
    };

    match find_child(element, "complexContent") {
        Some(content) => {
            if let Some(extension) = find_child(content, "extension") {
                complex_type.base = owned_attr(extension, "base");
                read_content(extension, &mut complex_type)?;
            } else if let Some(restriction) = find_child(content, "restriction") {
                // A restriction repeats the content it keeps
                read_content(restriction, &mut complex_type)?;
            }
        }
        None => {
            if find_child(element, "simpleContent").is_some() {
                warn!(
                    complex_type = complex_type.name.as_deref().unwrap_or("<anonymous>"),
                    "simple content ignored"
                );
            }
            read_content(element, &mut complex_type)?;
        }
    }

    Ok(complex_type)
}

fn read_attribute(element: &Element) -> Result<Option<AttributeDecl>, Error> {
    let Some(name) = owned_attr(element, "name") else {
        warn!("attribute reference ignored");
        return Ok(None);
    };

    Ok(Some(AttributeDecl {
        name,
        type_name: owned_attr(element, "type"),
        inline_type: find_child(element, "simpleType")
            .map(read_simple_type)
            .transpose()?,
        required: attr(element, "use") == Some("required"),
        default_value: owned_attr(element, "default").or_else(|| owned_attr(element, "fixed")),
        annotation: read_child_annotation(element)?,
    }))
}

fn read_simple_type(element: &Element) -> Result<SimpleType, Error> {
    let name = owned_attr(element, "name");
    let derivation = if let Some(restriction) = find_child(element, "restriction") {
        let mut facets = Vec::new();
        for child in children(restriction) {
            if let Some(kind) = FacetKind::from_name(&child.name) {
                let value = owned_attr(child, "value").ok_or_else(|| {
                    unsupported(format!("{} facet without value", kind.as_str()))
                })?;
                facets.push(Facet {
                    kind,
                    value,
                    annotation: read_child_annotation(child)?,
                });
            }
        }
        SimpleDerivation::Restriction {
            base: owned_attr(restriction, "base"),
            inline_base: find_child(restriction, "simpleType")
                .map(read_simple_type)
                .transpose()?
                .map(Box::new),
            facets,
        }
    } else if find_child(element, "list").is_some() {
        SimpleDerivation::List
    } else if find_child(element, "union").is_some() {
        SimpleDerivation::Union
    } else {
        return Err(unsupported(format!(
            "simpleType {} without restriction, list or union",
            name.as_deref().unwrap_or("<anonymous>")
        )));
    };

    Ok(SimpleType {
        name,
        annotation: read_child_annotation(element)?,
        derivation,
    })
}
