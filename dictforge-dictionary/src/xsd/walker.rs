//! Walks a [`Schema`] and builds resolved structures.
//!
//! Named complex types are built first, then global elements. Every type is
//! built once and looked up by name afterwards. A message requested while
//! its own build is running is promised: fields name it right away and the
//! promise must be fulfilled once the walk is over.
//!
//! Messages only hold their own fields while the walk runs. Extensions and
//! elements of a named type record the type they derive from, and base
//! fields are prepended once every message is built, so declaration order
//! does not matter. Anonymous types nested in a message are stored under
//! `Parent/Element`.

use std::collections::{BTreeSet, HashMap, HashSet};

use dictforge_core::{ScalarType, cast_value};
use indexmap::IndexMap;
use tracing::{debug, info, trace, warn};

use super::schema::{
    Annotation, AttributeDecl, ComplexType, ElementDecl, Facet, FacetKind, Group, GroupKind,
    Particle, Schema, SimpleDerivation, SimpleType, TypeDef, builtin_type,
};
use crate::{
    CoercionError, Error, ReferenceError, ValidationError,
    builder::inherit_fields,
    collector::{collect_attributes, override_entry},
    structure::{
        AttributeStructure, Attributes, DictionaryStructure, FieldKind, FieldStructure, Fields,
        MessageStructure,
    },
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Message,
    Field,
}

/// Scalar side of a simple type.
#[derive(Clone, Debug)]
struct SimpleResolution {
    scalar_type: ScalarType,
    /// Named simple type the field is declared with
    type_name: Option<String>,
    values: Attributes,
    /// Facets other than enumerations, and annotation attributes
    attributes: Attributes,
    description: Option<String>,
}

impl SimpleResolution {
    fn builtin(scalar_type: ScalarType) -> SimpleResolution {
        SimpleResolution {
            scalar_type,
            type_name: None,
            values: Attributes::new(),
            attributes: Attributes::new(),
            description: None,
        }
    }
}

enum TypeRef<'s> {
    /// Named complex type, by its declared name
    Complex(&'s str),
    Simple(SimpleResolution),
}

/// Occurrence constraints inherited from enclosing model groups.
#[derive(Clone, Copy, Debug)]
struct Occurrence {
    required: bool,
    collection: bool,
}

pub(crate) struct SchemaWalker<'s> {
    schema: &'s Schema,
    namespace: String,
    states: Vec<State>,
    /// Arena keys of the messages under construction, innermost last
    scopes: Vec<String>,
    depth: usize,
    messages: IndexMap<String, MessageStructure>,
    fields: Fields,
    /// Messages under construction
    pending: HashSet<String>,
    /// Messages handed out before they were built
    promises: BTreeSet<String>,
    simple_types: HashMap<&'s str, SimpleResolution>,
}

impl<'s> SchemaWalker<'s> {
    pub(crate) fn new(schema: &'s Schema, namespace: String) -> SchemaWalker<'s> {
        SchemaWalker {
            schema,
            namespace,
            states: Vec::new(),
            scopes: Vec::new(),
            depth: 0,
            messages: IndexMap::new(),
            fields: Fields::new(),
            pending: HashSet::new(),
            promises: BTreeSet::new(),
            simple_types: HashMap::new(),
        }
    }

    pub(crate) fn walk(mut self) -> Result<DictionaryStructure, Error> {
        let schema = self.schema;
        for name in schema.complex_types.keys() {
            self.complex_message(name)?;
        }

        for element in &schema.elements {
            let name = element
                .name
                .as_deref()
                .ok_or_else(|| Error::UnsupportedSchema("global element without name".into()))?;
            if self.global_message(name, element)?.is_some() {
                continue;
            }
            let field = self.declared_field(
                name,
                element,
                Occurrence {
                    required: element.min_occurs > 0,
                    collection: element.max_occurs.is_many(),
                },
            )?;
            if self.fields.contains_key(&field.name) {
                return Err(Error::Validation(ValidationError::DuplicatedField(field.name)));
            }
            self.fields.insert(field.name.clone(), field);
        }

        let unfilled: Vec<String> = self
            .promises
            .iter()
            .filter(|name| !self.messages.contains_key(*name))
            .cloned()
            .collect();
        if !unfilled.is_empty() {
            return Err(Error::Reference(ReferenceError::UnfilledForwardReference(unfilled)));
        }
        inherit_fields(&mut self.messages)?;

        let attributes = collect_attributes(&self.namespace, &schema.annotation.attributes)?;
        info!(
            namespace = %self.namespace,
            fields = self.fields.len(),
            messages = self.messages.len(),
            "schema resolved"
        );

        Ok(DictionaryStructure {
            namespace: self.namespace,
            description: schema.annotation.documentation.clone(),
            attributes,
            fields: self.fields,
            messages: self.messages,
        })
    }

    fn enter(&mut self, state: State, name: &str) {
        trace!("{:indent$}{state:?} {name}", "", indent = self.depth * 2);
        self.states.push(state);
        self.depth += 1;
    }

    fn leave(&mut self) {
        self.states.pop();
        self.depth -= 1;
    }

    fn register(&mut self, key: String, message: MessageStructure) -> Result<String, Error> {
        if self.messages.contains_key(&key) {
            return Err(Error::Validation(ValidationError::DuplicatedMessages(vec![key])));
        }
        debug!(key = %key, fields = message.fields.len(), "message resolved");
        self.messages.insert(key.clone(), message);
        Ok(key)
    }

    /// Hands out `name` for a message that is not built yet.
    fn promise(&mut self, name: &str) -> String {
        trace!(
            "{:indent$}promise {name} ({:?})",
            "",
            self.states.last(),
            indent = self.depth * 2
        );
        self.promises.insert(name.to_owned());
        name.to_owned()
    }

    /// Resolves a qualified type name to a named complex type or a scalar.
    fn classify(&mut self, owner: &str, qualified: &'s str) -> Result<TypeRef<'s>, Error> {
        let schema = self.schema;
        let (local, builtin) = schema.split_type_name(qualified);
        if !builtin {
            if let Some((name, _)) = schema.complex_types.get_key_value(local) {
                return Ok(TypeRef::Complex(name));
            }
            if let Some(simple_type) = schema.simple_types.get(local) {
                return Ok(TypeRef::Simple(self.resolve_simple(owner, simple_type)?));
            }
        }
        match builtin_type(local) {
            Some(scalar_type) => Ok(TypeRef::Simple(SimpleResolution::builtin(scalar_type))),
            None => Err(Error::Reference(ReferenceError::UnknownType {
                owner: owner.to_owned(),
                reference: qualified.to_owned(),
            })),
        }
    }

    /// Builds (or reuses) the message of a named complex type.
    fn complex_message(&mut self, name: &'s str) -> Result<String, Error> {
        if self.messages.contains_key(name) {
            return Ok(name.to_owned());
        }
        if self.pending.contains(name) {
            return Ok(self.promise(name));
        }
        let schema = self.schema;
        let complex_type = schema
            .complex_types
            .get(name)
            .ok_or_else(|| Error::UnsupportedSchema(format!("complex type {name} not declared")))?;
        self.build_complex(name.to_owned(), name, complex_type, None)
    }

    fn build_complex(
        &mut self,
        key: String,
        name: &str,
        complex_type: &'s ComplexType,
        element: Option<&'s ElementDecl>,
    ) -> Result<String, Error> {
        self.pending.insert(key.clone());
        self.scopes.push(key.clone());
        self.enter(State::Message, &key);
        let result = self
            .complex_structure(name, complex_type, element)
            .map_err(|err| Error::in_message(name, err));
        self.leave();
        self.scopes.pop();
        self.pending.remove(&key);

        self.register(key, result?)
    }

    fn complex_structure(
        &mut self,
        name: &str,
        complex_type: &'s ComplexType,
        element: Option<&'s ElementDecl>,
    ) -> Result<MessageStructure, Error> {
        let schema = self.schema;
        let reference_name = match complex_type.base.as_deref() {
            Some(base) => {
                let (local, builtin) = schema.split_type_name(base);
                match schema.complex_types.get_key_value(local) {
                    Some((base_name, _)) if !builtin => {
                        if self.scopes.last() == Some(base_name) {
                            return Err(Error::Reference(ReferenceError::RecursiveMessage(
                                base_name.clone(),
                            )));
                        }
                        // Base fields are prepended once the walk is over
                        Some(self.complex_message(base_name)?)
                    }
                    _ => {
                        warn!(owner = name, base, "extension of a simple type ignored");
                        None
                    }
                }
            }
            None => None,
        };

        let mut fields = Fields::new();

        if let Some(group) = &complex_type.particle {
            let occurrence = Occurrence {
                required: true,
                collection: false,
            };
            self.group_fields(name, group, occurrence, &mut fields)?;
        }
        for attribute in &complex_type.attributes {
            let field = self.attribute_field(attribute)?;
            insert_field(name, &mut fields, field)?;
        }

        let element_annotation = element.map(|element| &element.annotation);
        let description = element_annotation
            .and_then(|annotation| annotation.documentation.clone())
            .or_else(|| complex_type.annotation.documentation.clone());
        let mut attributes = collect_attributes(name, &complex_type.annotation.attributes)?;
        if let Some(annotation) = element_annotation {
            annotate(name, &mut attributes, annotation)?;
        }

        Ok(MessageStructure {
            name: name.to_owned(),
            namespace: self.namespace.clone(),
            description,
            reference_name,
            attributes,
            fields,
        })
    }

    fn group_fields(
        &mut self,
        owner: &str,
        group: &'s Group,
        inherited: Occurrence,
        fields: &mut Fields,
    ) -> Result<(), Error> {
        let occurrence = Occurrence {
            required: inherited.required
                && group.min_occurs > 0
                && group.kind != GroupKind::Choice,
            collection: inherited.collection || group.max_occurs.is_many(),
        };

        for particle in &group.particles {
            match particle {
                Particle::Element(element) => {
                    let field = self.element_field(element, occurrence)?;
                    insert_field(owner, fields, field)?;
                }
                Particle::Group(nested) => {
                    self.group_fields(owner, nested, occurrence, fields)?;
                }
                Particle::Any => {
                    warn!(owner, "wildcard ignored");
                }
            }
        }
        Ok(())
    }

    fn element_field(
        &mut self,
        element: &'s ElementDecl,
        inherited: Occurrence,
    ) -> Result<FieldStructure, Error> {
        let occurrence = Occurrence {
            required: inherited.required && element.min_occurs > 0,
            collection: inherited.collection || element.max_occurs.is_many(),
        };

        if let Some(reference) = element.reference.as_deref() {
            let schema = self.schema;
            let (local, _) = schema.split_type_name(reference);
            let global = schema.element(local).ok_or_else(|| {
                Error::Reference(ReferenceError::UnknownReference {
                    owner: element.name.clone().unwrap_or_else(|| local.to_owned()),
                    reference: reference.to_owned(),
                })
            })?;
            let name = global.name.as_deref().unwrap_or(local);
            let mut field = match self.global_message(name, global)? {
                Some(message) => {
                    let target = self.messages.get(&message);
                    message_field(
                        &self.namespace,
                        name,
                        message.clone(),
                        target.and_then(|target| target.reference_name.clone()),
                        &global.annotation,
                        target.and_then(|target| target.description.clone()),
                        occurrence,
                    )?
                }
                None => self.declared_field(name, global, occurrence)?,
            };
            if let Some(description) = &element.annotation.documentation {
                field.description = Some(description.clone());
            }
            annotate(name, &mut field.attributes, &element.annotation)?;
            return Ok(field);
        }

        let name = element
            .name
            .as_deref()
            .ok_or_else(|| Error::UnsupportedSchema("element without name or ref".into()))?;
        self.declared_field(name, element, occurrence)
    }

    /// Message of a global element, `None` when the element is a scalar.
    fn global_message(
        &mut self,
        name: &str,
        element: &'s ElementDecl,
    ) -> Result<Option<String>, Error> {
        if self.messages.contains_key(name) {
            return Ok(Some(name.to_owned()));
        }
        if self.pending.contains(name) {
            return Ok(Some(self.promise(name)));
        }

        match (element.inline_type.as_deref(), element.type_name.as_deref()) {
            (Some(TypeDef::Complex(complex_type)), _) => Ok(Some(self.build_complex(
                name.to_owned(),
                name,
                complex_type,
                Some(element),
            )?)),
            (Some(TypeDef::Simple(_)), _) | (None, None) => Ok(None),
            (None, Some(type_name)) => match self.classify(name, type_name)? {
                TypeRef::Complex(type_name) if type_name == name => {
                    Ok(Some(self.complex_message(type_name)?))
                }
                // Built once the type is complete
                TypeRef::Complex(type_name) if self.pending.contains(type_name) => {
                    Ok(Some(self.promise(name)))
                }
                TypeRef::Complex(type_name) => {
                    let type_message = self.complex_message(type_name)?;
                    Ok(Some(self.element_message(name, element, &type_message)?))
                }
                TypeRef::Simple(_) => Ok(None),
            },
        }
    }

    /// Message of a global element typed by a named complex type of another name.
    ///
    /// Its fields are the type's, filled in with the other derived messages.
    fn element_message(
        &mut self,
        name: &str,
        element: &ElementDecl,
        type_message: &str,
    ) -> Result<String, Error> {
        let source = self.messages.get(type_message).ok_or_else(|| {
            Error::Reference(ReferenceError::UnfilledForwardReference(vec![
                type_message.to_owned(),
            ]))
        })?;
        let mut attributes = source.attributes.clone();
        annotate(name, &mut attributes, &element.annotation)?;

        let message = MessageStructure {
            name: name.to_owned(),
            namespace: self.namespace.clone(),
            description: element
                .annotation
                .documentation
                .clone()
                .or_else(|| source.description.clone()),
            reference_name: Some(type_message.to_owned()),
            attributes,
            fields: Fields::new(),
        };
        self.register(name.to_owned(), message)
    }

    /// Field of an element declared with a name.
    fn declared_field(
        &mut self,
        name: &str,
        element: &'s ElementDecl,
        occurrence: Occurrence,
    ) -> Result<FieldStructure, Error> {
        self.enter(State::Field, name);
        let result = self.declared_field_structure(name, element, occurrence);
        self.leave();
        result
    }

    fn declared_field_structure(
        &mut self,
        name: &str,
        element: &'s ElementDecl,
        occurrence: Occurrence,
    ) -> Result<FieldStructure, Error> {
        let resolution = match (element.inline_type.as_deref(), element.type_name.as_deref()) {
            (Some(TypeDef::Complex(complex_type)), _) => {
                let key = match self.scopes.last() {
                    Some(scope) => format!("{scope}/{name}"),
                    None => name.to_owned(),
                };
                let message = self.build_complex(key, name, complex_type, None)?;
                let description = self
                    .messages
                    .get(&message)
                    .and_then(|message| message.description.clone());
                return message_field(
                    &self.namespace,
                    name,
                    message,
                    None,
                    &element.annotation,
                    description,
                    occurrence,
                );
            }
            (Some(TypeDef::Simple(simple_type)), _) => self.resolve_simple(name, simple_type)?,
            (None, Some(type_name)) => match self.classify(name, type_name)? {
                TypeRef::Complex(type_name) => {
                    let message = self.complex_message(type_name)?;
                    let description = self
                        .messages
                        .get(&message)
                        .and_then(|message| message.description.clone());
                    return message_field(
                        &self.namespace,
                        name,
                        message,
                        Some(type_name.to_owned()),
                        &element.annotation,
                        description,
                        occurrence,
                    );
                }
                TypeRef::Simple(resolution) => resolution,
            },
            (None, None) => SimpleResolution::builtin(ScalarType::String),
        };

        scalar_field(
            &self.namespace,
            name,
            resolution,
            &element.annotation,
            element.default_value.as_deref(),
            occurrence,
        )
    }

    fn attribute_field(&mut self, attribute: &'s AttributeDecl) -> Result<FieldStructure, Error> {
        let name = attribute.name.as_str();
        self.enter(State::Field, name);
        let resolution = match (&attribute.inline_type, attribute.type_name.as_deref()) {
            (Some(simple_type), _) => self.resolve_simple(name, simple_type),
            (None, Some(type_name)) => match self.classify(name, type_name) {
                Ok(TypeRef::Simple(resolution)) => Ok(resolution),
                Ok(TypeRef::Complex(type_name)) => Err(Error::UnsupportedSchema(format!(
                    "attribute {name} of complex type {type_name}"
                ))),
                Err(err) => Err(err),
            },
            (None, None) => Ok(SimpleResolution::builtin(ScalarType::String)),
        };
        self.leave();

        scalar_field(
            &self.namespace,
            name,
            resolution?,
            &attribute.annotation,
            attribute.default_value.as_deref(),
            Occurrence {
                required: attribute.required,
                collection: false,
            },
        )
    }

    /// Resolves a simple type down to its built-in type.
    ///
    /// Values come from the nearest restriction declaring enumerations;
    /// other facets and annotation attributes are merged, nearest wins.
    fn resolve_simple(
        &mut self,
        owner: &str,
        simple_type: &'s SimpleType,
    ) -> Result<SimpleResolution, Error> {
        if let Some(resolution) = simple_type
            .name
            .as_deref()
            .and_then(|name| self.simple_types.get(name))
        {
            return Ok(resolution.clone());
        }

        let schema = self.schema;
        let owner = simple_type.name.as_deref().unwrap_or(owner);
        let mut chain = vec![simple_type];
        let mut visited: BTreeSet<&str> = simple_type.name.as_deref().into_iter().collect();
        let mut current = simple_type;
        let scalar_type = loop {
            match &current.derivation {
                SimpleDerivation::List | SimpleDerivation::Union => break ScalarType::String,
                SimpleDerivation::Restriction {
                    inline_base: Some(base),
                    ..
                } => current = base.as_ref(),
                SimpleDerivation::Restriction {
                    base: Some(base), ..
                } => {
                    let (local, builtin) = schema.split_type_name(base);
                    if let Some((name, declared)) = schema
                        .simple_types
                        .get_key_value(local)
                        .filter(|_| !builtin)
                    {
                        if !visited.insert(name.as_str()) {
                            return Err(Error::Reference(ReferenceError::RecursiveReference(
                                visited.into_iter().map(str::to_owned).collect(),
                            )));
                        }
                        current = declared;
                    } else {
                        break builtin_type(local).ok_or_else(|| {
                            Error::Reference(ReferenceError::UnknownType {
                                owner: owner.to_owned(),
                                reference: base.clone(),
                            })
                        })?;
                    }
                }
                SimpleDerivation::Restriction { .. } => {
                    return Err(Error::UnsupportedSchema(format!(
                        "restriction without base in {owner}"
                    )));
                }
            }
            chain.push(current);
        };

        let values = match chain.iter().find_map(|link| enumerations(link)) {
            Some(enumerations) => enumeration_values(owner, enumerations, scalar_type)?,
            None => Attributes::new(),
        };

        let mut attributes = Attributes::new();
        for link in chain.iter().rev() {
            annotate(owner, &mut attributes, &link.annotation)?;
            if let SimpleDerivation::Restriction { facets, .. } = &link.derivation {
                for facet in facets.iter().filter(|facet| facet.kind != FacetKind::Enumeration) {
                    override_entry(
                        &mut attributes,
                        AttributeStructure::new(
                            owner,
                            "facet",
                            facet.kind.as_str().to_owned(),
                            Some(facet.value.clone()),
                            facet.kind.literal_type(scalar_type),
                        )?,
                    );
                }
            }
        }

        let resolution = SimpleResolution {
            scalar_type,
            type_name: simple_type.name.clone(),
            values,
            attributes,
            description: chain
                .iter()
                .find_map(|link| link.annotation.documentation.clone()),
        };
        if let Some(name) = simple_type.name.as_deref() {
            self.simple_types.insert(name, resolution.clone());
        }
        Ok(resolution)
    }
}

/// Enumeration facets of a restriction, `None` when it declares none.
fn enumerations(simple_type: &SimpleType) -> Option<Vec<&Facet>> {
    let SimpleDerivation::Restriction { facets, .. } = &simple_type.derivation else {
        return None;
    };
    let enumerations: Vec<_> = facets
        .iter()
        .filter(|facet| facet.kind == FacetKind::Enumeration)
        .collect();
    (!enumerations.is_empty()).then_some(enumerations)
}

/// Values named by their documentation, the literal otherwise.
fn enumeration_values(
    owner: &str,
    enumerations: Vec<&Facet>,
    scalar_type: ScalarType,
) -> Result<Attributes, Error> {
    let mut values = Attributes::with_capacity(enumerations.len());
    for facet in enumerations {
        let name = facet
            .annotation
            .documentation
            .clone()
            .unwrap_or_else(|| facet.value.clone());
        if values.contains_key(&name) {
            return Err(Error::Validation(ValidationError::DuplicatedValue {
                owner: owner.to_owned(),
                value: name,
            }));
        }
        let value = AttributeStructure::new(
            owner,
            "value",
            name.clone(),
            Some(facet.value.clone()),
            scalar_type,
        )?;
        values.insert(name, value);
    }
    Ok(values)
}

/// Merges `xs:appinfo` attributes of an annotation, annotation entries win.
fn annotate(owner: &str, attributes: &mut Attributes, annotation: &Annotation) -> Result<(), Error> {
    for raw in &annotation.attributes {
        override_entry(
            attributes,
            AttributeStructure::from_raw(owner, "attribute", raw)?,
        );
    }
    Ok(())
}

fn insert_field(owner: &str, fields: &mut Fields, field: FieldStructure) -> Result<(), Error> {
    if fields.contains_key(&field.name) {
        return Err(Error::Validation(ValidationError::DuplicatedMessageField {
            message: owner.to_owned(),
            field: field.name,
        }));
    }
    fields.insert(field.name.clone(), field);
    Ok(())
}

fn message_field(
    namespace: &str,
    name: &str,
    message: String,
    reference_name: Option<String>,
    annotation: &Annotation,
    message_description: Option<String>,
    occurrence: Occurrence,
) -> Result<FieldStructure, Error> {
    let mut attributes = Attributes::new();
    annotate(name, &mut attributes, annotation)?;

    Ok(FieldStructure {
        name: name.to_owned(),
        namespace: namespace.to_owned(),
        description: annotation.documentation.clone().or(message_description),
        reference_name,
        attributes,
        values: Attributes::new(),
        scalar_type: None,
        required: occurrence.required,
        collection: occurrence.collection,
        service_name: false,
        default_value: None,
        kind: FieldKind::Message { message },
    })
}

fn scalar_field(
    namespace: &str,
    name: &str,
    resolution: SimpleResolution,
    annotation: &Annotation,
    default_value: Option<&str>,
    occurrence: Occurrence,
) -> Result<FieldStructure, Error> {
    let mut attributes = resolution.attributes;
    annotate(name, &mut attributes, annotation)?;

    let default_value = match default_value {
        Some(literal) => cast_value(literal, resolution.scalar_type).map_err(|source| {
            Error::Coercion(CoercionError {
                owner: name.to_owned(),
                kind: "default value",
                name: name.to_owned(),
                source,
            })
        })?,
        None => None,
    };

    Ok(FieldStructure {
        name: name.to_owned(),
        namespace: namespace.to_owned(),
        description: annotation.documentation.clone().or(resolution.description),
        reference_name: resolution.type_name,
        attributes,
        values: resolution.values,
        scalar_type: Some(resolution.scalar_type),
        required: occurrence.required,
        collection: occurrence.collection,
        service_name: false,
        default_value,
        kind: FieldKind::Simple,
    })
}
