//! Recursive conversion of raw fields and messages into resolved structures.
//!
//! Messages are stored in an arena keyed by message name. A field embedding
//! a message stores that name, so a message referenced while its own build
//! is still running can be handed out as a [`MessagePromise`]: the name is
//! valid immediately and the arena slot is filled once the build completes.
//! After every pass all promises must be fulfilled.

use std::collections::{HashMap, HashSet};

use dictforge_core::cast_value;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    CoercionError, Error, ReferenceError, ValidationError,
    collector::Collector,
    raw::{RawField, RawIndex},
    resolver::TypeResolver,
    structure::{FieldKind, FieldStructure, Fields, MessageStructure},
};


/// Placeholder for a message whose build is still in progress.
#[derive(Debug)]
pub(crate) struct MessagePromise {
    key: String,
    name: String,
    fulfilled: bool,
}

/// A message that could not be registered because its name was taken.
#[derive(Debug)]
pub(crate) struct Duplicate {
    pub(crate) name: String,
    pub(crate) key: String,
}

pub(crate) struct StructureBuilder<'i, 'a> {
    index: &'i RawIndex<'a>,
    namespace: &'i str,
    aggregate: bool,
    /// Keys of messages under construction
    pending: HashSet<String>,
    /// Outstanding promises by message key
    promises: HashMap<String, MessagePromise>,
    /// Message key to the arena name it was registered under
    built: HashMap<String, String>,
    /// Arena name to the key of the message stored there
    owners: HashMap<String, String>,
    messages: IndexMap<String, MessageStructure>,
    duplicates: Vec<Duplicate>,
    top_level: HashSet<String>,
    resolved_top_level: usize,
    depth: usize,
}

impl<'i, 'a> StructureBuilder<'i, 'a> {
    pub(crate) fn new(
        index: &'i RawIndex<'a>,
        namespace: &'i str,
        aggregate: bool,
    ) -> StructureBuilder<'i, 'a> {
        StructureBuilder {
            index,
            namespace,
            aggregate,
            pending: HashSet::new(),
            promises: HashMap::new(),
            built: HashMap::new(),
            owners: HashMap::new(),
            messages: IndexMap::new(),
            duplicates: Vec::new(),
            top_level: HashSet::new(),
            resolved_top_level: 0,
            depth: 0,
        }
    }

    /// Registers dictionary level message keys, counted by [`Self::resolved_top_level`].
    pub(crate) fn with_top_level(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.top_level = keys.into_iter().collect();
        self
    }

    /// Number of dictionary level messages stored in the arena.
    pub(crate) fn resolved_top_level(&self) -> usize {
        self.resolved_top_level
    }

    pub(crate) fn is_built(&self, key: &str) -> bool {
        self.built.contains_key(key)
    }

    pub(crate) fn owner_of(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(String::as_str)
    }

    pub(crate) fn duplicates(&self) -> &[Duplicate] {
        &self.duplicates
    }

    fn collector(&self) -> Collector<'i, 'a> {
        Collector::new(self.index, self.aggregate)
    }

    fn resolver(&self) -> TypeResolver<'i, 'a> {
        TypeResolver::new(self.index)
    }

    /// Converts a dictionary level field; message-valued ones are rejected.
    pub(crate) fn dictionary_field(&self, raw: &'a RawField) -> Result<FieldStructure, Error> {
        let name = raw
            .name
            .clone()
            .ok_or_else(|| Error::Validation(ValidationError::MissingName("fields".into())))?;
        if raw.is_message() {
            return Err(Error::Validation(ValidationError::MessageInFields(name)));
        }
        if raw.scalar_type.is_none() && raw.reference.is_none() {
            return Err(Error::Validation(ValidationError::MissingTypeAndReference(name)));
        }
        let target = self.index.reference_of(raw)?;
        if target.is_some_and(RawField::is_message) {
            return Err(Error::Validation(ValidationError::MessageInFields(name)));
        }

        self.simple_field(raw, name, target, true)
    }

    /// Converts a message, returning the arena name it is reachable under.
    ///
    /// A message whose build is already running is not built again; a
    /// promise for it is issued instead.
    pub(crate) fn convert_message(&mut self, raw: &'a RawField, key: String) -> Result<String, Error> {
        if let Some(name) = self.built.get(&key) {
            return Ok(name.clone());
        }
        if self.pending.contains(&key) {
            return self.promise(raw, key);
        }

        // Ancestors first, walked without recursion
        let ancestors = self
            .reference_chain(raw, &key)
            .map_err(|err| Error::in_message(raw.display_name(), err))?;
        for (ancestor, ancestor_key) in ancestors.into_iter().rev() {
            if !self.built.contains_key(&ancestor_key) && !self.pending.contains(&ancestor_key) {
                self.build_message(ancestor, ancestor_key)?;
            }
        }

        // An ancestor may have pulled this message in already
        if let Some(name) = self.built.get(&key) {
            return Ok(name.clone());
        }
        self.build_message(raw, key)
    }

    /// Closes a pass: every promise must have been fulfilled.
    pub(crate) fn finish_pass(&mut self) -> Result<(), Error> {
        let mut unfilled: Vec<String> = self
            .promises
            .values()
            .filter(|promise| !promise.fulfilled)
            .map(|promise| format!("{} ({})", promise.name, promise.key))
            .collect();
        self.pending.clear();
        self.promises.clear();

        if unfilled.is_empty() {
            Ok(())
        } else {
            unfilled.sort();
            Err(Error::Reference(ReferenceError::UnfilledForwardReference(unfilled)))
        }
    }

    /// Consumes the builder, returning the arena with inheritance applied.
    pub(crate) fn finish(self) -> Result<IndexMap<String, MessageStructure>, Error> {
        let mut messages = self.messages;
        if self.aggregate {
            inherit_fields(&mut messages)?;
        }
        Ok(messages)
    }

    fn promise(&mut self, raw: &'a RawField, key: String) -> Result<String, Error> {
        if let Some(parent) = self.index.message_reference_of(raw)? {
            if self.index.message_reference_of(parent)?.is_some() {
                return Err(Error::Reference(ReferenceError::RecursiveMessage(key)));
            }
        }

        let name = message_name(raw)?;
        trace!(name = %name, key = %key, "issuing promise");
        self.promises
            .entry(key.clone())
            .or_insert_with(|| MessagePromise {
                key,
                name: name.clone(),
                fulfilled: false,
            });
        Ok(name)
    }

    /// Message references of `raw`, nearest first, up to the first one already
    /// built or under construction.
    fn reference_chain(
        &self,
        raw: &'a RawField,
        key: &str,
    ) -> Result<Vec<(&'a RawField, String)>, Error> {
        let mut chain = Vec::new();
        let mut visited = HashSet::from([key.to_owned()]);
        let mut current = raw;

        while let Some(next) = self.index.message_reference_of(current)? {
            let next_key = message_key(next, None)?;
            if !visited.insert(next_key.clone()) {
                return Err(Error::Reference(ReferenceError::RecursiveMessage(next_key)));
            }
            let known = self.built.contains_key(&next_key) || self.pending.contains(&next_key);
            chain.push((next, next_key));
            if known {
                break;
            }
            current = next;
        }

        Ok(chain)
    }

    fn build_message(&mut self, raw: &'a RawField, key: String) -> Result<String, Error> {
        let name = message_name(raw)?;
        debug!(depth = self.depth, name = %name, "building message");

        self.pending.insert(key.clone());
        self.depth += 1;
        let result = self
            .message_structure(raw, &key, &name)
            .map_err(|err| Error::in_message(&name, err));
        self.depth -= 1;
        self.pending.remove(&key);

        let message = result?;
        Ok(self.register(key, message))
    }

    fn message_structure(
        &mut self,
        raw: &'a RawField,
        key: &str,
        name: &str,
    ) -> Result<MessageStructure, Error> {
        let reference_name = match self.index.message_reference_of(raw)? {
            Some(parent) => {
                let parent_key = message_key(parent, None)?;
                Some(self.convert_message(parent, parent_key)?)
            }
            None => None,
        };
        let fields = self.build_fields(raw, key, name)?;
        let attributes = self.collector().attributes(raw)?.unwrap_or_default();

        Ok(MessageStructure {
            name: name.to_owned(),
            namespace: self.namespace.to_owned(),
            description: raw.description.clone(),
            reference_name,
            attributes,
            fields,
        })
    }

    fn register(&mut self, key: String, message: MessageStructure) -> String {
        let name = message.name.clone();
        let taken = self.owners.get(&name).is_some_and(|owner| *owner != key);
        if taken {
            debug!(name = %name, key = %key, "message name already taken");
            self.duplicates.push(Duplicate {
                name: name.clone(),
                key: key.clone(),
            });
        } else {
            debug!(name = %name, fields = message.fields.len(), "message resolved");
            if self.top_level.contains(&key) && !self.built.contains_key(&key) {
                self.resolved_top_level += 1;
            }
            self.owners.insert(name.clone(), key.clone());
            self.messages.insert(name.clone(), message);
        }

        if let Some(promise) = self.promises.get_mut(&key) {
            promise.fulfilled = true;
        }
        self.built.insert(key, name.clone());
        name
    }

    fn build_fields(&mut self, raw: &'a RawField, key: &str, name: &str) -> Result<Fields, Error> {
        let children = raw.fields();
        let mut fields = Fields::with_capacity(children.len());
        for child in children {
            let field = self.build_field(child, key, name)?;
            if fields.contains_key(&field.name) {
                return Err(Error::Validation(ValidationError::DuplicatedMessageField {
                    message: name.to_owned(),
                    field: field.name,
                }));
            }
            fields.insert(field.name.clone(), field);
        }
        Ok(fields)
    }

    fn build_field(
        &mut self,
        child: &'a RawField,
        parent_key: &str,
        parent_name: &str,
    ) -> Result<FieldStructure, Error> {
        let name = child.name.clone().ok_or_else(|| {
            Error::Validation(ValidationError::MissingName(format!("message {parent_name}")))
        })?;

        if child.is_message() {
            let key = message_key(child, Some(parent_key))?;
            let message = self.convert_message(child, key)?;
            return self.message_field(child, name, message, None);
        }

        match self.index.reference_of(child)? {
            Some(target) if target.is_message() => {
                let message = self.convert_message(target, message_key(target, None)?)?;
                self.message_field(child, name, message, Some(target))
            }
            target => {
                if child.scalar_type.is_none() && target.is_none() {
                    return Err(Error::Validation(ValidationError::MissingTypeAndReference(name)));
                }
                let search = self.aggregate || child.scalar_type.is_none();
                self.simple_field(child, name, target, search)
            }
        }
    }

    fn message_field(
        &self,
        child: &'a RawField,
        name: String,
        message: String,
        target: Option<&'a RawField>,
    ) -> Result<FieldStructure, Error> {
        let description = child
            .description
            .clone()
            .or_else(|| target.and_then(|target| target.description.clone()));

        Ok(FieldStructure {
            name,
            namespace: self.namespace.to_owned(),
            description,
            reference_name: target.and_then(|target| target.name.clone()),
            attributes: self.collector().attributes(child)?.unwrap_or_default(),
            values: Default::default(),
            scalar_type: None,
            required: child.required,
            collection: child.collection,
            service_name: child.service_name,
            default_value: None,
            kind: FieldKind::Message { message },
        })
    }

    fn simple_field(
        &self,
        raw: &'a RawField,
        name: String,
        target: Option<&'a RawField>,
        search: bool,
    ) -> Result<FieldStructure, Error> {
        let resolver = self.resolver();
        let scalar_type = resolver
            .resolve_type(raw, search)?
            .ok_or_else(|| Error::Validation(ValidationError::UnresolvedType(name.clone())))?;

        let collector = self.collector();
        let values = collector.values(raw, Some(scalar_type))?.unwrap_or_default();
        let attributes = collector.attributes(raw)?.unwrap_or_default();

        let default_value = match resolver.resolve_default(raw, self.aggregate)? {
            Some(literal) => cast_value(literal, scalar_type).map_err(|source| {
                Error::Coercion(CoercionError {
                    owner: name.clone(),
                    kind: "default value",
                    name: name.clone(),
                    source,
                })
            })?,
            None => None,
        };

        let description = match (&raw.description, target) {
            (Some(description), _) => Some(description.clone()),
            (None, Some(target)) if self.aggregate => target.description.clone(),
            _ => None,
        };

        Ok(FieldStructure {
            name,
            namespace: self.namespace.to_owned(),
            description,
            reference_name: target.and_then(|target| target.name.clone()),
            attributes,
            values,
            scalar_type: Some(scalar_type),
            required: raw.required,
            collection: raw.collection,
            service_name: raw.service_name,
            default_value,
            kind: FieldKind::Simple,
        })
    }
}

fn message_name(raw: &RawField) -> Result<String, Error> {
    raw.name.clone().ok_or_else(|| {
        Error::Validation(ValidationError::MissingName(format!(
            "message {}",
            raw.display_name()
        )))
    })
}

/// Key identifying a message declaration for the duration of a build.
///
/// The id when declared, the name otherwise (scoped by the enclosing
/// message for inline declarations).
pub(crate) fn message_key(raw: &RawField, scope: Option<&str>) -> Result<String, Error> {
    if let Some(id) = &raw.id {
        return Ok(id.clone());
    }
    let name = message_name(raw)?;
    Ok(match scope {
        Some(scope) => format!("{scope}/{name}"),
        None => name,
    })
}

/// Overlays every referencing message's own fields on its parent's fields.
///
/// Parent fields come first in the parent's order; an own field replaces a
/// same-named parent field and moves to the position of the own declaration.
pub(crate) fn inherit_fields(
    messages: &mut IndexMap<String, MessageStructure>,
) -> Result<(), Error> {
    let mut resolved: HashMap<String, Fields> = HashMap::with_capacity(messages.len());
    let names: Vec<String> = messages.keys().cloned().collect();

    for name in names {
        if resolved.contains_key(&name) {
            continue;
        }

        let mut chain = vec![name.clone()];
        let mut visited = HashSet::from([name.clone()]);
        let mut current = name.clone();
        while let Some(parent) = messages
            .get(&current)
            .and_then(|message| message.reference_name.clone())
        {
            if !messages.contains_key(&parent) || resolved.contains_key(&parent) {
                break;
            }
            if !visited.insert(parent.clone()) {
                return Err(Error::Reference(ReferenceError::RecursiveMessage(parent)));
            }
            chain.push(parent.clone());
            current = parent;
        }

        for link in chain.into_iter().rev() {
            let Some(message) = messages.get(&link) else {
                continue;
            };
            let mut fields = message
                .reference_name
                .as_ref()
                .and_then(|parent| resolved.get(parent))
                .cloned()
                .unwrap_or_default();
            for (field_name, field) in &message.fields {
                fields.shift_remove(field_name);
                fields.insert(field_name.clone(), field.clone());
            }
            resolved.insert(link, fields);
        }
    }

    for (name, message) in messages.iter_mut() {
        if let Some(fields) = resolved.remove(name) {
            message.fields = fields;
        }
    }

    Ok(())
}
