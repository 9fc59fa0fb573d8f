//! Dictionary assembly and loading.
//!
//! This module contains:
//! - The assembler turning a [`RawDictionary`] into a [`DictionaryStructure`]
//! - [`LoaderSettings`] controlling aggregation and the namespace
//! - The [`DictionaryLoader`] for reading dictionaries from files or strings

use std::{fmt, fs, path::Path, str::FromStr};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    Error, ValidationError,
    builder::{StructureBuilder, message_key},
    collector::collect_attributes,
    json,
    raw::{RawDictionary, RawIndex},
    structure::{DictionaryStructure, Fields},
    xml, xsd,
};

#[cfg(test)]
mod tests;

/// Settings shared by every loader.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct LoaderSettings {
    /// Merge attributes, values, defaults and inherited message fields
    /// along reference chains
    pub aggregate: bool,

    /// Namespace of the resolved structures, the dictionary name when unset
    pub namespace: Option<String>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        LoaderSettings {
            aggregate: true,
            namespace: None,
        }
    }
}

/// Dictionary file format.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Format {
    Xml,
    Json,
    Yaml,
    /// XML Schema
    Xsd,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Xml, Format::Json, Format::Yaml, Format::Xsd];

    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Format, Error> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(|extension| extension.to_ascii_lowercase().parse().ok())
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Xsd => "xsd",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(Format::Xml),
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "xsd" => Ok(Format::Xsd),
            _ => Err(Error::UnknownFormat(s.to_owned())),
        }
    }
}

/// Loader reading dictionaries and resolving them into structures.
///
/// Every call works on fresh builder state, so one loader may be reused
/// for any number of dictionaries.
#[derive(Clone, Debug, Default)]
pub struct DictionaryLoader {
    settings: LoaderSettings,
}

impl DictionaryLoader {
    /// Creates a loader with default settings (aggregation enabled).
    pub fn new() -> DictionaryLoader {
        DictionaryLoader::default()
    }

    /// Sets whether references aggregate attributes, values and fields
    pub fn with_aggregation(mut self, aggregate: bool) -> Self {
        self.settings.aggregate = aggregate;
        self
    }

    /// Overrides the namespace of the resolved structures
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.settings.namespace = Some(namespace.into());
        self
    }

    pub fn with_settings(mut self, settings: LoaderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Loads a dictionary file, the format is picked by its extension.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DictionaryStructure, Error> {
        let path = path.as_ref();
        self.load_format(path, Format::from_path(path)?)
    }

    /// Loads a dictionary file of the given format.
    pub fn load_format(
        &self,
        path: impl AsRef<Path>,
        format: Format,
    ) -> Result<DictionaryStructure, Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), %format, "loading dictionary");
        let text = fs::read_to_string(path)?;
        self.load_str(&text, format)
    }

    pub fn load_xml(&self, path: impl AsRef<Path>) -> Result<DictionaryStructure, Error> {
        self.load_format(path, Format::Xml)
    }

    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<DictionaryStructure, Error> {
        self.load_format(path, Format::Json)
    }

    pub fn load_yaml(&self, path: impl AsRef<Path>) -> Result<DictionaryStructure, Error> {
        self.load_format(path, Format::Yaml)
    }

    pub fn load_xsd(&self, path: impl AsRef<Path>) -> Result<DictionaryStructure, Error> {
        self.load_format(path, Format::Xsd)
    }

    /// Loads a dictionary held in memory.
    pub fn load_str(&self, text: &str, format: Format) -> Result<DictionaryStructure, Error> {
        match format {
            Format::Xml => self.convert(&xml::read_dictionary(text)?),
            Format::Json => self.convert(&json::read_json_dictionary(text)?),
            Format::Yaml => self.convert(&json::read_yaml_dictionary(text)?),
            Format::Xsd => xsd::convert(&xsd::read_schema(text)?, &self.settings),
        }
    }

    pub fn load_xml_str(&self, text: &str) -> Result<DictionaryStructure, Error> {
        self.load_str(text, Format::Xml)
    }

    pub fn load_json_str(&self, text: &str) -> Result<DictionaryStructure, Error> {
        self.load_str(text, Format::Json)
    }

    pub fn load_yaml_str(&self, text: &str) -> Result<DictionaryStructure, Error> {
        self.load_str(text, Format::Yaml)
    }

    pub fn load_xsd_str(&self, text: &str) -> Result<DictionaryStructure, Error> {
        self.load_str(text, Format::Xsd)
    }

    /// Resolves an already loaded raw dictionary.
    pub fn convert(&self, raw: &RawDictionary) -> Result<DictionaryStructure, Error> {
        DictionaryStructure::from_raw(raw, &self.settings)
    }
}

impl DictionaryStructure {
    /// Resolves every field and message of `raw`.
    ///
    /// Dictionary level fields are resolved first and never embed messages.
    /// Messages are then converted in declaration order; a message already
    /// built because an earlier one referenced it is skipped.
    pub(crate) fn from_raw(
        raw: &RawDictionary,
        settings: &LoaderSettings,
    ) -> Result<DictionaryStructure, Error> {
        let namespace = settings.namespace.as_deref().unwrap_or(&raw.name);
        if namespace.is_empty() {
            return Err(Error::Validation(ValidationError::MissingName("dictionary".into())));
        }

        let index = RawIndex::new(raw)?;
        let keys = raw
            .messages
            .iter()
            .map(|message| message_key(message, None))
            .collect::<Result<Vec<_>, _>>()?;
        let mut builder = StructureBuilder::new(&index, namespace, settings.aggregate)
            .with_top_level(keys.iter().cloned());

        let mut fields = Fields::with_capacity(raw.fields.len());
        for raw_field in &raw.fields {
            let field = builder.dictionary_field(raw_field)?;
            if fields.contains_key(&field.name) {
                return Err(Error::Validation(ValidationError::DuplicatedField(field.name)));
            }
            fields.insert(field.name.clone(), field);
        }

        resolve_messages(&mut builder, raw, &keys)?;

        let attributes = collect_attributes(namespace, &raw.attributes)?;
        let messages = builder.finish()?;
        info!(
            namespace,
            fields = fields.len(),
            messages = messages.len(),
            "dictionary resolved"
        );

        Ok(DictionaryStructure {
            namespace: namespace.to_owned(),
            description: raw.description.clone(),
            attributes,
            fields,
            messages,
        })
    }
}

fn resolve_messages<'a>(
    builder: &mut StructureBuilder<'_, 'a>,
    raw: &'a RawDictionary,
    keys: &[String],
) -> Result<(), Error> {
    let total = raw.messages.len();
    let mut position = 0;

    // Building one message may pull in others, so count what is resolved
    while builder.resolved_top_level() < total {
        let (Some(message), Some(key)) = (raw.messages.get(position), keys.get(position)) else {
            return Err(duplicated_messages(builder, raw, keys));
        };
        position += 1;
        if builder.is_built(key) {
            continue;
        }
        builder.convert_message(message, key.clone())?;
        builder.finish_pass()?;
    }

    if builder.duplicates().is_empty() {
        Ok(())
    } else {
        Err(duplicated_messages(builder, raw, keys))
    }
}

/// Lists every message name declared more than once with the keys declaring it.
fn duplicated_messages(
    builder: &StructureBuilder<'_, '_>,
    raw: &RawDictionary,
    keys: &[String],
) -> Error {
    let mut occurrences: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for (message, key) in raw.messages.iter().zip(keys) {
        occurrences
            .entry(message.display_name())
            .or_default()
            .push(key);
    }
    for duplicate in builder.duplicates() {
        let declared = occurrences.entry(&duplicate.name).or_default();
        if let Some(owner) = builder.owner_of(&duplicate.name) {
            if !declared.contains(&owner) {
                declared.push(owner);
            }
        }
        if !declared.contains(&duplicate.key.as_str()) {
            declared.push(&duplicate.key);
        }
    }

    Error::Validation(ValidationError::DuplicatedMessages(
        occurrences
            .into_iter()
            .filter(|(_, declared)| declared.len() > 1)
            .map(|(name, declared)| format!("{name} ({})", declared.join(", ")))
            .collect(),
    ))
}
