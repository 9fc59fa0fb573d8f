//! In-memory model of the XML Schema subset dictionaries are built from.

use dictforge_core::ScalarType;
use indexmap::IndexMap;

use crate::raw::RawAttribute;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    pub target_namespace: Option<String>,
    /// Prefix bound to the XML Schema namespace, `None` when it is the default namespace
    pub xsd_prefix: Option<String>,
    pub annotation: Annotation,
    /// Global element declarations, in document order
    pub elements: Vec<ElementDecl>,
    pub complex_types: IndexMap<String, ComplexType>,
    pub simple_types: IndexMap<String, SimpleType>,
}

impl Schema {
    /// Splits a qualified type name, telling whether it names a built-in type.
    ///
    /// Unprefixed names are ambiguous when the XML Schema namespace is the
    /// default one; such names are reported as not built in so that
    /// declared types win.
    pub fn split_type_name<'n>(&self, qualified: &'n str) -> (&'n str, bool) {
        match qualified.split_once(':') {
            Some((prefix, local)) => (local, self.xsd_prefix.as_deref() == Some(prefix)),
            None => (qualified, false),
        }
    }

    pub fn element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements
            .iter()
            .find(|element| element.name.as_deref() == Some(name))
    }
}

/// `xs:annotation` content.
///
/// `xs:appinfo` may carry `<attribute name="..." type="...">value</attribute>`
/// entries which end up as attributes of the annotated structure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotation {
    pub documentation: Option<String>,
    pub attributes: Vec<RawAttribute>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

impl MaxOccurs {
    /// More than one occurrence allowed
    pub fn is_many(&self) -> bool {
        match self {
            MaxOccurs::Bounded(max) => *max > 1,
            MaxOccurs::Unbounded => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElementDecl {
    pub name: Option<String>,
    /// `ref` to a global element
    pub reference: Option<String>,
    pub type_name: Option<String>,
    pub inline_type: Option<Box<TypeDef>>,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub default_value: Option<String>,
    pub annotation: Annotation,
}

impl Default for ElementDecl {
    fn default() -> Self {
        ElementDecl {
            name: None,
            reference: None,
            type_name: None,
            inline_type: None,
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            default_value: None,
            annotation: Annotation::default(),
        }
    }
}

/// Anonymous type declared inside an element.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDef {
    Complex(ComplexType),
    Simple(SimpleType),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComplexType {
    pub name: Option<String>,
    pub annotation: Annotation,
    /// `complexContent/extension` base type
    pub base: Option<String>,
    pub particle: Option<Group>,
    pub attributes: Vec<AttributeDecl>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupKind {
    Sequence,
    Choice,
    All,
}

/// Model group of particles.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub kind: GroupKind,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub particles: Vec<Particle>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Particle {
    Element(ElementDecl),
    Group(Group),
    /// `xs:any` wildcard
    Any,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeDecl {
    pub name: String,
    pub type_name: Option<String>,
    pub inline_type: Option<SimpleType>,
    pub required: bool,
    pub default_value: Option<String>,
    pub annotation: Annotation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimpleType {
    pub name: Option<String>,
    pub annotation: Annotation,
    pub derivation: SimpleDerivation,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimpleDerivation {
    Restriction {
        base: Option<String>,
        inline_base: Option<Box<SimpleType>>,
        facets: Vec<Facet>,
    },
    /// Whitespace separated items, read as a string
    List,
    /// Read as a string
    Union,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Facet {
    pub kind: FacetKind,
    pub value: String,
    pub annotation: Annotation,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FacetKind {
    Enumeration,
    MinInclusive,
    MaxInclusive,
    MinExclusive,
    MaxExclusive,
    Length,
    MinLength,
    MaxLength,
    TotalDigits,
    FractionDigits,
    Pattern,
    WhiteSpace,
}

impl FacetKind {
    pub fn from_name(name: &str) -> Option<FacetKind> {
        Some(match name {
            "enumeration" => FacetKind::Enumeration,
            "minInclusive" => FacetKind::MinInclusive,
            "maxInclusive" => FacetKind::MaxInclusive,
            "minExclusive" => FacetKind::MinExclusive,
            "maxExclusive" => FacetKind::MaxExclusive,
            "length" => FacetKind::Length,
            "minLength" => FacetKind::MinLength,
            "maxLength" => FacetKind::MaxLength,
            "totalDigits" => FacetKind::TotalDigits,
            "fractionDigits" => FacetKind::FractionDigits,
            "pattern" => FacetKind::Pattern,
            "whiteSpace" => FacetKind::WhiteSpace,
            _ => return None,
        })
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            FacetKind::Enumeration => "enumeration",
            FacetKind::MinInclusive => "minInclusive",
            FacetKind::MaxInclusive => "maxInclusive",
            FacetKind::MinExclusive => "minExclusive",
            FacetKind::MaxExclusive => "maxExclusive",
            FacetKind::Length => "length",
            FacetKind::MinLength => "minLength",
            FacetKind::MaxLength => "maxLength",
            FacetKind::TotalDigits => "totalDigits",
            FacetKind::FractionDigits => "fractionDigits",
            FacetKind::Pattern => "pattern",
            FacetKind::WhiteSpace => "whiteSpace",
        }
    }

    /// Type a facet literal is converted to, bounds follow the restricted type.
    pub fn literal_type(&self, restricted: ScalarType) -> ScalarType {
        match self {
            FacetKind::Enumeration
            | FacetKind::MinInclusive
            | FacetKind::MaxInclusive
            | FacetKind::MinExclusive
            | FacetKind::MaxExclusive => restricted,
            FacetKind::Length
            | FacetKind::MinLength
            | FacetKind::MaxLength
            | FacetKind::TotalDigits
            | FacetKind::FractionDigits => ScalarType::Integer,
            FacetKind::Pattern | FacetKind::WhiteSpace => ScalarType::String,
        }
    }
}

/// Maps a built-in `xs:` type name (without prefix) to a scalar type.
pub fn builtin_type(name: &str) -> Option<ScalarType> {
    Some(match name {
        "boolean" => ScalarType::Boolean,
        "byte" => ScalarType::Byte,
        "short" | "unsignedByte" => ScalarType::Short,
        "int" | "unsignedShort" => ScalarType::Integer,
        "long" | "unsignedInt" | "integer" | "nonNegativeInteger" | "positiveInteger"
        | "nonPositiveInteger" | "negativeInteger" => ScalarType::Long,
        "unsignedLong" | "decimal" => ScalarType::Decimal,
        "float" => ScalarType::Float,
        "double" => ScalarType::Double,
        "dateTime" => ScalarType::DateTime,
        "date" => ScalarType::Date,
        "time" => ScalarType::Time,
        "string" | "normalizedString" | "token" | "language" | "Name" | "NCName" | "ID"
        | "IDREF" | "IDREFS" | "ENTITY" | "ENTITIES" | "NMTOKEN" | "NMTOKENS" | "QName"
        | "NOTATION" | "anyURI" | "base64Binary" | "hexBinary" | "duration" | "gYear"
        | "gYearMonth" | "gMonth" | "gMonthDay" | "gDay" | "anySimpleType" | "anyType" => {
            ScalarType::String
        }
        _ => return None,
    })
}
