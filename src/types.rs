//! Core types for input directive compilation.

use std::fmt;

use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::registry::TransformFn;

/// Scalars provided by GraphQL itself.
pub const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

/// Record-level annotation that materializes validated values through a registered class.
pub const CLASS_ANNOTATION: &str = "class";

/// Argument of [`CLASS_ANNOTATION`] naming the class.
pub const CLASS_ARGUMENT: &str = "name";

/// Binding name used for links into another input record.
pub const NESTED_BINDING: &str = "nested";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Shape of a declared field or argument type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMeta {
    /// Innermost named type, with list and non-null wrappers removed.
    pub base: String,
    /// The outermost wrapper is a list.
    pub is_list: bool,
    /// The outermost position accepts null.
    pub is_nullable: bool,
    /// The base type is not a built-in scalar. Whether it actually names an
    /// input record is only known once the whole document has been walked.
    pub is_user_defined: bool,
}

impl TypeMeta {
    pub fn from_type(ty: &Type) -> Self {
        let is_list = matches!(ty.base, BaseType::List(_));
        let mut current = ty;
        let base = loop {
            match &current.base {
                BaseType::Named(name) => break name.to_string(),
                BaseType::List(inner) => current = inner,
            }
        };

        Self {
            is_user_defined: !BUILTIN_SCALARS.contains(&base.as_str()),
            base,
            is_list,
            is_nullable: ty.nullable,
        }
    }
}

/// A literal annotation argument.
///
/// Integers, floats, strings and booleans are converted; anything else
/// (lists, objects, enums, null) is kept as the raw node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DirectiveArg {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Raw(ConstValue),
}

impl DirectiveArg {
    pub fn kind(&self) -> &'static str {
        match self {
            DirectiveArg::Int(_) => "int",
            DirectiveArg::Float(_) => "float",
            DirectiveArg::String(_) => "string",
            DirectiveArg::Boolean(_) => "boolean",
            DirectiveArg::Raw(_) => "raw",
        }
    }

    /// Converts the argument to a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            DirectiveArg::Int(i) => Value::from(*i),
            DirectiveArg::Float(f) => Value::from(*f),
            DirectiveArg::String(s) => Value::String(s.clone()),
            DirectiveArg::Boolean(b) => Value::Bool(*b),
            DirectiveArg::Raw(raw) => raw.clone().into_json().unwrap_or(Value::Null),
        }
    }
}

/// Arguments of one annotation, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DirectiveArgs(IndexMap<String, DirectiveArg>);

impl DirectiveArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, arg: DirectiveArg) {
        self.0.insert(name.into(), arg);
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveArg> {
        self.0.get(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            DirectiveArg::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integer arguments are accepted wherever a float is expected.
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            DirectiveArg::Float(f) => Some(*f),
            DirectiveArg::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            DirectiveArg::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            DirectiveArg::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn raw(&self, name: &str) -> Option<&ConstValue> {
        match self.get(name)? {
            DirectiveArg::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    pub fn json(&self, name: &str) -> Option<Value> {
        self.get(name).map(DirectiveArg::to_json)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectiveArg)> {
        self.0.iter().map(|(name, arg)| (name.as_str(), arg))
    }
}

/// What a binding does when invoked.
#[derive(Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Transformer {
    /// A function from the annotation registry.
    Annotation {
        #[serde(skip)]
        function: TransformFn,
    },
    /// Descend into another input record, looked up by name when invoked.
    Nested { record: String },
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformer::Annotation { .. } => f.write_str("Annotation(..)"),
            Transformer::Nested { record } => f.debug_tuple("Nested").field(record).finish(),
        }
    }
}

/// One step of a transformer chain.
#[derive(Debug, Clone, Serialize)]
pub struct TransformerBinding {
    pub name: String,
    #[serde(flatten)]
    pub transformer: Transformer,
    #[serde(skip_serializing_if = "DirectiveArgs::is_empty")]
    pub args: DirectiveArgs,
}

impl TransformerBinding {
    pub fn annotation(name: impl Into<String>, function: TransformFn, args: DirectiveArgs) -> Self {
        Self {
            name: name.into(),
            transformer: Transformer::Annotation { function },
            args,
        }
    }

    pub fn nested(record: impl Into<String>) -> Self {
        Self {
            name: NESTED_BINDING.to_string(),
            transformer: Transformer::Nested {
                record: record.into(),
            },
            args: DirectiveArgs::new(),
        }
    }
}

/// A field of an input record and its ordered transformers.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeMeta,
    pub transformers: Vec<TransformerBinding>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeMeta) -> Self {
        Self {
            name: name.into(),
            ty,
            transformers: Vec::new(),
        }
    }
}

/// Compiled form of one input record definition.
#[derive(Debug, Clone, Serialize)]
pub struct InputRecordDescriptor {
    pub name: String,
    pub fields: IndexMap<String, FieldDescriptor>,
    #[serde(rename = "recordTransformers")]
    pub record_transformers: Vec<TransformerBinding>,
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_tag: Option<String>,
}

impl InputRecordDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            record_transformers: Vec::new(),
            class_tag: None,
        }
    }

    /// True if nothing would run for this record.
    pub fn is_passthrough(&self) -> bool {
        self.record_transformers.is_empty()
            && self.fields.values().all(|field| field.transformers.is_empty())
    }
}

/// Options for compiling a document.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// When true, unknown annotations on input records and their fields are
    /// build-time errors instead of warnings.
    pub strict: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
