//! Annotation and class registries.
//!
//! Both are built once before compilation and only read afterwards, so the
//! compiled schema can share them across concurrent requests.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::TransformContext;
use crate::error::TransformError;
use crate::types::DirectiveArgs;
use crate::validators;

/// A transformer: takes the current value, the annotation's arguments and the
/// invocation context, and returns the next value or rejects it.
pub type TransformFn = Arc<
    dyn Fn(Value, &DirectiveArgs, &TransformContext<'_>) -> Result<Value, TransformError>
        + Send
        + Sync,
>;

/// Builds a class instance from a validated value.
pub type ClassConstructor = Arc<dyn Fn(Value) -> Result<Instance, TransformError> + Send + Sync>;

/// Which declaration an annotation is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationTarget {
    Field,
    Record,
}

/// Transformers keyed by annotation name, one namespace per target.
#[derive(Clone)]
pub struct AnnotationRegistry {
    field: IndexMap<String, TransformFn>,
    record: IndexMap<String, TransformFn>,
    builtin: HashSet<String>,
}

impl AnnotationRegistry {
    /// Registry preloaded with the built-in field validators.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (name, function) in validators::builtins() {
            registry.field.insert(name.to_string(), function);
            registry.builtin.insert(name.to_string());
        }
        registry
    }

    /// Registry with no annotations at all.
    pub fn empty() -> Self {
        Self {
            field: IndexMap::new(),
            record: IndexMap::new(),
            builtin: HashSet::new(),
        }
    }

    /// Register a field-level transformer, replacing any built-in of the same name.
    pub fn field<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(Value, &DirectiveArgs, &TransformContext<'_>) -> Result<Value, TransformError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        self.builtin.remove(&name);
        self.field.insert(name, Arc::new(function));
        self
    }

    /// Register a record-level transformer.
    pub fn record<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(Value, &DirectiveArgs, &TransformContext<'_>) -> Result<Value, TransformError>
            + Send
            + Sync
            + 'static,
    {
        self.record.insert(name.into(), Arc::new(function));
        self
    }

    pub fn get(&self, target: AnnotationTarget, name: &str) -> Option<&TransformFn> {
        match target {
            AnnotationTarget::Field => self.field.get(name),
            AnnotationTarget::Record => self.record.get(name),
        }
    }

    /// Whether a field annotation still resolves to the built-in validator.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtin.contains(name)
    }

    pub fn names(&self, target: AnnotationTarget) -> impl Iterator<Item = &str> {
        let map = match target {
            AnnotationTarget::Field => &self.field,
            AnnotationTarget::Record => &self.record,
        };
        map.keys().map(String::as_str)
    }
}

impl Default for AnnotationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnnotationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationRegistry")
            .field("field", &self.field.keys().collect::<Vec<_>>())
            .field("record", &self.record.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A materialized class value.
#[derive(Clone)]
pub struct Instance {
    class: String,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(class: impl Into<String>, value: T) -> Self {
        Self {
            class: class.into(),
            inner: Arc::new(value),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("class", &self.class).finish()
    }
}

/// Class constructors keyed by class tag.
#[derive(Clone, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassConstructor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class whose instances are deserialized from the validated value.
    pub fn register<T>(self, name: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        let name = name.into();
        let class = name.clone();
        self.register_with(name, move |value| {
            serde_json::from_value::<T>(value)
                .map(|instance| Instance::new(class.clone(), instance))
                .map_err(|e| TransformError::Construct {
                    class: class.clone(),
                    message: e.to_string(),
                })
        })
    }

    /// Register a class with a custom constructor.
    pub fn register_with<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Value) -> Result<Instance, TransformError> + Send + Sync + 'static,
    {
        self.classes.insert(name.into(), Arc::new(constructor));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClassConstructor> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.classes.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn builtins_live_in_field_namespace() {
        let registry = AnnotationRegistry::new();
        assert!(registry.get(AnnotationTarget::Field, "IsIn").is_some());
        assert!(registry.get(AnnotationTarget::Record, "IsIn").is_none());
        assert!(registry.is_builtin("IsIn"));
    }

    #[test]
    fn user_transformers_override_builtins() {
        let registry =
            AnnotationRegistry::new().field("IsIn", |_value, _args, _ctx| Ok(json!("overridden")));
        let function = registry.get(AnnotationTarget::Field, "IsIn").unwrap();
        let ctx = TransformContext {
            record: "Input",
            field: None,
            request: crate::context::RequestContext::detached(),
        };
        let out = function(json!("x"), &DirectiveArgs::new(), &ctx).unwrap();
        assert_eq!(out, json!("overridden"));
        assert!(!registry.is_builtin("IsIn"));
    }

    #[test]
    fn empty_registry_has_no_builtins() {
        let registry = AnnotationRegistry::empty();
        assert_eq!(registry.names(AnnotationTarget::Field).count(), 0);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
    }

    #[test]
    fn register_deserializes_instances() {
        let classes = ClassRegistry::new().register::<User>("User");
        let constructor = classes.get("User").unwrap();
        let instance = constructor(json!({ "name": "ada" })).unwrap();

        assert_eq!(instance.class(), "User");
        assert_eq!(
            instance.downcast_ref::<User>(),
            Some(&User { name: "ada".into() })
        );
    }

    #[test]
    fn register_reports_construction_errors() {
        let classes = ClassRegistry::new().register::<User>("User");
        let constructor = classes.get("User").unwrap();
        let err = constructor(json!({ "nickname": "ada" })).unwrap_err();
        assert!(matches!(err, TransformError::Construct { ref class, .. } if class == "User"));
    }
}
