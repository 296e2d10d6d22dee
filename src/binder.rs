//! Argument preprocessing and resolver binding.
//!
//! Every argument of every object type field gets an [`ArgumentPreprocessor`]
//! built ahead of time. Wrapped resolvers run each incoming argument through
//! its preprocessor before calling the user resolver.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_graphql_parser::types::{
    InputValueDefinition, ServiceDocument, TypeKind, TypeSystemDefinition,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::chain::CompiledSchema;
use crate::context::{Context, Data, RequestContext, ResolveInfo};
use crate::error::{BoxError, CompileError, ExecutionError, TransformError};
use crate::loader::load_schema_str;
use crate::printer::print_document;
use crate::registry::{AnnotationRegistry, ClassConstructor, ClassRegistry, Instance};
use crate::types::{CompileOptions, TypeMeta};
use crate::walker::{compile, Compilation, CompileWarning};

/// A user resolver: `(root, preprocessed arguments, context) -> value`.
pub type Resolver =
    Arc<dyn Fn(&Value, Arguments, &Context<'_>) -> Result<Value, BoxError> + Send + Sync>;

/// User resolvers keyed by object type, then field.
#[derive(Clone, Default)]
pub struct Resolvers {
    types: IndexMap<String, IndexMap<String, Resolver>>,
}

impl Resolvers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field<F>(mut self, type_name: impl Into<String>, field: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&Value, Arguments, &Context<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.insert(type_name, field, Arc::new(resolver));
        self
    }

    pub fn insert(&mut self, type_name: impl Into<String>, field: impl Into<String>, resolver: Resolver) {
        self.types
            .entry(type_name.into())
            .or_default()
            .insert(field.into(), resolver);
    }

    pub fn get(&self, type_name: &str, field: &str) -> Option<&Resolver> {
        self.types.get(type_name)?.get(field)
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (type_name, fields) in &self.types {
            map.entry(type_name, &fields.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

/// A preprocessed argument value.
#[derive(Debug, Clone)]
pub enum Argument {
    /// Plain structured data.
    Value(Value),
    /// A value materialized through a registered class.
    Instance(Instance),
    /// A list whose elements were materialized individually.
    List(Vec<Argument>),
}

impl Argument {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Argument::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_instance()?.downcast_ref::<T>()
    }

    pub fn as_list(&self) -> Option<&[Argument]> {
        match self {
            Argument::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Argument::Value(Value::Null))
    }
}

/// Preprocessed arguments handed to a resolver, in request order.
#[derive(Debug, Clone, Default)]
pub struct Arguments(IndexMap<String, Argument>);

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.0.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name)?.as_value()
    }

    pub fn instance<T: Any>(&self, name: &str) -> Option<&T> {
        self.get(name)?.downcast_ref::<T>()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.0.iter().map(|(name, arg)| (name.as_str(), arg))
    }

    pub fn into_inner(self) -> IndexMap<String, Argument> {
        self.0
    }
}

/// Preprocessor for one `(object type, field, argument)`.
#[derive(Clone)]
pub struct ArgumentPreprocessor {
    name: String,
    ty: TypeMeta,
    /// Compiled input record for the argument's base type, if any.
    record: Option<String>,
    class: Option<ClassConstructor>,
}

impl ArgumentPreprocessor {
    fn new(definition: &InputValueDefinition, inputs: &CompiledSchema, classes: &ClassRegistry) -> Self {
        let ty = TypeMeta::from_type(&definition.ty.node);
        let record = inputs.get(&ty.base);
        let class = record
            .and_then(|record| record.class_tag.as_deref())
            .and_then(|tag| classes.get(tag))
            .cloned();

        Self {
            name: definition.name.node.to_string(),
            record: record.map(|record| record.name.clone()),
            ty,
            class,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeMeta {
        &self.ty
    }

    /// True if the argument has no record chain and is passed through as-is.
    pub fn is_identity(&self) -> bool {
        self.record.is_none()
    }

    /// Preprocess one raw argument value.
    ///
    /// Null on a nullable argument short-circuits before anything else, and
    /// null on a non-null argument is rejected. List arguments map the record
    /// chain over each element; a single value given for a list argument is
    /// treated as a one-element list.
    pub fn process(
        &self,
        inputs: &CompiledSchema,
        value: Value,
        request: &RequestContext<'_>,
    ) -> Result<Argument, TransformError> {
        let Some(record) = self.record.as_deref() else {
            return Ok(Argument::Value(value));
        };

        if value.is_null() {
            if self.ty.is_nullable {
                return Ok(Argument::Value(value));
            }
            return Err(TransformError::UnexpectedType {
                target: self.name.clone(),
                expected: "non-null value",
                actual: "null",
            });
        }

        if !self.ty.is_list {
            return self.process_item(inputs, record, value, request);
        }

        let items = match value {
            Value::Array(items) => items,
            single => vec![single],
        };
        let processed = items
            .into_iter()
            .map(|item| self.process_item(inputs, record, item, request))
            .collect::<Result<Vec<_>, _>>()?;

        if self.class.is_some() {
            return Ok(Argument::List(processed));
        }
        Ok(Argument::Value(Value::Array(
            processed
                .into_iter()
                .filter_map(|item| match item {
                    Argument::Value(value) => Some(value),
                    _ => None,
                })
                .collect(),
        )))
    }

    fn process_item(
        &self,
        inputs: &CompiledSchema,
        record: &str,
        item: Value,
        request: &RequestContext<'_>,
    ) -> Result<Argument, TransformError> {
        if item.is_null() {
            return Ok(Argument::Value(item));
        }

        let value = inputs.transform(record, item, request)?;
        match &self.class {
            Some(construct) => construct(value).map(Argument::Instance),
            None => Ok(Argument::Value(value)),
        }
    }
}

impl fmt::Debug for ArgumentPreprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentPreprocessor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("record", &self.record)
            .field("class", &self.class.is_some())
            .finish()
    }
}

/// A user resolver with its argument preprocessors.
pub struct WrappedResolver {
    type_name: String,
    field_name: String,
    preprocessors: IndexMap<String, ArgumentPreprocessor>,
    inputs: Arc<CompiledSchema>,
    inner: Resolver,
}

impl WrappedResolver {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn preprocessor(&self, argument: &str) -> Option<&ArgumentPreprocessor> {
        self.preprocessors.get(argument)
    }

    /// Preprocess `args` and call the user resolver.
    ///
    /// # Errors
    ///
    /// Returns the first transformer failure unchanged, `UnhandledArgument`
    /// for an argument the field does not declare, or the resolver's own error.
    pub fn call(
        &self,
        root: &Value,
        args: &Map<String, Value>,
        data: Option<&Data>,
    ) -> Result<Value, ExecutionError> {
        let context = Context {
            data,
            info: ResolveInfo {
                parent_type: &self.type_name,
                field_name: &self.field_name,
            },
        };
        let request = RequestContext::new(context, args);

        let mut processed = IndexMap::with_capacity(args.len());
        for (name, value) in args {
            let Some(preprocessor) = self.preprocessors.get(name) else {
                return Err(ExecutionError::UnhandledArgument {
                    type_name: self.type_name.clone(),
                    field: self.field_name.clone(),
                    argument: name.clone(),
                });
            };
            let argument = preprocessor.process(&self.inputs, value.clone(), &request)?;
            processed.insert(name.clone(), argument);
        }

        (self.inner)(root, Arguments(processed), &context).map_err(ExecutionError::Resolver)
    }
}

impl fmt::Debug for WrappedResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedResolver")
            .field("type_name", &self.type_name)
            .field("field_name", &self.field_name)
            .field("preprocessors", &self.preprocessors)
            .finish()
    }
}

/// Registries and options for building an executable schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    pub annotations: AnnotationRegistry,
    pub classes: ClassRegistry,
    pub resolvers: Resolvers,
    pub compile: CompileOptions,
}

impl SchemaOptions {
    /// Options with the built-in annotations and empty class and resolver tables.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annotations(mut self, annotations: AnnotationRegistry) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn classes(mut self, classes: ClassRegistry) -> Self {
        self.classes = classes;
        self
    }

    pub fn resolvers(mut self, resolvers: Resolvers) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.compile.strict = strict;
        self
    }
}

/// Stripped document plus wrapped resolvers, ready for an executor.
#[derive(Debug)]
pub struct ExecutableSchema {
    document: ServiceDocument,
    inputs: Arc<CompiledSchema>,
    resolvers: IndexMap<String, IndexMap<String, WrappedResolver>>,
    warnings: Vec<CompileWarning>,
}

impl ExecutableSchema {
    /// The document with consumed annotations removed.
    pub fn document(&self) -> &ServiceDocument {
        &self.document
    }

    pub fn inputs(&self) -> &CompiledSchema {
        &self.inputs
    }

    pub fn warnings(&self) -> &[CompileWarning] {
        &self.warnings
    }

    pub fn resolver(&self, type_name: &str, field: &str) -> Option<&WrappedResolver> {
        self.resolvers.get(type_name)?.get(field)
    }

    pub fn resolvers(&self) -> impl Iterator<Item = &WrappedResolver> {
        self.resolvers.values().flat_map(|fields| fields.values())
    }

    /// The stripped document rendered as SDL.
    pub fn sdl(&self) -> String {
        print_document(&self.document)
    }

    /// Resolve one field through its wrapped resolver.
    pub fn execute_field(
        &self,
        type_name: &str,
        field: &str,
        root: &Value,
        args: &Map<String, Value>,
        data: Option<&Data>,
    ) -> Result<Value, ExecutionError> {
        let resolver = self
            .resolver(type_name, field)
            .ok_or_else(|| ExecutionError::UnknownField {
                type_name: type_name.to_string(),
                field: field.to_string(),
            })?;
        resolver.call(root, args, data)
    }
}

/// Parse, compile and bind a schema.
///
/// # Errors
///
/// Returns `CompileError` if the text does not parse, an annotation is
/// malformed, a record names an unregistered class, or an object type field
/// with arguments has no resolver.
pub fn make_executable_schema(
    type_defs: &str,
    options: SchemaOptions,
) -> Result<ExecutableSchema, CompileError> {
    let document = load_schema_str(type_defs)?;
    build_executable_schema(document, options)
}

/// Compile and bind an already parsed document.
pub fn build_executable_schema(
    document: ServiceDocument,
    options: SchemaOptions,
) -> Result<ExecutableSchema, CompileError> {
    let Compilation {
        document,
        inputs,
        warnings,
    } = compile(document, &options.annotations, &options.compile)?;

    for record in inputs.records() {
        if let Some(class) = &record.class_tag {
            if !options.classes.contains(class) {
                return Err(CompileError::UnregisteredClass {
                    record: record.name.clone(),
                    class: class.clone(),
                });
            }
        }
    }

    let inputs = Arc::new(inputs);
    let resolvers = bind_resolvers(&document, &inputs, &options)?;

    Ok(ExecutableSchema {
        document,
        inputs,
        resolvers,
        warnings,
    })
}

fn bind_resolvers(
    document: &ServiceDocument,
    inputs: &Arc<CompiledSchema>,
    options: &SchemaOptions,
) -> Result<IndexMap<String, IndexMap<String, WrappedResolver>>, CompileError> {
    let mut bound: IndexMap<String, IndexMap<String, WrappedResolver>> = IndexMap::new();

    for definition in &document.definitions {
        let TypeSystemDefinition::Type(ty) = definition else {
            continue;
        };
        let TypeKind::Object(object) = &ty.node.kind else {
            continue;
        };
        let type_name = ty.node.name.node.as_str();

        for field in &object.fields {
            let field = &field.node;
            let field_name = field.name.node.as_str();

            let Some(inner) = options.resolvers.get(type_name, field_name) else {
                if field.arguments.is_empty() {
                    continue;
                }
                return Err(CompileError::MissingResolver {
                    type_name: type_name.to_string(),
                    field: field_name.to_string(),
                });
            };

            let preprocessors = field
                .arguments
                .iter()
                .map(|argument| {
                    let preprocessor =
                        ArgumentPreprocessor::new(&argument.node, inputs, &options.classes);
                    (preprocessor.name.clone(), preprocessor)
                })
                .collect();

            tracing::debug!(type_name, field = field_name, arguments = field.arguments.len(), "bound resolver");
            bound.entry(type_name.to_string()).or_default().insert(
                field_name.to_string(),
                WrappedResolver {
                    type_name: type_name.to_string(),
                    field_name: field_name.to_string(),
                    preprocessors,
                    inputs: Arc::clone(inputs),
                    inner: Arc::clone(inner),
                },
            );
        }
    }

    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SDL: &str = r#"
        input Input { value: String! @IsIn(in: ["a", "b"]) }
        type Mutation {
            single(input: Input): Int
            many(input: [Input]!): Int
            required(input: Input!): Int
            plain(id: ID): Int
        }
    "#;

    fn echo(_root: &Value, args: Arguments, _ctx: &Context<'_>) -> Result<Value, BoxError> {
        Ok(args.value("input").cloned().unwrap_or(Value::Null))
    }

    fn resolvers() -> Resolvers {
        Resolvers::new()
            .field("Mutation", "single", echo)
            .field("Mutation", "many", echo)
            .field("Mutation", "required", echo)
            .field("Mutation", "plain", |_root, args, _ctx| {
                Ok(args.value("id").cloned().unwrap_or(Value::Null))
            })
    }

    fn schema() -> ExecutableSchema {
        make_executable_schema(SDL, SchemaOptions::new().resolvers(resolvers())).unwrap()
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn preprocessors_cover_every_argument() {
        let schema = schema();
        let single = schema.resolver("Mutation", "single").unwrap();
        assert!(!single.preprocessor("input").unwrap().is_identity());
        let plain = schema.resolver("Mutation", "plain").unwrap();
        assert!(plain.preprocessor("id").unwrap().is_identity());
    }

    #[test]
    fn nullable_null_skips_the_chain() {
        let out = schema()
            .execute_field("Mutation", "single", &Value::Null, &args(json!({ "input": null })), None)
            .unwrap();
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn single_value_for_list_is_wrapped() {
        let out = schema()
            .execute_field(
                "Mutation",
                "many",
                &Value::Null,
                &args(json!({ "input": { "value": "a" } })),
                None,
            )
            .unwrap();
        assert_eq!(out, json!([{ "value": "a" }]));
    }

    #[test]
    fn non_null_argument_rejects_null() {
        for field in ["required", "many"] {
            let err = schema()
                .execute_field("Mutation", field, &Value::Null, &args(json!({ "input": null })), None)
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    ExecutionError::Transform(TransformError::UnexpectedType { ref target, actual: "null", .. })
                        if target == "input"
                ),
                "{field}: {err}"
            );
        }
    }

    #[test]
    fn undeclared_argument_is_an_invariant_violation() {
        let err = schema()
            .execute_field("Mutation", "plain", &Value::Null, &args(json!({ "other": 1 })), None)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::UnhandledArgument { ref argument, .. } if argument == "other"));
    }

    #[test]
    fn resolver_errors_propagate() {
        let resolvers = Resolvers::new().field("Query", "boom", |_root, _args, _ctx| {
            Err("boom".into())
        });
        let schema =
            make_executable_schema("type Query { boom(x: Int): Int }", SchemaOptions::new().resolvers(resolvers))
                .unwrap();
        let err = schema
            .execute_field("Query", "boom", &Value::Null, &Map::new(), None)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Resolver(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn resolver_sees_info_and_data() {
        struct Tenant(&'static str);
        let resolvers = Resolvers::new().field("Query", "whoami", |_root, _args, ctx| {
            let tenant = ctx.data::<Tenant>().map(|t| t.0).unwrap_or("none");
            Ok(json!(format!("{}.{}:{}", ctx.info.parent_type, ctx.info.field_name, tenant)))
        });
        let schema =
            make_executable_schema("type Query { whoami: String }", SchemaOptions::new().resolvers(resolvers))
                .unwrap();
        let tenant = Tenant("acme");
        let out = schema
            .execute_field("Query", "whoami", &Value::Null, &Map::new(), Some(&tenant))
            .unwrap();
        assert_eq!(out, json!("Query.whoami:acme"));
    }

    #[test]
    fn unknown_field_has_no_resolver() {
        let err = schema()
            .execute_field("Mutation", "missing", &Value::Null, &Map::new(), None)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownField { .. }));
    }

    #[test]
    fn executable_schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExecutableSchema>();
    }
}
