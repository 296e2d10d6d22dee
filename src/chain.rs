//! Transformer chains over compiled input records.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::{RequestContext, TransformContext};
use crate::error::TransformError;
use crate::types::{json_type_name, FieldDescriptor, InputRecordDescriptor, Transformer, TransformerBinding};

/// Compiled input records keyed by name. Read-only once built.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct CompiledSchema {
    records: IndexMap<String, InputRecordDescriptor>,
}

impl CompiledSchema {
    pub(crate) fn new(records: IndexMap<String, InputRecordDescriptor>) -> Self {
        Self { records }
    }

    pub fn get(&self, name: &str) -> Option<&InputRecordDescriptor> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &InputRecordDescriptor> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Run the compiled transform of `record` over `value`.
    ///
    /// Each field present in the value is reduced through its transformers in
    /// declaration order, then the whole record through its record-level
    /// transformers. The first failure aborts the transform. Names that are
    /// not compiled records pass the value through unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first `TransformError` raised by any transformer, unchanged.
    pub fn transform(
        &self,
        record: &str,
        value: Value,
        request: &RequestContext<'_>,
    ) -> Result<Value, TransformError> {
        match self.records.get(record) {
            Some(descriptor) => self.run_record(descriptor, value, *request),
            None => Ok(value),
        }
    }

    fn run_record(
        &self,
        record: &InputRecordDescriptor,
        value: Value,
        request: RequestContext<'_>,
    ) -> Result<Value, TransformError> {
        let input = match value {
            Value::Object(map) => map,
            other => {
                return Err(TransformError::UnexpectedType {
                    target: record.name.clone(),
                    expected: "object",
                    actual: json_type_name(&other),
                })
            }
        };

        let mut output = Map::with_capacity(input.len());
        for (key, raw) in input {
            let value = match record.fields.get(&key) {
                Some(field) => self.run_field(record, field, raw, request)?,
                None => raw,
            };
            output.insert(key, value);
        }

        let ctx = TransformContext {
            record: &record.name,
            field: None,
            request,
        };
        record
            .record_transformers
            .iter()
            .try_fold(Value::Object(output), |value, binding| {
                self.apply(binding, value, &ctx)
            })
    }

    fn run_field(
        &self,
        record: &InputRecordDescriptor,
        field: &FieldDescriptor,
        raw: Value,
        request: RequestContext<'_>,
    ) -> Result<Value, TransformError> {
        if raw.is_null() && field.ty.is_nullable {
            return Ok(raw);
        }

        let ctx = TransformContext {
            record: &record.name,
            field: Some(field),
            request,
        };
        field
            .transformers
            .iter()
            .try_fold(raw, |value, binding| self.apply(binding, value, &ctx))
    }

    fn apply(
        &self,
        binding: &TransformerBinding,
        value: Value,
        ctx: &TransformContext<'_>,
    ) -> Result<Value, TransformError> {
        tracing::trace!(path = %ctx.target(), binding = %binding.name, "applying transformer");
        match &binding.transformer {
            Transformer::Annotation { function } => function(value, &binding.args, ctx),
            Transformer::Nested { record } => self.descend(record, value, ctx),
        }
    }

    /// Resolve a nested link by name and run the target record's transform.
    fn descend(
        &self,
        name: &str,
        value: Value,
        ctx: &TransformContext<'_>,
    ) -> Result<Value, TransformError> {
        let Some(target) = self.records.get(name) else {
            return Ok(value);
        };

        match value {
            Value::Null => Ok(Value::Null),
            Value::Array(items) if ctx.is_list() => items
                .into_iter()
                .map(|item| match item {
                    Value::Null => Ok(Value::Null),
                    item => self.run_record(target, item, ctx.request),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => self.run_record(target, other, ctx.request),
        }
    }
}
