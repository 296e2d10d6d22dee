//! Per-request context threaded into every transformer call.

use std::any::Any;

use serde_json::{Map, Value};

use crate::types::FieldDescriptor;

/// Type-erased execution data supplied by the executor (the "context" of a request).
pub type Data = dyn Any + Send + Sync;

/// Where in the schema a resolver is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveInfo<'a> {
    pub parent_type: &'a str,
    pub field_name: &'a str,
}

/// Execution data and resolve info for one resolver call.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub data: Option<&'a Data>,
    pub info: ResolveInfo<'a>,
}

impl<'a> Context<'a> {
    pub fn new(info: ResolveInfo<'a>) -> Self {
        Self { data: None, info }
    }

    pub fn with_data(mut self, data: &'a Data) -> Self {
        self.data = Some(data);
        self
    }

    /// Downcast the execution data.
    pub fn data<T: Any>(&self) -> Option<&'a T> {
        self.data.and_then(|data| data.downcast_ref::<T>())
    }
}

/// Everything a transformer can see about the request it runs in.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    pub context: Context<'a>,
    /// Raw arguments of the field being resolved, before preprocessing.
    pub arguments: Option<&'a Map<String, Value>>,
}

impl<'a> RequestContext<'a> {
    pub fn new(context: Context<'a>, arguments: &'a Map<String, Value>) -> Self {
        Self {
            context,
            arguments: Some(arguments),
        }
    }

    /// A context outside of any resolver call, for running a record transform directly.
    pub fn detached() -> RequestContext<'static> {
        RequestContext {
            context: Context::new(ResolveInfo {
                parent_type: "",
                field_name: "",
            }),
            arguments: None,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&'a Value> {
        self.arguments.and_then(|args| args.get(name))
    }
}

/// Context passed to a single transformer invocation.
#[derive(Clone, Copy)]
pub struct TransformContext<'a> {
    /// Input record being transformed.
    pub record: &'a str,
    /// Field being transformed; `None` for record-level transformers.
    pub field: Option<&'a FieldDescriptor>,
    pub request: RequestContext<'a>,
}

impl<'a> TransformContext<'a> {
    /// True if the declared field type is a list.
    pub fn is_list(&self) -> bool {
        self.field.map(|field| field.ty.is_list).unwrap_or(false)
    }

    pub fn data<T: Any>(&self) -> Option<&'a T> {
        self.request.context.data()
    }

    /// Human-readable location used in error messages.
    pub fn target(&self) -> String {
        match self.field {
            Some(field) => format!("{}.{}", self.record, field.name),
            None => self.record.to_string(),
        }
    }
}
