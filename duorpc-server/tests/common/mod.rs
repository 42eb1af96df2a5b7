//! Shared test fixtures: an in-memory method registry

#![allow(dead_code)]

use duorpc_core::{
    ApplicationError, ArgType, ArgumentSpec, BoundArguments, Error, MethodDescriptor, Result,
};
use duorpc_server::{async_trait, CallContext, MethodRegistry, RpcServer};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

type MethodFn = Arc<dyn Fn(BoundArguments) -> Result<Value> + Send + Sync>;

struct Entry {
    descriptor: MethodDescriptor,
    endpoint: Option<String>,
    body: MethodFn,
}

/// Registry backed by a map of closures
#[derive(Default)]
pub struct StaticRegistry {
    methods: HashMap<String, Entry>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method visible on every endpoint
    pub fn method<F>(self, descriptor: MethodDescriptor, body: F) -> Self
    where
        F: Fn(BoundArguments) -> Result<Value> + Send + Sync + 'static,
    {
        self.insert(descriptor, None, body)
    }

    /// Register a method visible on one endpoint only
    pub fn method_on<F>(self, endpoint: &str, descriptor: MethodDescriptor, body: F) -> Self
    where
        F: Fn(BoundArguments) -> Result<Value> + Send + Sync + 'static,
    {
        self.insert(descriptor, Some(endpoint.to_string()), body)
    }

    fn insert<F>(mut self, descriptor: MethodDescriptor, endpoint: Option<String>, body: F) -> Self
    where
        F: Fn(BoundArguments) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(
            descriptor.name.clone(),
            Entry {
                descriptor,
                endpoint,
                body: Arc::new(body),
            },
        );
        self
    }
}

#[async_trait]
impl MethodRegistry for StaticRegistry {
    fn lookup(&self, name: &str, context: &CallContext) -> Option<MethodDescriptor> {
        let entry = self.methods.get(name)?;
        match &entry.endpoint {
            Some(endpoint) if endpoint != context.endpoint() => None,
            _ => Some(entry.descriptor.clone()),
        }
    }

    async fn execute(&self, method: &MethodDescriptor, args: BoundArguments) -> Result<Value> {
        let entry = self
            .methods
            .get(&method.name)
            .ok_or_else(|| Error::ProcedureNotFound(method.name.clone()))?;
        (entry.body)(args)
    }
}

/// Registry with the methods used across the integration tests
pub fn registry() -> StaticRegistry {
    StaticRegistry::new()
        .method(MethodDescriptor::new("system.ping"), |_| Ok(json!("pong")))
        .method(
            MethodDescriptor::new("echo").arg(ArgumentSpec::required("value", ArgType::Any)),
            |args| Ok(args.get(0).cloned().unwrap_or_default()),
        )
        .method(
            MethodDescriptor::new("math.add")
                .arg(ArgumentSpec::required("a", ArgType::Int))
                .arg(ArgumentSpec::required("b", ArgType::Int)),
            |args| Ok(json!(args.parse::<i64>(0)? + args.parse::<i64>(1)?)),
        )
        .method(
            MethodDescriptor::new("num.raw").arg(ArgumentSpec::required("n", ArgType::Float)),
            |args| Ok(args.get(0).cloned().unwrap_or_default()),
        )
        .method(
            MethodDescriptor::new("greet")
                .arg(ArgumentSpec::optional("mode", ArgType::String, Some(json!("fallback")))),
            |args| Ok(args.get(0).cloned().unwrap_or_default()),
        )
        .method(
            MethodDescriptor::new("pair")
                .arg(ArgumentSpec::required("first", ArgType::String))
                .arg(ArgumentSpec::required("name", ArgType::String)),
            |args| Ok(json!([args.get(0), args.get(1)])),
        )
        .method(
            MethodDescriptor::new("user.save").arg(ArgumentSpec::required("user", ArgType::Struct)),
            |args| Ok(args.get(0).cloned().unwrap_or_default()),
        )
        .method(
            MethodDescriptor::new("list.sum").arg(ArgumentSpec::required("items", ArgType::Array)),
            |args| {
                let items: Vec<f64> = args.parse(0)?;
                Ok(json!(items.iter().sum::<f64>()))
            },
        )
        .method(MethodDescriptor::new("fail.app"), |_| {
            Err(ApplicationError::new("Quota exceeded")
                .with_code(1001)
                .with_data(json!({"quota": 10}))
                .into())
        })
        .method(MethodDescriptor::new("fail.plain"), |_| {
            Err(ApplicationError::new("Something went wrong").into())
        })
        .method(MethodDescriptor::new("fail.panic"), |_| panic!("method exploded"))
        .method_on("admin", MethodDescriptor::new("only.admin"), |_| Ok(json!("secret")))
}

pub fn server() -> RpcServer {
    RpcServer::builder()
        .registry(Arc::new(registry()))
        .build()
        .expect("server builds")
}

/// Handle a request value and parse the reply body
pub async fn reply_json(server: &RpcServer, request: Value) -> Value {
    let reply = server.handle_value(&request).await.expect("reply");
    serde_json::from_str(reply.body().expect("reply has a body")).expect("valid JSON")
}
