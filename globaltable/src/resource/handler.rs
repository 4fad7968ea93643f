use std::future::Future;

use serde_json::Value;
use tracing::{error, info};

use crate::bail;
use crate::context::ReconcileContext;
use crate::error::{ErrorKind, ReconcileResult};
use crate::reconcile_error;
use crate::reconciler::{GlobalTableReconciler, SimpleGlobalTableReconciler};
use crate::resource::event::{LifecycleEvent, RequestType, ResourceResponse};
use crate::resource::properties::{
    global_table_name, normalize_global_table_properties, normalize_simple_global_table_properties,
};
use crate::store::TableStore;
use crate::types::ReconcileOutcome;

/// Serves the lifecycle events of one resource type.
///
/// Every operation defaults to a no-op that reports the event's physical id, or its logical id
/// if the resource was never created.
pub trait ResourceHandler {
    fn handle_create(
        &self,
        event: &LifecycleEvent,
    ) -> impl Future<Output = ReconcileResult<ReconcileOutcome>> + Send {
        let outcome = ReconcileOutcome::new(event.fallback_physical_resource_id());
        async move { Ok(outcome) }
    }

    fn handle_update(
        &self,
        event: &LifecycleEvent,
    ) -> impl Future<Output = ReconcileResult<ReconcileOutcome>> + Send {
        let outcome = ReconcileOutcome::new(event.fallback_physical_resource_id());
        async move { Ok(outcome) }
    }

    fn handle_delete(
        &self,
        event: &LifecycleEvent,
    ) -> impl Future<Output = ReconcileResult<ReconcileOutcome>> + Send {
        let outcome = ReconcileOutcome::new(event.fallback_physical_resource_id());
        async move { Ok(outcome) }
    }
}

impl<S> ResourceHandler for GlobalTableReconciler<S>
where
    S: TableStore + Send + Sync,
{
    async fn handle_create(&self, event: &LifecycleEvent) -> ReconcileResult<ReconcileOutcome> {
        let desired = normalize_global_table_properties(&event.resource_properties, true)?;
        self.create(&desired).await
    }

    async fn handle_update(&self, event: &LifecycleEvent) -> ReconcileResult<ReconcileOutcome> {
        let desired = normalize_global_table_properties(&event.resource_properties, true)?;
        let Some(old_properties) = &event.old_resource_properties else {
            bail!(
                ErrorKind::InvalidProperties,
                "Update events must carry the previous properties"
            );
        };
        let previous = normalize_global_table_properties(old_properties, false)?;

        self.update(&desired, &previous).await
    }

    async fn handle_delete(&self, event: &LifecycleEvent) -> ReconcileResult<ReconcileOutcome> {
        let desired = normalize_global_table_properties(&event.resource_properties, false)?;
        self.delete(&desired).await
    }
}

impl<S> ResourceHandler for SimpleGlobalTableReconciler<S>
where
    S: TableStore + Send + Sync,
{
    async fn handle_create(&self, event: &LifecycleEvent) -> ReconcileResult<ReconcileOutcome> {
        let desired = normalize_simple_global_table_properties(&event.resource_properties)?;
        self.create(&desired).await
    }

    async fn handle_update(&self, event: &LifecycleEvent) -> ReconcileResult<ReconcileOutcome> {
        let desired = normalize_simple_global_table_properties(&event.resource_properties)?;
        self.update(&desired).await
    }

    async fn handle_delete(&self, event: &LifecycleEvent) -> ReconcileResult<ReconcileOutcome> {
        let table_name = global_table_name(&event.resource_properties)?;
        Ok(self.delete(&table_name))
    }
}

/// Resource types served by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    GlobalTable,
    SimpleGlobalTable,
}

impl ResourceKind {
    /// Resolves the kind from the event's type tag.
    ///
    /// A `DynamoDBGlobalTable` with a truthy `IsSimpleType` property is served as a simple
    /// global table.
    pub fn from_event(event: &LifecycleEvent) -> ReconcileResult<Self> {
        match event.resource_type_name() {
            "DynamoDBGlobalTable" => {
                let is_simple = event
                    .resource_properties
                    .get("IsSimpleType")
                    .is_some_and(is_truthy);

                if is_simple {
                    Ok(ResourceKind::SimpleGlobalTable)
                } else {
                    Ok(ResourceKind::GlobalTable)
                }
            }
            "SimpleDynamoDBGlobalTable" => Ok(ResourceKind::SimpleGlobalTable),
            other => Err(reconcile_error!(
                ErrorKind::UnsupportedResourceType,
                "Unsupported resource type",
                other
            )),
        }
    }
}

/// Template values are loosely typed; this follows the usual truthiness rules.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Routes lifecycle events to the handler of their resource type.
#[derive(Debug, Clone)]
pub struct ResourceDispatcher<S> {
    global: GlobalTableReconciler<S>,
    simple: SimpleGlobalTableReconciler<S>,
}

impl<S> ResourceDispatcher<S>
where
    S: TableStore + Clone + Send + Sync,
{
    pub fn new(ctx: ReconcileContext<S>) -> Self {
        Self {
            simple: SimpleGlobalTableReconciler::new(ctx.clone()),
            global: GlobalTableReconciler::new(ctx),
        }
    }

    /// Runs the event through its handler.
    pub async fn dispatch(&self, event: &LifecycleEvent) -> ReconcileResult<ReconcileOutcome> {
        let kind = ResourceKind::from_event(event)?;

        info!(
            logical_resource_id = %event.logical_resource_id,
            physical_resource_id = ?event.physical_resource_id,
            request_type = ?event.request_type,
            ?kind,
            "handling lifecycle event"
        );

        match kind {
            ResourceKind::GlobalTable => run_handler(&self.global, event).await,
            ResourceKind::SimpleGlobalTable => run_handler(&self.simple, event).await,
        }
    }

    /// Runs the event and turns the result into the response sent back to the orchestrator.
    pub async fn handle_event(&self, event: &LifecycleEvent) -> ResourceResponse {
        match self.dispatch(event).await {
            Ok(outcome) => ResourceResponse::success(event, outcome),
            Err(err) => {
                error!(
                    logical_resource_id = %event.logical_resource_id,
                    error = %err,
                    "lifecycle event failed"
                );
                ResourceResponse::failure(event, &err)
            }
        }
    }
}

async fn run_handler<H>(handler: &H, event: &LifecycleEvent) -> ReconcileResult<ReconcileOutcome>
where
    H: ResourceHandler,
{
    match event.request_type {
        RequestType::Create => handler.handle_create(event).await,
        RequestType::Update => handler.handle_update(event).await,
        RequestType::Delete => handler.handle_delete(event).await,
    }
}
