//! Wire serialization: turning a [`RoutingSlip`] into a JSON document a
//! message bus can carry, and back, resolving activity type names through an
//! [`ActivityRegistry`].
//!
//! A plain `serde_json::Value` cannot hold an [`ArgValue::Slip`] or
//! `SlipList` directly (they are not `Serialize`), so this module walks the
//! argument/result maps explicitly rather than deriving `Serialize` on
//! [`WorkItem`](routingslip_core::WorkItem)/[`WorkLog`](routingslip_core::WorkLog)
//! themselves. The reserved composite keys (`branches`, `alternatives`,
//! `_branches`, `_succeeded`) are recognized at any nesting depth within a
//! map and decoded as embedded sub-slips; every other key round-trips as
//! plain JSON.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use routingslip_core::{
    ActivityRegistry, ArgValue, RoutingSlip, WorkItem, WorkItemArguments, WorkLog, WorkResult,
};

use crate::error::{Error, Result};

const RESERVED_SLIP_LIST_KEYS: &[&str] = &["branches", "alternatives", "_branches"];
const RESERVED_SLIP_KEYS: &[&str] = &["_succeeded"];

/// Encode `slip` as its wire JSON representation, resolving every activity
/// type it references to a stable name via `registry`.
///
/// # Errors
/// [`Error::UnregisteredActivityType`] if a referenced activity type was
/// never registered under a name and exposes no `NamedActivity` fallback.
pub fn to_serializable(slip: &RoutingSlip, registry: &ActivityRegistry) -> Result<Value> {
    let next_work_items = slip
        .pending()
        .map(|item| work_item_to_json(item, registry))
        .collect::<Result<Vec<_>>>()?;
    let completed_work_logs = slip
        .completed()
        .map(|log| work_log_to_json(log, registry))
        .collect::<Result<Vec<_>>>()?;

    Ok(json!({
        "operationId": slip.operation_id().to_string(),
        "nextWorkItems": next_work_items,
        "completedWorkLogs": completed_work_logs,
    }))
}

/// Decode a slip previously produced by [`to_serializable`], resolving every
/// referenced activity type name back to its factory via `registry`.
///
/// # Errors
/// [`Error::MalformedComposite`] if `value` is not shaped like a slip, or a
/// reserved key's value is not the shape it should be (e.g. `branches` not
/// an array of slip objects); [`Error::UnknownActivityType`] if it
/// references a name `registry` does not have.
pub fn from_serializable(value: &Value, registry: &ActivityRegistry) -> Result<RoutingSlip> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::MalformedComposite("slip is not a JSON object".into()))?;

    let operation_id = object
        .get("operationId")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedComposite("missing `operationId`".into()))?;
    let operation_id = uuid::Uuid::parse_str(operation_id)
        .map_err(|e| Error::MalformedComposite(format!("invalid `operationId`: {e}")))?;

    let pending = object
        .get("nextWorkItems")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::MalformedComposite("missing `nextWorkItems`".into()))?
        .iter()
        .map(|v| work_item_from_json(v, registry))
        .collect::<Result<_>>()?;

    let completed = object
        .get("completedWorkLogs")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::MalformedComposite("missing `completedWorkLogs`".into()))?
        .iter()
        .map(|v| work_log_from_json(v, registry))
        .collect::<Result<_>>()?;

    Ok(RoutingSlip::from_parts(operation_id, pending, completed))
}

fn work_item_to_json(item: &WorkItem, registry: &ActivityRegistry) -> Result<Value> {
    let activity_type_name = registry.get_name(item.activity_type())?;
    Ok(json!({
        "activityTypeName": activity_type_name,
        "arguments": arg_map_to_json(item.arguments(), registry)?,
    }))
}

/// Decode a work item, re-deriving its queue address from the resolved
/// activity type rather than reading it off the wire — only the activity
/// type name and arguments survive serialization.
fn work_item_from_json(value: &Value, registry: &ActivityRegistry) -> Result<WorkItem> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::MalformedComposite("work item is not a JSON object".into()))?;
    let activity_type_name = object
        .get("activityTypeName")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedComposite("work item missing `activityTypeName`".into()))?;
    let arguments = object
        .get("arguments")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::MalformedComposite("work item missing `arguments`".into()))?;

    let activity_type = registry.resolve(activity_type_name)?;
    let arguments = WorkItemArguments::from(arg_map_from_json(arguments, registry)?);
    Ok(WorkItem::new(activity_type, arguments))
}

fn work_log_to_json(log: &WorkLog, registry: &ActivityRegistry) -> Result<Value> {
    let activity_type_name = registry.get_name(log.activity_type())?;
    Ok(json!({
        "activityTypeName": activity_type_name,
        "result": arg_map_to_json(log.result(), registry)?,
    }))
}

/// Decode a work log, re-deriving its compensation queue address from the
/// resolved activity type rather than reading it off the wire.
fn work_log_from_json(value: &Value, registry: &ActivityRegistry) -> Result<WorkLog> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::MalformedComposite("work log is not a JSON object".into()))?;
    let activity_type_name = object
        .get("activityTypeName")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedComposite("work log missing `activityTypeName`".into()))?;
    let result = object
        .get("result")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::MalformedComposite("work log missing `result`".into()))?;

    let activity_type = registry.resolve(activity_type_name)?;
    let result = WorkResult::from(arg_map_from_json(result, registry)?);
    Ok(WorkLog::new(activity_type, result))
}

fn arg_map_to_json(map: &BTreeMap<String, ArgValue>, registry: &ActivityRegistry) -> Result<Value> {
    let mut object = Map::with_capacity(map.len());
    for (key, value) in map {
        object.insert(key.clone(), arg_value_to_json(value, registry)?);
    }
    Ok(Value::Object(object))
}

fn arg_value_to_json(value: &ArgValue, registry: &ActivityRegistry) -> Result<Value> {
    match value {
        ArgValue::Scalar(v) => Ok(v.clone()),
        ArgValue::Seq(items) => items
            .iter()
            .map(|v| arg_value_to_json(v, registry))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        ArgValue::Map(map) => arg_map_to_json(map, registry),
        ArgValue::Slip(slip) => to_serializable(slip, registry),
        ArgValue::SlipList(slips) => slips
            .iter()
            .map(|slip| to_serializable(slip, registry))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
    }
}

fn arg_map_from_json(
    object: &Map<String, Value>,
    registry: &ActivityRegistry,
) -> Result<BTreeMap<String, ArgValue>> {
    let mut map = BTreeMap::new();
    for (key, value) in object {
        let decoded = if RESERVED_SLIP_LIST_KEYS.contains(&key.as_str()) {
            let items = value.as_array().ok_or_else(|| {
                Error::MalformedComposite(format!("`{key}` must be an array of slips"))
            })?;
            let slips = items
                .iter()
                .map(|v| from_serializable(v, registry))
                .collect::<Result<Vec<_>>>()?;
            ArgValue::SlipList(slips)
        } else if RESERVED_SLIP_KEYS.contains(&key.as_str()) {
            ArgValue::Slip(from_serializable(value, registry)?)
        } else {
            generic_json_to_arg_value(value)
        };
        map.insert(key.clone(), decoded);
    }
    Ok(map)
}

fn generic_json_to_arg_value(value: &Value) -> ArgValue {
    match value {
        Value::Object(map) => ArgValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), generic_json_to_arg_value(v)))
                .collect(),
        ),
        Value::Array(items) => {
            ArgValue::Seq(items.iter().map(generic_json_to_arg_value).collect())
        }
        other => ArgValue::Scalar(other.clone()),
    }
}
