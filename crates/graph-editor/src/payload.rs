//! Strongly-typed node payloads
//!
//! A node's `data` is a tagged union over the closed set of node kinds.
//! The variant *is* the node type, so a node's type and its payload can
//! never disagree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::NodeKind;

/// HTTP verb used by webhook triggers and HTTP request actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// How a merge node combines incoming paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Continue once every incoming path has arrived
    #[default]
    WaitAll,
    /// Continue with whichever path arrives first
    FirstArrived,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartData {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManualTriggerData {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleTriggerData {
    pub name: String,
    /// Cron expression; not interpreted by the editor
    pub cron: String,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhookTriggerData {
    pub name: String,
    pub path: String,
    pub method: HttpMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpRequestData {
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendEmailData {
    pub name: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunScriptData {
    pub name: String,
    pub language: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DelayData {
    pub name: String,
    pub seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SetVariableData {
    pub name: String,
    pub variable: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionData {
    pub name: String,
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoopData {
    pub name: String,
    /// Expression producing the collection to iterate
    pub items: String,
    pub max_iterations: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeData {
    pub name: String,
    pub strategy: MergeStrategy,
}

/// Payload of a node, tagged by node type
///
/// Serializes as `{"type": "<tag>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NodeData {
    Start(StartData),
    TriggerManual(ManualTriggerData),
    TriggerSchedule(ScheduleTriggerData),
    TriggerWebhook(WebhookTriggerData),
    ActionHttpRequest(HttpRequestData),
    ActionSendEmail(SendEmailData),
    ActionRunScript(RunScriptData),
    LogicDelay(DelayData),
    LogicSetVariable(SetVariableData),
    CompoundCondition(ConditionData),
    CompoundLoop(LoopData),
    Merge(MergeData),
}

impl NodeData {
    /// The node kind this payload belongs to
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Start(_) => NodeKind::Start,
            NodeData::TriggerManual(_) => NodeKind::TriggerManual,
            NodeData::TriggerSchedule(_) => NodeKind::TriggerSchedule,
            NodeData::TriggerWebhook(_) => NodeKind::TriggerWebhook,
            NodeData::ActionHttpRequest(_) => NodeKind::ActionHttpRequest,
            NodeData::ActionSendEmail(_) => NodeKind::ActionSendEmail,
            NodeData::ActionRunScript(_) => NodeKind::ActionRunScript,
            NodeData::LogicDelay(_) => NodeKind::LogicDelay,
            NodeData::LogicSetVariable(_) => NodeKind::LogicSetVariable,
            NodeData::CompoundCondition(_) => NodeKind::CompoundCondition,
            NodeData::CompoundLoop(_) => NodeKind::CompoundLoop,
            NodeData::Merge(_) => NodeKind::Merge,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        match self {
            NodeData::Start(d) => &d.name,
            NodeData::TriggerManual(d) => &d.name,
            NodeData::TriggerSchedule(d) => &d.name,
            NodeData::TriggerWebhook(d) => &d.name,
            NodeData::ActionHttpRequest(d) => &d.name,
            NodeData::ActionSendEmail(d) => &d.name,
            NodeData::ActionRunScript(d) => &d.name,
            NodeData::LogicDelay(d) => &d.name,
            NodeData::LogicSetVariable(d) => &d.name,
            NodeData::CompoundCondition(d) => &d.name,
            NodeData::CompoundLoop(d) => &d.name,
            NodeData::Merge(d) => &d.name,
        }
    }

    /// Display name (mutable)
    pub fn name_mut(&mut self) -> &mut String {
        match self {
            NodeData::Start(d) => &mut d.name,
            NodeData::TriggerManual(d) => &mut d.name,
            NodeData::TriggerSchedule(d) => &mut d.name,
            NodeData::TriggerWebhook(d) => &mut d.name,
            NodeData::ActionHttpRequest(d) => &mut d.name,
            NodeData::ActionSendEmail(d) => &mut d.name,
            NodeData::ActionRunScript(d) => &mut d.name,
            NodeData::LogicDelay(d) => &mut d.name,
            NodeData::LogicSetVariable(d) => &mut d.name,
            NodeData::CompoundCondition(d) => &mut d.name,
            NodeData::CompoundLoop(d) => &mut d.name,
            NodeData::Merge(d) => &mut d.name,
        }
    }

    /// Shallow-merge a JSON object into this payload
    ///
    /// Each key of `patch` replaces the field of the same name. The node
    /// type cannot be changed, and keys the payload does not have are
    /// rejected. On error the reason is returned and `self` is untouched.
    pub fn merge_patch(&self, patch: &Value) -> Result<NodeData, String> {
        let Value::Object(patch) = patch else {
            return Err("patch must be a JSON object".to_string());
        };

        let mut value = serde_json::to_value(self).map_err(|e| e.to_string())?;
        let fields = value
            .get_mut("data")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| "payload is not an object".to_string())?;

        for (key, field) in patch {
            if !fields.contains_key(key) {
                return Err(format!("unknown field '{}' for {}", key, self.kind()));
            }
            fields.insert(key.clone(), field.clone());
        }

        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let data = NodeKind::LogicDelay.default_data();
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value, json!({"type": "logic_delay", "data": {"name": "Delay", "seconds": 60}}));
    }

    #[test]
    fn test_partial_payload_uses_defaults() {
        let data: NodeData =
            serde_json::from_value(json!({"type": "action_http_request", "data": {"url": "https://x"}}))
                .unwrap();
        match data {
            NodeData::ActionHttpRequest(req) => {
                assert_eq!(req.url, "https://x");
                assert_eq!(req.method, HttpMethod::Get);
                assert!(req.headers.is_empty());
            }
            other => panic!("Expected HTTP request payload, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_patch_replaces_fields() {
        let data = NodeKind::ActionHttpRequest.default_data();
        let patched = data
            .merge_patch(&json!({"url": "https://example.com", "method": "POST", "name": "Call API"}))
            .unwrap();

        match &patched {
            NodeData::ActionHttpRequest(req) => {
                assert_eq!(req.url, "https://example.com");
                assert_eq!(req.method, HttpMethod::Post);
            }
            other => panic!("Expected HTTP request payload, got {:?}", other),
        }
        assert_eq!(patched.name(), "Call API");
    }

    #[test]
    fn test_merge_patch_rejects_unknown_field() {
        let data = NodeKind::LogicDelay.default_data();
        let err = data.merge_patch(&json!({"minutes": 5})).unwrap_err();
        assert!(err.contains("minutes"));
    }

    #[test]
    fn test_merge_patch_rejects_wrong_type() {
        let data = NodeKind::LogicDelay.default_data();
        assert!(data.merge_patch(&json!({"seconds": "soon"})).is_err());
        assert!(data.merge_patch(&json!(["seconds"])).is_err());
    }

    #[test]
    fn test_merge_patch_cannot_change_type() {
        let data = NodeKind::LogicDelay.default_data();
        assert!(data.merge_patch(&json!({"type": "merge"})).is_err());
    }

    #[test]
    fn test_merge_patch_sets_optional_field() {
        let data = NodeKind::TriggerSchedule.default_data();
        let patched = data.merge_patch(&json!({"timezone": "UTC"})).unwrap();
        match patched {
            NodeData::TriggerSchedule(schedule) => {
                assert_eq!(schedule.timezone.as_deref(), Some("UTC"));
                assert_eq!(schedule.cron, "0 * * * *");
            }
            other => panic!("Expected schedule payload, got {:?}", other),
        }
    }
}
