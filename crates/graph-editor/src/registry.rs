//! Static node type registry
//!
//! Every node kind the editor knows about is a variant of [`NodeKind`].
//! Looking up a type tag resolves to the kind's category, label and default
//! payload; there is no runtime registration.
//!
//! # Usage
//!
//! ```ignore
//! use graph_editor::registry::{self, NodeCategory};
//!
//! let info = registry::lookup("action_http_request").unwrap();
//! assert_eq!(info.category, NodeCategory::Action);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::payload::{
    ConditionData, DelayData, HttpRequestData, LoopData, ManualTriggerData, MergeData, NodeData,
    RunScriptData, ScheduleTriggerData, SendEmailData, SetVariableData, StartData,
    WebhookTriggerData,
};

/// Category of a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Entry points (schedules, webhooks, the start node)
    Trigger,
    /// Steps with an external effect
    Action,
    /// Control flow (branching, looping, merging, variables)
    Logic,
}

/// The closed set of node types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Reserved entry node, exactly one per loaded graph
    Start,
    TriggerManual,
    TriggerSchedule,
    TriggerWebhook,
    ActionHttpRequest,
    ActionSendEmail,
    ActionRunScript,
    LogicDelay,
    LogicSetVariable,
    /// Conditional container with "then"/"else" branch ports
    CompoundCondition,
    /// Loop container with a "loop-back" port
    CompoundLoop,
    /// Joins several execution paths
    Merge,
}

impl NodeKind {
    /// Every node kind, in palette order
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Start,
        NodeKind::TriggerManual,
        NodeKind::TriggerSchedule,
        NodeKind::TriggerWebhook,
        NodeKind::ActionHttpRequest,
        NodeKind::ActionSendEmail,
        NodeKind::ActionRunScript,
        NodeKind::LogicDelay,
        NodeKind::LogicSetVariable,
        NodeKind::CompoundCondition,
        NodeKind::CompoundLoop,
        NodeKind::Merge,
    ];

    /// The serialized type tag (e.g. "trigger_schedule")
    pub fn type_tag(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::TriggerManual => "trigger_manual",
            NodeKind::TriggerSchedule => "trigger_schedule",
            NodeKind::TriggerWebhook => "trigger_webhook",
            NodeKind::ActionHttpRequest => "action_http_request",
            NodeKind::ActionSendEmail => "action_send_email",
            NodeKind::ActionRunScript => "action_run_script",
            NodeKind::LogicDelay => "logic_delay",
            NodeKind::LogicSetVariable => "logic_set_variable",
            NodeKind::CompoundCondition => "compound_condition",
            NodeKind::CompoundLoop => "compound_loop",
            NodeKind::Merge => "merge",
        }
    }

    /// Resolve a type tag to its kind
    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        NodeKind::ALL.into_iter().find(|kind| kind.type_tag() == tag)
    }

    /// Category used for palette grouping and input rules
    pub fn category(&self) -> NodeCategory {
        match self {
            NodeKind::Start
            | NodeKind::TriggerManual
            | NodeKind::TriggerSchedule
            | NodeKind::TriggerWebhook => NodeCategory::Trigger,
            NodeKind::ActionHttpRequest | NodeKind::ActionSendEmail | NodeKind::ActionRunScript => {
                NodeCategory::Action
            }
            NodeKind::LogicDelay
            | NodeKind::LogicSetVariable
            | NodeKind::CompoundCondition
            | NodeKind::CompoundLoop
            | NodeKind::Merge => NodeCategory::Logic,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Start => "Start",
            NodeKind::TriggerManual => "Manual Trigger",
            NodeKind::TriggerSchedule => "Schedule",
            NodeKind::TriggerWebhook => "Webhook",
            NodeKind::ActionHttpRequest => "HTTP Request",
            NodeKind::ActionSendEmail => "Send Email",
            NodeKind::ActionRunScript => "Run Script",
            NodeKind::LogicDelay => "Delay",
            NodeKind::LogicSetVariable => "Set Variable",
            NodeKind::CompoundCondition => "Condition",
            NodeKind::CompoundLoop => "Loop",
            NodeKind::Merge => "Merge",
        }
    }

    /// Whether nodes of this kind may be the target of an edge
    ///
    /// Triggers (and the start node) only ever begin a flow.
    pub fn accepts_input(&self) -> bool {
        self.category() != NodeCategory::Trigger
    }

    /// Whether nodes of this kind contain child nodes
    pub fn is_compound(&self) -> bool {
        matches!(self, NodeKind::CompoundCondition | NodeKind::CompoundLoop)
    }

    /// Default payload for a freshly created node
    pub fn default_data(&self) -> NodeData {
        let name = self.label().to_string();
        match self {
            NodeKind::Start => NodeData::Start(StartData { name }),
            NodeKind::TriggerManual => NodeData::TriggerManual(ManualTriggerData { name }),
            NodeKind::TriggerSchedule => NodeData::TriggerSchedule(ScheduleTriggerData {
                name,
                cron: "0 * * * *".to_string(),
                timezone: None,
            }),
            NodeKind::TriggerWebhook => NodeData::TriggerWebhook(WebhookTriggerData {
                name,
                ..Default::default()
            }),
            NodeKind::ActionHttpRequest => NodeData::ActionHttpRequest(HttpRequestData {
                name,
                ..Default::default()
            }),
            NodeKind::ActionSendEmail => NodeData::ActionSendEmail(SendEmailData {
                name,
                ..Default::default()
            }),
            NodeKind::ActionRunScript => NodeData::ActionRunScript(RunScriptData {
                name,
                language: "javascript".to_string(),
                source: String::new(),
            }),
            NodeKind::LogicDelay => NodeData::LogicDelay(DelayData { name, seconds: 60 }),
            NodeKind::LogicSetVariable => NodeData::LogicSetVariable(SetVariableData {
                name,
                ..Default::default()
            }),
            NodeKind::CompoundCondition => NodeData::CompoundCondition(ConditionData {
                name,
                expression: String::new(),
            }),
            NodeKind::CompoundLoop => NodeData::CompoundLoop(LoopData {
                name,
                ..Default::default()
            }),
            NodeKind::Merge => NodeData::Merge(MergeData {
                name,
                ..Default::default()
            }),
        }
    }

    /// Registry entry for this kind
    pub fn info(&self) -> NodeTypeInfo {
        NodeTypeInfo {
            kind: *self,
            type_tag: self.type_tag(),
            category: self.category(),
            label: self.label(),
            default_data: self.default_data(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

impl FromStr for NodeKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::from_tag(s).ok_or_else(|| EditorError::UnknownNodeType(s.to_string()))
    }
}

/// Registry entry describing a node type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeInfo {
    pub kind: NodeKind,
    pub type_tag: &'static str,
    pub category: NodeCategory,
    pub label: &'static str,
    pub default_data: NodeData,
}

/// Look up a node type by its tag
pub fn lookup(type_tag: &str) -> Option<NodeTypeInfo> {
    NodeKind::from_tag(type_tag).map(|kind| kind.info())
}

/// Node kinds grouped by category, in palette order
///
/// The start node is not user-creatable and is left out.
pub fn kinds_by_category() -> HashMap<NodeCategory, Vec<NodeKind>> {
    let mut grouped: HashMap<NodeCategory, Vec<NodeKind>> = HashMap::new();
    for kind in NodeKind::ALL {
        if kind == NodeKind::Start {
            continue;
        }
        grouped.entry(kind.category()).or_default().push(kind);
    }
    grouped
}
