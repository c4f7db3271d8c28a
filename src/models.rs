// src/models.rs

use crate::core::errors::MenuError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// The live tag set: presence of a name means "set", the value is only used for
/// submenu id templating.
pub type Tags = HashMap<String, String>;

// --- IDENTIFIERS ---

/// Opaque, equal-by-value identifier of a menu. It is the key of the menu cache.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MenuId(String);

impl MenuId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MenuId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MenuId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// --- CONDITION TREES ---

/// A boolean expression over the tag set.
///
/// The set of kinds is closed: building a node from data with any other kind
/// fails with [`MenuError::UnrecognizedConditionKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionNode {
    Always,
    TagSet(String),
    TagUnset(String),
    And(Vec<ConditionNode>),
    Or(Vec<ConditionNode>),
    Not(Box<ConditionNode>),
    /// Transparent wrapper found at the top of some authored trees.
    When(Box<ConditionNode>),
}

impl ConditionNode {
    /// Builds a node from its wire form: `{"tag": "<kind>", "contents": ...}`.
    ///
    /// `TLAnd`, `TLOr` and `TLNot` are accepted as aliases of `And`, `Or` and `Not`.
    pub fn from_json(value: &Value) -> Result<Self, MenuError> {
        let tag = value
            .get("tag")
            .and_then(Value::as_str)
            .ok_or_else(|| MenuError::MalformedCondition(format!("missing 'tag' in {}", value)))?;
        let contents = value.get("contents");

        match tag {
            "Always" => Ok(Self::Always),
            "TagSet" => Ok(Self::TagSet(tag_name(tag, contents)?)),
            "TagUnset" => Ok(Self::TagUnset(tag_name(tag, contents)?)),
            "And" | "TLAnd" => Ok(Self::And(children(tag, contents)?)),
            "Or" | "TLOr" => Ok(Self::Or(children(tag, contents)?)),
            "Not" | "TLNot" => Ok(Self::Not(Box::new(child(tag, contents)?))),
            "When" => Ok(Self::When(Box::new(child(tag, contents)?))),
            other => Err(MenuError::UnrecognizedConditionKind(other.to_string())),
        }
    }
}

fn tag_name(kind: &str, contents: Option<&Value>) -> Result<String, MenuError> {
    contents
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MenuError::MalformedCondition(format!("'{}' expects a tag name", kind)))
}

fn child(kind: &str, contents: Option<&Value>) -> Result<ConditionNode, MenuError> {
    let value = contents
        .ok_or_else(|| MenuError::MalformedCondition(format!("'{}' expects a child", kind)))?;
    ConditionNode::from_json(value)
}

fn children(kind: &str, contents: Option<&Value>) -> Result<Vec<ConditionNode>, MenuError> {
    contents
        .and_then(Value::as_array)
        .ok_or_else(|| MenuError::MalformedCondition(format!("'{}' expects a list", kind)))?
        .iter()
        .map(ConditionNode::from_json)
        .collect()
}

// --- REACTIONS & ENTRIES ---

/// An external side effect attached to an entry.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "tag")]
pub enum Action {
    /// Open a URL outside the menu.
    Nav { url: String },
    /// Any action kind this core does not dispatch.
    #[serde(other)]
    Unsupported,
}

/// The effect bundle of an entry: submenu resolution, tag mutations and an action.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Reaction {
    pub sub_menu: Option<String>,
    pub sub_id_postfix: Option<String>,
    pub set_tags: BTreeMap<String, String>,
    pub unset_tags: Vec<String>,
    pub act: Option<Action>,
}

/// One line of a menu definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub label: String,
    pub display: ConditionNode,
    pub disabled: Option<ConditionNode>,
    pub reaction: Reaction,
}

impl Entry {
    /// An always-visible entry with an empty reaction.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            display: ConditionNode::Always,
            disabled: None,
            reaction: Reaction::default(),
        }
    }

    pub fn display(mut self, display: ConditionNode) -> Self {
        self.display = display;
        self
    }

    pub fn disabled_when(mut self, disabled: ConditionNode) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn reaction(mut self, reaction: Reaction) -> Self {
        self.reaction = reaction;
        self
    }
}

/// A fetched menu definition. Read-only once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuData {
    pub id: MenuId,
    pub entries: Vec<Entry>,
}

/// The payload of the root fetch: initial tags, the root id and the root entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootData {
    pub tags: Tags,
    pub root_menu_id: MenuId,
    pub entries: Vec<Entry>,
}

impl RootData {
    /// The root menu as a regular menu definition, ready for the cache.
    pub fn menu(&self) -> MenuData {
        MenuData {
            id: self.root_menu_id.clone(),
            entries: self.entries.clone(),
        }
    }
}

// --- WIRE FORMAT ---
// Conditions are kept as raw JSON until conversion so a bad kind surfaces as a
// typed `MenuError` instead of an opaque deserializer message.

#[derive(Deserialize)]
struct WireEntry {
    label: String,
    display: Value,
    #[serde(default)]
    disabled: Option<Value>,
    #[serde(default)]
    reaction: Reaction,
}

#[derive(Deserialize)]
struct WireMenu {
    entries: Vec<WireEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRoot {
    #[serde(default)]
    tags: Tags,
    root_menu_id: MenuId,
    entries: Vec<WireEntry>,
}

impl TryFrom<WireEntry> for Entry {
    type Error = MenuError;

    fn try_from(wire: WireEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            label: wire.label,
            display: ConditionNode::from_json(&wire.display)?,
            disabled: wire
                .disabled
                .as_ref()
                .map(ConditionNode::from_json)
                .transpose()?,
            reaction: wire.reaction,
        })
    }
}

fn convert_entries(entries: Vec<WireEntry>) -> Result<Vec<Entry>, MenuError> {
    entries.into_iter().map(Entry::try_from).collect()
}

impl MenuData {
    /// Parses a menu document (`{"entries": [...]}`) served for `id`.
    pub fn from_json_str(id: &MenuId, json: &str) -> Result<Self, MenuError> {
        let wire: WireMenu =
            serde_json::from_str(json).map_err(|e| MenuError::DataUnavailable {
                id: id.clone(),
                reason: format!("invalid menu document: {}", e),
            })?;
        Ok(Self {
            id: id.clone(),
            entries: convert_entries(wire.entries)?,
        })
    }
}

impl RootData {
    /// Parses the root document (`{"tags": {...}, "rootMenuId": "...", "entries": [...]}`).
    pub fn from_json_str(json: &str) -> Result<Self, MenuError> {
        let wire: WireRoot =
            serde_json::from_str(json).map_err(|e| MenuError::DataUnavailable {
                id: MenuId::new("<root>"),
                reason: format!("invalid root document: {}", e),
            })?;
        Ok(Self {
            tags: wire.tags,
            root_menu_id: wire.root_menu_id,
            entries: convert_entries(wire.entries)?,
        })
    }
}

// --- RENDERED ITEMS ---

/// The rendered projection of one visible entry. Recomputed on every open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub menu_id: MenuId,
    /// Index into `MenuData::entries`, used to resolve the reaction on selection.
    pub entry_index: usize,
    /// Position among visible items only.
    pub display_index: usize,
    pub label: String,
    pub disabled: bool,
    pub sub_menu_id: Option<MenuId>,
}

// --- GEOMETRY ---

/// Horizontal side of the anchor a child menu hangs from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum AttachX {
    Left,
    Right,
}

/// Vertical edge of the anchor a child menu aligns with.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum AttachY {
    Top,
    Bottom,
}

impl FromStr for AttachX {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(MenuError::InvalidAttachDirection(s.to_string())),
        }
    }
}

impl FromStr for AttachY {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            _ => Err(MenuError::InvalidAttachDirection(s.to_string())),
        }
    }
}

impl TryFrom<String> for AttachX {
    type Error = MenuError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for AttachY {
    type Error = MenuError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AttachX> for String {
    fn from(value: AttachX) -> Self {
        value.to_string()
    }
}

impl From<AttachY> for String {
    fn from(value: AttachY) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AttachX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

impl fmt::Display for AttachY {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        })
    }
}

/// Preferred side of the anchor box a child menu should hang from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachSpec {
    pub x: AttachX,
    pub y: AttachY,
}

impl AttachSpec {
    pub fn new(x: AttachX, y: AttachY) -> Self {
        Self { x, y }
    }
}

impl Default for AttachSpec {
    fn default() -> Self {
        Self::new(AttachX::Right, AttachY::Top)
    }
}

impl FromStr for AttachSpec {
    type Err = MenuError;

    /// Parses `"<x>,<y>"`, e.g. `"right,top"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| MenuError::InvalidAttachDirection(s.to_string()))?;
        Ok(Self::new(x.parse()?, y.parse()?))
    }
}

/// Viewport-relative pixel box of an anchor element or a candidate menu.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// A zero-sized box at a pointer position.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, x, y, y)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Rounds both dimensions down to whole pixels.
    pub fn floor(self) -> Self {
        Self::new(self.width.floor(), self.height.floor())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

/// Output of the layout engine for one menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Position,
    pub max_width: f64,
    pub max_height: f64,
    /// The attach actually used, after any flip.
    pub attach: AttachSpec,
    pub must_scroll: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_from_json_accepts_aliases() {
        let value = json!({
            "tag": "When",
            "contents": {
                "tag": "TLAnd",
                "contents": [
                    {"tag": "TagSet", "contents": "a"},
                    {"tag": "TLNot", "contents": {"tag": "TagUnset", "contents": "b"}},
                    {"tag": "TLOr", "contents": []},
                    {"tag": "Always"}
                ]
            }
        });

        let node = ConditionNode::from_json(&value).unwrap();

        assert_eq!(
            node,
            ConditionNode::When(Box::new(ConditionNode::And(vec![
                ConditionNode::TagSet("a".into()),
                ConditionNode::Not(Box::new(ConditionNode::TagUnset("b".into()))),
                ConditionNode::Or(vec![]),
                ConditionNode::Always,
            ])))
        );
    }

    #[test]
    fn test_condition_from_json_rejects_unknown_kind() {
        let value = json!({"tag": "TLXor", "contents": []});
        let err = ConditionNode::from_json(&value).unwrap_err();
        assert_eq!(err, MenuError::UnrecognizedConditionKind("TLXor".into()));
    }

    #[test]
    fn test_nested_unknown_kind_is_not_masked() {
        let json = r#"{"entries": [
            {"label": "A", "display": {"tag": "And", "contents": [{"tag": "Maybe"}]}}
        ]}"#;
        let err = MenuData::from_json_str(&MenuId::new("m"), json).unwrap_err();
        assert_eq!(err, MenuError::UnrecognizedConditionKind("Maybe".into()));
    }

    #[test]
    fn test_root_document_parses_reactions() {
        let json = r#"{
            "tags": {"zone": "3"},
            "rootMenuId": "root",
            "entries": [
                {
                    "label": "Go",
                    "display": {"tag": "Always"},
                    "disabled": {"tag": "TagSet", "contents": "tired"},
                    "reaction": {
                        "subMenu": "room",
                        "subIdPostfix": "zone",
                        "setTags": {"seen": "1"},
                        "unsetTags": ["fresh"],
                        "act": {"tag": "Nav", "url": "https://example.org"}
                    }
                },
                {"label": "Wait", "display": {"tag": "Always"}, "reaction": {"act": {"tag": "Dance"}}}
            ]
        }"#;

        let root = RootData::from_json_str(json).unwrap();

        assert_eq!(root.root_menu_id, MenuId::new("root"));
        assert_eq!(root.tags.get("zone").map(String::as_str), Some("3"));
        let go = &root.entries[0];
        assert_eq!(go.reaction.sub_menu.as_deref(), Some("room"));
        assert_eq!(go.reaction.sub_id_postfix.as_deref(), Some("zone"));
        assert_eq!(go.reaction.unset_tags, vec!["fresh".to_string()]);
        assert_eq!(
            go.reaction.act,
            Some(Action::Nav {
                url: "https://example.org".into()
            })
        );
        assert_eq!(go.disabled, Some(ConditionNode::TagSet("tired".into())));
        assert_eq!(root.entries[1].reaction.act, Some(Action::Unsupported));
        assert_eq!(root.menu().entries.len(), 2);
    }

    #[test]
    fn test_attach_spec_parsing() {
        let spec: AttachSpec = "Left, bottom".parse().unwrap();
        assert_eq!(spec, AttachSpec::new(AttachX::Left, AttachY::Bottom));

        assert_eq!(
            "up,left".parse::<AttachSpec>().unwrap_err(),
            MenuError::InvalidAttachDirection("up".into())
        );
        assert!(matches!(
            "right".parse::<AttachSpec>(),
            Err(MenuError::InvalidAttachDirection(_))
        ));
    }
}
