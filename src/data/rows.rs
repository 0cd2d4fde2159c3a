use serde::Serialize;

use super::osm::ElementKind;

pub const NODE_FIELDS: [&str; 8] = ["id", "lat", "lon", "user", "uid", "version", "changeset", "timestamp"];
pub const NODE_TAGS_FIELDS: [&str; 4] = ["id", "key", "value", "type"];
pub const WAY_FIELDS: [&str; 6] = ["id", "user", "uid", "version", "changeset", "timestamp"];
pub const WAY_TAGS_FIELDS: [&str; 4] = ["id", "key", "value", "type"];
pub const WAY_NODES_FIELDS: [&str; 3] = ["id", "node_id", "position"];

// Field order of each row struct must match `columns()`; rows are serialized positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowSetKind {
    Nodes,
    NodeTags,
    Ways,
    WayNodes,
    WayTags,
}

impl RowSetKind {
    pub const ALL: [RowSetKind; 5] = [
        RowSetKind::Nodes,
        RowSetKind::NodeTags,
        RowSetKind::Ways,
        RowSetKind::WayNodes,
        RowSetKind::WayTags,
    ];

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            RowSetKind::Nodes => &NODE_FIELDS,
            RowSetKind::NodeTags => &NODE_TAGS_FIELDS,
            RowSetKind::Ways => &WAY_FIELDS,
            RowSetKind::WayNodes => &WAY_NODES_FIELDS,
            RowSetKind::WayTags => &WAY_TAGS_FIELDS,
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            RowSetKind::Nodes => "node",
            RowSetKind::NodeTags => "node_tags",
            RowSetKind::Ways => "way",
            RowSetKind::WayNodes => "way_nodes",
            RowSetKind::WayTags => "way_tags",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.table_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRow {
    pub id: u64,
    pub lat: f64,
    pub lon: f64,
    pub user: String,
    pub uid: u64,
    pub version: String,
    pub changeset: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WayRow {
    pub id: u64,
    pub user: String,
    pub uid: u64,
    pub version: String,
    pub changeset: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRow {
    pub id: u64,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WayNodeRow {
    pub id: u64,
    pub node_id: u64,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapedElement {
    Node {
        node: NodeRow,
        tags: Vec<TagRow>,
    },
    Way {
        way: WayRow,
        nodes: Vec<WayNodeRow>,
        tags: Vec<TagRow>,
    },
}

impl ShapedElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            ShapedElement::Node { .. } => ElementKind::Node,
            ShapedElement::Way { .. } => ElementKind::Way,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            ShapedElement::Node { node, .. } => node.id,
            ShapedElement::Way { way, .. } => way.id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub nodes: u64,
    pub node_tags: u64,
    pub ways: u64,
    pub way_nodes: u64,
    pub way_tags: u64,
}
