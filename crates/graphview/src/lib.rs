//! Graph-layout native extension.
//!
//! The server ships a `native` node of kind `graph` whose `extra` payload
//! carries the graph itself: a node list (each with an id, a generic label
//! subtree, and box attrs) and an edge list. The widget owns its subtree
//! from then on: graph props steer the layout, attrs land on the svg root,
//! and `setExtra` edits deliver replacement node/edge lists that trigger a
//! re-layout. Labels are built through the generic tree builder, so they
//! can be arbitrary virtual nodes, handlers included.

mod layout;

pub use crate::layout::{GraphLayout, LayoutConfig, layout};

use core_types::NodeKey;
use dom::{Attach, DomError, Mounted, NativeMount, NativeRegistry, NativeSpec, TreeCx};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use vdom::{Edit, VNode};

pub const KIND: &str = "graph";
const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub fn register(natives: &mut NativeRegistry) {
    natives.register(KIND, build_graph);
}

/// One graph vertex. Wire form: `{"gnode": {"id", "label", "attrs"}}`.
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: String,
    pub label: VNode,
    pub attrs: BTreeMap<String, String>,
}

impl<'de> Deserialize<'de> for GraphNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Envelope {
            gnode: Body,
        }
        #[derive(Deserialize)]
        struct Body {
            id: String,
            label: VNode,
            #[serde(default)]
            attrs: BTreeMap<String, String>,
        }
        let Envelope { gnode } = Envelope::deserialize(deserializer)?;
        Ok(GraphNode {
            id: gnode.id,
            label: gnode.label,
            attrs: gnode.attrs,
        })
    }
}

/// One directed edge. Wire form: `{"gedge": {"from", "to", "attrs"}}`.
#[derive(Clone, Debug)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub attrs: BTreeMap<String, String>,
}

impl<'de> Deserialize<'de> for GraphEdge {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Envelope {
            gedge: Body,
        }
        #[derive(Deserialize)]
        struct Body {
            from: String,
            to: String,
            #[serde(default)]
            attrs: BTreeMap<String, String>,
        }
        let Envelope { gedge } = Envelope::deserialize(deserializer)?;
        Ok(GraphEdge {
            from: gedge.from,
            to: gedge.to,
            attrs: gedge.attrs,
        })
    }
}

fn build_graph(
    cx: &mut TreeCx<'_>,
    attach: Attach,
    spec: &NativeSpec<'_>,
) -> Result<Mounted, DomError> {
    let nodes = parse_nodes(spec.extra.get("nodes"), NodeKey::INVALID)?;
    let edges = parse_edges(spec.extra.get("edges"), NodeKey::INVALID)?;

    let mut attrs = spec.attrs.clone();
    attrs.insert("id".to_string(), spec.id.to_string());
    let root_vnode = VNode::Element {
        tag_name: "svg".to_string(),
        attrs,
        props: BTreeMap::from([("namespace".to_string(), Value::String(SVG_NS.to_string()))]),
        events: spec.events.clone(),
        kids: Vec::new(),
    };
    let root = cx.build(&root_vnode, attach)?;

    let mount = GraphMount {
        root,
        nodes,
        edges,
        props: spec.props.clone(),
    };
    mount.render(cx)?;
    Ok(Mounted {
        root,
        mount: Box::new(mount),
    })
}

struct GraphMount {
    root: NodeKey,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    props: BTreeMap<String, Value>,
}

impl GraphMount {
    /// Recompute the layout and rebuild the subtree: edges first so nodes
    /// paint over them, then one group per vertex carrying its label.
    fn render(&self, cx: &mut TreeCx<'_>) -> Result<(), DomError> {
        let config = LayoutConfig::from_props(&self.props);
        let ids: Vec<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let links: Vec<(String, String)> = self
            .edges
            .iter()
            .map(|e| (e.from.clone(), e.to.clone()))
            .collect();
        let placed = layout(&ids, &links, &config);

        for child in cx.tree.children(self.root).to_vec() {
            cx.remove_subtree(child)?;
        }

        for edge in &self.edges {
            let (Some(&(x1, y1)), Some(&(x2, y2))) = (
                placed.positions.get(&edge.from),
                placed.positions.get(&edge.to),
            ) else {
                log::debug!("edge {} -> {} names an unknown vertex", edge.from, edge.to);
                continue;
            };
            let mut attrs = edge.attrs.clone();
            attrs.insert("class".to_string(), "edge".to_string());
            attrs.insert("d".to_string(), format!("M{x1},{y1} L{x2},{y2}"));
            let path = VNode::Element {
                tag_name: "path".to_string(),
                attrs,
                props: BTreeMap::new(),
                events: BTreeMap::new(),
                kids: Vec::new(),
            };
            cx.build(&path, Attach::Append { parent: self.root })?;
        }

        for node in &self.nodes {
            let Some(&(x, y)) = placed.positions.get(&node.id) else {
                continue;
            };
            let mut attrs = node.attrs.clone();
            attrs.insert("class".to_string(), "node".to_string());
            attrs.insert("transform".to_string(), format!("translate({x},{y})"));
            let group = VNode::Element {
                tag_name: "g".to_string(),
                attrs,
                props: BTreeMap::new(),
                events: BTreeMap::new(),
                kids: vec![node.label.clone()],
            };
            cx.build(&group, Attach::Append { parent: self.root })?;
        }

        cx.tree.set_attr(self.root, "width", &placed.width.to_string())?;
        cx.tree.set_attr(self.root, "height", &placed.height.to_string())?;
        Ok(())
    }
}

impl NativeMount for GraphMount {
    fn patch(
        &mut self,
        cx: &mut TreeCx<'_>,
        edits: &[Edit],
        attach: Attach,
    ) -> Result<(), DomError> {
        let mut new_nodes = None;
        let mut new_edges = None;
        let mut relayout = false;
        for edit in edits {
            match edit {
                Edit::SetAttr { name, val } => cx.tree.set_attr(self.root, name, val)?,
                Edit::RemoveAttr { name } => cx.tree.remove_attr(self.root, name)?,
                Edit::SetProp { name, val } => {
                    self.props.insert(name.clone(), val.clone());
                    relayout = true;
                }
                Edit::RemoveProp { name } => {
                    self.props.remove(name);
                    relayout = true;
                }
                Edit::SetExtra { name, value } => match name.as_str() {
                    "nodes" => new_nodes = Some(parse_nodes(Some(value), self.root)?),
                    "edges" => new_edges = Some(parse_edges(Some(value), self.root)?),
                    other => log::debug!("graph ignores extra {other:?}"),
                },
                Edit::Replace { html } => {
                    cx.build(html, attach)?;
                    return Ok(());
                }
                other => log::debug!("graph ignores {:?} edits", other.kind()),
            }
        }
        if let Some(nodes) = new_nodes {
            self.nodes = nodes;
            relayout = true;
        }
        if let Some(edges) = new_edges {
            self.edges = edges;
            relayout = true;
        }
        if relayout {
            self.render(cx)?;
        }
        Ok(())
    }
}

fn parse_nodes(value: Option<&Value>, node: NodeKey) -> Result<Vec<GraphNode>, DomError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    serde_json::from_value(value.clone()).map_err(|e| DomError::BadExtra {
        node,
        detail: format!("nodes: {e}"),
    })
}

fn parse_edges(value: Option<&Value>, node: NodeKey) -> Result<Vec<GraphEdge>, DomError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    serde_json::from_value(value.clone()).map_err(|e| DomError::BadExtra {
        node,
        detail: format!("edges: {e}"),
    })
}
