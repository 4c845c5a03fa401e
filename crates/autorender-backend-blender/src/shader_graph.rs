//! Typed material node graphs and the channel isolation rewrite.
//!
//! A [`ShaderGraph`] is a snapshot of one material's node tree: named nodes
//! with a kind, unlinked input values and a mute flag, plus directed links
//! between sockets. Engines hand graphs out through
//! [`crate::engine::RenderEngine::material_graph`] and take changes back as a
//! list of [`GraphEdit`]s.
//!
//! [`plan_isolation`] is the pure part of channel isolation: given a graph
//! whose surface output is fed by a principled BSDF, it plans the edits that
//! route one BSDF input into an emission shader instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Socket of the material output that receives the surface shader.
pub const SURFACE_SOCKET: &str = "Surface";
/// Colour input of an emission node.
pub const EMISSION_COLOR_SOCKET: &str = "Color";
/// Shader output of an emission node.
pub const EMISSION_OUTPUT_SOCKET: &str = "Emission";

/// Node type, named the way Blender reports `node.type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    OutputMaterial,
    BsdfPrincipled,
    Emission,
    TexImage,
    Value,
    Rgb,
    #[serde(other)]
    Other,
}

/// Unlinked value of an input socket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SocketValue {
    Float(f64),
    Vector([f64; 3]),
    Color([f64; 4]),
}

impl SocketValue {
    /// The value as an RGBA colour; scalars are broadcast to grey with alpha 1.
    pub fn to_color(self) -> [f64; 4] {
        match self {
            SocketValue::Float(v) => [v, v, v, 1.0],
            SocketValue::Vector([x, y, z]) => [x, y, z, 1.0],
            SocketValue::Color(c) => c,
        }
    }
}

/// One node of a material graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderNode {
    /// Unique node name within the graph.
    pub name: String,
    /// Node type.
    pub kind: NodeKind,
    /// Unlinked input values by socket name.
    #[serde(default)]
    pub inputs: std::collections::BTreeMap<String, SocketValue>,
    /// Muted nodes pass nothing through.
    #[serde(default)]
    pub muted: bool,
}

impl ShaderNode {
    /// Creates a node without inputs.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: Default::default(),
            muted: false,
        }
    }

    /// Sets an input value.
    pub fn with_input(mut self, socket: impl Into<String>, value: SocketValue) -> Self {
        self.inputs.insert(socket.into(), value);
        self
    }
}

/// Directed link from an output socket to an input socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLink {
    pub from_node: String,
    pub from_socket: String,
    pub to_node: String,
    pub to_socket: String,
}

impl NodeLink {
    /// Creates a link.
    pub fn new(
        from_node: impl Into<String>,
        from_socket: impl Into<String>,
        to_node: impl Into<String>,
        to_socket: impl Into<String>,
    ) -> Self {
        Self {
            from_node: from_node.into(),
            from_socket: from_socket.into(),
            to_node: to_node.into(),
            to_socket: to_socket.into(),
        }
    }
}

/// A change to a material graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GraphEdit {
    /// Adds a node.
    AddNode { name: String, kind: NodeKind },
    /// Links two sockets, replacing any link into `to_socket`.
    Link(NodeLink),
    /// Sets an unlinked input value.
    SetInput {
        node: String,
        socket: String,
        value: SocketValue,
    },
    /// Mutes a node without removing it.
    Mute { node: String },
}

/// Ways a graph can fail to match the isolation pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphShapeError {
    #[error("no material output node")]
    NoOutput,

    #[error("output '{output}' has no linked Surface input")]
    SurfaceUnlinked { output: String },

    #[error("surface shader '{node}' is not a principled BSDF")]
    NotPrincipled { node: String },

    #[error("node '{node}' has no input '{socket}'")]
    MissingInput { node: String, socket: String },

    #[error("node '{0}' does not exist")]
    UnknownNode(String),

    #[error("node '{0}' already exists")]
    DuplicateNode(String),
}

/// Snapshot of a material's node tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderGraph {
    #[serde(default)]
    pub nodes: Vec<ShaderNode>,
    #[serde(default)]
    pub links: Vec<NodeLink>,
}

impl ShaderGraph {
    /// The standard graph of a fresh material: principled BSDF into the output.
    pub fn principled_default() -> Self {
        Self {
            nodes: vec![
                ShaderNode::new("Principled BSDF", NodeKind::BsdfPrincipled)
                    .with_input("Base Color", SocketValue::Color([0.8, 0.8, 0.8, 1.0]))
                    .with_input("Roughness", SocketValue::Float(0.5))
                    .with_input("Metallic", SocketValue::Float(0.0)),
                ShaderNode::new("Material Output", NodeKind::OutputMaterial),
            ],
            links: vec![NodeLink::new(
                "Principled BSDF",
                "BSDF",
                "Material Output",
                SURFACE_SOCKET,
            )],
        }
    }

    /// Looks up a node by name.
    pub fn node(&self, name: &str) -> Option<&ShaderNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    fn node_mut(&mut self, name: &str) -> Result<&mut ShaderNode, GraphShapeError> {
        self.nodes
            .iter_mut()
            .find(|n| n.name == name)
            .ok_or_else(|| GraphShapeError::UnknownNode(name.to_string()))
    }

    /// The link feeding `node`'s input `socket`, if any.
    pub fn link_into(&self, node: &str, socket: &str) -> Option<&NodeLink> {
        self.links
            .iter()
            .find(|l| l.to_node == node && l.to_socket == socket)
    }

    /// Finds the first material output and the node feeding its surface input.
    ///
    /// Returns the output node, the surface link and the upstream node.
    pub fn find_output_then_upstream(
        &self,
    ) -> Result<(&ShaderNode, &NodeLink, &ShaderNode), GraphShapeError> {
        let output = self
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::OutputMaterial)
            .ok_or(GraphShapeError::NoOutput)?;

        let link = self.link_into(&output.name, SURFACE_SOCKET).ok_or_else(|| {
            GraphShapeError::SurfaceUnlinked {
                output: output.name.clone(),
            }
        })?;

        let upstream = self
            .node(&link.from_node)
            .ok_or_else(|| GraphShapeError::UnknownNode(link.from_node.clone()))?;

        Ok((output, link, upstream))
    }

    /// Returns a node name not yet used in the graph, starting from `base`.
    pub fn unique_node_name(&self, base: &str) -> String {
        if self.node(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{}.{:03}", base, i))
            .find(|name| self.node(name).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Applies edits in order.
    pub fn apply(&mut self, edits: &[GraphEdit]) -> Result<(), GraphShapeError> {
        for edit in edits {
            match edit {
                GraphEdit::AddNode { name, kind } => {
                    if self.node(name).is_some() {
                        return Err(GraphShapeError::DuplicateNode(name.clone()));
                    }
                    self.nodes.push(ShaderNode::new(name.clone(), kind.clone()));
                }
                GraphEdit::Link(link) => {
                    for name in [&link.from_node, &link.to_node] {
                        if self.node(name).is_none() {
                            return Err(GraphShapeError::UnknownNode(name.clone()));
                        }
                    }
                    self.links
                        .retain(|l| !(l.to_node == link.to_node && l.to_socket == link.to_socket));
                    self.links.push(link.clone());
                }
                GraphEdit::SetInput {
                    node,
                    socket,
                    value,
                } => {
                    self.node_mut(node)?.inputs.insert(socket.clone(), *value);
                }
                GraphEdit::Mute { node } => {
                    self.node_mut(node)?.muted = true;
                }
            }
        }
        Ok(())
    }

    /// Flat value reaching `node`'s input `socket`.
    ///
    /// Follows at most one link: a linked input takes the source node's
    /// input named like the source socket, or else its first input. Inputs
    /// driven by textures or other non-constant nodes have no flat value.
    pub fn flat_input(&self, node: &str, socket: &str) -> Option<SocketValue> {
        match self.link_into(node, socket) {
            Some(link) => {
                let source = self.node(&link.from_node)?;
                if source.muted {
                    return None;
                }
                source
                    .inputs
                    .get(&link.from_socket)
                    .or_else(|| source.inputs.values().next())
                    .copied()
            }
            None => self.node(node)?.inputs.get(socket).copied(),
        }
    }

    /// Colour the surface emits, if it is an unmuted emission shader.
    pub fn emitted_color(&self) -> Option<[f64; 4]> {
        let (_, _, upstream) = self.find_output_then_upstream().ok()?;
        if upstream.kind != NodeKind::Emission || upstream.muted {
            return None;
        }
        self.flat_input(&upstream.name, EMISSION_COLOR_SOCKET)
            .map(SocketValue::to_color)
    }

    /// Flat value of a principled BSDF input, found through the surface link.
    pub fn principled_input(&self, socket: &str) -> Option<SocketValue> {
        let (_, _, upstream) = self.find_output_then_upstream().ok()?;
        if upstream.kind != NodeKind::BsdfPrincipled {
            return None;
        }
        self.flat_input(&upstream.name, socket)
    }
}

/// Plans the edits that route `input` of the surface BSDF into an emission shader.
///
/// The emission node is named `emission_name` (made unique within the graph).
/// Its colour comes from whatever feeds `input`: an upstream link is
/// forwarded, a constant is copied with scalars broadcast to grey. The
/// emission output is linked to the surface input and the BSDF is muted.
pub fn plan_isolation(
    graph: &ShaderGraph,
    input: &str,
    emission_name: &str,
) -> Result<Vec<GraphEdit>, GraphShapeError> {
    let (output, surface_link, upstream) = graph.find_output_then_upstream()?;

    if upstream.kind != NodeKind::BsdfPrincipled {
        return Err(GraphShapeError::NotPrincipled {
            node: upstream.name.clone(),
        });
    }

    let emission = graph.unique_node_name(emission_name);
    let mut edits = vec![GraphEdit::AddNode {
        name: emission.clone(),
        kind: NodeKind::Emission,
    }];

    match graph.link_into(&upstream.name, input) {
        Some(link) => edits.push(GraphEdit::Link(NodeLink::new(
            link.from_node.clone(),
            link.from_socket.clone(),
            emission.clone(),
            EMISSION_COLOR_SOCKET,
        ))),
        None => {
            let value = upstream.inputs.get(input).ok_or_else(|| {
                GraphShapeError::MissingInput {
                    node: upstream.name.clone(),
                    socket: input.to_string(),
                }
            })?;
            edits.push(GraphEdit::SetInput {
                node: emission.clone(),
                socket: EMISSION_COLOR_SOCKET.to_string(),
                value: SocketValue::Color(value.to_color()),
            });
        }
    }

    edits.push(GraphEdit::Link(NodeLink::new(
        emission,
        EMISSION_OUTPUT_SOCKET,
        output.name.clone(),
        surface_link.to_socket.clone(),
    )));
    edits.push(GraphEdit::Mute {
        node: upstream.name.clone(),
    });

    Ok(edits)
}
