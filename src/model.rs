use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Market graph as delivered by the backend:
/// `{ "nodes": [{ "id", ... }], "connections": [{ "source", "target", ... }] }`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<NodeRecord>,
    #[serde(alias = "links")]
    pub connections: Vec<Connection>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    /// Market question.
    #[serde(default, alias = "question")]
    pub label: Option<String>,
    #[serde(default)]
    pub volatility: f32,
    #[serde(default, alias = "connections", alias = "connectionCount")]
    pub connection_count: Option<u32>,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub position: Option<[f32; 2]>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// One side of a connection. Payload edges name their endpoints by id; the
/// simulation rewrites each endpoint to an arena index exactly once when it
/// binds the graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Endpoint {
    Unbound(String),
    Bound(usize),
}

impl Endpoint {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Bound(index) => Some(*index),
            Self::Unbound(_) => None,
        }
    }
}

impl From<String> for Endpoint {
    fn from(id: String) -> Self {
        Self::Unbound(id)
    }
}

impl From<&str> for Endpoint {
    fn from(id: &str) -> Self {
        Self::Unbound(id.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Connection {
    pub source: Endpoint,
    pub target: Endpoint,
    #[serde(default)]
    pub correlation: f32,
    #[serde(default)]
    pub pressure: f32,
}

impl Connection {
    pub fn new(source: impl Into<Endpoint>, target: impl Into<Endpoint>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            correlation: 0.0,
            pressure: 0.0,
        }
    }

    pub fn with_correlation(mut self, correlation: f32) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }

    /// Both arena indices, once bound.
    pub fn indices(&self) -> Option<(usize, usize)> {
        Some((self.source.index()?, self.target.index()?))
    }
}

pub fn parse_payload(raw: &str) -> Result<GraphPayload> {
    let payload: GraphPayload =
        serde_json::from_str(raw).context("invalid graph payload JSON")?;

    if let Some(position) = payload.nodes.iter().position(|node| node.id.is_empty()) {
        bail!("node #{position} has an empty id");
    }

    Ok(payload)
}

pub fn load_payload(path: &Path) -> Result<GraphPayload> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph payload from {}", path.display()))?;
    parse_payload(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nodes_and_connections() {
        let payload = parse_payload(
            r#"{
                "nodes": [
                    {"id": "m1", "question": "Will it rain?", "volatility": 0.4, "volume": 1200.5},
                    {"id": "m2", "connectionCount": 3, "position": [10.0, 20.0]}
                ],
                "connections": [
                    {"source": "m1", "target": "m2", "correlation": 0.8, "pressure": 0.3}
                ]
            }"#,
        )
        .expect("payload parses");

        assert_eq!(payload.nodes.len(), 2);
        assert_eq!(payload.nodes[0].display_name(), "Will it rain?");
        assert_eq!(payload.nodes[1].display_name(), "m2");
        assert_eq!(payload.nodes[1].connection_count, Some(3));
        assert_eq!(payload.nodes[1].position, Some([10.0, 20.0]));

        let connection = &payload.connections[0];
        assert_eq!(connection.source, Endpoint::Unbound("m1".to_owned()));
        assert_eq!(connection.target, Endpoint::Unbound("m2".to_owned()));
        assert_eq!(connection.indices(), None);
        assert!((connection.correlation - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn accepts_links_alias() {
        let payload =
            parse_payload(r#"{"nodes": [{"id": "a"}], "links": [{"source": "a", "target": "b"}]}"#)
                .expect("payload parses");
        assert_eq!(payload.connections.len(), 1);
        assert_eq!(payload.connections[0].pressure, 0.0);
    }

    #[test]
    fn rejects_structurally_invalid_payloads() {
        assert!(parse_payload("[]").is_err());
        assert!(parse_payload(r#"{"nodes": []}"#).is_err());
        assert!(parse_payload(r#"{"nodes": [{"label": "x"}], "connections": []}"#).is_err());
        assert!(parse_payload(r#"{"nodes": [], "connections": [{"source": "a"}]}"#).is_err());
        assert!(parse_payload(r#"{"nodes": [{"id": ""}], "connections": []}"#).is_err());
    }
}
