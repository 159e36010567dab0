//! Parameterized traversals for the HTTP API.
//!
//! User input only ever travels as bindings; the script text is assembled from
//! fixed fragments and generated binding names.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::gremlin::GremlinRequest;

/// Traversal used to check connectivity.
pub const PROBE: &str = "g.V().limit(1)";

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("property name must not be empty")]
    EmptyPropertyName,
    #[error("property '{0}' must be a string, number or boolean")]
    UnsupportedValue(String),
    #[error("{0} must be a non-empty string or a number")]
    InvalidId(&'static str),
    #[error("missing partition key property '{0}'")]
    MissingPartitionKey(String),
}

/// Body of `POST /vertices`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVertex {
    pub label: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Body of `POST /edges`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEdge {
    pub label: String,
    pub from: Value,
    pub to: Value,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

pub fn probe() -> GremlinRequest {
    GremlinRequest::new(PROBE)
}

pub fn all_vertices() -> GremlinRequest {
    GremlinRequest::new("g.V()")
}

pub fn all_edges() -> GremlinRequest {
    GremlinRequest::new("g.E()")
}

/// `g.addV(label).property(k, v)...`
pub fn add_vertex(
    vertex: &NewVertex,
    partition_key: Option<&str>,
) -> Result<GremlinRequest, QueryError> {
    let label = non_empty_label(&vertex.label)?;

    if let Some(pk) = partition_key {
        if !vertex.properties.contains_key(pk) {
            return Err(QueryError::MissingPartitionKey(pk.to_string()));
        }
    }

    let request = GremlinRequest::new("g.addV(vertexLabel)").bind("vertexLabel", label);
    with_properties(request, &vertex.properties)
}

/// `g.V(from).addE(label).to(g.V(to)).property(k, v)...`
pub fn add_edge(edge: &NewEdge) -> Result<GremlinRequest, QueryError> {
    let label = non_empty_label(&edge.label)?;
    let from = vertex_id(&edge.from, "from")?;
    let to = vertex_id(&edge.to, "to")?;

    let request = GremlinRequest::new("g.V(fromId).addE(edgeLabel).to(g.V(toId))")
        .bind("fromId", from)
        .bind("toId", to)
        .bind("edgeLabel", label);
    with_properties(request, &edge.properties)
}

fn non_empty_label(label: &str) -> Result<&str, QueryError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(QueryError::EmptyLabel);
    }
    Ok(label)
}

fn vertex_id(id: &Value, field: &'static str) -> Result<Value, QueryError> {
    match id {
        Value::String(s) if !s.trim().is_empty() => Ok(id.clone()),
        Value::Number(_) => Ok(id.clone()),
        _ => Err(QueryError::InvalidId(field)),
    }
}

fn with_properties(
    mut request: GremlinRequest,
    properties: &Map<String, Value>,
) -> Result<GremlinRequest, QueryError> {
    for (i, (name, value)) in properties.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(QueryError::EmptyPropertyName);
        }
        if !matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
            return Err(QueryError::UnsupportedValue(name.clone()));
        }
        let key_binding = format!("k{}", i);
        let value_binding = format!("v{}", i);
        request
            .gremlin
            .push_str(&format!(".property({}, {})", key_binding, value_binding));
        request = request
            .bind(key_binding, name.as_str())
            .bind(value_binding, value.clone());
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_add_vertex_binds_everything() {
        let vertex = NewVertex {
            label: "person".into(),
            properties: props(json!({ "name": "O'Brien'); g.V().drop(); //", "age": 42 })),
        };
        let request = add_vertex(&vertex, None).unwrap();

        assert_eq!(
            request.gremlin,
            "g.addV(vertexLabel).property(k0, v0).property(k1, v1)"
        );
        assert_eq!(request.bindings["vertexLabel"], "person");
        let bound: Vec<(Value, Value)> = (0..2)
            .map(|i| {
                (
                    request.bindings[&format!("k{}", i)].clone(),
                    request.bindings[&format!("v{}", i)].clone(),
                )
            })
            .collect();
        assert!(bound.contains(&(json!("age"), json!(42))));
        assert!(bound.contains(&(json!("name"), json!("O'Brien'); g.V().drop(); //"))));
        assert!(!request.gremlin.contains("O'Brien"));
    }

    #[test]
    fn test_vertex_validation() {
        let empty = NewVertex {
            label: "  ".into(),
            properties: Map::new(),
        };
        assert_eq!(add_vertex(&empty, None).unwrap_err(), QueryError::EmptyLabel);

        let nested = NewVertex {
            label: "person".into(),
            properties: props(json!({ "tags": ["a", "b"] })),
        };
        assert_eq!(
            add_vertex(&nested, None).unwrap_err(),
            QueryError::UnsupportedValue("tags".into())
        );
    }

    #[test]
    fn test_partition_key_required_when_configured() {
        let vertex = NewVertex {
            label: "person".into(),
            properties: props(json!({ "name": "ada" })),
        };
        assert_eq!(
            add_vertex(&vertex, Some("pk")).unwrap_err(),
            QueryError::MissingPartitionKey("pk".into())
        );

        let vertex = NewVertex {
            label: "person".into(),
            properties: props(json!({ "name": "ada", "pk": "people" })),
        };
        assert!(add_vertex(&vertex, Some("pk")).is_ok());
    }

    #[test]
    fn test_add_edge() {
        let edge = NewEdge {
            label: "knows".into(),
            from: json!("alice"),
            to: json!("bob"),
            properties: props(json!({ "since": 2020 })),
        };
        let request = add_edge(&edge).unwrap();

        assert_eq!(
            request.gremlin,
            "g.V(fromId).addE(edgeLabel).to(g.V(toId)).property(k0, v0)"
        );
        assert_eq!(request.bindings["fromId"], "alice");
        assert_eq!(request.bindings["toId"], "bob");
        assert_eq!(request.bindings["edgeLabel"], "knows");
        assert_eq!(request.bindings["v0"], 2020);
    }

    #[test]
    fn test_edge_requires_ids() {
        let edge = NewEdge {
            label: "knows".into(),
            from: json!(""),
            to: json!("bob"),
            properties: Map::new(),
        };
        assert_eq!(add_edge(&edge).unwrap_err(), QueryError::InvalidId("from"));

        let edge = NewEdge {
            label: "knows".into(),
            from: json!("alice"),
            to: json!({ "id": "bob" }),
            properties: Map::new(),
        };
        assert_eq!(add_edge(&edge).unwrap_err(), QueryError::InvalidId("to"));
    }

    #[test]
    fn test_read_all_and_probe() {
        assert_eq!(all_vertices().gremlin, "g.V()");
        assert_eq!(all_edges().gremlin, "g.E()");
        assert_eq!(probe().gremlin, PROBE);
        assert!(probe().bindings.is_empty());
    }
}
