//! Request boundary.
//!
//! Typed requests in, `{ code, message, data }` envelopes out. Engine errors
//! map onto status codes; writes are gated by an [`AccessGuard`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::GraphEngine;
use crate::error::{Result, SocialFlowError};
use crate::graph::query::SearchParams;
use crate::types::Attributes;

pub const CODE_OK: u16 = 200;
pub const CODE_BAD_REQUEST: u16 = 400;
pub const CODE_UNAUTHORIZED: u16 = 401;
pub const CODE_NOT_FOUND: u16 = 404;
pub const CODE_CONFLICT: u16 = 409;
pub const CODE_INTERNAL: u16 = 500;

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Uniform response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: CODE_OK,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn from_error(err: &SocialFlowError) -> Self {
        Self::failure(status_code(err), err.to_string())
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

/// Status code for an engine error.
pub fn status_code(err: &SocialFlowError) -> u16 {
    match err {
        SocialFlowError::InvalidInput(_) => CODE_BAD_REQUEST,
        SocialFlowError::NotFound(_) => CODE_NOT_FOUND,
        SocialFlowError::Conflict(_) => CODE_CONFLICT,
        SocialFlowError::Storage(_)
        | SocialFlowError::Serialization(_)
        | SocialFlowError::Config(_)
        | SocialFlowError::Io(_)
        | SocialFlowError::Other(_) => CODE_INTERNAL,
    }
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

/// Decides whether a caller may perform writes.
///
/// `credential` is the raw `Authorization` value, if the caller sent one.
pub trait AccessGuard: Send + Sync {
    fn authorize(&self, credential: Option<&str>) -> bool;
}

/// Permits every caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessGuard for AllowAll {
    fn authorize(&self, _credential: Option<&str>) -> bool {
        true
    }
}

/// Accepts `Bearer <token>` for one fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl AccessGuard for StaticToken {
    fn authorize(&self, credential: Option<&str>) -> bool {
        credential
            .and_then(|c| c.strip_prefix("Bearer "))
            .is_some_and(|t| !t.is_empty() && t == self.token)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One call against the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Overview,
    Graph {
        #[serde(default)]
        limit: Option<usize>,
    },
    NodeDetail {
        id: String,
    },
    Neighbors {
        id: String,
    },
    ShortestPath {
        from: String,
        to: String,
    },
    BlastRadius {
        id: String,
    },
    Search(SearchParams),
    Recommend {
        id: String,
        #[serde(default)]
        top_k: Option<usize>,
    },
    AddNode {
        id: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        attributes: Attributes,
    },
    UpdateNode {
        id: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        attributes: Option<Attributes>,
    },
    RemoveNode {
        id: String,
    },
    AddEdge {
        source: String,
        target: String,
    },
    RemoveEdge {
        source: String,
        target: String,
    },
}

impl Request {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::AddNode { .. }
                | Self::UpdateNode { .. }
                | Self::RemoveNode { .. }
                | Self::AddEdge { .. }
                | Self::RemoveEdge { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes requests to a shared engine.
pub struct Api<'a> {
    engine: &'a GraphEngine,
    guard: Box<dyn AccessGuard + 'a>,
}

impl std::fmt::Debug for Api<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api").field("engine", self.engine).finish_non_exhaustive()
    }
}

impl<'a> Api<'a> {
    pub fn new(engine: &'a GraphEngine, guard: impl AccessGuard + 'a) -> Self {
        Self {
            engine,
            guard: Box::new(guard),
        }
    }

    /// Unguarded access.
    pub fn open(engine: &'a GraphEngine) -> Self {
        Self::new(engine, AllowAll)
    }

    /// Execute `request`. Writes without a valid credential are rejected
    /// with 401 before the engine is touched.
    pub fn dispatch(&self, request: Request, credential: Option<&str>) -> ApiResponse<Value> {
        if request.is_write() && !self.guard.authorize(credential) {
            warn!(?request, "write rejected by access guard");
            return ApiResponse::failure(CODE_UNAUTHORIZED, "authentication required");
        }
        match self.execute(request) {
            Ok(data) => ApiResponse::ok(data),
            Err(err) => {
                debug!(error = %err, "request failed");
                ApiResponse::from_error(&err)
            }
        }
    }

    fn execute(&self, request: Request) -> Result<Value> {
        let e = self.engine;
        let value = match request {
            Request::Overview => serde_json::to_value(e.overview())?,
            Request::Graph { limit } => serde_json::to_value(e.graph(limit))?,
            Request::NodeDetail { id } => serde_json::to_value(e.node_detail(&id)?)?,
            Request::Neighbors { id } => serde_json::to_value(e.neighbors(&id)?)?,
            Request::ShortestPath { from, to } => {
                serde_json::to_value(e.shortest_path(&from, &to)?)?
            }
            Request::BlastRadius { id } => serde_json::to_value(e.blast_radius(&id)?)?,
            Request::Search(params) => serde_json::to_value(e.search(&params))?,
            Request::Recommend { id, top_k } => serde_json::to_value(e.recommend(&id, top_k))?,
            Request::AddNode {
                id,
                label,
                attributes,
            } => serde_json::to_value(e.add_node(&id, label.as_deref(), attributes)?)?,
            Request::UpdateNode {
                id,
                label,
                attributes,
            } => serde_json::to_value(e.update_node(&id, label.as_deref(), attributes)?)?,
            Request::RemoveNode { id } => serde_json::to_value(e.remove_node(&id)?)?,
            Request::AddEdge { source, target } => {
                serde_json::to_value(e.add_edge(&source, &target)?)?
            }
            Request::RemoveEdge { source, target } => {
                let removed = e.remove_edge(&source, &target)?;
                serde_json::json!({ "source": source, "target": target, "removed": removed })
            }
        };
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Orientation;
    use serde_json::json;
    use test_case::test_case;

    fn add(id: &str) -> Request {
        Request::AddNode {
            id: id.into(),
            label: None,
            attributes: Attributes::new(),
        }
    }

    #[test_case(SocialFlowError::InvalidInput("x".into()), 400)]
    #[test_case(SocialFlowError::NotFound("x".into()), 404)]
    #[test_case(SocialFlowError::Conflict("x".into()), 409)]
    #[test_case(SocialFlowError::Config("x".into()), 500)]
    #[test_case(SocialFlowError::Other("x".into()), 500)]
    fn maps_errors_to_codes(err: SocialFlowError, code: u16) {
        assert_eq!(status_code(&err), code);
    }

    #[test]
    fn request_parses_from_tagged_json() {
        let req: Request =
            serde_json::from_value(json!({ "op": "shortest_path", "from": "a", "to": "b" })).unwrap();
        assert_eq!(
            req,
            Request::ShortestPath {
                from: "a".into(),
                to: "b".into()
            }
        );

        let req: Request = serde_json::from_value(json!({ "op": "search", "query": "ali" })).unwrap();
        match req {
            Request::Search(p) => {
                assert_eq!(p.query.as_deref(), Some("ali"));
                assert_eq!(p.page, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dispatch_success_and_errors() {
        let engine = GraphEngine::in_memory(Orientation::Undirected).unwrap();
        let api = Api::open(&engine);

        let resp = api.dispatch(add("a"), None);
        assert_eq!(resp.code, 200);
        assert_eq!(resp.data.as_ref().unwrap()["label"], "Unknown");

        assert_eq!(api.dispatch(add("a"), None).code, 409);
        assert_eq!(api.dispatch(add(""), None).code, 400);
        let missing = api.dispatch(Request::NodeDetail { id: "zz".into() }, None);
        assert_eq!(missing.code, 404);
        assert!(missing.data.is_none());
        assert!(missing.message.contains("zz"));
    }

    #[test]
    fn unreachable_path_is_success() {
        let engine = GraphEngine::in_memory(Orientation::Undirected).unwrap();
        let api = Api::open(&engine);
        api.dispatch(add("a"), None);
        api.dispatch(add("b"), None);
        let resp = api.dispatch(
            Request::ShortestPath {
                from: "a".into(),
                to: "b".into(),
            },
            None,
        );
        assert_eq!(resp.code, 200);
        assert_eq!(resp.data.unwrap()["distance"], -1);
    }

    #[test]
    fn guard_blocks_writes_not_reads() {
        let engine = GraphEngine::in_memory(Orientation::Directed).unwrap();
        let api = Api::new(&engine, StaticToken::new("s3cret"));

        assert_eq!(api.dispatch(add("a"), None).code, 401);
        assert_eq!(api.dispatch(add("a"), Some("Bearer wrong")).code, 401);
        assert_eq!(api.dispatch(add("a"), Some("s3cret")).code, 401);
        assert_eq!(engine.overview().total_nodes, 0);

        assert_eq!(api.dispatch(add("a"), Some("Bearer s3cret")).code, 200);
        assert_eq!(api.dispatch(Request::Overview, None).code, 200);
    }

    #[test]
    fn remove_edge_reports_whether_anything_changed() {
        let engine = GraphEngine::in_memory(Orientation::Undirected).unwrap();
        let api = Api::open(&engine);
        api.dispatch(add("a"), None);
        api.dispatch(add("b"), None);
        let edge = || Request::RemoveEdge {
            source: "a".into(),
            target: "b".into(),
        };
        let resp = api.dispatch(edge(), None);
        assert_eq!(resp.code, 200);
        assert_eq!(resp.data.unwrap()["removed"], false);
    }

    #[test]
    fn blast_radius_on_undirected_is_bad_request() {
        let engine = GraphEngine::in_memory(Orientation::Undirected).unwrap();
        let api = Api::open(&engine);
        api.dispatch(add("a"), None);
        assert_eq!(api.dispatch(Request::BlastRadius { id: "a".into() }, None).code, 400);
    }
}
