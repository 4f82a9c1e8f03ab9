//! Built-in demo datasets.
//!
//! `services` is a directed microservice call topology (gateways down to data
//! stores and ops tooling); `social` is a small undirected friendship network.
//! Both are loaded through the engine's regular write path, so seeding an
//! already-populated database only adds what is missing.

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::engine::GraphEngine;
use crate::error::{Result, SocialFlowError};
use crate::types::{Attributes, Orientation, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Services,
    Social,
}

impl Dataset {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "services" | "service" | "microservices" => Some(Self::Services),
            "social" | "friends" => Some(Self::Social),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Social => "social",
        }
    }

    /// The orientation the dataset is meant for.
    pub fn orientation(&self) -> Orientation {
        match self {
            Self::Services => Orientation::Directed,
            Self::Social => Orientation::Undirected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub dataset: Dataset,
    pub nodes_added: usize,
    pub edges_added: usize,
    /// Entries that were already present.
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Service topology
// ---------------------------------------------------------------------------

type ServiceRow = (&'static str, &'static str, Tier, &'static [&'static str], &'static str);

const SERVICES: &[ServiceRow] = &[
    ("gw_main", "API-Gateway", Tier::Gateway, &["Nginx", "OpenResty"], "Primary ingress gateway"),
    ("gw_admin", "Admin-Gateway", Tier::Gateway, &["Nginx"], "Back-office gateway"),
    ("gw_ws", "WebSocket-Gateway", Tier::Gateway, &["Node.js", "Socket.IO"], "Long-lived connection gateway"),
    ("bff_app", "App-BFF", Tier::Bff, &["Node.js", "Express"], "Mobile aggregation layer"),
    ("bff_web", "Web-BFF", Tier::Bff, &["Node.js", "GraphQL"], "Web aggregation layer"),
    ("bff_admin", "Admin-BFF", Tier::Bff, &["Go", "Gin"], "Back-office aggregation"),
    ("svc_user", "User-Service", Tier::Core, &["Java", "Spring Boot"], "User accounts"),
    ("svc_order", "Order-Service", Tier::Core, &["Java", "Spring Boot"], "Orders"),
    ("svc_pay", "Payment-Service", Tier::Core, &["Java", "Spring Boot"], "Payments"),
    ("svc_product", "Product-Service", Tier::Core, &["Java", "Spring Boot"], "Product catalog"),
    ("svc_inventory", "Inventory-Service", Tier::Core, &["Java", "Spring Boot"], "Stock levels"),
    ("svc_cart", "Cart-Service", Tier::Core, &["Go", "gRPC"], "Shopping cart"),
    ("svc_search", "Search-Service", Tier::Core, &["Java", "Elasticsearch"], "Search engine"),
    ("svc_recommend", "Recommend-Service", Tier::Core, &["Python", "TensorFlow"], "Recommendation engine"),
    ("svc_pricing", "Pricing-Service", Tier::Core, &["Go"], "Price calculation"),
    ("svc_coupon", "Coupon-Service", Tier::Core, &["Java", "Spring Boot"], "Coupons"),
    ("svc_auth", "Auth-Service", Tier::Middleware, &["Go", "JWT"], "Authentication"),
    ("svc_config", "Config-Center", Tier::Middleware, &["Java", "Nacos"], "Configuration center"),
    ("svc_registry", "Service-Registry", Tier::Middleware, &["Java", "Nacos"], "Service discovery"),
    ("svc_mq", "Message-Queue", Tier::Middleware, &["RocketMQ"], "Message queue"),
    ("svc_cache", "Cache-Cluster", Tier::Middleware, &["Redis", "Sentinel"], "Cache cluster"),
    ("svc_limiter", "Rate-Limiter", Tier::Middleware, &["Go", "Redis"], "Rate limiting and circuit breaking"),
    ("svc_notify", "Notify-Service", Tier::Auxiliary, &["Node.js"], "Push notifications"),
    ("svc_sms", "SMS-Service", Tier::Auxiliary, &["Java"], "SMS delivery"),
    ("svc_email", "Email-Service", Tier::Auxiliary, &["Python", "Celery"], "Email delivery"),
    ("svc_audit", "Audit-Log", Tier::Auxiliary, &["Go"], "Audit trail"),
    ("svc_report", "Report-Service", Tier::Auxiliary, &["Python", "Pandas"], "Reporting engine"),
    ("svc_file", "File-Service", Tier::Auxiliary, &["Go", "MinIO"], "File storage"),
    ("svc_cron", "Scheduler", Tier::Auxiliary, &["Java", "XXL-Job"], "Scheduled jobs"),
    ("db_user", "UserDB-MySQL", Tier::Data, &["MySQL 8.0"], "User primary database"),
    ("db_order", "OrderDB-MySQL", Tier::Data, &["MySQL 8.0"], "Order primary database"),
    ("db_product", "ProductDB-MySQL", Tier::Data, &["MySQL 8.0"], "Product primary database"),
    ("db_pay", "PayDB-MySQL", Tier::Data, &["MySQL 8.0", "TiDB"], "Payment ledger"),
    ("db_log", "LogDB-ClickHouse", Tier::Data, &["ClickHouse"], "Log analytics"),
    ("db_es", "ES-Cluster", Tier::Data, &["Elasticsearch 8"], "Full-text search cluster"),
    ("db_mongo", "MongoDB-Cluster", Tier::Data, &["MongoDB 6"], "Document store"),
    ("db_redis", "Redis-Master", Tier::Data, &["Redis 7"], "Cache primary"),
    ("svc_monitor", "Monitor-Center", Tier::Ops, &["Prometheus", "Grafana"], "Monitoring and alerting"),
    ("svc_trace", "Trace-System", Tier::Ops, &["Jaeger", "OpenTelemetry"], "Distributed tracing"),
    ("svc_log_agg", "Log-Aggregator", Tier::Ops, &["Filebeat", "Logstash"], "Log collection"),
    ("svc_cicd", "CI/CD-Pipeline", Tier::Ops, &["Jenkins", "ArgoCD"], "Continuous delivery"),
    ("svc_k8s", "K8s-Cluster", Tier::Ops, &["Kubernetes 1.28"], "Container orchestration"),
];

/// `(caller, callee)` pairs.
const CALLS: &[(&str, &str)] = &[
    // gateways
    ("gw_main", "bff_app"),
    ("gw_main", "bff_web"),
    ("gw_admin", "bff_admin"),
    ("gw_main", "svc_auth"),
    ("gw_admin", "svc_auth"),
    ("gw_ws", "svc_notify"),
    ("gw_main", "svc_limiter"),
    // bff -> core
    ("bff_app", "svc_user"),
    ("bff_app", "svc_order"),
    ("bff_app", "svc_product"),
    ("bff_app", "svc_cart"),
    ("bff_app", "svc_search"),
    ("bff_app", "svc_recommend"),
    ("bff_web", "svc_user"),
    ("bff_web", "svc_order"),
    ("bff_web", "svc_product"),
    ("bff_web", "svc_cart"),
    ("bff_web", "svc_search"),
    ("bff_admin", "svc_user"),
    ("bff_admin", "svc_order"),
    ("bff_admin", "svc_product"),
    ("bff_admin", "svc_report"),
    ("bff_admin", "svc_audit"),
    // core -> core
    ("svc_order", "svc_pay"),
    ("svc_order", "svc_inventory"),
    ("svc_order", "svc_coupon"),
    ("svc_order", "svc_pricing"),
    ("svc_order", "svc_user"),
    ("svc_cart", "svc_product"),
    ("svc_cart", "svc_pricing"),
    ("svc_cart", "svc_inventory"),
    ("svc_pay", "svc_notify"),
    ("svc_pay", "svc_audit"),
    ("svc_product", "svc_inventory"),
    ("svc_product", "svc_pricing"),
    ("svc_search", "svc_product"),
    ("svc_recommend", "svc_user"),
    ("svc_recommend", "svc_product"),
    // core -> middleware
    ("svc_user", "svc_cache"),
    ("svc_order", "svc_mq"),
    ("svc_pay", "svc_mq"),
    ("svc_product", "svc_cache"),
    ("svc_inventory", "svc_cache"),
    ("svc_auth", "svc_cache"),
    ("svc_coupon", "svc_cache"),
    ("svc_limiter", "svc_cache"),
    // -> data
    ("svc_user", "db_user"),
    ("svc_order", "db_order"),
    ("svc_product", "db_product"),
    ("svc_pay", "db_pay"),
    ("svc_search", "db_es"),
    ("svc_recommend", "db_mongo"),
    ("svc_cache", "db_redis"),
    ("svc_audit", "db_log"),
    // notifications
    ("svc_notify", "svc_sms"),
    ("svc_notify", "svc_email"),
    ("svc_notify", "gw_ws"),
    // reporting
    ("svc_report", "db_order"),
    ("svc_report", "db_user"),
    ("svc_report", "db_log"),
    // scheduled jobs
    ("svc_cron", "svc_inventory"),
    ("svc_cron", "svc_report"),
    ("svc_cron", "svc_coupon"),
    // files
    ("svc_product", "svc_file"),
    ("svc_user", "svc_file"),
    // ops
    ("svc_monitor", "svc_trace"),
    ("svc_monitor", "svc_log_agg"),
    ("svc_log_agg", "db_log"),
    ("svc_trace", "db_log"),
    ("svc_cicd", "svc_k8s"),
    // registration
    ("svc_user", "svc_registry"),
    ("svc_order", "svc_registry"),
    ("svc_pay", "svc_registry"),
    ("svc_product", "svc_registry"),
    ("svc_cart", "svc_registry"),
    ("svc_config", "svc_registry"),
];

// ---------------------------------------------------------------------------
// Social network
// ---------------------------------------------------------------------------

const PEOPLE: &[(&str, &str, &[&str])] = &[
    ("u1", "Alice", &["hiking", "rust", "chess"]),
    ("u2", "Bob", &["chess", "cooking"]),
    ("u3", "Carol", &["rust", "photography"]),
    ("u4", "Dave", &["hiking", "photography"]),
    ("u5", "Erin", &["cooking", "travel"]),
    ("u6", "Frank", &["chess", "rust", "travel"]),
    ("u7", "Grace", &["hiking"]),
    ("u8", "Heidi", &["photography", "travel"]),
    ("u9", "Ivan", &[]),
];

const FRIENDSHIPS: &[(&str, &str)] = &[
    ("u1", "u2"),
    ("u1", "u3"),
    ("u2", "u3"),
    ("u2", "u6"),
    ("u3", "u4"),
    ("u3", "u6"),
    ("u4", "u7"),
    ("u4", "u8"),
    ("u5", "u8"),
    ("u6", "u5"),
];

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Load `dataset` into `engine`. Existing nodes and edges are left alone and
/// counted as skipped.
pub fn load(engine: &GraphEngine, dataset: Dataset) -> Result<SeedReport> {
    if engine.orientation() != dataset.orientation() {
        return Err(SocialFlowError::InvalidInput(format!(
            "dataset '{}' needs a {} graph, engine is {}",
            dataset.as_str(),
            dataset.orientation(),
            engine.orientation()
        )));
    }

    let mut report = SeedReport {
        dataset,
        nodes_added: 0,
        edges_added: 0,
        skipped: 0,
    };

    let (nodes, edges) = match dataset {
        Dataset::Services => (service_nodes(), CALLS),
        Dataset::Social => (social_nodes(), FRIENDSHIPS),
    };

    for (id, label, attributes) in nodes {
        match engine.add_node(id, Some(label), attributes) {
            Ok(_) => report.nodes_added += 1,
            Err(SocialFlowError::Conflict(_)) => report.skipped += 1,
            Err(e) => return Err(e),
        }
    }
    for (source, target) in edges {
        match engine.add_edge(source, target) {
            Ok(_) => report.edges_added += 1,
            Err(SocialFlowError::Conflict(_)) => report.skipped += 1,
            Err(e) => return Err(e),
        }
    }

    info!(
        dataset = dataset.as_str(),
        nodes = report.nodes_added,
        edges = report.edges_added,
        skipped = report.skipped,
        "seeded dataset"
    );
    Ok(report)
}

fn service_nodes() -> Vec<(&'static str, &'static str, Attributes)> {
    SERVICES
        .iter()
        .map(|(id, label, tier, stack, desc)| {
            let attrs = Attributes::new()
                .with("techStack", json!(stack))
                .with("tier", tier.as_str())
                .with("desc", *desc);
            (*id, *label, attrs)
        })
        .collect()
}

fn social_nodes() -> Vec<(&'static str, &'static str, Attributes)> {
    PEOPLE
        .iter()
        .map(|(id, name, interests)| {
            (*id, *name, Attributes::new().with("interests", json!(interests)))
        })
        .collect()
}
