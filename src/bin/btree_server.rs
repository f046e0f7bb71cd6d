//! HTTP server for the B+ tree.
//!
//! Provides REST API endpoints for:
//! - CRUD operations on key-value pairs
//! - Range scans
//! - Tree visualization export
//! - Configuration management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use bplus_tree::{Db, TreeConfig, TreeNode, TreeStats};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

/// Request to create a database or change the config
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigRequest {
    branching_factor: Option<usize>,
}

/// Request for key-value operations
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutRequest {
    key: String,
    value: String,
}

/// Query for range scans; both bounds inclusive and optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    start: Option<String>,
    end: Option<String>,
}

/// Response for get operations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GetResponse {
    key: String,
    value: Option<String>,
    found: bool,
}

/// A key-value pair in a scan result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PairResponse {
    key: String,
    value: String,
}

/// Response for operations that return success/failure
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    success: bool,
    message: String,
}

/// Stats response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(flatten)]
    stats: TreeStats,
    btree_config: TreeConfig,
}

/// Tree visualization response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeResponse {
    tree: Option<TreeNode>,
    stats: Option<StatsResponse>,
}

/// Mutable app state for database management
struct MutableAppState {
    db: RwLock<Option<Db>>,
    btree_config: RwLock<TreeConfig>,
}

impl MutableAppState {
    fn new() -> Self {
        Self {
            db: RwLock::new(None),
            btree_config: RwLock::new(TreeConfig::default()),
        }
    }

    /// Clone the open database handle
    fn db(&self) -> Result<Db, ApiError> {
        self.db.read().clone().ok_or_else(no_database)
    }
}

type SharedState = Arc<MutableAppState>;
type ApiError = (StatusCode, Json<OperationResponse>);

fn no_database() -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(OperationResponse {
            success: false,
            message: "No database open".to_string(),
        }),
    )
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn stats_response(db: &Db) -> StatsResponse {
    StatsResponse {
        stats: db.stats(),
        btree_config: db.btree_config(),
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = Arc::new(MutableAppState::new());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/db", post(create_db))
        .route("/api/db", delete(close_db))
        .route("/api/config", get(get_config))
        .route("/api/config", post(set_config))
        .route("/api/kv/:key", get(get_value))
        .route("/api/kv", post(put_value))
        .route("/api/kv/:key", delete(delete_value))
        .route("/api/keys", get(list_keys))
        .route("/api/range", get(range_scan))
        .route("/api/tree", get(get_tree))
        .route("/api/stats", get(get_stats))
        .route("/api/clear", post(clear_db))
        .route("/api/bulk", post(bulk_insert))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
    tracing::info!("B+ tree server running on http://localhost:3001");
    println!("API Endpoints:");
    println!("  POST   /api/db       - Create database");
    println!("  DELETE /api/db       - Close database");
    println!("  GET    /api/config   - Get tree config");
    println!("  POST   /api/config   - Set tree config");
    println!("  GET    /api/kv/:key  - Get value by key");
    println!("  POST   /api/kv       - Put key-value pair");
    println!("  DELETE /api/kv/:key  - Delete key");
    println!("  GET    /api/keys     - List all keys");
    println!("  GET    /api/range    - Scan ?start=&end= (inclusive)");
    println!("  GET    /api/tree     - Get tree structure for visualization");
    println!("  GET    /api/stats    - Get tree stats");
    println!("  POST   /api/clear    - Clear all data");
    println!("  POST   /api/bulk     - Bulk insert key-value pairs");
    axum::serve(listener, app).await
}

async fn create_db(
    State(state): State<SharedState>,
    body: Option<Json<ConfigRequest>>,
) -> Json<OperationResponse> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let config = {
        let mut config = state.btree_config.write();
        if let Some(branching_factor) = req.branching_factor {
            *config = TreeConfig::new(branching_factor);
        }
        *config
    };

    *state.db.write() = Some(Db::open(config));
    tracing::info!(branching_factor = config.branching_factor, "database created");

    Json(OperationResponse {
        success: true,
        message: format!("Database created with branching factor {}", config.branching_factor),
    })
}

async fn close_db(State(state): State<SharedState>) -> Json<OperationResponse> {
    let mut db_lock = state.db.write();
    if db_lock.take().is_some() {
        Json(OperationResponse {
            success: true,
            message: "Database closed".to_string(),
        })
    } else {
        Json(OperationResponse {
            success: false,
            message: "No database open".to_string(),
        })
    }
}

async fn get_config(State(state): State<SharedState>) -> Json<TreeConfig> {
    Json(*state.btree_config.read())
}

async fn set_config(
    State(state): State<SharedState>,
    Json(req): Json<ConfigRequest>,
) -> Json<OperationResponse> {
    let mut config = state.btree_config.write();
    if let Some(branching_factor) = req.branching_factor {
        *config = TreeConfig::new(branching_factor);
    }
    Json(OperationResponse {
        success: true,
        message: format!(
            "Config updated: branching_factor={} (applies to the next database)",
            config.branching_factor
        ),
    })
}

async fn get_value(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    let db = state.db()?;
    let value = db.get(key.as_bytes());
    Ok(Json(GetResponse {
        found: value.is_some(),
        value: value.as_deref().map(lossy),
        key,
    }))
}

async fn put_value(
    State(state): State<SharedState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<OperationResponse>, ApiError> {
    let db = state.db()?;
    let message = match db.put(req.key.as_bytes(), req.value.as_bytes()) {
        Some(_) => format!("Updated key '{}'", req.key),
        None => format!("Inserted key '{}'", req.key),
    };
    Ok(Json(OperationResponse {
        success: true,
        message,
    }))
}

async fn delete_value(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<OperationResponse>, ApiError> {
    let db = state.db()?;
    let message = if db.delete(key.as_bytes()) {
        format!("Deleted key '{}'", key)
    } else {
        format!("Key '{}' not found", key)
    };
    Ok(Json(OperationResponse {
        success: true,
        message,
    }))
}

async fn list_keys(State(state): State<SharedState>) -> Result<Json<Vec<String>>, ApiError> {
    let db = state.db()?;
    let keys = db.iter().into_iter().map(|(k, _)| lossy(&k)).collect();
    Ok(Json(keys))
}

async fn range_scan(
    State(state): State<SharedState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<PairResponse>>, ApiError> {
    let db = state.db()?;
    let pairs = db
        .range(
            query.start.as_deref().map(str::as_bytes),
            query.end.as_deref().map(str::as_bytes),
        )
        .into_iter()
        .map(|(k, v)| PairResponse {
            key: lossy(&k),
            value: lossy(&v),
        })
        .collect();
    Ok(Json(pairs))
}

async fn get_tree(State(state): State<SharedState>) -> Result<Json<TreeResponse>, ApiError> {
    let db = state.db()?;
    Ok(Json(TreeResponse {
        tree: db.export_tree(),
        stats: Some(stats_response(&db)),
    }))
}

async fn get_stats(State(state): State<SharedState>) -> Result<Json<StatsResponse>, ApiError> {
    let db = state.db()?;
    Ok(Json(stats_response(&db)))
}

async fn clear_db(State(state): State<SharedState>) -> Result<Json<OperationResponse>, ApiError> {
    let db = state.db()?;
    db.clear();
    Ok(Json(OperationResponse {
        success: true,
        message: "Database cleared".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkInsertRequest {
    pairs: Vec<PutRequest>,
}

async fn bulk_insert(
    State(state): State<SharedState>,
    Json(req): Json<BulkInsertRequest>,
) -> Result<Json<OperationResponse>, ApiError> {
    let db = state.db()?;
    let count = req.pairs.len();
    for pair in req.pairs {
        db.put(pair.key.as_bytes(), pair.value.as_bytes());
    }
    tracing::debug!(count, "bulk insert");
    Ok(Json(OperationResponse {
        success: true,
        message: format!("Inserted {} key-value pairs", count),
    }))
}
