//! JSON-RPC 2.0 message handling for the tool-call protocol (MCP shape).
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{ArrError, ArrResult};
use crate::tools::{AddMovieArgs, AddShowArgs, SearchMoviesArgs, SearchShowArgs, Tools};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
const SUPPORTED_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

static TOOL_DEFINITIONS: Lazy<Value> = Lazy::new(|| {
    json!([
        {
            "name": "search_movies",
            "description": "Search for movies by title using Radarr's lookup. Accepts a plain title (\"The Matrix\"), an IMDb id (tt0133093) or tmdb:<id>. Returns up to 10 candidates with their TMDb ids; nothing is added.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Movie title only, e.g. \"Primer\"" }
                },
                "required": ["title"]
            }
        },
        {
            "name": "add_movie_by_id",
            "description": "Add a specific movie to Radarr by its TMDb id. Fails with kind=duplicate if the movie is already in the library.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tmdb_id": { "type": "integer", "minimum": 1, "description": "The Movie Database id" },
                    "root_folder": { "type": "string", "description": "Optional root folder path, e.g. /storage/movies" }
                },
                "required": ["tmdb_id"]
            }
        },
        {
            "name": "search_and_add_show",
            "description": "Search for TV shows with a natural language description or title using Sonarr's lookup. With auto_add, the show is added when the query unambiguously identifies one result.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "description": { "type": "string", "description": "Show title or description, or tvdb:<id>" },
                    "auto_add": { "type": "boolean", "default": false, "description": "Add the show when exactly one candidate is confirmed" }
                },
                "required": ["description"]
            }
        },
        {
            "name": "add_show_by_tvdb_id",
            "description": "Add a specific TV show to Sonarr by its TVDB id. Fails with kind=duplicate if the show is already in the library.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tvdb_id": { "type": "integer", "minimum": 1, "description": "The TV Database id" },
                    "title": { "type": "string", "description": "Title to use if the catalog lookup returns nothing" },
                    "root_folder": { "type": "string", "description": "Optional root folder path, e.g. /storage/anime" }
                },
                "required": ["tvdb_id"]
            }
        },
        {
            "name": "test_config",
            "description": "Report the loaded configuration and test search connectivity to Radarr and Sonarr.",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "get_server_status",
            "description": "Check reachability and version of the Radarr and Sonarr servers.",
            "inputSchema": { "type": "object", "properties": {} }
        }
    ])
});

pub fn tool_definitions() -> &'static Value {
    &TOOL_DEFINITIONS
}

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl RpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Handles one raw message. Notifications produce no response.
pub async fn handle_message(tools: &Tools, raw: &[u8]) -> Option<RpcResponse> {
    let value: Value = match serde_json::from_slice(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Rejecting message: invalid JSON: {}", e);
            return Some(RpcResponse::failure(
                Value::Null,
                RpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
            ));
        }
    };
    let fallback_id = value.get("id").cloned().unwrap_or(Value::Null);
    // Only a missing id marks a notification; `"id": null` still gets a reply.
    let is_notification = value.get("id").is_none();
    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            return Some(RpcResponse::failure(
                fallback_id,
                RpcError::new(INVALID_REQUEST, format!("Invalid request: {e}")),
            ))
        }
    };
    if request.jsonrpc.as_deref() != Some("2.0") {
        return Some(RpcResponse::failure(
            fallback_id,
            RpcError::new(INVALID_REQUEST, "Invalid request: jsonrpc must be \"2.0\""),
        ));
    }

    if is_notification {
        debug!("Notification received: {}", request.method);
        return None;
    }
    let id = request.id.unwrap_or(Value::Null);

    Some(match dispatch(tools, &request.method, request.params).await {
        Ok(result) => RpcResponse::success(id, result),
        Err(error) => RpcResponse::failure(id, error),
    })
}

async fn dispatch(tools: &Tools, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "initialize" => {
            let requested = params.get("protocolVersion").and_then(|v| v.as_str());
            let version = requested
                .filter(|v| SUPPORTED_VERSIONS.contains(v))
                .unwrap_or(PROTOCOL_VERSION);
            info!("Client initialized (protocol {})", version);
            Ok(json!({
                "protocolVersion": version,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": { "name": "arrlink", "version": env!("CARGO_PKG_VERSION") },
                "instructions": "Search with search_movies / search_and_add_show, then add a confirmed entry by id with add_movie_by_id / add_show_by_tvdb_id."
            }))
        }
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tool_definitions() })),
        "tools/call" => {
            let name = params
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| RpcError::new(INVALID_PARAMS, "tools/call requires a tool name"))?;
            let arguments = match params.get("arguments") {
                None | Some(Value::Null) => json!({}),
                Some(args) => args.clone(),
            };
            call_tool(tools, name, arguments).await
        }
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    }
}

async fn call_tool(tools: &Tools, name: &str, arguments: Value) -> Result<Value, RpcError> {
    info!("Tool call: {}", name);
    match name {
        "search_movies" => {
            let args: SearchMoviesArgs = decode(name, arguments)?;
            render(tools.search_movies(&args.title).await)
        }
        "add_movie_by_id" => {
            let args: AddMovieArgs = decode(name, arguments)?;
            render(
                tools
                    .add_movie_by_id(args.tmdb_id, args.root_folder.as_deref())
                    .await,
            )
        }
        "search_and_add_show" => {
            let args: SearchShowArgs = decode(name, arguments)?;
            render(
                tools
                    .search_and_add_show(&args.description, args.auto_add)
                    .await,
            )
        }
        "add_show_by_tvdb_id" => {
            let args: AddShowArgs = decode(name, arguments)?;
            render(
                tools
                    .add_show_by_tvdb_id(
                        args.tvdb_id,
                        args.title.as_deref(),
                        args.root_folder.as_deref(),
                    )
                    .await,
            )
        }
        "test_config" => render(Ok(tools.test_config().await)),
        "get_server_status" => render(tools.get_server_status().await),
        other => Err(RpcError::new(
            INVALID_PARAMS,
            format!("Unknown tool: {other}"),
        )),
    }
}

fn decode<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, RpcError> {
    serde_json::from_value(arguments)
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid arguments for {tool}: {e}")))
}

fn render<T: Serialize>(result: ArrResult<T>) -> Result<Value, RpcError> {
    let (structured, is_error) = match result {
        Ok(value) => {
            let structured = serde_json::to_value(value)
                .map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))?;
            (structured, false)
        }
        Err(e) => {
            warn!("Tool failed: {}", e);
            (tool_error(&e), true)
        }
    };
    let text = serde_json::to_string_pretty(&structured)
        .map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))?;
    Ok(json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": structured,
        "isError": is_error,
    }))
}

fn tool_error(error: &ArrError) -> Value {
    let mut body = json!({
        "error": error.to_string(),
        "kind": error.kind(),
    });
    if let ArrError::Duplicate {
        library_id: Some(id),
        ..
    } = error
    {
        body["library_id"] = json!(id);
    }
    body
}
