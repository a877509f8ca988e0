use std::time::Instant;

use clap::{Args, Subcommand};
use cms_core::ContentError;
use cms_core::page::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use cms_core::search::{DEFAULT_SEARCH_TOP, MAX_SEARCH_TOP};
use serde_json::{Map, Value, json};
use tokio::io::{self, AsyncBufRead, AsyncWrite, BufReader};

pub mod args;
pub mod config;
pub mod definitions;
pub mod tools;
pub mod transport;
pub mod upstream;

use args::{
    arg_bounded_u64, arg_domain, arg_optional_string, reject_unknown_args, required_i64,
    required_raw_string, required_string,
};
use config::RuntimeConfig;
use definitions::{
    CONTENT_TYPES_RESOURCE, REDIRECTS_RESOURCE, ToolDefinition, ToolKind, resource_definitions,
    tool_definitions,
};
use tools::ContentTools;
use transport::{Framing, TransportError, read_frame, write_frame};
use upstream::UpstreamClient;

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const MCP_SERVER_NAME: &str = "cms-mcp";

#[derive(Subcommand, Clone, Debug)]
pub enum McpCommands {
    /// Run the MCP server over stdio
    Serve,
    /// Print the virtual tool registry for a domain and exit
    Registry(RegistryArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RegistryArgs {
    /// Domain to introspect (defaults to the configured domain)
    #[arg(long)]
    pub domain: Option<String>,
}

pub async fn run(config: RuntimeConfig, command: McpCommands) -> i32 {
    let server = McpServer::new(config);
    match command {
        McpCommands::Serve => {
            tracing::info!(
                transport = "stdio",
                base_url = %server.config.upstream.base_url,
                api_version = %server.config.upstream.api_version,
                default_domain = %server.config.default_domain,
                "MCP server starting"
            );
            let reader = BufReader::new(io::stdin());
            let writer = io::stdout();
            match server.serve(reader, writer).await {
                Ok(()) => 0,
                Err(err) => {
                    let payload = json!({
                        "error": "mcp_server_error",
                        "message": err.to_string(),
                    });
                    eprintln!("{}", to_pretty_json(&payload));
                    1
                }
            }
        }
        McpCommands::Registry(args) => {
            let domain = args
                .domain
                .unwrap_or_else(|| server.config.default_domain.clone());
            match server.tools.tool_registry(&domain).await {
                Ok(registry) => {
                    println!("{}", to_pretty_json(&json!(registry)));
                    0
                }
                Err(err) => {
                    eprintln!("{}", to_pretty_json(&ToolError::from(err).to_value()));
                    1
                }
            }
        }
    }
}

/// JSON-RPC front door shared by the stdio and HTTP transports.
pub struct McpServer {
    config: RuntimeConfig,
    tools: ContentTools,
    definitions: Vec<ToolDefinition>,
}

impl McpServer {
    pub fn new(config: RuntimeConfig) -> Self {
        let tools = ContentTools::new(
            UpstreamClient::new(config.upstream.clone()),
            config.aliases.clone(),
        );
        Self {
            config,
            tools,
            definitions: tool_definitions(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Read frames until EOF, answering each in the framing it arrived in.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), TransportError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        while let Some(frame) = read_frame(&mut reader).await? {
            let (responses, is_batch) = match frame.payload {
                Ok(incoming) => {
                    let is_batch = incoming.is_array();
                    (self.handle_incoming_message(incoming).await, is_batch)
                }
                Err(message) => (
                    vec![error_response(Value::Null, RpcError::parse_error(message))],
                    false,
                ),
            };
            write_responses(&mut writer, responses, is_batch, frame.framing).await?;
        }
        tracing::info!("stdin closed; MCP server stopping");
        Ok(())
    }

    pub async fn handle_incoming_message(&self, incoming: Value) -> Vec<Value> {
        let mut responses = Vec::new();

        if let Some(batch) = incoming.as_array() {
            if batch.is_empty() {
                responses.push(error_response(
                    Value::Null,
                    RpcError::invalid_request("Batch request must not be empty"),
                ));
                return responses;
            }
            for item in batch {
                if let Some(response) = self.handle_single_message(item.clone()).await {
                    responses.push(response);
                }
            }
            return responses;
        }

        if let Some(response) = self.handle_single_message(incoming).await {
            responses.push(response);
        }
        responses
    }

    async fn handle_single_message(&self, incoming: Value) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            // A client response; this server never issues requests.
            return None;
        };

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        match obj.get("id").cloned() {
            Some(id) => {
                let result = self.handle_request(method, params).await;
                Some(match result {
                    Ok(payload) => success_response(id, payload),
                    Err(err) => error_response(id, err),
                })
            }
            None => {
                tracing::debug!(method, "notification ignored");
                None
            }
        }
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.tools_list_payload()),
            "tools/call" => self.handle_tools_call(params).await,
            "resources/list" => Ok(self.resources_list_payload()),
            "resources/read" => self.handle_resources_read(params).await,
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn initialize_payload(&self) -> Value {
        let instructions = format!(
            "Read-only access to headless CMS content. Call get_tool_registry first: it lists every valid call for a domain (content types, aliases, redirects, search) with copy-paste examples. Content-type aliases are accepted anywhere a contentType is expected. When 'domain' is omitted, {} is used.",
            self.config.default_domain
        );
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "listChanged": false
                },
                "resources": {
                    "listChanged": false
                },
                "prompts": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": MCP_SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": instructions
        })
    }

    fn tools_list_payload(&self) -> Value {
        let tools: Vec<Value> = self
            .definitions
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let args = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "tools/call 'arguments' must be an object",
                ));
            }
        };

        let started = Instant::now();
        let result = self.execute_tool(name, &args).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        Ok(match result {
            Ok(payload) => {
                tracing::info!(tool = name, status = "complete", elapsed_ms, "tool call");
                build_tool_call_response(
                    json!({
                        "status": "complete",
                        "tool": name,
                        "data": payload
                    }),
                    false,
                )
            }
            Err(err) => {
                tracing::info!(
                    tool = name,
                    status = "error",
                    error = %err.code,
                    elapsed_ms,
                    "tool call"
                );
                build_tool_call_response(
                    json!({
                        "status": "error",
                        "tool": name,
                        "error": err.to_value()
                    }),
                    true,
                )
            }
        })
    }

    async fn execute_tool(
        &self,
        tool_name: &str,
        args: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let definition = self
            .definitions
            .iter()
            .find(|tool| tool.name == tool_name)
            .ok_or_else(|| {
                ToolError::new("unknown_tool", format!("Unknown tool '{tool_name}'"))
                    .with_docs_hint("Call tools/list, or get_tool_registry for domain-specific calls.")
            })?;
        reject_unknown_args(args, &definition.input_schema)?;

        let domain = arg_domain(args, &self.config.default_domain)?;
        let tools = &self.tools;
        let payload = match definition.kind {
            ToolKind::ListContentTypes => tools.list_content_types(&domain).await?,
            ToolKind::ListItems => {
                let content_type = required_string(args, "contentType")?;
                let limit = arg_bounded_u64(args, "limit", DEFAULT_PAGE_LIMIT, 1, MAX_PAGE_LIMIT)?;
                let offset = arg_bounded_u64(args, "offset", 0, 0, u64::MAX)?;
                tools
                    .list_items(
                        &domain,
                        &content_type,
                        to_usize(limit),
                        to_usize(offset),
                    )
                    .await?
            }
            ToolKind::GetItemBySlug => {
                let content_type = required_string(args, "contentType")?;
                let slug = required_string(args, "slug")?;
                tools.get_item_by_slug(&domain, &content_type, &slug).await?
            }
            ToolKind::GetItemById => {
                let content_type = required_string(args, "contentType")?;
                let id = required_i64(args, "id")?;
                tools.get_item_by_id(&domain, &content_type, id).await?
            }
            ToolKind::ListRedirects => tools.list_redirects(&domain).await?,
            ToolKind::LookupRedirect => {
                let from_path = required_string(args, "fromPath")?;
                tools.lookup_redirect(&domain, &from_path).await?
            }
            ToolKind::SearchContent => {
                let q = required_raw_string(args, "q")?;
                let top = arg_bounded_u64(args, "top", DEFAULT_SEARCH_TOP, 1, MAX_SEARCH_TOP)?;
                let kind = arg_optional_string(args, "type")?;
                tools
                    .search_content(&domain, &q, to_usize(top), kind.as_deref())
                    .await?
            }
            ToolKind::GetToolRegistry => json!(tools.tool_registry(&domain).await?),
        };
        Ok(payload)
    }

    fn resources_list_payload(&self) -> Value {
        let resources: Vec<Value> = resource_definitions()
            .into_iter()
            .map(|res| {
                json!({
                    "uri": res.uri,
                    "name": res.name,
                    "description": res.description,
                    "mimeType": "application/json"
                })
            })
            .collect();
        json!({ "resources": resources })
    }

    async fn handle_resources_read(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("resources/read params must be an object"))?;
        let uri = params.get("uri").and_then(Value::as_str).ok_or_else(|| {
            RpcError::invalid_params("resources/read requires string field 'uri'")
        })?;

        let domain = &self.config.default_domain;
        let content_payload = match uri {
            CONTENT_TYPES_RESOURCE => self.tools.list_content_types(domain).await,
            REDIRECTS_RESOURCE => self.tools.list_redirects(domain).await,
            _ => {
                return Err(RpcError::invalid_params(format!(
                    "Unknown resource uri '{uri}'"
                )));
            }
        }
        .map_err(|e| {
            let message = e.to_string();
            RpcError::internal(message).with_data(ToolError::from(e).to_value())
        })?;

        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": "application/json",
                "text": to_pretty_json(&content_payload)
            }]
        }))
    }
}

#[derive(Debug)]
struct RpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

impl RpcError {
    fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: format!("Parse error: {}", message.into()),
            data: None,
        }
    }

    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {method}"),
            data: None,
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
            data: None,
        }
    }

    fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Tool-level failure, surfaced inside the call envelope with `isError`.
#[derive(Debug, Clone)]
struct ToolError {
    code: String,
    message: String,
    field: Option<String>,
    docs_hint: Option<String>,
}

impl ToolError {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: None,
            docs_hint: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    fn with_docs_hint(mut self, docs_hint: impl Into<String>) -> Self {
        self.docs_hint = Some(docs_hint.into());
        self
    }

    fn to_value(&self) -> Value {
        let mut payload = json!({
            "error": self.code,
            "message": self.message
        });
        if let Some(field) = &self.field {
            payload["field"] = Value::String(field.clone());
        }
        if let Some(docs_hint) = &self.docs_hint {
            payload["docs_hint"] = Value::String(docs_hint.clone());
        }
        payload
    }
}

impl From<ContentError> for ToolError {
    fn from(err: ContentError) -> Self {
        let mut tool_error = ToolError::new(err.code(), err.to_string());
        if let Some(field) = err.field() {
            tool_error = tool_error.with_field(field);
        }
        let hint = match &err {
            ContentError::NotFound { .. } => {
                Some("Use list_items to see which slugs and ids exist for this content type.")
            }
            ContentError::Upstream { status: 404, .. } => Some(
                "The domain or content type may not exist; call list_content_types or get_tool_registry.",
            ),
            ContentError::UpstreamConnection { .. } => {
                Some("Ensure CMS_API_BASE_URL points at a reachable content API.")
            }
            _ => None,
        };
        match hint {
            Some(hint) => tool_error.with_docs_hint(hint),
            None => tool_error,
        }
    }
}

fn build_tool_call_response(envelope: Value, is_error: bool) -> Value {
    let text = to_pretty_json(&envelope);
    if is_error {
        json!({
            "isError": true,
            "content": [{ "type": "text", "text": text }],
            "structuredContent": envelope
        })
    } else {
        json!({
            "content": [{ "type": "text", "text": text }],
            "structuredContent": envelope
        })
    }
}

async fn write_responses<W>(
    writer: &mut W,
    mut responses: Vec<Value>,
    is_batch: bool,
    framing: Framing,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    // A batch is answered with a single array, never one frame per item.
    if responses.is_empty() {
        return Ok(());
    }
    if !is_batch && responses.len() == 1 {
        return write_frame(writer, &responses.remove(0), framing).await;
    }
    write_frame(writer, &Value::Array(responses), framing).await
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: Value, error: RpcError) -> Value {
    let mut payload = json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    });
    if let Some(data) = error.data {
        payload["error"]["data"] = data;
    }
    payload
}

pub fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
