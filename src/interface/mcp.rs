//! MCP Server for wishlist-libraries
//!
//! MCP Protocol (stdio) <-> application::WishlistService / PageService
//!
//! 6 tools: libraries, wishlist, recommend, holdings, set_preferred_branches, render_page

use std::path::PathBuf;

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{service_for_dir, JsonWishlistService};
use crate::application::error::AppError;
use crate::application::page::{PageConfig, PageFormat, PageService};

// =============================================================================
// Public entry point
// =============================================================================

/// MCP Serverを起動する。data_dirにwishlist.json / library.json / libraries.jsonを置く。
pub async fn run(data_dir: PathBuf) -> anyhow::Result<()> {
    tracing::info!(data_dir = %data_dir.display(), "starting MCP server");
    let server = WishlistMcpServer::new(data_dir);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct WishlistMcpServer {
    data_dir: PathBuf,
    tool_router: ToolRouter<Self>,
}

impl WishlistMcpServer {
    fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            tool_router: Self::tool_router(),
        }
    }

    fn service(&self) -> JsonWishlistService {
        service_for_dir(&self.data_dir)
    }

    /// 参照ミスは invalid_params、それ以外は internal_error。
    fn to_mcp_error(e: AppError) -> McpError {
        match e {
            AppError::ItemNotFound(_) | AppError::AmbiguousItem { .. } | AppError::Domain(_) => {
                McpError::invalid_params(format!("{e}"), None)
            }
            other => McpError::internal_error(format!("{other}"), None),
        }
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for WishlistMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "wishlist-libraries".to_string(),
                title: Some("Wishlist Libraries — best branch per wishlist item".to_string()),
                description: Some(
                    "Wishlist merged with library holdings by ISBN. \
                     2-step workflow: `wishlist` → pick number → `recommend`."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Find which library branch to visit for each wishlist item.\n\
                 \n\
                 Tools: `wishlist` → `recommend` / `holdings` for one item. \
                 `libraries` and `set_preferred_branches` manage branch preferences. \
                 `render_page` writes the full HTML page."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

/// filenameにパス区切り文字や".."が含まれていないことを検証する。
fn validate_filename(filename: &str) -> Result<(), McpError> {
    if filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
        || filename.is_empty()
    {
        return Err(McpError::invalid_params(
            "filename must not contain path separators, '..', or be empty",
            None,
        ));
    }
    Ok(())
}

/// タイトルをファイル名に安全な文字列に変換する。
/// 英数字と`-`以外を`_`に置換し、連続`_`を圧縮、先頭末尾の`_`を除去する。
fn sanitize_for_filename(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_underscore = true; // true開始で先頭`_`を除去
    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            result.push(c);
            prev_underscore = false;
        } else if !prev_underscore {
            result.push('_');
            prev_underscore = true;
        }
    }

    while result.ends_with('_') {
        result.pop();
    }

    if result.is_empty() {
        "wishlist".to_string()
    } else {
        result
    }
}

fn parse_page_format(s: Option<&str>) -> Result<PageFormat, McpError> {
    match s {
        Some("html") | None => Ok(PageFormat::Html),
        Some("json") => Ok(PageFormat::Json),
        Some(other) => Err(McpError::invalid_params(
            format!("Unknown format: '{other}'. Use: html, json"),
            None,
        )),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpLibrariesRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpWishlistRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpItemRequest {
    #[schemars(
        description = "Item number from `wishlist` output (e.g. '3'), an ISBN, or a title fragment. A number beyond the list length is searched as a title (e.g. '1984')"
    )]
    pub item: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpSetPreferredBranchesRequest {
    #[schemars(description = "Library system name as shown by `libraries` (e.g. 'Minuteman')")]
    pub library: String,
    #[schemars(
        description = "Preferred branches, most preferred first (e.g. ['CAMBRIDGE', 'INTERNET'])"
    )]
    pub branches: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpRenderPageRequest {
    #[schemars(description = "Output directory path (default: the data directory)")]
    pub output_dir: Option<String>,
    #[schemars(description = "Output filename (default: '<title>.html')")]
    pub filename: Option<String>,
    #[schemars(description = "Page title (default: 'Library Wishlist')")]
    pub title: Option<String>,
    #[schemars(description = "Output format: 'html' (default) or 'json'")]
    pub format: Option<String>,
}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl WishlistMcpServer {
    #[tool(
        name = "libraries",
        description = "List configured library systems with their preferred branches, most preferred first.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn libraries(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpLibrariesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let prefs = self.service().preferences().map_err(Self::to_mcp_error)?;

        let mut output = format!("# Libraries ({})\n\n", prefs.libraries().len());
        for (i, pref) in prefs.libraries().iter().enumerate() {
            let branches = if pref.preferred_branches().is_empty() {
                "(no preferred branches)".to_string()
            } else {
                pref.preferred_branches().join(" > ")
            };
            output.push_str(&format!("{}. {} — {}\n", i + 1, pref.library(), branches));
        }

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "wishlist",
        description = "Show the wishlist in order with numbered items and the branches to visit for each. Run this first — use the numbers with `recommend` and `holdings`.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn wishlist(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpWishlistRequest>,
    ) -> Result<CallToolResult, McpError> {
        let report = self.service().report().map_err(Self::to_mcp_error)?;

        if report.items.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                "Wishlist is empty. Run the wishlist scraper to produce wishlist.json.",
            )]));
        }

        Ok(CallToolResult::success(vec![Content::text(
            PageService::render_summary(&report),
        )]))
    }

    #[tool(
        name = "recommend",
        description = "Show the ranked branch recommendation of every library for one item. Specify the item by number from `wishlist` output (e.g. '3'), ISBN, or title fragment.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn recommend(
        &self,
        Parameters(req): Parameters<McpItemRequest>,
    ) -> Result<CallToolResult, McpError> {
        let (position, row) = self
            .service()
            .item_report(&req.item)
            .map_err(Self::to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::text(
            PageService::render_item_detail(position, &row),
        )]))
    }

    #[tool(
        name = "holdings",
        description = "List the raw holdings scraped for one item, grouped by library. Specify the item by number from `wishlist` output, ISBN, or title fragment.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn holdings(
        &self,
        Parameters(req): Parameters<McpItemRequest>,
    ) -> Result<CallToolResult, McpError> {
        let (position, item, holdings) = self
            .service()
            .item_holdings(&req.item)
            .map_err(Self::to_mcp_error)?;

        let mut output = format!(
            "# {}. {} ({} holdings)\n",
            position,
            item.title(),
            holdings.len()
        );

        let mut current_library: Option<&str> = None;
        for h in &holdings {
            if current_library != Some(h.library()) {
                output.push_str(&format!("\n## {}\n", h.library()));
                current_library = Some(h.library());
            }
            let status = if h.is_available() {
                "available"
            } else {
                "checked out"
            };
            let location = h.call_number().or(h.digital_url()).unwrap_or("?");
            output.push_str(&format!("- {} — {} — {}", h.branch(), location, status));
            if let Some(collection) = h.collection() {
                output.push_str(&format!(" ({collection})"));
            }
            output.push('\n');
        }

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "set_preferred_branches",
        description = "Replace the preferred branch list of one library (most preferred first). Affects every recommendation. Persisted to libraries.json.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn set_preferred_branches(
        &self,
        Parameters(req): Parameters<McpSetPreferredBranchesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let prefs = self
            .service()
            .set_preferred_branches(&req.library, req.branches)
            .map_err(Self::to_mcp_error)?;

        let branches = prefs
            .get(&req.library)
            .map(|p| p.preferred_branches().join(" > "))
            .unwrap_or_default();

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Updated: {} — {}",
            req.library, branches
        ))]))
    }

    #[tool(
        name = "render_page",
        description = "Write the full wishlist page (every item, every library) as HTML or JSON. Input files are NOT modified.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn render_page(
        &self,
        Parameters(req): Parameters<McpRenderPageRequest>,
    ) -> Result<CallToolResult, McpError> {
        let format = parse_page_format(req.format.as_deref())?;
        let title = req
            .title
            .unwrap_or_else(|| "Library Wishlist".to_string());

        let filename = req
            .filename
            .unwrap_or_else(|| format!("{}.{}", sanitize_for_filename(&title), format.extension()));
        validate_filename(&filename)?;

        let output_dir = req
            .output_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| self.data_dir.clone());

        let svc = self.service();
        let report = svc.report().map_err(Self::to_mcp_error)?;
        let prefs = svc.preferences().map_err(Self::to_mcp_error)?;

        let config = PageConfig {
            output_dir,
            filename,
            title,
            format,
        };
        let path = PageService::publish(&report, &prefs, &config).map_err(Self::to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Page with {} items written to: {}",
            report.items.len(),
            path.display()
        ))]))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_page_format_valid() {
        assert_eq!(parse_page_format(None).unwrap(), PageFormat::Html);
        assert_eq!(parse_page_format(Some("html")).unwrap(), PageFormat::Html);
        assert_eq!(parse_page_format(Some("json")).unwrap(), PageFormat::Json);
    }

    #[test]
    fn parse_page_format_invalid() {
        assert!(parse_page_format(Some("markdown")).is_err());
    }

    #[test]
    fn server_info() {
        let server = WishlistMcpServer::new(PathBuf::from("/tmp/test-wishlist"));
        let info = server.get_info();
        assert_eq!(info.server_info.name, "wishlist-libraries");
        assert!(!info.server_info.version.is_empty());
    }

    #[test]
    fn item_request_parse() {
        let req: McpItemRequest = serde_json::from_str(r#"{"item": "3"}"#).unwrap();
        assert_eq!(req.item, "3");
    }

    #[test]
    fn set_preferred_branches_request_parse() {
        let req: McpSetPreferredBranchesRequest = serde_json::from_str(
            r#"{"library": "Minuteman", "branches": ["SOMERVILLE", "INTERNET"]}"#,
        )
        .unwrap();
        assert_eq!(req.library, "Minuteman");
        assert_eq!(req.branches, vec!["SOMERVILLE", "INTERNET"]);
    }

    #[test]
    fn render_page_request_defaults() {
        let req: McpRenderPageRequest = serde_json::from_str("{}").unwrap();
        assert!(req.output_dir.is_none());
        assert!(req.filename.is_none());
        assert!(req.title.is_none());
        assert!(req.format.is_none());
    }

    #[test]
    fn empty_requests_parse() {
        let _libraries: McpLibrariesRequest = serde_json::from_str("{}").unwrap();
        let _wishlist: McpWishlistRequest = serde_json::from_str("{}").unwrap();
    }

    #[test]
    fn validate_filename_rejects_paths() {
        assert!(validate_filename("wishlist.html").is_ok());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("../wishlist.html").is_err());
        assert!(validate_filename("out/wishlist.html").is_err());
        assert!(validate_filename("out\\wishlist.html").is_err());
    }

    #[test]
    fn sanitize_basic_title() {
        assert_eq!(sanitize_for_filename("Library Wishlist"), "Library_Wishlist");
    }

    #[test]
    fn sanitize_collapses_and_strips() {
        assert_eq!(sanitize_for_filename("  Books / 2016!! "), "Books_2016");
        assert_eq!(sanitize_for_filename("../.."), "wishlist");
    }

    #[test]
    fn to_mcp_error_maps_lookup_failures_to_invalid_params() {
        let err = WishlistMcpServer::to_mcp_error(AppError::ItemNotFound("x".into()));
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);

        let err = WishlistMcpServer::to_mcp_error(AppError::PageIo(std::io::Error::other("disk")));
        assert_eq!(err.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
    }
}
