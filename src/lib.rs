//! # kanjiconv-mcp
//!
//! MCP (Model Context Protocol) server for converting Japanese text.
//!
//! This crate provides an MCP server exposing three tools over stdin/stdout
//! using JSON-RPC 2.0: `convert_to_hiragana`, `convert_to_katakana` and
//! `convert_to_roman`. Each takes the text plus optional converter settings
//! (`separator`, `use_custom_readings`, `use_unidic`, `sudachi_dict_type`).
//!
//! ## Features
//!
//! - **Schema driven validation**: the published input schema and argument checking share one declaration
//! - **Converter cache**: one converter per distinct configuration, built at most once even under concurrency
//! - **Errors as content**: conversion failures come back as `Error: ...` text, never as protocol faults
//!
//! ## Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "kanjiconv": {
//!       "command": "/path/to/kanjiconv-mcp",
//!       "args": ["--dict-dir", "/path/to/dictionaries"]
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use kanjiconv_mcp::{McpServer, ServerConfig, ServerContext};
//!
//! # async fn run() -> kanjiconv_mcp::Result<()> {
//! let context = ServerContext::with_lexicons(ServerConfig::default());
//! context.warm().await?;
//! let mut server = McpServer::new(context);
//!
//! // Reads from stdin, writes to stdout
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod context;
pub mod converter;
pub mod dispatch;
mod error;
mod server;
pub mod tools;

pub use cache::ConverterCache;
pub use context::{ServerConfig, ServerContext};
pub use converter::{ConverterFactory, DictType, ResolvedConfig, TextConverter};
pub use dispatch::{Dispatcher, ResultEnvelope};
pub use error::{rpc_codes, McpError, Result};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use tools::{ConversionTool, ConvertRequest, ToolDef, ToolRegistry};
