//! Protocol server: a persistent Unix-domain-socket endpoint.
//!
//! One JSON object per request line, one per response line. The listening
//! endpoint outlives connections and requests; it owns the `Engine`, so the
//! token cache persists across requests and repeated analyses of an
//! unchanged corpus stay cheap. Connections are served sequentially — an
//! in-flight `analyze` owns the worker pool, so a second connection queues
//! at accept rather than interleaving pool usage.
//!
//! Per-connection lifecycle: accept, loop (read line, dispatch, write
//! line), close. `shutdown` acknowledges, then the endpoint stops
//! accepting, finishes the current connection, removes the socket file, and
//! returns.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::core::{Error, FileSet, Result};
use crate::engine::{self, Engine, TokenCache};

/// Stable protocol error codes.
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// The listening endpoint.
pub struct Server {
    engine: Engine,
    config: Config,
    socket: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Request {
    id: String,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl Response {
    fn success(id: String, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: String, error: RpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

impl RpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    root: PathBuf,
    #[serde(default)]
    extensions: Vec<String>,
    min_tokens: Option<usize>,
    min_similarity: Option<f64>,
    type3: Option<bool>,
    threads: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CompareParams {
    file1: PathBuf,
    file2: PathBuf,
    min_similarity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HotspotsParams {
    root: PathBuf,
    #[serde(default)]
    extensions: Vec<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct FileClonesParams {
    root: PathBuf,
    file: PathBuf,
    #[serde(default)]
    extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FileTreeParams {
    root: PathBuf,
    #[serde(default)]
    extensions: Vec<String>,
}

impl Server {
    /// Build a server from config; `socket` overrides the configured path.
    pub fn new(config: Config, socket: Option<PathBuf>) -> Self {
        let socket = socket.unwrap_or_else(|| config.server.socket.clone());
        let engine = Engine::with_cache(TokenCache::new(config.cache.capacity));
        Self {
            engine,
            config,
            socket,
        }
    }

    /// Bind and serve until `shutdown`. A bind failure is the only fatal
    /// error; everything after that is answered on the wire.
    pub fn run(&self) -> Result<()> {
        // A stale socket file from a dead process blocks bind; clear it.
        if self.socket.exists() {
            std::fs::remove_file(&self.socket)?;
        }
        let listener = UnixListener::bind(&self.socket).map_err(|e| {
            Error::server(format!("cannot bind {}: {e}", self.socket.display()))
        })?;
        tracing::info!("listening on {}", self.socket.display());

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if self.serve_connection(stream) {
                        break;
                    }
                }
                Err(e) => tracing::warn!("accept failed: {e}"),
            }
        }

        let _ = std::fs::remove_file(&self.socket);
        tracing::info!("server drained; exiting");
        Ok(())
    }

    /// Serve one connection to completion. Returns true once `shutdown`
    /// has been acknowledged.
    fn serve_connection(&self, stream: UnixStream) -> bool {
        let mut writer = match stream.try_clone() {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!("connection setup failed: {e}");
                return false;
            }
        };
        let reader = BufReader::new(stream);
        let mut shutdown = false;

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("connection read failed: {e}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line, &mut shutdown);
            if write_response(&mut writer, &response).is_err() {
                // The caller went away; completed work is simply dropped.
                tracing::warn!("connection write failed; abandoning response");
                break;
            }
            if shutdown {
                break;
            }
        }

        shutdown
    }

    fn handle_line(&self, line: &str, shutdown: &mut bool) -> Response {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Response::failure(
                    String::new(),
                    RpcError::new(PARSE_ERROR, format!("parse error: {e}")),
                );
            }
        };

        // Salvage the id before strict envelope validation so the caller
        // can correlate the error.
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let request: Request = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Response::failure(
                    id,
                    RpcError::new(INVALID_REQUEST, format!("invalid request: {e}")),
                );
            }
        };

        if request.method == "shutdown" {
            *shutdown = true;
            return Response::success(request.id, json!({"status": "shutting_down"}));
        }

        match self.dispatch(&request.method, request.params) {
            Ok(result) => Response::success(request.id, result),
            Err(error) => Response::failure(request.id, error),
        }
    }

    fn dispatch(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError> {
        match method {
            "analyze" => self.handle_analyze(params),
            "compare_files" => self.handle_compare(params),
            "get_hotspots" => self.handle_hotspots(params),
            "get_file_clones" => self.handle_file_clones(params),
            "file_tree" => self.handle_file_tree(params),
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("unknown method: {other}"),
            )),
        }
    }

    fn handle_analyze(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let p: AnalyzeParams = parse_params(params)?;
        let mut options = self.config.engine.to_options();
        if let Some(min_tokens) = p.min_tokens {
            options.min_tokens = min_tokens;
        }
        if let Some(min_similarity) = p.min_similarity {
            options.min_similarity = min_similarity;
        }
        if let Some(type3) = p.type3 {
            options.type3 = type3;
        }
        if let Some(threads) = p.threads {
            options.threads = threads;
        }

        let set = self.file_set(&p.root, &p.extensions)?;
        let report = self.engine.analyze(&set, &options).map_err(internal)?;
        serde_json::to_value(report).map_err(|e| internal(Error::from(e)))
    }

    fn handle_compare(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let p: CompareParams = parse_params(params)?;
        let mut options = self.config.engine.to_options();
        if let Some(min_similarity) = p.min_similarity {
            options.min_similarity = min_similarity;
        }

        let report = self
            .engine
            .compare_files(&p.file1, &p.file2, &options)
            .map_err(|e| match e {
                Error::FileNotFound { .. } | Error::UnsupportedLanguage { .. } => {
                    RpcError::new(INVALID_PARAMS, e.to_string())
                }
                other => internal(other),
            })?;
        serde_json::to_value(report).map_err(|e| internal(Error::from(e)))
    }

    fn handle_hotspots(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let p: HotspotsParams = parse_params(params)?;
        let options = self.config.engine.to_options();
        let set = self.file_set(&p.root, &p.extensions)?;
        let report = self
            .engine
            .hotspots(&set, &options, p.limit.unwrap_or(10))
            .map_err(internal)?;
        serde_json::to_value(report.hotspots).map_err(|e| internal(Error::from(e)))
    }

    fn handle_file_clones(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let p: FileClonesParams = parse_params(params)?;
        let options = self.config.engine.to_options();
        let set = self.file_set(&p.root, &p.extensions)?;
        let report = self
            .engine
            .file_clones(&set, &p.file, &options)
            .map_err(internal)?;
        serde_json::to_value(report.clones).map_err(|e| internal(Error::from(e)))
    }

    fn handle_file_tree(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let p: FileTreeParams = parse_params(params)?;
        let set = self.file_set(&p.root, &p.extensions)?;
        let paths: Vec<String> = engine::file_tree(&set)
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        Ok(json!({ "files": paths }))
    }

    fn file_set(
        &self,
        root: &std::path::Path,
        extensions: &[String],
    ) -> std::result::Result<FileSet, RpcError> {
        FileSet::from_path_filtered(root, extensions, &self.config.exclude_patterns)
            .map_err(|e| RpcError::new(INVALID_PARAMS, format!("root: {e}")))
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> std::result::Result<T, RpcError> {
    serde_json::from_value(params)
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("invalid params: {e}")))
}

fn internal(e: Error) -> RpcError {
    RpcError::new(INTERNAL_ERROR, e.to_string())
}

fn write_response(writer: &mut UnixStream, response: &Response) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, response)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    writeln!(writer)?;
    writer.flush()
}
