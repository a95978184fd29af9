use std::sync::Arc;

use schema_resume::{SchemaBundle, Validator, diagnose, is_resume_document};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter, e.g. `schema_resume=debug`
const LOG_ENV: &str = "SCHEMA_RESUME_LOG";

/// LSP server publishing Schema Resume diagnostics.
/// Validation pipeline -> parse the buffer with serde_json (syntax error: one diagnostic, STOP)
/// -> validate against the embedded schema -> map each error's field path to a range.
///
/// Only buffers that declare a schema-resume `$schema` (or are named `*resume.json`)
/// are validated; anything else is left alone.
#[derive(Debug)]
struct Backend {
    client: Client,
    validator: Arc<Validator>,
}

impl Backend {
    async fn publish(&self, uri: Url, text: &str, version: Option<i32>) {
        if !is_resume_document(uri.path(), text) {
            debug!(uri = %uri, "Not a resume document, skipping");
            return;
        }

        let diagnostics = diagnose(&self.validator, text);
        info!(uri = %uri, count = diagnostics.len(), "Publishing diagnostics");
        self.client
            .publish_diagnostics(uri, diagnostics, version)
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "schema-resume server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        self.publish(document.uri, &document.text, Some(document.version))
            .await;
    }

    async fn did_change(&self, mut params: DidChangeTextDocumentParams) {
        // FULL sync: the last change carries the whole buffer
        let Some(change) = params.content_changes.pop() else {
            return;
        };
        self.publish(
            params.text_document.uri,
            &change.text,
            Some(params.text_document.version),
        )
        .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.client
            .publish_diagnostics(params.text_document.uri, Vec::new(), None)
            .await;
    }
}

#[tokio::main]
async fn main() {
    // stdout carries the LSP stream, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let validator = match SchemaBundle::embedded().and_then(|bundle| Validator::from_bundle(&bundle)) {
        Ok(validator) => Arc::new(validator),
        Err(e) => {
            error!(error = %e, "Failed to load embedded schema");
            std::process::exit(1);
        }
    };

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(move |client| Backend { client, validator });
    Server::new(stdin, stdout, socket).serve(service).await;
}
