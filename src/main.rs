use std::sync::Arc;

use tower_lsp::Server;
use tracing_subscriber::EnvFilter;
use x_element_lsp::server::build_service;
use x_element_lsp::session::Session;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = build_service(Arc::new(Session::new()));

    Server::new(stdin, stdout, socket).serve(service).await;
}
