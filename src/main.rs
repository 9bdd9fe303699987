//! petmed
//!
//! An MCP server for tracking a pet's medicines, doses and health records.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing::info;
use tracing_subscriber::EnvFilter;

use petmed::config;
use petmed::db::{migrations, Database};
use petmed::mcp::PetmedService;
use petmed::session::Session;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config::DEFAULT_LOG_DIRECTIVE.parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    petmed::build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let db_path = config::database_path();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = Database::open_migrated(&db_path)?;
    let version = database.with_conn(migrations::get_schema_version)?;
    eprintln!("Database schema version: {}", version);

    // Restore the persisted session, dropping it if the token is stale
    let session = Session::init(&database)?;
    match session.current() {
        Some(auth) => info!(email = %auth.user.email, "signed in"),
        None => info!("no active session; use register or login"),
    }

    let service = PetmedService::new(db_path, database, session);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
