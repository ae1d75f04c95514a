//! Sheetmap API Server binary
//!
//! HTTP REST API over the YAML schemas found in a directory.

use clap::Parser;
use royalbit_sheetmap::api::{run_api_server, ApiConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sheetmap-server")]
#[command(version)]
#[command(about = "Sheetmap API Server - Excel export and import over HTTP")]
#[command(long_about = r#"
Sheetmap API Server

Loads every *.yaml / *.yml schema in --schema-dir at startup and serves:
  - GET  /api/v1/schemas     - Names of loaded schemas
  - POST /api/v1/export      - JSON records to an .xlsx download
  - POST /api/v1/import      - Multipart .xls/.xlsx upload to JSON records
  - POST /api/v1/import/url  - Fetch a remote workbook and import it

Additional endpoints:
  - GET  /health             - Health check
  - GET  /version            - Server version info
  - GET  /                   - API documentation

Example usage:
  sheetmap-server --schema-dir ./schemas
  sheetmap-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/export \
    -H "Content-Type: application/json" \
    -d '{"schema": "employee", "file_name": "staff", "records": []}' \
    -o staff.xlsx
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SHEETMAP_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "SHEETMAP_PORT")]
    port: u16,

    /// Directory of YAML schema documents
    #[arg(short, long, default_value = "schemas", env = "SHEETMAP_SCHEMA_DIR")]
    schema_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        schema_dir: args.schema_dir,
    };

    run_api_server(config).await
}
