use anyhow::{Context, Result};
use clap::Parser;
use gsheet_report::{
    fetch::{
        self, sheets::REQUEST_TIMEOUT, CredentialProvider, GoogleSheets, SheetSource,
        SnapshotSource, StaticToken, TokenCache,
    },
    mapping::{ColumnMapping, Mapping},
    pipeline::{self, SheetStatus},
};
use reqwest::blocking::Client;
use std::{env, path::PathBuf};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Convert a linked household registration sheet into a formatted xlsx report"
)]
struct Args {
    /// `.gsheet` pointer file holding the spreadsheet `doc_id`
    input: PathBuf,
    /// Output workbook path
    #[arg(default_value = "output.xlsx")]
    output: PathBuf,
    /// Column mapping (YAML or JSON); the built-in form layout when omitted
    #[arg(long, env = "GSHEET_MAPPING")]
    mapping: Option<PathBuf>,
    /// Read sheet values from a local snapshot instead of the Sheets API
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Also save the fetched sheet values as a snapshot
    #[arg(long)]
    dump_snapshot: Option<PathBuf>,
    /// Cached OAuth token file (refreshed in place when expired)
    #[arg(long, env = "GOOGLE_TOKEN_FILE", default_value = "token.json")]
    token_file: PathBuf,
    /// Bearer token to use as-is, bypassing the token file
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

fn load_mapping(path: Option<&PathBuf>) -> Result<Mapping> {
    let raw = match path {
        Some(p) => {
            info!("loading column mapping from {}", p.display());
            ColumnMapping::from_path(p)?
        }
        None => ColumnMapping::default(),
    };
    Ok(raw.resolve()?)
}

fn convert<S: SheetSource>(source: &S, doc_id: &str, mapping: &Mapping, args: &Args) -> Result<()> {
    let summary = match &args.dump_snapshot {
        Some(dump) => pipeline::run_with_snapshot(source, doc_id, mapping, &args.output, dump)?,
        None => pipeline::run(source, doc_id, mapping, &args.output)?,
    };
    for sheet in &summary.sheets {
        match &sheet.status {
            SheetStatus::Written {
                worksheet,
                households,
                people,
                duplicates,
                failed_rows,
            } => info!(
                sheet = %sheet.title,
                %worksheet,
                households,
                people,
                duplicates,
                failed_rows,
                "written"
            ),
            SheetStatus::Skipped(reason) => warn!(sheet = %sheet.title, %reason, "skipped"),
        }
    }
    info!(
        "successfully converted {} to {}",
        args.input.display(),
        args.output.display()
    );
    info!("total sheets processed: {}", summary.processed());
    Ok(())
}

fn main() -> Result<()> {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    let args = Args::parse();
    let mapping = load_mapping(args.mapping.as_ref())?;
    let doc_id = fetch::read_doc_id(&args.input)?;
    info!(%doc_id, "spreadsheet");

    let result = if let Some(snap) = &args.snapshot {
        let source = SnapshotSource::load(snap)?;
        convert(&source, &doc_id, &mapping, &args)
    } else {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        let credentials: Box<dyn CredentialProvider> = match &args.access_token {
            Some(token) => Box::new(StaticToken(token.clone())),
            None => Box::new(TokenCache::load(&args.token_file, client.clone()).with_context(
                || {
                    format!(
                        "no usable credentials; authorize scope {} and save the token to {}",
                        fetch::auth::SCOPE_READONLY,
                        args.token_file.display()
                    )
                },
            )?),
        };
        let source = GoogleSheets::new(client, credentials)?;
        convert(&source, &doc_id, &mapping, &args)
    };

    if let Err(e) = &result {
        error!("an error occurred: {:#}", e);
    }
    result
}
