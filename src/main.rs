//! askdb - ask questions about your data in plain language.

use askdb::cli::Cli;
use askdb::config::Config;
use askdb::db::{self, DatabaseClient, MockDatabaseClient};
use askdb::error::{AskError, Result};
use askdb::llm::{self, LlmProvider};
use askdb::logging;
use askdb::pipeline::{Outcome, Pipeline};
use askdb::question::Question;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Environment file first, so RUST_LOG from it takes effect too.
    dotenvy::dotenv().ok();
    logging::init_stderr_logging();

    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse_args();

    // Empty input never reaches the pipeline.
    let question = match cli.question.as_deref().map(Question::new) {
        Some(Ok(q)) => q,
        _ => {
            println!("Please enter a question.");
            return Ok(2);
        }
    };

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let provider: LlmProvider = cli
        .provider
        .as_deref()
        .unwrap_or(&config.llm.provider)
        .parse()
        .map_err(AskError::config)?;
    let model = cli.model.clone().or_else(|| config.llm.model.clone());
    let sample_rows = cli.sample_rows.unwrap_or(config.llm.sample_rows);

    // Credential check happens here, before any network activity.
    let llm_client = llm::create_client(provider, None, model)?;

    let db_client: Box<dyn DatabaseClient> = if cli.mock_db {
        Box::new(MockDatabaseClient::new())
    } else {
        let mut conn = config.connection.clone();
        if let Some(cli_conn) = cli.to_connection_config()? {
            conn.merge(&cli_conn);
        }
        conn.apply_env_defaults();
        info!("Connection: {}", conn.display_string());
        db::connect(&conn, sample_rows).await?
    };

    let pipeline = Pipeline::new(llm_client.as_ref(), db_client.as_ref());
    let outcome = pipeline.run(&question).await;

    let code = match outcome {
        Outcome::Done(answer) => {
            println!("Generated SQL:");
            println!("{}", answer.query);
            println!();
            println!("Query Result:");
            println!("{}", answer.result.render_text());
            if let Some(warning) = answer.result.truncation_warning() {
                println!("{warning}");
            }
            if !answer.table_schemas.is_empty() {
                println!();
                println!("Schema of Used Tables:");
                for (_, schema_text) in &answer.table_schemas {
                    println!();
                    print!("{schema_text}");
                }
            }
            0
        }
        Outcome::Failed {
            error,
            attempted_query,
        } => {
            if let Some(query) = attempted_query {
                println!("Generated SQL:");
                println!("{query}");
                println!();
            }
            eprintln!("{}: {}", error.category(), error);
            1
        }
    };

    let _ = db_client.close().await;
    Ok(code)
}
