mod app;

use anyhow::Result;
use clap::Parser;
use serde_json::Value;

use app::{Cli, compile_request, match_document, write_output};
use tagquery::{IndexConfig, QueryCompiler};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let compiler = QueryCompiler::new(IndexConfig::load(cli.config.as_deref())?);
    let config = compiler.config();
    tracing::info!(
        "Index fields: metric={}, nid={}, endpoint={} (series limit {}, docs limit {})",
        config.fields.metric,
        config.fields.nid,
        config.fields.endpoint,
        config.limits.series,
        config.limits.docs
    );

    let compiled = compile_request(cli.kind, &cli.request, &compiler)?;
    tracing::info!("Compiled {} query: {}", cli.kind.label(), compiled.query());

    let mut out = compiled.to_json(cli.kind)?;
    if let Some(path) = &cli.match_doc {
        let matches = match_document(compiled.query(), path)?;
        if let Value::Object(map) = &mut out {
            map.insert("matches".to_string(), Value::Bool(matches));
        }
    }

    write_output(cli.output.as_deref(), &out, cli.pretty)
}
