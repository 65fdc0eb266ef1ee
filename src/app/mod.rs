use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tagquery::{
    CompiledAggregation, CompiledQuery, Document, QueryCompiler, QueryNode, evaluate,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Request shape to compile
    #[arg(short, long, value_enum)]
    pub kind: RequestKind,

    /// Request file (JSON, or YAML by extension); `-` reads stdin
    #[arg(short, long)]
    pub request: PathBuf,

    /// Index configuration file (field names and limits)
    #[arg(short, long, env = "TAGQUERY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Document (JSON object of field -> value) to test against the query
    #[arg(short, long = "match")]
    pub match_doc: Option<PathBuf>,

    /// Output file; stdout when omitted or `-`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum RequestKind {
    /// Batch of `QueryData`
    #[value(name = "data")]
    Data,
    /// `QueryDataForUi`
    #[value(name = "ui")]
    Ui,
    /// `EndpointsRecv`, aggregated to metric names
    #[value(name = "metrics")]
    Metrics,
    /// `EndpointMetricRecv`, aggregated to tag pairs
    #[value(name = "tag-pairs")]
    TagPairs,
    /// `CludeRecv`
    #[value(name = "clude")]
    Clude,
    /// `IndexByFullTagsRecv`
    #[value(name = "full-tags", alias = "fulltags")]
    FullTags,
}

impl RequestKind {
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::Data => "data",
            RequestKind::Ui => "ui",
            RequestKind::Metrics => "metrics",
            RequestKind::TagPairs => "tag-pairs",
            RequestKind::Clude => "clude",
            RequestKind::FullTags => "full-tags",
        }
    }
}

pub enum Compiled {
    Query(CompiledQuery),
    Aggregation(CompiledAggregation),
}

impl Compiled {
    pub fn query(&self) -> &QueryNode {
        match self {
            Compiled::Query(c) => &c.query,
            Compiled::Aggregation(c) => &c.query,
        }
    }

    pub fn to_json(&self, kind: RequestKind) -> Result<Value> {
        let options = match self {
            Compiled::Query(c) => serde_json::to_value(&c.options)?,
            Compiled::Aggregation(c) => serde_json::to_value(&c.options)?,
        };
        Ok(json!({
            "kind": kind.label(),
            "expr": self.query().to_string(),
            "query": serde_json::to_value(self.query())?,
            "options": options,
        }))
    }
}

fn read_source(path: &Path) -> Result<String> {
    let mut buf = String::new();
    if path == Path::new("-") {
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("CLI: Failed to read stdin")?;
    } else {
        buf = std::fs::read_to_string(path)
            .with_context(|| format!("CLI: Failed to read {:?}", path))?;
    }
    Ok(buf)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "yaml" | "yml"))
}

/// Decode a JSON or YAML file into `T`.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = read_source(path)?;
    if is_yaml(path) {
        serde_yaml::from_str(&raw).with_context(|| format!("CLI: Invalid YAML in {:?}", path))
    } else {
        serde_json::from_str(&raw).with_context(|| format!("CLI: Invalid JSON in {:?}", path))
    }
}

pub fn compile_request(kind: RequestKind, path: &Path, compiler: &QueryCompiler) -> Result<Compiled> {
    let compiled = match kind {
        RequestKind::Data => {
            let inputs: Vec<tagquery::QueryData> = read_document(path)?;
            tracing::info!("Request: {} series lookups", inputs.len());
            Compiled::Query(compiler.query_data(&inputs))
        }
        RequestKind::Ui => Compiled::Query(compiler.query_data_for_ui(&read_document(path)?)),
        RequestKind::Metrics => {
            Compiled::Aggregation(compiler.query_metrics(&read_document(path)?))
        }
        RequestKind::TagPairs => {
            Compiled::Aggregation(compiler.query_tag_pairs(&read_document(path)?))
        }
        RequestKind::Clude => {
            Compiled::Query(compiler.query_index_by_clude(&read_document(path)?))
        }
        RequestKind::FullTags => {
            Compiled::Query(compiler.query_index_by_full_tags(&read_document(path)?))
        }
    };
    Ok(compiled)
}

pub fn match_document(query: &QueryNode, path: &Path) -> Result<bool> {
    let doc: Document = read_document(path)?;
    Ok(evaluate(query, &doc))
}

pub fn write_output(output: Option<&Path>, value: &Value, pretty: bool) -> Result<()> {
    let sink: Box<dyn Write> = match output {
        None => Box::new(std::io::stdout()),
        Some(path) if path == Path::new("-") => Box::new(std::io::stdout()),
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("CLI: Failed to create {:?}", path))?,
        ),
    };
    let mut writer = BufWriter::new(sink);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
