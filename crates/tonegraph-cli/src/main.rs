use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tonegraph_client::{
    AudioInput, ClientConfig, ClientError, GraphBackend, GraphSession, HttpBackend,
};
use tonegraph_dsp::response_for_node;
use tonegraph_graph::{default_graph, resolve_edges, validate, Graph, SignalRegistry};
use tracing_subscriber::EnvFilter;

mod output;

use output::OutputFormat;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let backend = cli.backend;

    match cli.command {
        Commands::Edges(args) => execute_edges(args),
        Commands::Validate(args) => execute_validate(args),
        Commands::Response(args) => execute_response(args),
        Commands::DefaultGraph(args) => execute_default_graph(args),
        Commands::Fetch(args) => block_on(execute_fetch(args, backend.config())),
        Commands::Push(args) => block_on(execute_push(args, backend.config())),
        Commands::Watch => block_on(execute_watch(backend.config())),
        Commands::Render(args) => block_on(execute_render(args, backend.config())),
        Commands::Source(args) => block_on(execute_source(args, backend.config())),
    }
}

fn block_on(task: impl Future<Output = Result<()>>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(task)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

#[derive(Parser)]
#[command(author, version, about = "Signal-flow graph tools and backend client for tonegraph")]
struct Cli {
    /// Log at debug level regardless of RUST_LOG.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(flatten)]
    backend: BackendArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the edges derived from matching port numbers.
    Edges(EdgesArgs),
    /// Check a graph for structural problems.
    Validate(GraphFileArgs),
    /// Print the frequency response of a Biquad or ParametricEq node.
    Response(ResponseArgs),
    /// Print the default stereo compressor graph.
    DefaultGraph(OutArgs),
    /// Fetch the session graph from the backend.
    Fetch(OutArgs),
    /// Replace the session graph on the backend.
    Push(GraphFileArgs),
    /// Print graph snapshots pushed by the backend until the stream ends.
    Watch,
    /// Run recordings through the session graph on the backend.
    Render(RenderArgs),
    /// Download the generated source archive for the session graph.
    Source(SourceArgs),
}

#[derive(Args)]
struct BackendArgs {
    /// Backend base URL. Overrides TONEGRAPH_BACKEND_URL.
    #[arg(long, global = true)]
    backend: Option<String>,
    /// Session id. Overrides TONEGRAPH_SESSION.
    #[arg(long, global = true)]
    session: Option<String>,
}

impl BackendArgs {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::load();
        if let Some(url) = &self.backend {
            config = config.with_base_url(url.clone());
        }
        if let Some(session) = &self.session {
            config = config.with_session_id(session.clone());
        }
        config
    }
}

#[derive(Args)]
struct GraphFileArgs {
    /// Graph JSON file.
    graph: PathBuf,
}

#[derive(Args)]
struct EdgesArgs {
    /// Graph JSON file.
    graph: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args)]
struct ResponseArgs {
    /// Graph JSON file.
    graph: PathBuf,
    /// Name of the node to analyse.
    #[arg(long)]
    node: String,
    /// Defaults to the graph's sample rate.
    #[arg(long)]
    sample_rate: Option<f64>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args)]
struct OutArgs {
    /// Write the graph here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct RenderArgs {
    /// Recording for a graph input, as NAME=FILE.wav. Repeat per input.
    #[arg(long = "input", value_parser = parse_input, required = true)]
    inputs: Vec<(String, PathBuf)>,
    /// Zip archive receiving the rendered outputs.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args)]
struct SourceArgs {
    /// Directory receiving the archive.
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

fn parse_input(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=FILE, got `{value}`")),
    }
}

fn load_graph(path: &Path) -> Result<Graph> {
    let data = fs::read(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    Graph::from_slice(&data)
        .with_context(|| format!("{} is not a valid graph file", path.display()))
}

fn write_graph(graph: &Graph, out: Option<&Path>) -> Result<()> {
    let json = graph.to_json_pretty()?;
    match out {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn execute_edges(args: EdgesArgs) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    let edges = resolve_edges(&graph);
    print!("{}", output::edges(&edges, args.format)?);

    let registry = SignalRegistry::build(&graph);
    for (port, signal) in registry.unbound_consumers() {
        tracing::warn!(
            signal,
            consumer = %port.endpoint,
            port = port.port,
            "signal already bound to an earlier consumer"
        );
    }
    Ok(())
}

fn execute_validate(args: GraphFileArgs) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    match validate(&graph) {
        Ok(()) => {
            println!("Graph '{}' is valid ({} nodes)", graph.name, graph.nodes.len());
            Ok(())
        }
        Err(errors) => {
            eprint!("{}", output::validation(&errors));
            bail!("graph '{}' has {} problem(s)", graph.name, errors.len())
        }
    }
}

fn execute_response(args: ResponseArgs) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    let node = graph
        .node(&args.node)
        .ok_or_else(|| anyhow!("graph '{}' has no node named '{}'", graph.name, args.node))?;
    let sample_rate = args
        .sample_rate
        .unwrap_or_else(|| f64::from(graph.sample_rate));
    let response = response_for_node(node, sample_rate)
        .ok_or_else(|| anyhow!("{} node '{}' has no frequency response", node.kind(), args.node))?
        .with_context(|| format!("node '{}' has invalid filter parameters", args.node))?;
    print!("{}", output::response(&response, args.format)?);
    Ok(())
}

fn execute_default_graph(args: OutArgs) -> Result<()> {
    write_graph(&default_graph(), args.out.as_deref())
}

fn connect(config: &ClientConfig) -> Result<Arc<HttpBackend>> {
    let backend = HttpBackend::new(config.clone())?;
    tracing::debug!(backend = %config.base_url, session = %config.session_id, "using backend");
    Ok(Arc::new(backend))
}

async fn execute_fetch(args: OutArgs, config: ClientConfig) -> Result<()> {
    let backend = connect(&config)?;
    let graph = backend.fetch_graph().await?;
    write_graph(&graph, args.out.as_deref())
}

async fn execute_push(args: GraphFileArgs, config: ClientConfig) -> Result<()> {
    let graph = load_graph(&args.graph)?;
    if let Err(errors) = validate(&graph) {
        tracing::warn!(problems = errors.len(), "pushing a graph that fails validation");
    }
    let backend = connect(&config)?;
    let accepted = backend.push_graph(&graph).await?;
    println!(
        "Pushed graph '{}' ({} nodes)",
        accepted.name,
        accepted.nodes.len()
    );
    Ok(())
}

async fn execute_watch(config: ClientConfig) -> Result<()> {
    let backend = connect(&config)?;
    watch(&*backend).await
}

async fn execute_render(args: RenderArgs, config: ClientConfig) -> Result<()> {
    let mut inputs = Vec::with_capacity(args.inputs.len());
    for (name, path) in &args.inputs {
        let wav = fs::read(path)
            .with_context(|| format!("failed to read recording {}", path.display()))?;
        let mut input = AudioInput::new(name.clone(), wav);
        if let Some(file_name) = path.file_name() {
            input.file_name = file_name.to_string_lossy().into_owned();
        }
        inputs.push(input);
    }
    let session = GraphSession::connect(connect(&config)?, &config, Default::default()).await?;
    let archive = session.render(inputs).await?;
    fs::write(&args.out, &archive)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    println!("Rendered outputs written to {}", args.out.display());
    Ok(())
}

async fn execute_source(args: SourceArgs, config: ClientConfig) -> Result<()> {
    let session = GraphSession::connect(connect(&config)?, &config, Default::default()).await?;
    let (name, archive) = session.download_source().await?;
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let path = args.out.join(name);
    fs::write(&path, &archive).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Source archive written to {}", path.display());
    Ok(())
}

async fn watch<B: GraphBackend>(backend: &B) -> Result<()> {
    let mut updates = backend.subscribe().await?;
    while let Some(update) = updates.recv().await {
        match update {
            Ok(graph) => println!(
                "Graph '{}': {} nodes, {} edges",
                graph.name,
                graph.nodes.len(),
                resolve_edges(&graph).len()
            ),
            Err(err @ ClientError::MalformedUpdate { .. }) => {
                tracing::warn!(%err, "skipping graph update");
            }
            Err(err) => return Err(err.into()),
        }
    }
    println!("Update stream closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn input_pairs_need_a_name_and_a_file() {
        assert_eq!(
            parse_input("audio_in=take1.wav").unwrap(),
            ("audio_in".to_string(), PathBuf::from("take1.wav"))
        );
        assert!(parse_input("take1.wav").is_err());
        assert!(parse_input("=take1.wav").is_err());
    }

    #[test]
    fn response_flags_parse() {
        let cli = Cli::try_parse_from([
            "tonegraph",
            "response",
            "graph.json",
            "--node",
            "StereoEQ",
            "--format",
            "csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Response(args) => {
                assert_eq!(args.node, "StereoEQ");
                assert_eq!(args.format, OutputFormat::Csv);
                assert_eq!(args.sample_rate, None);
            }
            _ => panic!("expected the response command"),
        }
    }
}
