use clap::{Parser, Subcommand};
use dotenv::dotenv;
use stategraph::server;
use stategraph::tools::register_tools;
use stategraph::workflow::executor::{ExecutorConfig, DEFAULT_LOOP_CAP};
use stategraph::workflow::graph::GraphDef;
use stategraph::workflow::registry::ToolRegistry;
use stategraph::workflow::state::WorkflowState;
use stategraph::workflow::store::WorkflowService;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,

        /// Maximum revisits to a single node within one run
        #[arg(long)]
        loop_cap: Option<u32>,
    },
    /// Execute a graph definition file once and print the run record
    Run {
        /// Path to the graph definition (YAML or JSON)
        #[arg(short, long)]
        file: String,

        /// Initial state as a JSON object
        #[arg(short, long, default_value = "{}")]
        state: String,

        /// Maximum revisits to a single node within one run
        #[arg(long)]
        loop_cap: Option<u32>,
    },
}

fn executor_config(flag: Option<u32>) -> ExecutorConfig {
    let loop_cap = flag
        .or_else(|| {
            std::env::var("STATEGRAPH_LOOP_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
        })
        .unwrap_or(DEFAULT_LOOP_CAP);
    ExecutorConfig { loop_cap }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Serve { port, loop_cap } => {
            let registry = ToolRegistry::new();
            register_tools(&registry).await;

            let service = WorkflowService::new(registry, executor_config(loop_cap));
            server::serve(port, service).await?;
        }
        Commands::Run {
            file,
            state,
            loop_cap,
        } => {
            let registry = ToolRegistry::new();
            register_tools(&registry).await;

            let content = tokio::fs::read_to_string(&file).await?;
            let def: GraphDef = serde_yaml::from_str(&content)?;
            let initial: WorkflowState = serde_json::from_str(&state)?;

            let service = WorkflowService::new(registry, executor_config(loop_cap));
            let graph_id = service.create_graph(def).await?;

            log::info!("executing graph {} from {}", graph_id, file);
            let record = service.run_graph(graph_id, initial).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}
