use crate::demo::{
    run_demo, run_property_listing, run_queue_listing, run_search, DemoArgs, ListArgs, QueueArgs,
    SearchArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use land_registry::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Land Registry Portal",
    about = "Run the land registry portal or walk through its workflows from the terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the seeded registry records
    Registry {
        #[command(subcommand)]
        command: RegistryCommand,
    },
    /// Run a registration and a transfer end to end, then decide the queue
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum RegistryCommand {
    /// List registered properties with their status, area and registration date
    List(ListArgs),
    /// Public lookup by property id, plot number, survey number or token id
    Search(SearchArgs),
    /// List registrations waiting for an officer
    Queue(QueueArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Registry {
            command: RegistryCommand::List(args),
        } => run_property_listing(args),
        Command::Registry {
            command: RegistryCommand::Search(args),
        } => run_search(args),
        Command::Registry {
            command: RegistryCommand::Queue(args),
        } => run_queue_listing(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
