use clap::Parser;
use tailwind_config::{
    handle_check_command, handle_files_command, handle_show_command, run_scan, Cli, Commands,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let result = match cli.command {
        Commands::Scan(args) => run_scan(args, cli.verbose).await.map(|outcome| {
            println!("Scan successful!");
            println!("  - Scanned {} files", outcome.files.len());
            println!("  - Found {} candidate classes", outcome.manifest.classes.len());
        }),
        Commands::Files(args) => handle_files_command(args).await,
        Commands::Show(args) => handle_show_command(args).await,
        Commands::Check(args) => handle_check_command(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
