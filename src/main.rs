// src/main.rs

use taskpace::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(summary) if summary.failed > 0 => std::process::exit(1),
        Ok(_) => {}
        Err(err) => {
            eprintln!("taskpace error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<taskpace::RunSummary> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
