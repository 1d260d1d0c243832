use clap::Parser;
use gridscout::cli::Args;
use gridscout::config::Config;
use gridscout::error::AppError;
use gridscout::logging::setup_logging;
use gridscout::report::{ReportGenerator, ReportRequest};
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let args = Args::parse();

    if args.config_path {
        println!("{}", Config::get_config_path());
        return Ok(());
    }

    if let Some(api_key) = args.set_api_key {
        let mut config = Config::load().await.unwrap_or_default();
        config.api_key = api_key;
        config.save().await?;
        println!("API key saved to {}", Config::get_config_path());
        return Ok(());
    }

    let (game, team) = match (&args.game, &args.team) {
        (Some(game), Some(team)) => (game.clone(), team.clone()),
        _ => {
            return Err(AppError::config_error(
                "both --game and --team are required to generate a report",
            ));
        }
    };

    let config = Config::load().await?;
    // Guard must stay alive until exit so buffered logs are flushed.
    let (_log_path, _guard) = setup_logging(&config, args.debug).await?;
    info!("Starting report generation for {} in {}", team, game);

    let request = ReportRequest {
        game,
        team,
        opponent: args.opponent.clone(),
        last_n: args.last_n,
        window: args.window.into(),
    };

    let generator = ReportGenerator::new(config)?;
    let report = generator.generate(&request).await?;
    let rendered = if args.json {
        serde_json::to_string_pretty(&report)?
    } else {
        report.to_markdown()
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &rendered).await?;
            println!("Report written to {path}");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
