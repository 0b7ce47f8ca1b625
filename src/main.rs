//! Offense preference CLI
//!
//! Builds team pairs, collects judge answers, and fits a surrogate model that
//! explains the judge's choices through stat differentials.

use clap::{Parser, Subcommand};
use offense::{Config, Result};

#[derive(Parser)]
#[command(name = "offense")]
#[command(about = "Learn which offensive stats drive a text judge's preferences", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// Aggregate play-by-play rows into the team summary
    Summarize,

    /// Rank teams by strength and pair neighbours
    Pairs,

    /// Render judge prompts for every pair
    Prompts,

    /// Send prompts to the chat-completion judge
    Ask,

    /// Parse judge answers into preference labels
    Labels,

    /// Build the differential training table
    Features,

    /// Fit and evaluate the preference model
    Train {
        /// Number of gradient steps (overrides config)
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Random seed for the split and backend (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Pairs, labels, features, and training from existing answers
    Run,

    /// Show the saved model artifact
    Model,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Summarize => commands::summarize(config),
        Commands::Pairs => commands::pairs(config),
        Commands::Prompts => commands::prompts(config),
        Commands::Ask => commands::ask(config),
        Commands::Labels => commands::labels(config),
        Commands::Features => commands::features(config),
        Commands::Train { epochs, seed } => commands::train(config, epochs, seed),
        Commands::Run => commands::run(config),
        Commands::Model => commands::model_info(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use offense::data::METRIC_COUNT;
    use offense::judge::ChatJudge;
    use offense::pipeline::{PairsSummary, Pipeline};
    use offense::training::{DefaultBackend, ModelArtifact, ModelReport};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("results")?;
        println!("Created data/ and results/ directories");

        println!("\nNext steps:");
        println!("  1. Put play-by-play data at {}", config.paths.plays);
        println!("  2. Run 'offense summarize' and 'offense pairs'");
        println!("  3. Run 'offense prompts' then 'offense ask' (needs ${})", config.judge.api_key_env);
        println!("  4. Run 'offense run' to label, build features, and train");

        Ok(())
    }

    pub fn summarize(config: Config) -> Result<()> {
        let summary = Pipeline::new(config).summarize()?;
        println!("Summarized {} plays into {} teams", summary.plays, summary.teams);
        Ok(())
    }

    pub fn pairs(config: Config) -> Result<()> {
        let summary = Pipeline::new(config).pairs()?;
        print_pairs(&summary);
        Ok(())
    }

    pub fn prompts(config: Config) -> Result<()> {
        let summary = Pipeline::new(config).prompts()?;
        println!("Generated {} prompts for {} pairs", summary.prompts, summary.pairs);
        Ok(())
    }

    pub fn ask(config: Config) -> Result<()> {
        let pipeline = Pipeline::new(config);
        let judge = ChatJudge::from_env(pipeline.config().judge.clone())?;
        let summary = pipeline.ask(&judge)?;
        println!(
            "Collected {} answers ({} failed)",
            summary.prompts, summary.failed
        );
        Ok(())
    }

    pub fn labels(config: Config) -> Result<()> {
        let summary = Pipeline::new(config).labels()?;
        println!(
            "Labelled {} of {} answers: {} parsed, {} unknown",
            summary.labels, summary.answers, summary.parsed, summary.unknown
        );
        Ok(())
    }

    pub fn features(config: Config) -> Result<()> {
        let summary = Pipeline::new(config).features()?;
        println!(
            "Built {} training rows from {} labels",
            summary.rows, summary.labels
        );
        Ok(())
    }

    pub fn train(mut config: Config, epochs: Option<usize>, seed: Option<u64>) -> Result<()> {
        if let Some(epochs) = epochs {
            config.training.epochs = epochs;
        }
        if let Some(seed) = seed {
            config.training.seed = seed;
        }
        let report = Pipeline::new(config).train::<DefaultBackend>(Default::default())?;
        print_report(&report);
        Ok(())
    }

    pub fn run(config: Config) -> Result<()> {
        let summary = Pipeline::new(config).run::<DefaultBackend>(Default::default())?;
        print_pairs(&summary.pairs);
        println!(
            "Labels: {} ({} parsed, {} unknown)",
            summary.labels.labels, summary.labels.parsed, summary.labels.unknown
        );
        println!("Training rows: {}", summary.features.rows);
        print_report(&summary.report);
        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let path = &config.paths.model_artifact;
        let artifact = ModelArtifact::load(path)?;
        println!("Model: {} (seed {})", path, artifact.seed);
        println!("Final training loss: {:.4}", artifact.model.final_loss);
        println!("Test {}", artifact.evaluation);

        let even = artifact.standardizer.transform(&[0.0; METRIC_COUNT]);
        println!(
            "P(Team A) for two identical offenses: {:.3}",
            artifact.model.probability(&even)
        );

        print_report(&ModelReport::new(artifact));
        Ok(())
    }

    fn print_pairs(summary: &PairsSummary) {
        println!(
            "Created {} pairs from {} teams using '{}'",
            summary.pairs, summary.teams, summary.source
        );
        if let Some(team) = &summary.unpaired {
            println!("Unpaired: {}", team);
        }
    }

    fn print_report(report: &ModelReport) {
        let artifact = &report.artifact;
        println!(
            "\nTrained on {} rows, tested on {}",
            artifact.train_size, artifact.test_size
        );
        println!("Test accuracy: {:.3}", report.accuracy());
        println!(
            "Confusion matrix (rows = true, cols = predicted):\n{}",
            artifact.evaluation.confusion
        );
        println!("\nTop features:");
        for c in report.ranked.iter().take(5) {
            println!("  {:<28} {:+.3}", c.feature, c.coef);
        }
    }
}
