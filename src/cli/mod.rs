// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Argument parsing is
// generated by clap; all business logic is delegated to the
// application layer.
//
// Two commands are supported:
//   1. `train`    — trains the recurrent tune model
//   2. `complete` — samples a tune completion from seed tokens

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, CompleteArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "folktune",
    version,
    about = "Train a recurrent model over tokenised folk tunes, then sample new ones."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case. The CLI layer only
    /// routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(ref args) => self.run_train(args.clone()),
            Commands::Complete(ref args) => self.run_complete(args.clone()),
        }
    }

    fn run_train(&self, args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training from '{}'", args.data_path);

        let use_case = TrainUseCase::new(args.into());
        let history = use_case.execute()?;

        if let Some(last) = history.last() {
            println!(
                "Training complete: {} epochs, final loss {:.4}, accuracy {:.1}%",
                history.len(),
                last.loss,
                last.accuracy * 100.0,
            );
        }
        Ok(())
    }

    fn run_complete(&self, args: CompleteArgs) -> Result<()> {
        use crate::application::complete_use_case::CompleteUseCase;

        let use_case = CompleteUseCase::new((&args).into());
        let tune = use_case.execute(&args.seed)?;

        println!("\n{}", tune);
        Ok(())
    }
}
