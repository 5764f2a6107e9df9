use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use services::AppServices;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::commands::{self, Action};

#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ReplLine {
    #[command(subcommand)]
    command: ReplCommand,
}

#[derive(Subcommand)]
enum ReplCommand {
    #[command(flatten)]
    Action(Action),

    /// Enter or leave mistake review
    Mistakes { mode: Switch },

    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

/// Line-oriented session; mistake mode lasts for the life of the process.
pub async fn run(services: &AppServices) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("review session started, type `help` for commands");

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        let parsed = match ReplLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(err) => {
                // Help output is reported through the error path too.
                eprintln!("{err}");
                continue;
            }
        };

        match parsed.command {
            ReplCommand::Action(action) => match commands::execute(services, action).await {
                Ok(output) => println!("{output}"),
                Err(err) => eprintln!("error: {err:#}"),
            },
            ReplCommand::Mistakes { mode: Switch::On } => {
                services.engine().set_mistake_mode(true).await;
                println!("mistake mode on");
            }
            ReplCommand::Mistakes { mode: Switch::Off } => {
                leave_mistake_mode(services, &mut lines).await?;
            }
            ReplCommand::Quit => break,
        }
    }
    Ok(())
}

async fn leave_mistake_mode(
    services: &AppServices,
    lines: &mut Lines<BufReader<Stdin>>,
) -> anyhow::Result<()> {
    let engine = services.engine();
    let was_on = engine.is_mistake_mode().await;
    engine.set_mistake_mode(false).await;
    println!("mistake mode off");
    if !was_on {
        return Ok(());
    }

    let correct = engine.count_correct_mistakes().await?;
    if correct == 0 {
        return Ok(());
    }
    println!("{correct} mistake-book questions are now answered correctly. Remove them? [y/N]");
    let reply = lines.next_line().await.context("reading stdin")?;
    if reply.is_some_and(|r| r.trim().eq_ignore_ascii_case("y")) {
        let removed = engine.clear_correct_mistakes().await?;
        println!("removed {removed} questions from the mistake book");
    }
    Ok(())
}
