use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use taskserver::humanize::HumanDuration;
use taskserver::task::NewTask;

#[derive(Parser, Debug)]
#[command(name = "taskserver")]
#[command(about = "Role-based task server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server until Ctrl+C / SIGTERM, then drain
    Server(ServerArgs),
    /// Submit a fixed batch of tasks, wait for them, print final statuses
    Batch(BatchArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (overrides `server.bind_addr`)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// Task as "description:role"; may be repeated
    #[arg(
        long = "task",
        value_parser = parse_task_arg,
        default_values = ["Deploy:DevOps", "Clean logs:DevOps"]
    )]
    pub tasks: Vec<NewTask>,

    /// Simulated execution time per task (overrides `pool.execution_delay`)
    #[arg(long)]
    pub delay: Option<HumanDuration>,
}

/// Parse `"description:role"`; the last colon separates the role
fn parse_task_arg(raw: &str) -> Result<NewTask, String> {
    let (description, role) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected \"description:role\", got {raw:?}"))?;

    let task = NewTask::builder()
        .description(description.trim())
        .required_role(role.trim())
        .build();
    task.validate().map_err(|err| err.to_string())?;

    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_arg() {
        let task = parse_task_arg("Clean logs:DevOps").unwrap();
        assert_eq!(task.description, "Clean logs");
        assert_eq!(task.required_role, "DevOps");
        assert_eq!(task.priority, 0);

        let task = parse_task_arg("run db:migrate:DBA").unwrap();
        assert_eq!(task.description, "run db:migrate");
        assert_eq!(task.required_role, "DBA");
    }

    #[test]
    fn test_parse_task_arg_rejects_incomplete() {
        assert!(parse_task_arg("Deploy").is_err());
        assert!(parse_task_arg("Deploy:").is_err());
        assert!(parse_task_arg(":DevOps").is_err());
    }

    #[test]
    fn test_batch_defaults() {
        let cli = Cli::try_parse_from(["taskserver", "batch"]).unwrap();
        let Commands::Batch(args) = cli.command else {
            panic!("expected batch command");
        };
        let descriptions: Vec<_> = args.tasks.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["Deploy", "Clean logs"]);
        assert!(args.delay.is_none());
    }

    #[test]
    fn test_batch_custom_tasks() {
        let cli = Cli::try_parse_from([
            "taskserver",
            "batch",
            "--task",
            "Run tests:QA",
            "--delay",
            "10ms",
        ])
        .unwrap();
        let Commands::Batch(args) = cli.command else {
            panic!("expected batch command");
        };
        assert_eq!(args.tasks.len(), 1);
        assert_eq!(args.tasks[0].required_role, "QA");
        assert_eq!(args.delay, Some(HumanDuration::from_millis(10)));
    }
}
