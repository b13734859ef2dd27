use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::{config, fix_content, utils, validate};

#[derive(Args, Debug, Clone)]
pub struct RunMigrationsArgs {
    /// File name under the migrations directory, e.g. `processed_events.sql`
    #[arg(short, long)]
    file: String,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct FixContentArgs {
    /// Directory holding the content files, e.g. `project-ops/launch`
    dir: PathBuf,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Action {
    /// Renders a migration and runs it against `DB_HOST`
    RunMigrations(RunMigrationsArgs),
    /// Checks the structure of the YONI tasks CSV
    ValidateTasksCsv(ValidateArgs),
    /// Checks the structure of the YONI Notion template JSON
    ValidateNotion(ValidateArgs),
    /// Normalizes the formatting of the JSON and CSV files in a directory
    FixContent(FixContentArgs),
}

/// Operational tasks for the YONI webhook service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct AppArgs {
    #[command(subcommand)]
    pub action: Action,
}

impl AppArgs {
    pub async fn run(&self) -> anyhow::Result<()> {
        match &self.action {
            Action::RunMigrations(RunMigrationsArgs { file }) => {
                let app_config = config::init_config()?;
                let db_pool = utils::setup_sqlite_db_pool(&app_config).await?;

                utils::run_migrations(&db_pool, &app_config.migrations_dir, file).await
            }
            Action::ValidateTasksCsv(ValidateArgs { path }) => {
                validate::tasks_csv::validate_file(path)?.into_result()
            }
            Action::ValidateNotion(ValidateArgs { path }) => {
                validate::notion::validate_file(path)?.into_result()
            }
            Action::FixContent(FixContentArgs { dir }) => {
                fix_content::fix_dir(dir)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let args = AppArgs::try_parse_from(["scripts", "validate-tasks-csv", "tasks.csv"]).unwrap();
        assert!(matches!(
            args.action,
            Action::ValidateTasksCsv(ValidateArgs { ref path }) if path == &PathBuf::from("tasks.csv")
        ));

        let args = AppArgs::try_parse_from([
            "scripts",
            "run-migrations",
            "--file",
            "processed_events.sql",
        ])
        .unwrap();
        assert!(matches!(
            args.action,
            Action::RunMigrations(RunMigrationsArgs { ref file }) if file == "processed_events.sql"
        ));

        let args = AppArgs::try_parse_from(["scripts", "fix-content", "project-ops/launch"]).unwrap();
        assert!(matches!(
            args.action,
            Action::FixContent(FixContentArgs { ref dir }) if dir == &PathBuf::from("project-ops/launch")
        ));

        assert!(AppArgs::try_parse_from(["scripts", "validate-notion"]).is_err());
        assert!(AppArgs::try_parse_from(["scripts", "fix-content"]).is_err());
    }
}
