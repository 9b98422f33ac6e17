use crate::cli::commands::{Commands, ConfigAction, ProfileAction};
use crate::cli::handlers;
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{OffLevel, Verbosity};
use gymtrack_common::logging::LogFormat;
use gymtrack_common::ConfigLoader;
use gymtrack_sdk::ClientConfig;
use std::path::PathBuf;

/// GymTrack CLI - workouts from your terminal
#[derive(Parser, Debug)]
#[command(
    name = "gymtrack",
    author = "GymTrack Team",
    version,
    about = "GymTrack CLI - workouts from your terminal",
    long_about = "Command-line client for the GymTrack API.

SESSION:
  gymtrack login -e <email>         # Sign in (password is prompted)
  gymtrack signup -n <name> -e <email>
  gymtrack logout

EXERCISES:
  gymtrack groups                   # List muscle groups
  gymtrack exercises <group>        # Exercises for a group
  gymtrack exercise <id>            # Exercise details

PROFILE:
  gymtrack profile update -n <name> [--change-password]

CONFIGURATION:
  gymtrack config show              # Effective configuration"
)]
pub struct Args {
    /// Configuration file path (defaults to ./gymtrack.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<OffLevel>,

    /// Log line format when logging is enabled (compact or json)
    #[arg(long, global = true, env = "GYMTRACK_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let config = ClientConfig::load(self.config.clone())?;

        match self.command {
            // Session
            Commands::Login { email, password } => {
                handlers::session::handle_login(&config, &email, password).await
            }
            Commands::Signup {
                name,
                email,
                password,
            } => handlers::session::handle_signup(&config, &name, &email, password).await,
            Commands::Logout => handlers::session::handle_logout(&config).await,

            // Exercises
            Commands::Groups => handlers::exercises::handle_groups(&config, self.json).await,
            Commands::Exercises { group } => {
                handlers::exercises::handle_exercises(&config, &group, self.json).await
            }
            Commands::Exercise { id } => {
                handlers::exercises::handle_exercise(&config, id, self.json).await
            }

            // Profile
            Commands::Profile {
                action:
                    ProfileAction::Update {
                        name,
                        change_password,
                    },
            } => {
                let passwords = if change_password {
                    Some(handlers::profile::prompt_password_change()?)
                } else {
                    None
                };
                handlers::profile::handle_update(&config, &name, passwords).await
            }

            // Configuration
            Commands::Config {
                action: ConfigAction::Show,
            } => handlers::config::handle_show(&config, self.json),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_exercises() {
        let args = Args::parse_from(["gymtrack", "--json", "exercises", "costas"]);
        assert!(args.json);
        assert!(matches!(args.command, Commands::Exercises { ref group } if group == "costas"));
    }

    #[test]
    fn test_parse_log_format_after_subcommand() {
        let args = Args::parse_from(["gymtrack", "groups", "-v", "--log-format", "json"]);
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(Args::try_parse_from(["gymtrack", "--log-format", "pretty", "groups"]).is_err());
    }

    #[test]
    fn test_parse_profile_update() {
        let args = Args::parse_from([
            "gymtrack",
            "profile",
            "update",
            "--name",
            "Ana",
            "--change-password",
        ]);
        assert!(matches!(
            args.command,
            Commands::Profile {
                action: ProfileAction::Update {
                    change_password: true,
                    ..
                }
            }
        ));
    }
}
