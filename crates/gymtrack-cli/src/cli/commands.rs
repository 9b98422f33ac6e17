use clap::Subcommand;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and keep the session for later commands
    Login {
        /// Account e-mail
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "GYMTRACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account e-mail
        #[arg(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "GYMTRACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and remove the stored session
    Logout,

    /// List muscle groups
    Groups,

    /// List the exercises of a muscle group
    Exercises {
        /// Muscle group name, as listed by `gymtrack groups`
        group: String,
    },

    /// Show a single exercise
    Exercise {
        /// Exercise id
        id: u64,
    },

    /// Manage your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Change your name and, optionally, your password
    Update {
        /// New display name
        #[arg(short, long)]
        name: String,

        /// Also change the password (current and new are prompted for)
        #[arg(long)]
        change_password: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
}
