//! Command line definition.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// LavaPro laundry dashboard.
#[derive(Debug, Parser)]
#[command(name = "lavapro", version, about)]
pub struct Cli {
    /// Use the built-in demo dataset instead of the hosted backend
    #[arg(long, global = true)]
    pub demo: bool,

    /// Config file (defaults to lavapro.toml in the config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Sign in for this run only, without touching the session file
    #[arg(long, global = true, env = "LAVAPRO_EMAIL", requires = "password")]
    pub email: Option<String>,

    /// Password for `--email`
    #[arg(long, global = true, env = "LAVAPRO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        email: String,
        /// Read from stdin when omitted
        #[arg(long = "with-password", value_name = "PASSWORD")]
        password: Option<String>,
    },

    /// Email a one-time sign-in code
    MagicLink {
        email: String,
        /// Where the emailed link should land
        #[arg(long)]
        redirect_to: Option<String>,
    },

    /// Sign in with an emailed one-time code
    Verify { email: String, code: String },

    /// Create an account
    Signup {
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long = "with-password", value_name = "PASSWORD")]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Who is signed in and which layout they get
    Whoami,

    /// Statistics, revenue chart and recent orders
    Dashboard {
        /// Recent orders to list
        #[arg(long, default_value_t = 5)]
        recent: usize,
    },

    /// List orders
    Orders(OrderFilter),

    /// Orders grouped by status
    Board,

    /// Move an order to another status
    SetStatus {
        order_id: i64,
        /// pending, in_progress, ready, in_transit, delivered, canceled
        status: String,
    },

    /// Deliveries assigned to the signed-in courier
    Deliveries,

    /// Move a delivery one step (ready → in transit → delivered)
    Advance { order_id: i64 },

    /// List customers
    Customers,

    /// Register a customer
    AddCustomer(CustomerArgs),

    /// Complete your own customer registration (customer accounts)
    Register(CustomerArgs),

    /// The public service catalog
    Catalog,

    /// Add a catalog entry
    AddService(ServiceArgs),

    /// Account and laundry settings
    Settings,
}

#[derive(Debug, Args)]
pub struct OrderFilter {
    /// Customer or service name, order number, or #number
    #[arg(long, short)]
    pub search: Option<String>,

    /// Only orders in this status
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, short, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct CustomerArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

#[derive(Debug, Args)]
pub struct ServiceArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Price in reais, e.g. 25.90
    #[arg(long)]
    pub price: String,
    #[arg(long)]
    pub icon: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_set_status() {
        let cli = Cli::try_parse_from(["lavapro", "--demo", "set-status", "42", "in_progress"]).unwrap();
        assert!(cli.demo);
        match cli.command {
            Command::SetStatus { order_id, status } => {
                assert_eq!(order_id, 42);
                assert_eq!(status, "in_progress");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parses_register() {
        let cli = Cli::try_parse_from(["lavapro", "register", "--name", "Beatriz Nunes", "--phone", "11977776666"]).unwrap();
        match cli.command {
            Command::Register(args) => {
                assert_eq!(args.name, "Beatriz Nunes");
                assert_eq!(args.phone.as_deref(), Some("11977776666"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lavapro", "orders", "--status", "pending", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Orders(filter) => {
                assert_eq!(filter.status.as_deref(), Some("pending"));
                assert_eq!(filter.limit, 50);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
