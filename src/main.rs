use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use rostercli::{cli, config, logging, remote::Resource, utils, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Log debug information to stderr (overridden by ROSTER_LOG)
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in and store the session
    Login(LoginOptions),

    /// End the current session
    Logout,

    /// Show who is logged in
    Whoami,

    /// List trainees
    Trainees(ListOptions),

    /// List companies
    Companies(ListOptions),

    /// List users (admin only)
    Users(ListOptions),

    /// Browse a catalog interactively
    Browse(BrowseOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct LoginOptions {
    #[clap(long)]
    pub email: String,

    /// Password; read from ROSTER_PASSWORD when omitted
    #[clap(long, env = "ROSTER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ListOptions {
    /// Free-text search term
    #[clap(long)]
    pub search: Option<String>,

    /// Filter as key=value; can be repeated
    #[clap(
        long = "filter",
        short = 'f',
        value_parser = utils::parse_filter_arg,
        action = ArgAction::Append,
        num_args = 1
    )]
    pub filters: Vec<(String, String)>,

    /// Page to show
    #[clap(long)]
    pub page: Option<u32>,

    /// Items per page (defaults to ROSTER_PAGE_SIZE)
    #[clap(long)]
    pub limit: Option<u32>,
}

impl From<ListOptions> for cli::ListArgs {
    fn from(opt: ListOptions) -> Self {
        cli::ListArgs {
            search: opt.search,
            filters: opt.filters,
            page: opt.page,
            limit: opt.limit,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct BrowseOptions {
    /// Catalog to browse: trainees, companies or users
    #[clap(value_parser = parse_resource)]
    pub resource: Resource,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn parse_resource(raw: &str) -> Result<Resource, String> {
    raw.parse()
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        warning!("Cannot initialize logging. Err: {}", e);
    }

    match cli.command {
        Command::Login(opt) => cli::login(opt.email, opt.password).await,
        Command::Logout => cli::logout().await,
        Command::Whoami => cli::whoami().await,
        Command::Trainees(opt) => cli::list(Resource::Trainees, opt.into()).await,
        Command::Companies(opt) => cli::list(Resource::Companies, opt.into()).await,
        Command::Users(opt) => cli::list(Resource::Users, opt.into()).await,
        Command::Browse(opt) => cli::browse(opt.resource).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
