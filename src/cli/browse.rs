use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    cli::{connect, render},
    config::Settings,
    error::{ApiError, ControlError},
    info,
    management::{ListOptions, ListQueryController, LoadOutcome, PageSource},
    remote::{CatalogSource, Resource},
    types::{AdminUser, Company, Listable, Trainee},
    utils, warning,
};

const HELP: &str = "\
type to search (settles after a short pause, empty line clears)
:f key=value   set a filter       :clear key   clear a filter
:reset         clear everything   :r           reload from the server
:p N           go to page N       :n / :prev   next / previous page
:help          this text          :q           quit";

/// One line of input in browse mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Search(String),
    Filter(String, String),
    ClearFilter(String),
    Reset,
    Page(u32),
    Next,
    Prev,
    Reload,
    Help,
    Quit,
}

impl BrowseCommand {
    /// Parses a line. Anything not starting with `:` is search input.
    pub fn parse(line: &str) -> Result<BrowseCommand, String> {
        let Some(command) = line.trim().strip_prefix(':') else {
            return Ok(BrowseCommand::Search(line.trim_end_matches(['\r', '\n']).to_string()));
        };

        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(n, r)| (n, r.trim()))
            .unwrap_or((command, ""));

        match name {
            "f" | "filter" => utils::parse_filter_expr(rest)
                .map(|(k, v)| BrowseCommand::Filter(k, v))
                .map_err(|e| e.to_string()),
            "clear" if !rest.is_empty() => Ok(BrowseCommand::ClearFilter(rest.to_lowercase())),
            "reset" => Ok(BrowseCommand::Reset),
            "p" | "page" => rest
                .parse::<u32>()
                .map(BrowseCommand::Page)
                .map_err(|_| format!("not a page number: `{rest}`")),
            "n" | "next" => Ok(BrowseCommand::Next),
            "prev" => Ok(BrowseCommand::Prev),
            "r" | "reload" => Ok(BrowseCommand::Reload),
            "h" | "help" => Ok(BrowseCommand::Help),
            "q" | "quit" | "exit" => Ok(BrowseCommand::Quit),
            other => Err(format!("unknown command `:{other}`, try :help")),
        }
    }
}

pub async fn browse(resource: Resource) {
    match resource {
        Resource::Trainees => browse_catalog::<Trainee>(resource).await,
        Resource::Companies => browse_catalog::<Company>(resource).await,
        Resource::Users => browse_catalog::<AdminUser>(resource).await,
    }
}

async fn browse_catalog<T: Listable>(resource: Resource) {
    let settings = Settings::from_env();
    let client = connect(&settings).await;
    if !client.sessions().is_authenticated() {
        warning!("Not logged in. Please run rostercli login");
        return;
    }

    let view = ListQueryController::new(
        CatalogSource::<T>::new(client, resource),
        resource.filter_keys(),
        ListOptions::from(&settings),
    );

    info!(
        "Browsing {} (filters: {}). :help for commands.",
        resource,
        resource.filter_keys().join(", ")
    );
    report(&view, view.load().await.map_err(ControlError::from));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warning!("Cannot read input: {}", e);
                        break;
                    }
                };

                match BrowseCommand::parse(&line) {
                    Ok(BrowseCommand::Quit) => break,
                    Ok(BrowseCommand::Help) => println!("{}", HELP),
                    Ok(BrowseCommand::Search(text)) => view.set_search(&text),
                    Ok(command) => {
                        let result = execute(&view, command).await;
                        report(&view, result);
                    }
                    Err(e) => warning!("{}", e),
                }
            }
            settled = view.next_settled_search() => match settled {
                Some(text) => {
                    let result = view.apply_search(&text).await.map_err(ControlError::from);
                    report(&view, result);
                }
                None => break,
            }
        }
    }
}

async fn execute<S: PageSource>(
    view: &ListQueryController<S>,
    command: BrowseCommand,
) -> Result<LoadOutcome, ControlError> {
    let result = match command {
        BrowseCommand::Filter(key, value) => return view.set_filter(&key, &value).await,
        BrowseCommand::ClearFilter(key) => return view.clear_filter(&key).await,
        BrowseCommand::Reset => view.reset_filters().await,
        BrowseCommand::Page(page) => view.go_to_page(page).await,
        BrowseCommand::Next => view.next_page().await,
        BrowseCommand::Prev => view.prev_page().await,
        BrowseCommand::Reload => view.reload().await,
        BrowseCommand::Search(_) | BrowseCommand::Help | BrowseCommand::Quit => {
            Ok(LoadOutcome::Unchanged)
        }
    };
    result.map_err(ControlError::from)
}

fn report<T: Listable>(
    view: &ListQueryController<CatalogSource<T>>,
    result: Result<LoadOutcome, ControlError>,
) {
    match &result {
        Ok(LoadOutcome::Superseded) => {}
        Ok(LoadOutcome::Unchanged) => info!("Nothing changed."),
        Ok(_) | Err(ControlError::Api(_)) => render(&view.snapshot()),
        Err(ControlError::Filter(e)) => warning!("{}", e),
    }

    if let Err(ControlError::Api(ApiError::SessionExpired)) = &result {
        warning!("Leaving browse mode.");
        std::process::exit(1);
    }
}
