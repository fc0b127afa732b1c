use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    cli::{connect, render},
    config::Settings,
    error,
    management::{ListOptions, ListQueryController},
    remote::{CatalogSource, Resource},
    types::{AdminUser, Company, Listable, Trainee},
    warning,
};

/// Query given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub search: Option<String>,
    pub filters: Vec<(String, String)>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list(resource: Resource, args: ListArgs) {
    match resource {
        Resource::Trainees => list_catalog::<Trainee>(resource, args).await,
        Resource::Companies => list_catalog::<Company>(resource, args).await,
        Resource::Users => list_catalog::<AdminUser>(resource, args).await,
    }
}

async fn list_catalog<T: Listable>(resource: Resource, args: ListArgs) {
    let mut settings = Settings::from_env();
    if let Some(limit) = args.limit {
        settings.page_size = limit.max(1);
    }

    let client = connect(&settings).await;
    if !client.sessions().is_authenticated() {
        error!("Not logged in. Please run rostercli login");
    }

    let view = ListQueryController::new(
        CatalogSource::<T>::new(client, resource),
        resource.filter_keys(),
        ListOptions::from(&settings),
    );

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Fetching {}...", resource));
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let search = args.search.unwrap_or_default();
    let selected = if args.filters.is_empty() && search.trim().is_empty() {
        view.load().await.map_err(|e| e.to_string())
    } else {
        view.apply_selection(&args.filters, &search)
            .await
            .map_err(|e| e.to_string())
    };

    if let Err(e) = selected {
        pb.finish_and_clear();
        if view.error().is_none() {
            // rejected before any request went out, e.g. an unknown filter key
            error!("{}", e);
        }
        render(&view.snapshot());
        std::process::exit(1);
    }

    if let Some(page) = args.page.filter(|p| *p != 1) {
        let total_pages = view.pagination().total_pages;
        if page == 0 || page > total_pages {
            warning!(
                "Page {} is out of range, there are {} page(s).",
                page,
                total_pages
            );
        } else if view.go_to_page(page).await.is_err() {
            pb.finish_and_clear();
            render(&view.snapshot());
            std::process::exit(1);
        }
    }

    pb.finish_and_clear();
    render(&view.snapshot());
}
