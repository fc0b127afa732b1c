use tabled::{Table, settings::Style};

use crate::{error::FilterError, management::PaginationState, types::Listable};

/// Parses a `key=value` filter expression as given on the command line.
///
/// The value may be empty (`major=`), which clears that filter.
pub fn parse_filter_expr(expr: &str) -> Result<(String, String), FilterError> {
    let Some((key, value)) = expr.split_once('=') else {
        return Err(FilterError::Malformed(expr.to_string()));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(FilterError::Malformed(expr.to_string()));
    }
    Ok((key.to_lowercase(), value.trim().to_string()))
}

/// `value_parser` adapter for clap.
pub fn parse_filter_arg(expr: &str) -> Result<(String, String), String> {
    parse_filter_expr(expr).map_err(|e| e.to_string())
}

/// One-line pagination summary, e.g. `page 2/3 · 23 results`.
pub fn pagination_footer(pagination: &PaginationState) -> String {
    let noun = if pagination.total == 1 {
        "result"
    } else {
        "results"
    };
    format!(
        "page {}/{} · {} {}",
        pagination.page, pagination.total_pages, pagination.total, noun
    )
}

/// Renders entities as a table, or `None` when there is nothing to show.
pub fn render_table<T: Listable>(items: &[T]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let rows: Vec<T::Row> = items.iter().map(Listable::to_row).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    Some(table.to_string())
}
