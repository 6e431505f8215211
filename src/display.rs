//! Console rendering of reports and result tables.

use std::path::Path;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{AggregateResult, Config, ProbeReport};

const RULE_WIDTH: usize = 100;

/// Cuts `s` to at most `max` display columns, ending in `...` when shortened.
pub fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let budget = max.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Left-aligns `s` in a column of `width` display columns.
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(fill))
}

/// Renders a boxed table.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let border = {
        let parts: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("+{}+\n", parts.join("+"))
    };
    let line = |cells: Vec<&str>| {
        let parts: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| format!(" {} ", pad(cells.get(i).copied().unwrap_or(""), *w)))
            .collect();
        format!("|{}|\n", parts.join("|"))
    };

    let mut out = border.clone();
    let titles: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    out.push_str(&line(titles.iter().map(String::as_str).collect()));
    out.push_str(&border);
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    if !rows.is_empty() {
        out.push_str(&border);
    }
    out
}

/// Renders the availability report sorted by site name.
pub fn doctor_table(report: &ProbeReport) -> String {
    let mut out = String::from("\n");
    out.push_str(&format!(
        "{} {} {} {} {} {}\n",
        pad("SITE", 15),
        pad("URL", 40),
        pad("STATUS", 8),
        pad("ENABLED", 8),
        pad("LATENCY", 10),
        "ERROR"
    ));
    out.push_str(&"─".repeat(RULE_WIDTH));
    out.push('\n');

    for status in report.sorted() {
        let state = if status.available { "OK" } else { "DOWN" };
        let enabled = if status.enabled { "Yes" } else { "No" };
        let latency = format!("{}ms", status.latency.as_millis());
        let error = truncate(status.error.as_deref().unwrap_or(""), 25);
        out.push_str(
            format!(
                "{} {} {} {} {} {}",
                pad(&status.name, 15),
                pad(&truncate(&status.url, 38), 40),
                pad(state, 8),
                pad(enabled, 8),
                pad(&latency, 10),
                error
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str(&"─".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str(&format!(
        "Total: {} sites, {} available, {} down\n",
        report.total(),
        report.available(),
        report.down()
    ));
    out
}

/// Renders the configured sites.
pub fn sites_table(config: &Config, path: &Path) -> String {
    let rows: Vec<Vec<String>> = config
        .sites
        .iter()
        .map(|(name, site)| {
            vec![
                name.clone(),
                site.url.clone(),
                site.language.to_string(),
                if site.enabled { "Yes" } else { "No" }.to_string(),
            ]
        })
        .collect();
    format!(
        "Config file: {}\n\n{}",
        path.display(),
        table(&["Site", "URL", "Language", "Enabled"], &rows)
    )
}

/// Returns `true` if any record carries more than title and magnet.
fn has_details(results: &AggregateResult) -> bool {
    results.iter().any(|(_, r)| {
        r.uploader.is_some()
            || r.seeders.is_some()
            || r.leechers.is_some()
            || r.snatches.is_some()
            || r.file_size.is_some()
            || r.folder.is_some()
    })
}

/// Renders merged results, newest-looking titles first (key descending).
///
/// Extended columns are shown only when some record has them.
pub fn results_table(results: &AggregateResult) -> String {
    let entries = results.sorted_desc();
    if !has_details(results) {
        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|(key, record)| vec![key.to_string(), record.magnet.clone()])
            .collect();
        return table(&["Title", "Magnet"], &rows);
    }

    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|(key, r)| {
            vec![
                key.to_string(),
                field(&r.uploader),
                field(&r.seeders),
                field(&r.leechers),
                field(&r.snatches),
                field(&r.file_size),
                r.magnet.clone(),
                field(&r.folder),
            ]
        })
        .collect();
    table(
        &[
            "Title", "Uploader", "Seeder", "Leecher", "Snatch", "FileSize", "Magnet", "Folder",
        ],
        &rows,
    )
}

/// One `title<TAB>magnet` line per result.
pub fn results_compact(results: &AggregateResult) -> String {
    results
        .sorted_desc()
        .iter()
        .map(|(key, record)| format!("{}\t{}\n", key, record.magnet))
        .collect()
}
