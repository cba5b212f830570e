//! Plain-text rendering of the view model for terminal output.

use std::fmt::Write;

use crawlx_core::{
    ExplorerView, ExtractionStatus, ExtractionView, ItemRowView, JobStatus, JobView, Notice,
    NoticeLevel, NoticeScope, StatsView,
};

const MAX_TITLE_CHARS: usize = 72;

pub fn render_notice(notice: &Notice) -> String {
    let scope = scope_label(notice.scope);
    match notice.level {
        NoticeLevel::Info => format!("[{scope}] {}", notice.message),
        NoticeLevel::Error => format!("[{scope}] error: {}", notice.message),
    }
}

fn scope_label(scope: NoticeScope) -> &'static str {
    match scope {
        NoticeScope::Health => "health",
        NoticeScope::Jobs => "jobs",
        NoticeScope::Extraction => "extract",
        NoticeScope::Clipboard => "clipboard",
        NoticeScope::Explorer => "items",
        NoticeScope::Export => "export",
        NoticeScope::Stats => "stats",
    }
}

pub fn render_jobs(view: &JobView) -> String {
    let mut out = String::new();
    let status = match view.status {
        JobStatus::Idle => "idle",
        JobStatus::Triggering => "triggering",
        JobStatus::Failed => "failed",
    };
    let _ = writeln!(out, "Batch jobs: {status}");
    if !view.scheduled_spiders.is_empty() {
        let _ = writeln!(out, "Scheduled: {}", view.scheduled_spiders.join(", "));
    }
    out
}

pub fn render_extraction(view: &ExtractionView) -> String {
    let mut out = String::new();
    match view.status {
        ExtractionStatus::Idle => {}
        ExtractionStatus::Pending => out.push_str("Extracting...\n"),
        ExtractionStatus::Failed => {
            let error = view.error.as_deref().unwrap_or("Failed to scrape URL");
            let _ = writeln!(out, "Extraction failed: {error}");
        }
        ExtractionStatus::Succeeded => {
            let Some(page) = &view.result else {
                return out;
            };
            let _ = writeln!(out, "URL:       {}", page.url);
            field(&mut out, "Title", page.title.as_deref());
            field(&mut out, "Author", page.author.as_deref());
            field(&mut out, "Published", page.published_date.as_deref());
            field(&mut out, "Method", page.extraction_method.as_deref());
            field(&mut out, "Summary", page.description.as_deref());
            if !page.tags.is_empty() {
                let _ = writeln!(out, "Tags:      {}", page.tags.join(", "));
            }
            if !page.tables.is_empty() || !page.lists.is_empty() {
                let _ = writeln!(
                    out,
                    "Structure: {} table(s), {} list(s)",
                    page.tables.len(),
                    page.lists.len()
                );
            }
            match &view.preview {
                Some(preview) => {
                    out.push('\n');
                    out.push_str(preview);
                    out.push('\n');
                }
                None => out.push_str("(no text content)\n"),
            }
        }
    }
    out
}

fn field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
        let _ = writeln!(out, "{:<10} {value}", format!("{label}:"));
    }
}

pub fn render_items(view: &ExplorerView) -> String {
    let mut out = String::new();
    let mut filters = Vec::new();
    if !view.query.trim().is_empty() {
        filters.push(format!("query \"{}\"", view.query.trim()));
        if view.fuzzy {
            filters.push("fuzzy".to_string());
        }
    }
    if let Some(tag) = &view.tag {
        filters.push(format!("tag {tag}"));
    }
    if filters.is_empty() {
        let _ = writeln!(out, "{} item(s)", view.items.len());
    } else {
        let _ = writeln!(out, "{} item(s) matching {}", view.items.len(), filters.join(", "));
    }
    for item in &view.items {
        out.push_str(&item_line(item));
        out.push('\n');
    }
    out
}

fn item_line(item: &ItemRowView) -> String {
    let mut line = format!(
        "{:>6}  {}  {:<12}  {}",
        item.id.as_str(),
        item.scraped_at.format("%Y-%m-%d %H:%M"),
        item.source,
        truncate_chars(&item.title, MAX_TITLE_CHARS)
    );
    if !item.tags.is_empty() {
        let _ = write!(line, "  [{}]", item.tags.join(", "));
    }
    line
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

pub fn render_stats(view: &StatsView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Total: {}  Today: {}  News: {}  Jobs: {}",
        view.total, view.today, view.news, view.jobs
    );
    if !view.by_tag.is_empty() {
        let tags: Vec<String> = view
            .by_tag
            .iter()
            .map(|(tag, count)| format!("{tag}={count}"))
            .collect();
        let _ = writeln!(out, "By tag: {}", tags.join(" "));
    }
    out
}
