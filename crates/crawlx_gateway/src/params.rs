//! Query-string construction for every endpoint.
//!
//! Absent values are omitted entirely, never sent as empty strings, and
//! multi-valued parameters repeat the key.

use crawlx_core::{
    ConsoleError, ExportFormat, ExportOptions, ListQuery, ScrapeJobRequest, SearchQuery,
};
use url::Url;

pub type QueryPairs = Vec<(&'static str, String)>;

pub fn list_params(query: &ListQuery) -> QueryPairs {
    let mut pairs = QueryPairs::new();
    push_opt(&mut pairs, "skip", query.skip);
    push_opt(&mut pairs, "limit", query.limit);
    push_tag(&mut pairs, query.tag.as_deref());
    pairs
}

pub fn search_params(query: &SearchQuery) -> QueryPairs {
    let mut pairs = vec![("q", query.q.clone())];
    push_opt(&mut pairs, "skip", query.skip);
    push_opt(&mut pairs, "limit", query.limit);
    push_tag(&mut pairs, query.tag.as_deref());
    push_opt(&mut pairs, "fuzzy", query.fuzzy);
    pairs
}

pub fn run_params(request: &ScrapeJobRequest) -> QueryPairs {
    request
        .spiders
        .iter()
        .flatten()
        .map(|spider| ("spiders", spider.clone()))
        .collect()
}

pub fn export_path(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Json => "/items/export",
        ExportFormat::Csv => "/items/export/csv",
        ExportFormat::Pdf => "/items/export/pdf",
    }
}

/// Only the PDF endpoint takes parameters.
pub fn export_params(format: ExportFormat, options: &ExportOptions) -> QueryPairs {
    let mut pairs = QueryPairs::new();
    if format == ExportFormat::Pdf {
        if !options.style.trim().is_empty() {
            pairs.push(("style", options.style.trim().to_string()));
        }
        pairs.push(("limit", options.limit.to_string()));
        push_tag(&mut pairs, options.tag.as_deref());
    }
    pairs
}

/// Joins `path` onto `base`, keeping any path prefix the base carries.
pub fn build_url(base: &str, path: &str, params: &[(&'static str, String)]) -> Result<Url, ConsoleError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined)
        .map_err(|err| ConsoleError::Validation(format!("invalid service URL '{joined}': {err}")))?;
    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

fn push_opt<T: ToString>(pairs: &mut QueryPairs, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        pairs.push((key, value.to_string()));
    }
}

fn push_tag(pairs: &mut QueryPairs, tag: Option<&str>) {
    if let Some(tag) = tag.map(str::trim).filter(|tag| !tag.is_empty()) {
        pairs.push(("tag", tag.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_spiders_serialize_as_repeated_keys() {
        let request = ScrapeJobRequest::for_spiders(["news", "jobs"]);
        let url = build_url("http://svc", "/scrape/run", &run_params(&request)).unwrap();
        assert_eq!(url.query(), Some("spiders=news&spiders=jobs"));
    }

    #[test]
    fn omitted_spiders_serialize_as_no_parameter() {
        let url = build_url("http://svc", "/scrape/run", &run_params(&ScrapeJobRequest::all()))
            .unwrap();
        assert_eq!(url.as_str(), "http://svc/scrape/run");
    }

    #[test]
    fn blank_tag_is_omitted() {
        let pairs = list_params(&ListQuery {
            skip: None,
            limit: Some(100),
            tag: Some("  ".into()),
        });
        assert_eq!(pairs, vec![("limit", "100".to_string())]);
    }

    #[test]
    fn search_passes_fuzzy_through() {
        let pairs = search_params(&SearchQuery {
            q: "rust jobs".into(),
            skip: Some(0),
            limit: Some(100),
            tag: Some("jobs".into()),
            fuzzy: Some(true),
        });
        assert_eq!(
            pairs,
            vec![
                ("q", "rust jobs".to_string()),
                ("skip", "0".to_string()),
                ("limit", "100".to_string()),
                ("tag", "jobs".to_string()),
                ("fuzzy", "true".to_string()),
            ]
        );
    }

    #[test]
    fn only_pdf_export_takes_options() {
        let options = ExportOptions {
            tag: Some("news".into()),
            ..ExportOptions::default()
        };
        assert!(export_params(ExportFormat::Csv, &options).is_empty());
        assert_eq!(
            export_params(ExportFormat::Pdf, &options),
            vec![
                ("style", "detailed".to_string()),
                ("limit", "100".to_string()),
                ("tag", "news".to_string()),
            ]
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let url = build_url("http://svc/api/", "/items", &[]).unwrap();
        assert_eq!(url.as_str(), "http://svc/api/items");
    }

    #[test]
    fn malformed_base_is_a_validation_error() {
        let err = build_url("not a url", "/items", &[]).unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
    }
}
