use crate::state::{ExportPhase, ExtractionPhase, JobPhase, NoticeScope};
use crate::{
    text_download_filename, AppState, ConsoleError, Effect, ExtractionOutcome, Msg, SavePurpose,
    ScrapeJobRequest, Stats, JOB_REFRESH_DELAY, STATS_REFRESH_INTERVAL,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::HealthCheckRequested => vec![Effect::CheckHealth],
        Msg::HealthChecked(result) => {
            match &result {
                Ok(health) => state.notify(
                    NoticeScope::Health,
                    format!("Service status: {}", health.status),
                ),
                Err(err) => state.notify_error(NoticeScope::Health, err),
            }
            state.health = Some(result);
            state.mark_dirty();
            Vec::new()
        }

        Msg::RunScrapersClicked { spiders } => {
            // One trigger per control: no queueing behind an in-flight request.
            if state.jobs.phase == JobPhase::Triggering {
                return (state, Vec::new());
            }
            state.jobs.phase = JobPhase::Triggering;
            state.mark_dirty();
            vec![Effect::RunScrapers {
                request: ScrapeJobRequest::for_spiders(spiders),
            }]
        }
        Msg::ScrapersTriggered(result) => {
            if state.jobs.phase != JobPhase::Triggering {
                return (state, Vec::new());
            }
            state.mark_dirty();
            match result {
                Ok(response) => {
                    state.jobs.phase = JobPhase::Idle;
                    let message = if response.message.trim().is_empty() {
                        "Scrapers started successfully!".to_string()
                    } else {
                        response.message.clone()
                    };
                    state.notify(NoticeScope::Jobs, message.clone());
                    state.jobs.last_message = Some(message);
                    state.jobs.scheduled_spiders = response.spiders;
                    vec![Effect::ScheduleRefresh {
                        delay: JOB_REFRESH_DELAY,
                    }]
                }
                Err(err) => {
                    state.notify_error(NoticeScope::Jobs, &err);
                    state.jobs.phase = JobPhase::Failed(err);
                    Vec::new()
                }
            }
        }
        Msg::JobRefreshDue => {
            let mut effects = vec![reissue_current_view(&mut state)];
            if state.stats.active && !state.stats.seq.in_flight() {
                effects.push(issue_stats_fetch(&mut state));
            }
            state.mark_dirty();
            effects
        }

        Msg::ExtractionSubmitted(request) => {
            state.mark_dirty();
            if let Err(err) = request.validate() {
                // Also supersedes any extraction still in flight.
                state.extraction.seq.invalidate();
                state.notify_error(NoticeScope::Extraction, &err);
                state.extraction.phase = ExtractionPhase::Failed(err);
                return (state, Vec::new());
            }
            let seq = state.extraction.seq.issue();
            state.extraction.phase = ExtractionPhase::Pending;
            vec![Effect::ScrapeUrl { seq, request }]
        }
        Msg::ExtractionCompleted { seq, result } => {
            if !state.extraction.seq.complete(seq) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            let outcome = result.map(|response| response.into_outcome());
            state.extraction.phase = match outcome {
                Ok(ExtractionOutcome::Extracted(page)) => ExtractionPhase::Succeeded(page),
                Ok(ExtractionOutcome::Failed { error }) => {
                    let err = ConsoleError::Service {
                        status: 200,
                        message: error,
                    };
                    state.notify_error(NoticeScope::Extraction, &err);
                    ExtractionPhase::Failed(err)
                }
                Err(err) => {
                    state.notify_error(NoticeScope::Extraction, &err);
                    ExtractionPhase::Failed(err)
                }
            };
            Vec::new()
        }
        Msg::CopyContentClicked => {
            let text = state
                .extraction
                .result()
                .and_then(|page| page.text())
                .map(str::to_string);
            match text {
                Some(text) => vec![Effect::CopyToClipboard { text }],
                None => {
                    let err = ConsoleError::Validation("No extracted content to copy".to_string());
                    state.notify_error(NoticeScope::Clipboard, &err);
                    Vec::new()
                }
            }
        }
        Msg::SaveContentClicked => {
            let save = state.extraction.result().and_then(|page| {
                page.text().map(|text| Effect::SaveFile {
                    purpose: SavePurpose::ExtractedText,
                    filename: text_download_filename(page.title.as_deref()),
                    bytes: text.as_bytes().to_vec(),
                })
            });
            match save {
                Some(effect) => vec![effect],
                None => {
                    let err = ConsoleError::Validation("No extracted content to save".to_string());
                    state.notify_error(NoticeScope::Extraction, &err);
                    Vec::new()
                }
            }
        }
        Msg::ClipboardWritten(result) => {
            match result {
                Ok(()) => state.notify(NoticeScope::Clipboard, "Content copied to clipboard!"),
                Err(err) => state.notify_error(NoticeScope::Clipboard, &err),
            }
            Vec::new()
        }

        Msg::ListRequested => vec![issue_listing(&mut state)],
        Msg::QueryChanged(query) => {
            state.search.query = query;
            state.mark_dirty();
            Vec::new()
        }
        Msg::FuzzyToggled(fuzzy) => {
            state.search.fuzzy = fuzzy;
            state.mark_dirty();
            Vec::new()
        }
        Msg::TagFilterChanged(tag) => {
            let tag = tag
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty());
            if tag == state.search.tag {
                return (state, Vec::new());
            }
            state.search.tag = tag;
            vec![issue_listing(&mut state)]
        }
        Msg::SearchSubmitted => vec![reissue_current_view(&mut state)],
        Msg::ResetClicked => {
            state.search.query.clear();
            state.search.tag = None;
            state.search.fuzzy = false;
            vec![issue_listing(&mut state)]
        }
        Msg::ItemsLoaded { seq, result } => {
            if !state.search.seq.complete(seq) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            match result {
                Ok(items) => {
                    state.search.items = items;
                    state.search.last_error = None;
                }
                Err(err) => {
                    // Keep whatever the last successful load displayed.
                    state.notify_error(NoticeScope::Explorer, &err);
                    state.search.last_error = Some(err);
                }
            }
            Vec::new()
        }

        Msg::ExportClicked { format, options } => {
            if state.exports.contains_key(&format) {
                return (state, Vec::new());
            }
            state.exports.insert(format, ExportPhase::Downloading);
            state.mark_dirty();
            vec![Effect::ExportBlob { format, options }]
        }
        Msg::ExportDownloaded { format, result } => {
            if state.exports.get(&format) != Some(&ExportPhase::Downloading) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            match result {
                Ok(bytes) => {
                    state.exports.insert(format, ExportPhase::Saving);
                    vec![Effect::SaveFile {
                        purpose: SavePurpose::Export(format),
                        filename: format.filename().to_string(),
                        bytes,
                    }]
                }
                Err(err) => {
                    state.exports.remove(&format);
                    state.notify_error(NoticeScope::Export, &err);
                    Vec::new()
                }
            }
        }
        Msg::FileSaved { purpose, result } => {
            let scope = match purpose {
                SavePurpose::Export(format) => {
                    state.exports.remove(&format);
                    NoticeScope::Export
                }
                SavePurpose::ExtractedText => NoticeScope::Extraction,
            };
            match result {
                Ok(path) => state.notify(scope, format!("Saved {}", path.display())),
                Err(err) => state.notify_error(scope, &err),
            }
            Vec::new()
        }

        Msg::StatsViewOpened => {
            if state.stats.active {
                return (state, Vec::new());
            }
            state.stats.active = true;
            state.mark_dirty();
            vec![
                Effect::StartPolling {
                    interval: STATS_REFRESH_INTERVAL,
                },
                issue_stats_fetch(&mut state),
            ]
        }
        Msg::StatsViewClosed => {
            if !state.stats.active {
                return (state, Vec::new());
            }
            state.stats.active = false;
            state.stats.seq.invalidate();
            state.mark_dirty();
            vec![Effect::StopPolling]
        }
        Msg::StatsTick => {
            // Overlapping polls are skipped; the transport timeout bounds a stuck one.
            if !state.stats.active || state.stats.seq.in_flight() {
                return (state, Vec::new());
            }
            vec![issue_stats_fetch(&mut state)]
        }
        Msg::StatsLoaded { seq, today, result } => {
            if !state.stats.active || !state.stats.seq.complete(seq) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            match result {
                Ok(items) => {
                    state.stats.stats = Some(Stats::derive(&items, today));
                    state.stats.items = items;
                    state.stats.last_error = None;
                }
                Err(err) => {
                    state.notify_error(NoticeScope::Stats, &err);
                    state.stats.last_error = Some(err);
                }
            }
            Vec::new()
        }

        Msg::NoticesShown => {
            if matches!(state.jobs.phase, JobPhase::Failed(_)) {
                state.jobs.phase = JobPhase::Idle;
                state.mark_dirty();
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn issue_listing(state: &mut AppState) -> Effect {
    let seq = state.search.seq.issue();
    state.mark_dirty();
    Effect::ListItems {
        seq,
        query: state.search.list_query(),
    }
}

/// Re-runs whatever the explorer currently shows: a search when a query is
/// set, otherwise a plain listing.
fn reissue_current_view(state: &mut AppState) -> Effect {
    match state.search.search_query() {
        Some(query) => {
            let seq = state.search.seq.issue();
            state.mark_dirty();
            Effect::SearchItems { seq, query }
        }
        None => issue_listing(state),
    }
}

fn issue_stats_fetch(state: &mut AppState) -> Effect {
    let seq = state.stats.seq.issue();
    Effect::FetchStats {
        seq,
        query: state.stats.query(),
    }
}
