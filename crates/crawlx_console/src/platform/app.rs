use std::io::Write;
use std::sync::Arc;

use crawlx_core::{
    update, AppState, ExportOptions, ExtractionStatus, Msg, NoticeLevel, UrlScrapeRequest,
};
use crawlx_gateway::{AtomicFileWriter, Gateway};
use crawlx_logging::{crawlx_debug, crawlx_info};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use super::clipboard::Clipboard;
use super::effects::EffectRunner;
use super::render;
use crate::Command;

/// Drives the core state machine for one subcommand: dispatches its
/// messages, runs the resulting effects and feeds completions back until
/// nothing is left in flight.
pub struct ConsoleApp {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
    out: Box<dyn Write + Send>,
    errors: usize,
    stats_refreshes: u32,
}

/// What the loop waits for after the initial messages are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Until {
    Settled,
    /// Keep the dashboard open for this many refreshes, or until Ctrl-C.
    StatsRefreshes(Option<u32>),
}

impl ConsoleApp {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        writer: AtomicFileWriter,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self::with_output(gateway, writer, clipboard, Box::new(std::io::stdout()))
    }

    pub fn with_output(
        gateway: Arc<dyn Gateway>,
        writer: AtomicFileWriter,
        clipboard: Arc<dyn Clipboard>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(),
            runner: EffectRunner::new(gateway, writer, clipboard, msg_tx),
            msg_rx,
            out,
            errors: 0,
            stats_refreshes: 0,
        }
    }

    pub async fn run(mut self, command: Command) -> anyhow::Result<()> {
        self.execute(command).await;
        if self.errors > 0 {
            anyhow::bail!("finished with {} error(s)", self.errors);
        }
        Ok(())
    }

    async fn execute(&mut self, command: Command) {
        crawlx_info!("Running {:?}", command);
        match command {
            Command::Health => {
                self.step(vec![Msg::HealthCheckRequested], Until::Settled).await;
            }
            Command::Run { spiders } => {
                self.step(vec![Msg::RunScrapersClicked { spiders }], Until::Settled)
                    .await;
                if self.errors > 0 {
                    return;
                }
                let jobs = render::render_jobs(&self.state.view().jobs);
                self.print(jobs);
                // The post-trigger refresh reloads the item listing.
                if !self.state.view().explorer.items.is_empty() {
                    let items = render::render_items(&self.state.view().explorer);
                    self.print(items);
                }
            }
            Command::Scrape {
                url,
                extract_type,
                wait_for,
                copy,
                save,
            } => {
                let mut request = UrlScrapeRequest::new(url).with_extract_type(extract_type);
                if let Some(wait_for) = wait_for {
                    request = request.with_wait_for(wait_for);
                }
                self.step(vec![Msg::ExtractionSubmitted(request)], Until::Settled)
                    .await;
                let view = self.state.view().extraction;
                if view.status != ExtractionStatus::Succeeded {
                    return;
                }
                self.print(render::render_extraction(&view));
                if copy {
                    self.step(vec![Msg::CopyContentClicked], Until::Settled).await;
                }
                if save {
                    self.step(vec![Msg::SaveContentClicked], Until::Settled).await;
                }
            }
            Command::Items { tag, query, fuzzy } => {
                let has_query = query.as_deref().is_some_and(|q| !q.trim().is_empty());
                let mut msgs = vec![
                    Msg::QueryChanged(query.unwrap_or_default()),
                    Msg::FuzzyToggled(fuzzy),
                ];
                let tag = tag
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty());
                let has_tag = tag.is_some();
                if has_tag {
                    msgs.push(Msg::TagFilterChanged(tag));
                }
                // A tag change already lists; a query needs its own search.
                if has_query || !has_tag {
                    msgs.push(Msg::SearchSubmitted);
                }
                self.step(msgs, Until::Settled).await;
                if self.state.search().last_error.is_none() {
                    let items = render::render_items(&self.state.view().explorer);
                    self.print(items);
                }
            }
            Command::Export {
                format,
                style,
                limit,
                tag,
            } => {
                let options = ExportOptions { style, limit, tag };
                self.step(vec![Msg::ExportClicked { format, options }], Until::Settled)
                    .await;
            }
            Command::Watch { ticks } => {
                self.step(vec![Msg::StatsViewOpened], Until::StatsRefreshes(ticks))
                    .await;
            }
        }
    }

    async fn step(&mut self, msgs: Vec<Msg>, until: Until) {
        for msg in msgs {
            self.dispatch(msg);
        }

        let mut interrupted = false;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            if let Until::StatsRefreshes(Some(limit)) = until {
                if self.stats_refreshes >= limit && self.state.stats().active {
                    self.dispatch(Msg::StatsViewClosed);
                }
            }

            // Read the counter before draining: a task decrements only after
            // its message is queued.
            let idle = self.runner.outstanding() == 0;
            match self.msg_rx.try_recv() {
                Ok(msg) => {
                    self.dispatch(msg);
                    continue;
                }
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }
            if idle && !self.state.is_busy() && !self.state.stats().active {
                break;
            }

            tokio::select! {
                msg = self.msg_rx.recv() => match msg {
                    Some(msg) => self.dispatch(msg),
                    None => break,
                },
                _ = &mut ctrl_c, if !interrupted => {
                    interrupted = true;
                    crawlx_info!("Interrupted");
                    if self.state.stats().active {
                        self.dispatch(Msg::StatsViewClosed);
                    } else {
                        self.runner.shutdown();
                        break;
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        crawlx_debug!("dispatch {}", msg_label(&msg));
        let stats_loaded = matches!(msg, Msg::StatsLoaded { .. });

        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        let notices = self.state.take_notices();
        if !notices.is_empty() {
            for notice in &notices {
                if notice.level == NoticeLevel::Error {
                    self.errors += 1;
                }
                self.print(render::render_notice(notice));
            }
            let (state, _) = update(std::mem::take(&mut self.state), Msg::NoticesShown);
            self.state = state;
        }

        if self.state.consume_dirty() && stats_loaded {
            self.stats_refreshes += 1;
            if let Some(stats) = self.state.view().stats {
                self.print(render::render_stats(&stats));
            }
        }

        self.runner.enqueue(effects);
    }

    fn print(&mut self, text: impl AsRef<str>) {
        // A closed stdout is not worth aborting the command over.
        let _ = writeln!(self.out, "{}", text.as_ref().trim_end_matches('\n'));
    }
}

/// Variant name only; payloads can be large.
fn msg_label(msg: &Msg) -> &'static str {
    match msg {
        Msg::HealthCheckRequested => "HealthCheckRequested",
        Msg::HealthChecked(_) => "HealthChecked",
        Msg::RunScrapersClicked { .. } => "RunScrapersClicked",
        Msg::ScrapersTriggered(_) => "ScrapersTriggered",
        Msg::JobRefreshDue => "JobRefreshDue",
        Msg::ExtractionSubmitted(_) => "ExtractionSubmitted",
        Msg::ExtractionCompleted { .. } => "ExtractionCompleted",
        Msg::CopyContentClicked => "CopyContentClicked",
        Msg::SaveContentClicked => "SaveContentClicked",
        Msg::ClipboardWritten(_) => "ClipboardWritten",
        Msg::ListRequested => "ListRequested",
        Msg::QueryChanged(_) => "QueryChanged",
        Msg::FuzzyToggled(_) => "FuzzyToggled",
        Msg::TagFilterChanged(_) => "TagFilterChanged",
        Msg::SearchSubmitted => "SearchSubmitted",
        Msg::ResetClicked => "ResetClicked",
        Msg::ItemsLoaded { .. } => "ItemsLoaded",
        Msg::ExportClicked { .. } => "ExportClicked",
        Msg::ExportDownloaded { .. } => "ExportDownloaded",
        Msg::FileSaved { .. } => "FileSaved",
        Msg::StatsViewOpened => "StatsViewOpened",
        Msg::StatsViewClosed => "StatsViewClosed",
        Msg::StatsTick => "StatsTick",
        Msg::StatsLoaded { .. } => "StatsLoaded",
        Msg::NoticesShown => "NoticesShown",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::platform::clipboard::testing::RecordingClipboard;
    use crate::platform::fake_gateway::FakeGateway;
    use crawlx_core::{ExportFormat, ExtractType, HealthStatus, ScrapedItem, UrlScrapeResponse};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl SharedOutput {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Harness {
        dir: TempDir,
        gateway: Arc<FakeGateway>,
        clipboard: Arc<RecordingClipboard>,
        output: SharedOutput,
    }

    impl Harness {
        fn new(gateway: FakeGateway) -> Self {
            crawlx_logging::initialize_for_tests();
            Self {
                dir: TempDir::new().unwrap(),
                gateway: Arc::new(gateway),
                clipboard: Arc::new(RecordingClipboard::default()),
                output: SharedOutput::default(),
            }
        }

        async fn run(&self, command: Command) -> anyhow::Result<()> {
            let app = ConsoleApp::with_output(
                self.gateway.clone(),
                AtomicFileWriter::new(self.dir.path().to_path_buf()),
                self.clipboard.clone(),
                Box::new(self.output.clone()),
            );
            app.run(command).await
        }
    }

    fn items() -> Vec<ScrapedItem> {
        serde_json::from_value(serde_json::json!([
            {"id": 1, "source": "news_spider", "title": "Rust 2.0", "url": "",
             "tags": ["news"], "scraped_at": "2024-05-01T08:30:00"},
            {"id": 2, "source": "jobs_spider", "title": "Rust engineer", "url": "",
             "tags": "jobs", "scraped_at": "2024-05-01T09:00:00"}
        ]))
        .unwrap()
    }

    fn page(title: &str, content: &str) -> UrlScrapeResponse {
        serde_json::from_value(serde_json::json!({
            "success": true,
            "url": "https://example.com/a",
            "title": title,
            "content": content,
            "extracted_at": "2024-05-01T10:00:00"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn health_prints_service_status() {
        let harness = Harness::new(FakeGateway {
            health: Some(HealthStatus {
                status: "healthy".into(),
            }),
            ..FakeGateway::default()
        });

        harness.run(Command::Health).await.unwrap();
        assert_eq!(harness.output.text(), "[health] Service status: healthy\n");
    }

    #[tokio::test]
    async fn unreachable_service_fails_the_command() {
        let harness = Harness::new(FakeGateway::default());

        let err = harness
            .run(Command::Items {
                tag: None,
                query: None,
                fuzzy: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "finished with 1 error(s)");
        assert_eq!(harness.output.text(), "[items] error: network error: offline\n");
    }

    #[tokio::test]
    async fn tag_and_query_supersede_the_tag_listing() {
        let harness = Harness::new(FakeGateway {
            items: Some(items()),
            ..FakeGateway::default()
        });

        harness
            .run(Command::Items {
                tag: Some("jobs".into()),
                query: Some("rust".into()),
                fuzzy: true,
            })
            .await
            .unwrap();

        let mut calls = harness.gateway.calls();
        calls.sort();
        assert_eq!(calls, vec!["list tag=Some(\"jobs\")", "search q=rust"]);
        assert!(harness
            .output
            .text()
            .starts_with("2 item(s) matching query \"rust\", fuzzy, tag jobs\n"));
    }

    #[tokio::test]
    async fn blank_tag_still_lists_items() {
        let harness = Harness::new(FakeGateway {
            items: Some(items()),
            ..FakeGateway::default()
        });

        harness
            .run(Command::Items {
                tag: Some("  ".into()),
                query: None,
                fuzzy: false,
            })
            .await
            .unwrap();

        assert_eq!(harness.gateway.calls(), vec!["list tag=None"]);
        assert!(harness.output.text().starts_with("2 item(s)\n"));
    }

    #[tokio::test]
    async fn export_saves_fixed_filename() {
        let harness = Harness::new(FakeGateway {
            export: Some(b"id,title\n1,a\n".to_vec()),
            ..FakeGateway::default()
        });

        harness
            .run(Command::Export {
                format: ExportFormat::Csv,
                style: "detailed".into(),
                limit: 100,
                tag: None,
            })
            .await
            .unwrap();

        let saved = harness.dir.path().join("scraped_data.csv");
        assert_eq!(std::fs::read(&saved).unwrap(), b"id,title\n1,a\n");
        assert_eq!(
            harness.output.text(),
            format!("[export] Saved {}\n", saved.display())
        );
    }

    #[tokio::test]
    async fn scrape_copies_and_saves_full_text() {
        let harness = Harness::new(FakeGateway {
            scrape: Some(page("Hello: World", "full body text")),
            ..FakeGateway::default()
        });

        harness
            .run(Command::Scrape {
                url: " https://example.com/a ".into(),
                extract_type: ExtractType::Article,
                wait_for: Some(30),
                copy: true,
                save: true,
            })
            .await
            .unwrap();

        assert_eq!(harness.gateway.calls(), vec!["scrape https://example.com/a"]);
        assert_eq!(
            *harness.clipboard.writes.lock().unwrap(),
            vec!["full body text".to_string()]
        );
        let saved = harness.dir.path().join("Hello_ World.txt");
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "full body text");
        let output = harness.output.text();
        assert!(output.contains("[clipboard] Content copied to clipboard!"));
        assert!(output.contains(&format!("[extract] Saved {}", saved.display())));
    }

    #[tokio::test]
    async fn failed_scrape_skips_copy() {
        let harness = Harness::new(FakeGateway::default());

        let result = harness
            .run(Command::Scrape {
                url: "https://example.com/a".into(),
                extract_type: ExtractType::Auto,
                wait_for: None,
                copy: true,
                save: false,
            })
            .await;

        assert!(result.is_err());
        assert!(harness.clipboard.writes.lock().unwrap().is_empty());
        assert_eq!(harness.output.text(), "[extract] error: network error: offline\n");
    }

    #[tokio::test(start_paused = true)]
    async fn run_waits_for_refresh_and_lists_items() {
        let harness = Harness::new(FakeGateway {
            items: Some(items()),
            ..FakeGateway::default()
        });

        harness
            .run(Command::Run {
                spiders: vec!["news".into()],
            })
            .await
            .unwrap();

        assert_eq!(harness.gateway.calls(), vec!["run", "list tag=None"]);
        let output = harness.output.text();
        assert!(output.starts_with("[jobs] Scrapers started successfully!\n"));
        assert!(output.contains("Scheduled: news\n"));
        assert!(output.contains("2 item(s)\n"));
    }

    #[tokio::test]
    async fn watch_stops_after_requested_refreshes() {
        let harness = Harness::new(FakeGateway {
            items: Some(items()),
            ..FakeGateway::default()
        });

        harness
            .run(Command::Watch { ticks: Some(1) })
            .await
            .unwrap();

        let output = harness.output.text();
        assert!(output.starts_with("Total: 2  Today: "), "{output}");
        assert!(output.contains("By tag: jobs=1 news=1"));
        assert_eq!(harness.gateway.calls().len(), 1);
    }
}
