use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use crawlx_core::{ConsoleError, Effect, Msg};
use crawlx_gateway::{AtomicFileWriter, Gateway};
use crawlx_logging::{crawlx_debug, crawlx_info, crawlx_warn};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::clipboard::Clipboard;

/// Executes core effects and reports each completion back as a `Msg`.
pub struct EffectRunner {
    gateway: Arc<dyn Gateway>,
    writer: AtomicFileWriter,
    clipboard: Arc<dyn Clipboard>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    shutdown: CancellationToken,
    polling: Option<CancellationToken>,
    /// One-shot tasks whose completion message has not been sent yet.
    outstanding: Arc<AtomicUsize>,
}

impl EffectRunner {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        writer: AtomicFileWriter,
        clipboard: Arc<dyn Clipboard>,
        msg_tx: mpsc::UnboundedSender<Msg>,
    ) -> Self {
        Self {
            gateway,
            writer,
            clipboard,
            msg_tx,
            shutdown: CancellationToken::new(),
            polling: None,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Must be called from inside a tokio runtime.
    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.execute(effect);
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn is_polling(&self) -> bool {
        self.polling.is_some()
    }

    /// Cancels timers and the poller. Requests already on the wire still
    /// complete and report back.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.polling = None;
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::CheckHealth => {
                let gateway = Arc::clone(&self.gateway);
                self.spawn_task(async move { Some(Msg::HealthChecked(gateway.health().await)) });
            }
            Effect::RunScrapers { request } => {
                crawlx_info!("RunScrapers spiders={:?}", request.spiders);
                let gateway = Arc::clone(&self.gateway);
                self.spawn_task(async move {
                    Some(Msg::ScrapersTriggered(gateway.run_scrapers(&request).await))
                });
            }
            Effect::ScheduleRefresh { delay } => {
                crawlx_debug!("ScheduleRefresh in {:?}", delay);
                let cancel = self.shutdown.child_token();
                self.spawn_task(async move {
                    tokio::select! {
                        _ = cancel.cancelled() => None,
                        _ = tokio::time::sleep(delay) => Some(Msg::JobRefreshDue),
                    }
                });
            }
            Effect::ScrapeUrl { seq, request } => {
                crawlx_info!(
                    "ScrapeUrl seq={} url={} type={}",
                    seq,
                    request.url,
                    request.extract_type
                );
                let gateway = Arc::clone(&self.gateway);
                self.spawn_task(async move {
                    let result = gateway.scrape_url(&request).await;
                    Some(Msg::ExtractionCompleted { seq, result })
                });
            }
            Effect::ListItems { seq, query } => {
                crawlx_debug!("ListItems seq={} tag={:?}", seq, query.tag);
                let gateway = Arc::clone(&self.gateway);
                self.spawn_task(async move {
                    let result = gateway.list_items(&query).await;
                    Some(Msg::ItemsLoaded { seq, result })
                });
            }
            Effect::SearchItems { seq, query } => {
                crawlx_debug!("SearchItems seq={} q={:?} fuzzy={:?}", seq, query.q, query.fuzzy);
                let gateway = Arc::clone(&self.gateway);
                self.spawn_task(async move {
                    let result = gateway.search_items(&query).await;
                    Some(Msg::ItemsLoaded { seq, result })
                });
            }
            Effect::FetchStats { seq, query } => {
                crawlx_debug!("FetchStats seq={}", seq);
                let gateway = Arc::clone(&self.gateway);
                self.spawn_task(async move {
                    let result = gateway.list_items(&query).await;
                    Some(Msg::StatsLoaded {
                        seq,
                        today: Local::now().date_naive(),
                        result,
                    })
                });
            }
            Effect::StartPolling { interval } => self.start_polling(interval),
            Effect::StopPolling => {
                if let Some(token) = self.polling.take() {
                    crawlx_info!("Stats polling stopped");
                    token.cancel();
                }
            }
            Effect::ExportBlob { format, options } => {
                crawlx_info!("ExportBlob format={}", format);
                let gateway = Arc::clone(&self.gateway);
                self.spawn_task(async move {
                    let result = gateway
                        .export_blob(format, &options)
                        .await
                        .map(|bytes| bytes.to_vec());
                    Some(Msg::ExportDownloaded { format, result })
                });
            }
            Effect::SaveFile {
                purpose,
                filename,
                bytes,
            } => {
                let writer = self.writer.clone();
                self.spawn_task(async move {
                    let result = save_file(writer, filename, bytes).await;
                    Some(Msg::FileSaved { purpose, result })
                });
            }
            Effect::CopyToClipboard { text } => {
                let result = self.clipboard.write_text(&text);
                if let Err(err) = &result {
                    crawlx_warn!("Clipboard write failed: {}", err);
                }
                let _ = self.msg_tx.send(Msg::ClipboardWritten(result));
            }
        }
    }

    fn start_polling(&mut self, interval: Duration) {
        if let Some(previous) = self.polling.take() {
            previous.cancel();
        }
        let token = self.shutdown.child_token();
        self.polling = Some(token.clone());
        crawlx_info!("Stats polling every {:?}", interval);

        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if msg_tx.send(Msg::StatsTick).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = Option<Msg>> + Send + 'static,
    {
        let msg_tx = self.msg_tx.clone();
        let outstanding = Arc::clone(&self.outstanding);
        outstanding.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            if let Some(msg) = task.await {
                let _ = msg_tx.send(msg);
            }
            // Decrement only after the send so a zero count implies an
            // observable message.
            outstanding.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

async fn save_file(
    writer: AtomicFileWriter,
    filename: String,
    bytes: Vec<u8>,
) -> Result<PathBuf, ConsoleError> {
    let joined = tokio::task::spawn_blocking(move || writer.write(&filename, &bytes)).await;
    match joined {
        Ok(Ok(path)) => {
            crawlx_info!("Saved {} ({} bytes)", path.display(), path_len(&path));
            Ok(path)
        }
        Ok(Err(err)) => {
            crawlx_warn!("Save failed: {}", err);
            Err(err.into())
        }
        Err(err) => Err(ConsoleError::Io(format!("save task failed: {err}"))),
    }
}

fn path_len(path: &std::path::Path) -> u64 {
    std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}
