//! Document controller – owns the editor content, keeps pages and preview
//! in sync, and runs the save / reset / export commands one at a time.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::debounce::Debouncer;
use crate::dom::ElementNode;
use crate::error::{Error, Result};
use crate::export::{export_preview, ArtifactSink, ExportReport, FileSink};
use crate::i18n::{process_locale, t, Lang};
use crate::measure::{LayoutMeasurer, Measure};
use crate::paginate::{paginate, Pages};
use crate::preview::{build_preview, highlight_block};
use crate::raster::{BoxRasterizer, Rasterizer};
use crate::storage::{Clock, DraftStore, KeyValueStore};

// ---------------------------------------------------------------------------
// Single-flight state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Save,
    Reset,
    Export,
}

impl OperationKind {
    /// i18n key of the loading label.
    pub fn progress_key(self) -> &'static str {
        match self {
            OperationKind::Save => "saving",
            OperationKind::Reset => "resetting",
            OperationKind::Export => "exporting",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Save => "save",
            OperationKind::Reset => "reset",
            OperationKind::Export => "export",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Activity {
    #[default]
    Idle,
    InProgress(OperationKind),
}

/// Shared activity cell. Every surface that can start a command holds a
/// clone, so at most one command runs at a time across all of them.
#[derive(Debug, Clone, Default)]
pub struct FlightState(Rc<Cell<Activity>>);

impl FlightState {
    pub fn current(&self) -> Activity {
        self.0.get()
    }

    /// Start `kind`, or fail with [`Error::Busy`] naming the running command.
    pub fn begin(&self, kind: OperationKind) -> Result<FlightGuard> {
        match self.0.get() {
            Activity::InProgress(running) => Err(Error::Busy(running)),
            Activity::Idle => {
                self.0.set(Activity::InProgress(kind));
                Ok(FlightGuard {
                    state: Rc::clone(&self.0),
                })
            }
        }
    }
}

/// Marks a command as running; returns the state to idle when dropped.
#[derive(Debug)]
pub struct FlightGuard {
    state: Rc<Cell<Activity>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.state.set(Activity::Idle);
    }
}

// ---------------------------------------------------------------------------
// Notices & commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// Localized outcome of a command, for the UI shell to display.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    /// i18n key the message was built from.
    pub key: &'static str,
    pub message: String,
    /// Underlying error text for failures.
    pub detail: Option<String>,
}

impl Notice {
    fn success(lang: Lang, key: &'static str) -> Self {
        Self {
            level: NoticeLevel::Success,
            key,
            message: t(lang, key).to_string(),
            detail: None,
        }
    }

    fn failure(lang: Lang, key: &'static str, err: &Error) -> Self {
        Self {
            level: NoticeLevel::Failure,
            key,
            message: t(lang, key).to_string(),
            detail: Some(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

/// The operations a UI shell may invoke.
pub trait Commands {
    fn save(&mut self) -> Result<Notice>;
    fn reset(&mut self) -> Result<Notice>;
    fn export_document(&mut self) -> Result<Notice>;
}

fn pause(d: Duration) {
    if !d.is_zero() {
        std::thread::sleep(d);
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct Controller<S, C> {
    config: AppConfig,
    content: String,
    pages: Pages,
    preview: ElementNode,
    lang: Lang,
    drafts: DraftStore<S, C>,
    measurer: Box<dyn Measure>,
    rasterizer: Box<dyn Rasterizer>,
    sink: Box<dyn ArtifactSink>,
    flight: FlightState,
    resize: Debouncer,
    last_export: Option<ExportReport>,
}

impl<S: KeyValueStore, C: Clock> Controller<S, C> {
    /// Controller with the layout-backed measurer and rasterizer, writing
    /// exports into the working directory. The UI language is the stored
    /// one, else the process locale's, else `config.lang`.
    pub fn new(config: AppConfig, drafts: DraftStore<S, C>) -> Self {
        let locale = process_locale();
        Self::with_locale(config, drafts, locale.as_deref())
    }

    /// [`Controller::new`] with the locale given instead of read from the
    /// environment.
    pub fn with_locale(config: AppConfig, drafts: DraftStore<S, C>, locale: Option<&str>) -> Self {
        let width = config.page_width_px();
        let lang = drafts
            .load_lang()
            .or_else(|| locale.and_then(Lang::from_locale))
            .unwrap_or(config.lang);
        let pages = Pages::placeholder();
        let preview = build_preview(&pages, t(lang, "content_placeholder"));
        Self {
            resize: Debouncer::new(config.resize_debounce()),
            config,
            content: String::new(),
            pages,
            preview,
            lang,
            drafts,
            measurer: Box::new(LayoutMeasurer::new()),
            rasterizer: Box::new(BoxRasterizer::new(width)),
            sink: Box::new(FileSink::new(".")),
            flight: FlightState::default(),
            last_export: None,
        }
    }

    pub fn with_measurer(mut self, measurer: impl Measure + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    pub fn with_sink(mut self, sink: impl ArtifactSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Share the single-flight state with another command surface.
    pub fn with_flight_state(mut self, flight: FlightState) -> Self {
        self.flight = flight;
        self
    }

    pub fn flight_state(&self) -> FlightState {
        self.flight.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn pages(&self) -> &Pages {
        &self.pages
    }

    pub fn preview(&self) -> &ElementNode {
        &self.preview
    }

    pub fn drafts(&self) -> &DraftStore<S, C> {
        &self.drafts
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn last_export(&self) -> Option<&ExportReport> {
        self.last_export.as_ref()
    }

    /// The running command, for a loading indicator.
    pub fn loading(&self) -> Option<OperationKind> {
        match self.flight.current() {
            Activity::Idle => None,
            Activity::InProgress(kind) => Some(kind),
        }
    }

    pub fn loading_label(&self) -> Option<&'static str> {
        self.loading().map(|kind| t(self.lang, kind.progress_key()))
    }

    /// Replace the content and re-paginate immediately.
    pub fn set_content(&mut self, markup: impl Into<String>) {
        self.content = markup.into();
        self.repaginate();
    }

    /// Restore the saved draft, if any. Returns whether content was loaded.
    pub fn hydrate(&mut self) -> bool {
        match self.drafts.load() {
            Some(content) => {
                log::debug!("Hydrated draft ({} bytes)", content.len());
                self.set_content(content);
                true
            }
            None => false,
        }
    }

    pub fn set_lang(&mut self, lang: Lang) {
        self.lang = lang;
        if let Err(e) = self.drafts.save_lang(lang) {
            log::warn!("Could not persist language: {e}");
        }
        self.rebuild_preview();
    }

    /// Record a resize; re-pagination waits for [`Controller::poll_resize`].
    pub fn on_resize(&mut self, now: Instant) {
        self.resize.trigger(now);
    }

    /// Re-paginate if the resize burst has settled. Returns whether it did.
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        if self.resize.poll(now) {
            self.repaginate();
            true
        } else {
            false
        }
    }

    pub fn highlight_block(&mut self, block_id: &str) -> usize {
        highlight_block(&mut self.preview, block_id)
    }

    pub fn repaginate(&mut self) {
        self.pages = paginate(
            &self.content,
            self.config.page_width_px(),
            self.config.budget,
            self.measurer.as_mut(),
        );
        self.rebuild_preview();
    }

    fn rebuild_preview(&mut self) {
        self.preview = build_preview(&self.pages, t(self.lang, "content_placeholder"));
    }
}

impl<S: KeyValueStore, C: Clock> Commands for Controller<S, C> {
    fn save(&mut self) -> Result<Notice> {
        let _flight = self.flight.begin(OperationKind::Save)?;
        match self.drafts.save(&self.content) {
            Ok(()) => {
                pause(self.config.save_delay());
                log::info!("Draft saved ({} bytes)", self.content.len());
                Ok(Notice::success(self.lang, "save_success"))
            }
            Err(e) => {
                log::error!("Saving draft failed: {e}");
                Ok(Notice::failure(self.lang, "save_failed", &e))
            }
        }
    }

    fn reset(&mut self) -> Result<Notice> {
        let _flight = self.flight.begin(OperationKind::Reset)?;
        if let Err(e) = self.drafts.mark_reset() {
            log::warn!("Could not record reset marker: {e}");
        }
        if let Err(e) = self.drafts.clear() {
            log::warn!("Could not remove draft: {e}");
        }
        self.content.clear();
        self.repaginate();
        pause(self.config.reset_delay());
        log::info!("Document reset");
        Ok(Notice::success(self.lang, "reset_success"))
    }

    fn export_document(&mut self) -> Result<Notice> {
        let _flight = self.flight.begin(OperationKind::Export)?;
        let opts = self.config.export_options();
        match export_preview(
            &mut self.preview,
            self.rasterizer.as_mut(),
            self.sink.as_mut(),
            &opts,
        ) {
            Ok(report) => {
                self.last_export = Some(report);
                Ok(Notice::success(self.lang, "export_success"))
            }
            Err(e) => {
                log::error!("PDF export failed: {e}");
                Ok(Notice::failure(self.lang, "export_failed", &e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemorySink;
    use crate::storage::{ManualClock, MemoryStore};

    fn controller() -> Controller<MemoryStore, ManualClock> {
        Controller::with_locale(
            AppConfig::without_delays(),
            DraftStore::new(MemoryStore::new(), ManualClock::new(10_000)),
            None,
        )
        .with_sink(MemorySink::default())
    }

    #[test]
    fn starts_with_placeholder_page() {
        let c = controller();
        assert!(c.pages().is_placeholder());
        assert_eq!(c.loading(), None);
    }

    #[test]
    fn busy_while_another_command_runs() {
        let mut c = controller();
        let flight = c.flight_state();
        let guard = flight.begin(OperationKind::Export).unwrap();
        assert_eq!(c.loading(), Some(OperationKind::Export));
        assert!(matches!(c.save(), Err(Error::Busy(OperationKind::Export))));
        drop(guard);
        assert_eq!(flight.current(), Activity::Idle);
        assert!(c.save().unwrap().is_success());
        assert_eq!(flight.current(), Activity::Idle);
    }

    #[test]
    fn save_and_hydrate() {
        let mut c = controller();
        c.set_content("<p>draft</p>");
        let notice = c.save().unwrap();
        assert_eq!(notice.key, "save_success");
        assert_eq!(notice.message, "저장되었습니다.");

        c.set_content("");
        assert!(c.hydrate());
        assert_eq!(c.content(), "<p>draft</p>");
    }

    #[test]
    fn reset_clears_and_suppresses_hydration() {
        let mut c = controller();
        c.set_content("<p>draft</p>");
        c.save().unwrap();
        assert!(c.reset().unwrap().is_success());
        assert_eq!(c.content(), "");
        assert!(c.pages().is_placeholder());
        assert!(!c.hydrate());
    }

    #[test]
    fn language_switch_relocalizes_placeholder() {
        let mut c = controller();
        c.set_lang(Lang::En);
        assert_eq!(c.preview().text_content(), t(Lang::En, "content_placeholder"));
        assert_eq!(c.drafts().load_lang(), Some(Lang::En));
        assert_eq!(c.loading_label(), None);
    }

    #[test]
    fn stored_language_beats_locale_beats_config() {
        let drafts = || DraftStore::new(MemoryStore::new(), ManualClock::new(0));
        let config = AppConfig::without_delays();

        let c = Controller::with_locale(config.clone(), drafts(), Some("ja_JP.UTF-8"));
        assert_eq!(c.lang(), Lang::Ja);
        assert_eq!(c.preview().text_content(), t(Lang::Ja, "content_placeholder"));

        let c = Controller::with_locale(config.clone(), drafts(), Some("C"));
        assert_eq!(c.lang(), config.lang);

        let mut stored = drafts();
        stored.save_lang(Lang::Zh).unwrap();
        let c = Controller::with_locale(config, stored, Some("ja_JP.UTF-8"));
        assert_eq!(c.lang(), Lang::Zh);
    }

    #[test]
    fn busy_error_names_operation() {
        assert_eq!(Error::Busy(OperationKind::Save).to_string(), "Busy: save in progress");
    }
}
