//! Application state management for the HostPilot dashboard
//!
//! This module contains the main application state: one cached resource per
//! panel, keyboard handling, and the refresh and cache-clearing actions the
//! keys trigger.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;
use std::time::Duration;

use hostpilot::cache::{CacheContext, CachedResource, LoadPhase, ResourceOptions};
use hostpilot::models::{
    Booking, DashboardStats, Property, Task, BOOKINGS_PATH, DASHBOARD_STATS_PATH,
    PROPERTIES_PATH, TASKS_PATH,
};

/// Dashboard panels, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Dashboard,
    Properties,
    Bookings,
    Tasks,
}

impl Panel {
    pub const ALL: [Panel; 4] = [
        Panel::Dashboard,
        Panel::Properties,
        Panel::Bookings,
        Panel::Tasks,
    ];

    /// Tab title
    pub fn title(self) -> &'static str {
        match self {
            Panel::Dashboard => "Dashboard",
            Panel::Properties => "Properties",
            Panel::Bookings => "Bookings",
            Panel::Tasks => "Tasks",
        }
    }

    /// Cache key backing the panel
    pub fn key(self) -> &'static str {
        match self {
            Panel::Dashboard => DASHBOARD_STATS_PATH,
            Panel::Properties => PROPERTIES_PATH,
            Panel::Bookings => BOOKINGS_PATH,
            Panel::Tasks => TASKS_PATH,
        }
    }

    /// Substring used to clear this panel's cache entries
    pub fn clear_pattern(self) -> &'static str {
        match self {
            Panel::Dashboard => "dashboard",
            Panel::Properties => "properties",
            Panel::Bookings => "bookings",
            Panel::Tasks => "tasks",
        }
    }

    pub fn index(self) -> usize {
        Panel::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    fn next(self) -> Panel {
        Panel::ALL[(self.index() + 1) % Panel::ALL.len()]
    }

    fn previous(self) -> Panel {
        Panel::ALL[(self.index() + Panel::ALL.len() - 1) % Panel::ALL.len()]
    }
}

/// Summary of one panel's load state for the status bar
#[derive(Debug, Clone, PartialEq)]
pub struct PanelStatus {
    pub phase: LoadPhase,
    pub is_stale: bool,
    pub error: Option<String>,
}

/// Which panels a refresh applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScope {
    Current,
    All,
}

/// Main application struct managing state and data
pub struct App {
    /// Currently shown panel
    pub panel: Panel,
    /// Index of the selected row in list panels
    pub selected_index: usize,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Pending refresh requested from the keyboard
    pub refresh_requested: Option<RefreshScope>,
    /// Timestamp of last manual refresh
    pub last_refresh: Option<DateTime<Local>>,
    /// One-line feedback shown in the status bar
    pub status_message: Option<String>,
    /// Shared cache all panels read from
    cache: CacheContext,
    pub stats: Arc<CachedResource<DashboardStats>>,
    pub properties: Arc<CachedResource<Vec<Property>>>,
    pub bookings: Arc<CachedResource<Vec<Booking>>>,
    pub tasks: Arc<CachedResource<Vec<Task>>>,
}

impl App {
    /// Creates the app and mounts one resource per panel
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cache: CacheContext, refetch_interval: Option<Duration>) -> Self {
        let options = ResourceOptions {
            refetch_interval,
            ..Default::default()
        };
        Self {
            panel: Panel::Dashboard,
            selected_index: 0,
            should_quit: false,
            show_help: false,
            refresh_requested: None,
            last_refresh: None,
            status_message: None,
            stats: Arc::new(cache.use_cached_data(DASHBOARD_STATS_PATH, options.clone())),
            properties: Arc::new(cache.use_cached_data(PROPERTIES_PATH, options.clone())),
            bookings: Arc::new(cache.use_cached_data(BOOKINGS_PATH, options.clone())),
            tasks: Arc::new(cache.use_cached_data(TASKS_PATH, options)),
            cache,
        }
    }

    /// The cache the panels are bound to
    pub fn cache(&self) -> &CacheContext {
        &self.cache
    }

    /// Number of rows in the current panel
    pub fn row_count(&self) -> usize {
        match self.panel {
            Panel::Dashboard => 0,
            Panel::Properties => self.properties.data().map_or(0, |v| v.len()),
            Panel::Bookings => self.bookings.data().map_or(0, |v| v.len()),
            Panel::Tasks => self.tasks.data().map_or(0, |v| v.len()),
        }
    }

    /// Load state of `panel`
    pub fn panel_status(&self, panel: Panel) -> PanelStatus {
        let (phase, is_stale, error) = match panel {
            Panel::Dashboard => (self.stats.phase(), self.stats.is_stale(), self.stats.error()),
            Panel::Properties => (
                self.properties.phase(),
                self.properties.is_stale(),
                self.properties.error(),
            ),
            Panel::Bookings => (
                self.bookings.phase(),
                self.bookings.is_stale(),
                self.bookings.error(),
            ),
            Panel::Tasks => (self.tasks.phase(), self.tasks.is_stale(), self.tasks.error()),
        };
        PanelStatus {
            phase,
            is_stale,
            error: error.map(|e| e.to_string()),
        }
    }

    /// Handles keyboard input events
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {} // Ignore other keys when help is shown
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Right | KeyCode::Tab => {
                self.select_panel(self.panel.next());
            }
            KeyCode::Left | KeyCode::BackTab => {
                self.select_panel(self.panel.previous());
            }
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.select_panel(Panel::ALL[index]);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection_up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection_down();
            }
            KeyCode::Char('r') => {
                self.refresh_requested = Some(RefreshScope::Current);
            }
            KeyCode::Char('R') => {
                self.refresh_requested = Some(RefreshScope::All);
            }
            KeyCode::Char('c') => {
                let removed = self.cache().clear_cache(Some(self.panel.clear_pattern()));
                self.status_message = Some(format!(
                    "Cleared {} cached {} entr{}",
                    removed,
                    self.panel.title().to_lowercase(),
                    if removed == 1 { "y" } else { "ies" }
                ));
            }
            KeyCode::Char('C') => {
                let removed = self.cache().clear_cache(None);
                self.status_message = Some(format!("Cleared all {} cache entries", removed));
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn select_panel(&mut self, panel: Panel) {
        if self.panel != panel {
            self.panel = panel;
            self.selected_index = 0;
        }
    }

    /// Moves selection up, wrapping to the bottom
    fn move_selection_up(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        self.selected_index = if self.selected_index == 0 {
            count - 1
        } else {
            self.selected_index - 1
        };
    }

    /// Moves selection down, wrapping to the top
    fn move_selection_down(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    /// Starts any refresh requested from the keyboard without blocking the UI
    ///
    /// # Returns
    /// The spawned task, if a refresh was pending
    pub fn process_refresh_request(&mut self) -> Option<tokio::task::JoinHandle<()>> {
        let scope = self.refresh_requested.take()?;
        self.last_refresh = Some(Local::now());
        self.status_message = None;

        let panels: Vec<Panel> = match scope {
            RefreshScope::Current => vec![self.panel],
            RefreshScope::All => Panel::ALL.to_vec(),
        };

        let stats = Arc::clone(&self.stats);
        let properties = Arc::clone(&self.properties);
        let bookings = Arc::clone(&self.bookings);
        let tasks = Arc::clone(&self.tasks);

        Some(tokio::spawn(async move {
            let refetches = panels.into_iter().map(|panel| {
                let stats = Arc::clone(&stats);
                let properties = Arc::clone(&properties);
                let bookings = Arc::clone(&bookings);
                let tasks = Arc::clone(&tasks);
                async move {
                    let result = match panel {
                        Panel::Dashboard => stats.refetch().await.map(|_| ()),
                        Panel::Properties => properties.refetch().await.map(|_| ()),
                        Panel::Bookings => bookings.refetch().await.map(|_| ()),
                        Panel::Tasks => tasks.refetch().await.map(|_| ()),
                    };
                    if let Err(e) = result {
                        tracing::warn!("Refreshing {} failed: {}", panel.title(), e);
                    }
                }
            });
            futures::future::join_all(refetches).await;
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use hostpilot::api::{fetch_fn, FetchError, Fetcher};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn api_fetcher() -> Arc<dyn Fetcher> {
        fetch_fn(|key| async move {
            match key.as_str() {
                DASHBOARD_STATS_PATH => Ok(json!({"totalProperties": 5, "activeBookings": 2})),
                PROPERTIES_PATH => Ok(json!([
                    {"id": 1, "name": "Villa Aruna"},
                    {"id": 2, "name": "Beach Loft"},
                    {"id": 3, "name": "Garden House"}
                ])),
                BOOKINGS_PATH => Ok(json!([])),
                _ => Err(FetchError::Http {
                    status: 500,
                    status_text: "Internal Server Error".to_string(),
                    message: None,
                }),
            }
        })
    }

    async fn create_test_app() -> App {
        let app = App::new(CacheContext::new(api_fetcher()), None);
        app.properties.wait_for(|s| !s.is_loading()).await;
        app.stats.wait_for(|s| !s.is_loading()).await;
        app.tasks.wait_for(|s| !s.is_loading()).await;
        app
    }

    #[tokio::test]
    async fn test_new_app_starts_on_dashboard_loading() {
        let app = App::new(CacheContext::new(api_fetcher()), None);
        assert_eq!(app.panel, Panel::Dashboard);
        assert_eq!(app.panel_status(Panel::Dashboard).phase, LoadPhase::Loading);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_panels_load_and_report_errors() {
        let app = create_test_app().await;

        assert_eq!(app.stats.data().unwrap().total_properties, 5);
        assert_eq!(app.panel_status(Panel::Properties).phase, LoadPhase::Ready);

        let tasks = app.panel_status(Panel::Tasks);
        assert_eq!(tasks.phase, LoadPhase::Error);
        assert!(tasks.error.unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_tab_navigation_wraps() {
        let mut app = create_test_app().await;

        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.panel, Panel::Tasks);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.panel, Panel::Dashboard);
        app.handle_key(key(KeyCode::Char('3')));
        assert_eq!(app.panel, Panel::Bookings);
    }

    #[tokio::test]
    async fn test_selection_wraps_within_panel_rows() {
        let mut app = create_test_app().await;
        app.handle_key(key(KeyCode::Char('2')));

        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected_index, 2);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected_index, 0);

        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.selected_index, 0, "switching panels resets selection");
    }

    #[tokio::test]
    async fn test_clear_keys_clear_cache() {
        let mut app = create_test_app().await;
        app.cache().set_cached_data("/api/properties/5", json!({"id": 5}));
        app.handle_key(key(KeyCode::Char('2')));

        app.handle_key(key(KeyCode::Char('c')));
        assert!(app.cache().get_cached_data(PROPERTIES_PATH).is_none());
        assert!(app.cache().get_cached_data("/api/properties/5").is_none());
        assert!(app.cache().get_cached_data(DASHBOARD_STATS_PATH).is_some());
        assert!(app.status_message.as_deref().unwrap().contains("Cleared 2"));

        app.handle_key(key(KeyCode::Char('C')));
        assert!(app.cache().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_request_refetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetcher = fetch_fn(move |_key| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(json!([])) }
        });
        let mut app = App::new(CacheContext::new(fetcher), None);
        app.stats.wait_for(|s| !s.is_loading()).await;
        app.bookings.wait_for(|s| !s.is_loading()).await;
        app.tasks.wait_for(|s| !s.is_loading()).await;
        app.properties.wait_for(|s| !s.is_loading()).await;
        let before = calls.load(Ordering::SeqCst);

        app.handle_key(key(KeyCode::Char('R')));
        let task = app.process_refresh_request().expect("refresh should start");
        task.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), before + Panel::ALL.len());
        assert!(app.last_refresh.is_some());
        assert!(app.process_refresh_request().is_none());
    }

    #[tokio::test]
    async fn test_help_overlay_intercepts_keys() {
        let mut app = create_test_app().await;

        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.panel, Panel::Dashboard);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(!app.should_quit);

        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
