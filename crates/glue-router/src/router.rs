//! Navigation orchestration.

use crate::apply::apply;
use crate::cache::SnapshotFetcher;
use crate::config::RouterConfig;
use crate::events::ListenerId;
use crate::events::NavigationEvents;
use crate::extract::extract;
use crate::host::LiveDocument;
use crate::host::Window;
use crate::snapshot::Snapshot;
use futures::task::LocalSpawn;
use glue_core::GlueResult;
use glue_net::Network;
use glue_net::normalize_location;
use glue_net::resolve_navigation_url;
use std::cell::Ref;
use std::cell::RefCell;
use std::cell::RefMut;
use std::fmt;
use std::rc::Rc;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Per-navigation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing one.
    pub replace: bool,
    /// Reset scroll to the top after applying.
    pub scroll: bool,
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            replace: false,
            scroll: true,
        }
    }
}

impl NavigateOptions {
    pub fn without_scroll(mut self) -> Self {
        self.scroll = false;
        self
    }
}

/// How a popstate notification was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopStateOutcome {
    /// The cached snapshot for the new location was applied.
    Applied,
    /// Nothing cached for the location; a full reload was requested.
    Reloaded,
}

/// Client-side page-transition router.
///
/// Single-threaded: every method takes `&self` and no internal borrow is
/// held across an await, so navigations may overlap on one executor.
pub struct Router<D, W>
where
    D: LiveDocument,
    W: Window,
{
    config: Rc<RouterConfig>,
    document: RefCell<D>,
    window: RefCell<W>,
    fetcher: SnapshotFetcher,
    current_url: RefCell<String>,
    events: NavigationEvents,
}

impl<D, W> fmt::Debug for Router<D, W>
where
    D: LiveDocument,
    W: Window,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("current_url", &self.current_url)
            .field("fetcher", &self.fetcher)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<D, W> Router<D, W>
where
    D: LiveDocument,
    W: Window,
{
    /// Builds a router over its collaborators and seeds the cache with a
    /// snapshot of the live document under the window's location.
    ///
    /// Fails when the configuration is invalid, the location is not an
    /// absolute URL, or the live document has no page root.
    pub fn with_parts<N, S>(
        config: RouterConfig,
        document: D,
        network: N,
        window: W,
        spawner: S,
    ) -> GlueResult<Self>
    where
        N: Network + 'static,
        S: LocalSpawn + 'static,
    {
        config.validate()?;
        let current_url = normalize_location(&window.location())?;
        let initial = extract(&document, &config)?;

        let config = Rc::new(config);
        let fetcher =
            SnapshotFetcher::new(Rc::clone(&config), Rc::new(network), Rc::new(spawner));
        fetcher.seed(&current_url, initial);
        info!(url = current_url.as_str(), "router initialized");

        Ok(Self {
            config,
            document: RefCell::new(document),
            window: RefCell::new(window),
            fetcher,
            current_url: RefCell::new(current_url),
            events: NavigationEvents::default(),
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// URL of the snapshot currently displayed.
    pub fn current_url(&self) -> String {
        self.current_url.borrow().clone()
    }

    pub fn fetcher(&self) -> &SnapshotFetcher {
        &self.fetcher
    }

    /// Do not hold the returned guard across an await on a navigation.
    pub fn document(&self) -> Ref<'_, D> {
        self.document.borrow()
    }

    pub fn window(&self) -> Ref<'_, W> {
        self.window.borrow()
    }

    /// Mutable window access for hosts that drive history themselves.
    pub fn window_mut(&self) -> RefMut<'_, W> {
        self.window.borrow_mut()
    }

    pub fn on_navigated(&self, listener: impl Fn() + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn off_navigated(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Navigates to `url`, pushing a history entry.
    pub async fn push(&self, url: &str, options: NavigateOptions) -> GlueResult<()> {
        self.navigate(
            url,
            NavigateOptions {
                replace: false,
                ..options
            },
        )
        .await
    }

    /// Navigates to `url`, replacing the current history entry.
    pub async fn replace(&self, url: &str, options: NavigateOptions) -> GlueResult<()> {
        self.navigate(
            url,
            NavigateOptions {
                replace: true,
                ..options
            },
        )
        .await
    }

    /// Resolves `url` against the current origin, obtains its snapshot from
    /// the cache or the network, applies it, then updates history and scroll.
    ///
    /// Navigating to the URL already displayed does nothing.
    pub async fn navigate(&self, url: &str, options: NavigateOptions) -> GlueResult<()> {
        let location = self.window.borrow().location();
        let target = resolve_navigation_url(&location, url)?;

        let unchanged = *self.current_url.borrow() == target;
        if unchanged {
            debug!(url = target.as_str(), "already displayed");
            return Ok(());
        }

        let pending = self.fetcher.resolve(&target);
        let snapshot = pending.await?;
        self.apply_snapshot(&snapshot, &target)?;

        let mut window = self.window.borrow_mut();
        if options.replace {
            window.replace_state(&target);
        } else {
            window.push_state(&target);
        }
        if options.scroll {
            window.scroll_to_top();
        }

        Ok(())
    }

    /// Warms the cache for `url` in the background. Never fails.
    pub fn prefetch(&self, url: &str) {
        let location = self.window.borrow().location();
        match resolve_navigation_url(&location, url) {
            Ok(target) => self.fetcher.prefetch(&target),
            Err(error) => warn!(url, %error, "prefetch target rejected"),
        }
    }

    pub fn back(&self) {
        self.window.borrow_mut().back();
    }

    pub fn forward(&self) {
        self.window.borrow_mut().forward();
    }

    /// Handles a native popstate: applies the cached snapshot for the
    /// window's location, or requests a full reload when none is cached.
    pub fn handle_pop_state(&self) -> GlueResult<PopStateOutcome> {
        let location = self.window.borrow().location();
        let url = normalize_location(&location)?;

        let Some(snapshot) = self.fetcher.cached(&url) else {
            warn!(
                url = url.as_str(),
                "no cached snapshot for history entry, reloading"
            );
            self.window.borrow_mut().reload();
            return Ok(PopStateOutcome::Reloaded);
        };

        self.apply_snapshot(&snapshot, &url)?;
        Ok(PopStateOutcome::Applied)
    }

    fn apply_snapshot(&self, snapshot: &Snapshot, url: &str) -> GlueResult<()> {
        apply(&mut *self.document.borrow_mut(), snapshot, &self.config)?;
        *self.current_url.borrow_mut() = url.to_owned();
        info!(url, "navigation applied");
        self.events.emit();
        Ok(())
    }
}
