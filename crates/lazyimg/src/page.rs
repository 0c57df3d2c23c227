//! Page
//!
//! Single-threaded host for lazy images: owns the tree, the observers, the
//! transition timeline and the fetcher, and turns element commands into
//! observer subscriptions and network requests.

use std::collections::{HashMap, VecDeque};

use lazyimg_dom::{
    CustomElementError, CustomElementOptions, CustomElementRegistry, DOMRect, DomError, DomEvent,
    DomEventType, DomTree, NodeId,
};
use lazyimg_net::Fetcher;

use crate::animation::{parse_transition, Timeline};
use crate::config::OBSERVED_ATTRIBUTES;
use crate::element::{Command, LazyImage, LoadState, TAG_NAME};
use crate::metadata;
use crate::observer::{IntersectionObserverManager, IntersectionObserverOptions};
use crate::WidgetOptions;

/// Handle to a lazy image on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(usize);

/// Page errors
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("unknown widget {0:?}")]
    UnknownWidget(WidgetId),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    CustomElement(#[from] CustomElementError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NetworkTask {
    Metadata { url: String },
    Image { target: NodeId, url: String },
}

/// Page hosting lazy images
pub struct Page<F: Fetcher> {
    tree: DomTree,
    registry: CustomElementRegistry,
    fetcher: F,
    options: WidgetOptions,
    widgets: Vec<LazyImage>,
    observers: IntersectionObserverManager,
    /// Widget -> its observer
    observer_of: HashMap<WidgetId, u64>,
    /// Layout rects of host elements, in document coordinates
    rects: HashMap<NodeId, DOMRect>,
    viewport: DOMRect,
    device_pixel_ratio: f64,
    timeline: Timeline,
    /// Current (possibly mid-transition) opacity per element
    computed_opacity: HashMap<NodeId, f64>,
    network: VecDeque<(WidgetId, NetworkTask)>,
    now: f64,
}

impl<F: Fetcher> Page<F> {
    /// Create a page with an 800x600 viewport at 1x
    pub fn new(fetcher: F, options: WidgetOptions) -> Result<Self, PageError> {
        let mut registry = CustomElementRegistry::new();
        registry.define(TAG_NAME, CustomElementOptions::observing(&OBSERVED_ATTRIBUTES))?;

        Ok(Self {
            tree: DomTree::new(),
            registry,
            fetcher,
            options,
            widgets: Vec::new(),
            observers: IntersectionObserverManager::new(),
            observer_of: HashMap::new(),
            rects: HashMap::new(),
            viewport: DOMRect::new(0.0, 0.0, 800.0, 600.0),
            device_pixel_ratio: 1.0,
            timeline: Timeline::new(),
            computed_opacity: HashMap::new(),
            network: VecDeque::new(),
            now: 0.0,
        })
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport.width = width;
        self.viewport.height = height;
        self
    }

    pub fn with_device_pixel_ratio(mut self, dpr: f64) -> Self {
        self.device_pixel_ratio = dpr;
        self
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn viewport(&self) -> DOMRect {
        self.viewport
    }

    /// Milliseconds since the page was created
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn widget(&self, id: WidgetId) -> Option<&LazyImage> {
        self.widgets.get(id.0)
    }

    pub fn state(&self, id: WidgetId) -> Option<LoadState> {
        self.widget(id).map(LazyImage::state)
    }

    /// Network requests queued but not yet run
    pub fn pending_requests(&self) -> usize {
        self.network.len()
    }

    /// Opacity as currently painted, honoring running transitions
    pub fn computed_opacity(&self, node: NodeId) -> f64 {
        self.computed_opacity.get(&node).copied().unwrap_or_else(|| {
            self.tree
                .style(node)
                .and_then(|s| s.get("opacity"))
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0)
        })
    }

    fn widget_mut(&mut self, id: WidgetId) -> Result<&mut LazyImage, PageError> {
        self.widgets.get_mut(id.0).ok_or(PageError::UnknownWidget(id))
    }

    fn host_of(&self, id: WidgetId) -> Result<NodeId, PageError> {
        self.widget(id)
            .map(LazyImage::host)
            .ok_or(PageError::UnknownWidget(id))
    }

    /// Widget whose shadow tree holds `node`
    fn owner_of(&self, node: NodeId) -> Option<WidgetId> {
        self.widgets
            .iter()
            .position(|w| self.tree.contains(w.host(), node))
            .map(WidgetId)
    }

    // ------------------------------------------------------------------
    // Element surface
    // ------------------------------------------------------------------

    /// `document.createElement("lazy-image")`
    pub fn create_lazy_image(&mut self) -> Result<WidgetId, PageError> {
        let host = self.tree.create_element(TAG_NAME);
        let widget = LazyImage::build(&mut self.tree, host, self.options.clone())?;
        self.widgets.push(widget);
        let id = WidgetId(self.widgets.len() - 1);
        tracing::debug!(?id, ?host, "lazy image created");
        self.flush(id);
        Ok(id)
    }

    fn observes(&self, name: &str) -> bool {
        self.registry
            .get(TAG_NAME)
            .is_some_and(|definition| definition.observes(name))
    }

    /// `element.setAttribute(name, value)`; names are lowercased like HTML
    pub fn set_attribute(&mut self, id: WidgetId, name: &str, value: &str) -> Result<(), PageError> {
        let host = self.host_of(id)?;
        let name = name.to_ascii_lowercase();
        let old = self.tree.set_attribute(host, &name, value)?;

        if self.observes(&name) {
            let widget = self.widgets.get_mut(id.0).ok_or(PageError::UnknownWidget(id))?;
            widget.attribute_changed(&mut self.tree, &name, old.as_deref(), Some(value));
        }
        self.flush(id);
        Ok(())
    }

    /// `element.removeAttribute(name)`
    pub fn remove_attribute(&mut self, id: WidgetId, name: &str) -> Result<(), PageError> {
        let host = self.host_of(id)?;
        let name = name.to_ascii_lowercase();
        let old = self.tree.remove_attribute(host, &name)?;

        if old.is_some() && self.observes(&name) {
            let widget = self.widgets.get_mut(id.0).ok_or(PageError::UnknownWidget(id))?;
            widget.attribute_changed(&mut self.tree, &name, old.as_deref(), None);
        }
        self.flush(id);
        Ok(())
    }

    pub fn get_attribute(&self, id: WidgetId, name: &str) -> Option<&str> {
        self.tree
            .get_attribute(self.widget(id)?.host(), &name.to_ascii_lowercase())
    }

    /// `element.base = value`
    pub fn set_base(&mut self, id: WidgetId, value: &str) -> Result<(), PageError> {
        let widget = self.widgets.get_mut(id.0).ok_or(PageError::UnknownWidget(id))?;
        widget.set_base(&mut self.tree, value);
        self.flush(id);
        Ok(())
    }

    /// `element.imageId = value`
    pub fn set_image_id(&mut self, id: WidgetId, value: &str) -> Result<(), PageError> {
        let widget = self.widgets.get_mut(id.0).ok_or(PageError::UnknownWidget(id))?;
        widget.set_image_id(&mut self.tree, value);
        self.flush(id);
        Ok(())
    }

    /// `element.alt = value`
    pub fn set_alt(&mut self, id: WidgetId, value: &str) -> Result<(), PageError> {
        let widget = self.widgets.get_mut(id.0).ok_or(PageError::UnknownWidget(id))?;
        widget.set_alt(&mut self.tree, value);
        self.flush(id);
        Ok(())
    }

    /// Insert the element into the document, laid out at `rect`
    ///
    /// A new observer gets its initial callback before this returns.
    pub fn connect(&mut self, id: WidgetId, rect: DOMRect) -> Result<(), PageError> {
        let host = self.host_of(id)?;
        self.tree.append_child(NodeId::ROOT, host)?;
        self.rects.insert(host, rect);

        let widget = self.widgets.get_mut(id.0).ok_or(PageError::UnknownWidget(id))?;
        widget.connected(&mut self.tree);
        let observing = self.flush(id);
        if observing {
            self.check_visibility();
        }
        Ok(())
    }

    /// Remove the element from the document
    pub fn disconnect(&mut self, id: WidgetId) -> Result<(), PageError> {
        let host = self.host_of(id)?;
        self.tree.remove(host);
        self.rects.remove(&host);
        self.widget_mut(id)?.disconnected();
        self.flush(id);
        Ok(())
    }

    /// Move the element (document coordinates)
    pub fn set_element_rect(&mut self, id: WidgetId, rect: DOMRect) -> Result<(), PageError> {
        let host = self.host_of(id)?;
        self.rects.insert(host, rect);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Scroll vertically and run visibility checks
    pub fn scroll_to(&mut self, y: f64) {
        self.viewport.y = y;
        self.check_visibility();
    }

    /// Deliver intersection entries to their widgets
    pub fn check_visibility(&mut self) {
        let results = self.observers.process(self.viewport, &self.rects, self.now);
        for (observer_id, entries) in results {
            let Some(id) = self
                .observer_of
                .iter()
                .find_map(|(w, o)| (*o == observer_id).then_some(*w))
            else {
                continue;
            };
            for entry in &entries {
                tracing::trace!(?id, intersecting = entry.is_intersecting, ratio = entry.intersection_ratio, "intersection");
                if let Some(widget) = self.widgets.get_mut(id.0) {
                    widget.on_intersection(&mut self.tree, entry, self.device_pixel_ratio);
                }
            }
            self.flush(id);
        }
    }

    /// Run queued network requests until none are left
    ///
    /// Requests run one at a time in issue order. Returns how many ran.
    pub async fn pump(&mut self) -> usize {
        let mut ran = 0;
        while let Some((id, task)) = self.network.pop_front() {
            ran += 1;
            match task {
                NetworkTask::Metadata { url } => {
                    let ratio = metadata::resolve_aspect_ratio(&self.fetcher, &url).await;
                    if let Some(widget) = self.widgets.get_mut(id.0) {
                        widget.on_metadata(&mut self.tree, ratio);
                    }
                }
                NetworkTask::Image { target, url } => {
                    let result = self
                        .fetcher
                        .get(&url)
                        .await
                        .and_then(|response| response.error_for_status());
                    let event = match result {
                        Ok(response) => {
                            tracing::debug!(url = %url, bytes = response.bytes().len(), "image loaded");
                            DomEvent::load(target, self.now)
                        }
                        Err(e) => {
                            tracing::warn!(url = %url, error = %e, "image failed to load");
                            DomEvent::error(target, self.now)
                        }
                    };
                    if let Some(widget) = self.widgets.get_mut(id.0) {
                        widget.on_image_event(&mut self.tree, &event);
                    }
                }
            }
            self.flush(id);
        }
        ran
    }

    /// Advance the clock, sample transitions and fire `transitionend`
    pub fn advance(&mut self, ms: f64) {
        self.now += ms.max(0.0);
        for frame in self.timeline.tick(self.now) {
            if frame.property == "opacity" {
                self.computed_opacity.insert(frame.target, frame.value);
            }
            if !frame.finished {
                continue;
            }

            let event = DomEvent::transition_end(frame.target, &frame.property, self.now);
            let Some(id) = self.owner_of(frame.target) else {
                continue;
            };
            if let Some(widget) = self.widgets.get_mut(id.0) {
                widget.on_transition_end(&mut self.tree, &event);
            }
            self.flush(id);
        }
    }

    /// Apply a widget's queued commands and start any style transitions
    ///
    /// Returns true when a new observer was started.
    fn flush(&mut self, id: WidgetId) -> bool {
        let commands = match self.widgets.get_mut(id.0) {
            Some(widget) => widget.take_commands(),
            None => Vec::new(),
        };
        let mut observing = false;

        for command in commands {
            match command {
                Command::Observe { target } => {
                    let options = IntersectionObserverOptions {
                        root_margin: self.options.root_margin_px,
                        ..Default::default()
                    };
                    let observer_id = self.observers.create(options);
                    if let Some(observer) = self.observers.get(observer_id) {
                        observer.observe(target);
                    }
                    if let Some(previous) = self.observer_of.insert(id, observer_id) {
                        self.observers.remove(previous);
                    }
                    tracing::trace!(?id, observer_id, "observing");
                    observing = true;
                }
                Command::Unobserve { target } => {
                    if let Some(observer_id) = self.observer_of.remove(&id) {
                        if let Some(observer) = self.observers.get(observer_id) {
                            observer.unobserve(target);
                        }
                        self.observers.remove(observer_id);
                        tracing::trace!(?id, observer_id, "observer disconnected");
                    }
                }
                Command::FetchMetadata { url } => {
                    self.network.push_back((id, NetworkTask::Metadata { url }));
                }
                Command::LoadImage { target, url } => {
                    self.network.push_back((id, NetworkTask::Image { target, url }));
                }
            }
        }

        self.apply_style_changes();
        self.prune_removed_nodes();
        observing
    }

    /// Forget painted state of nodes that left the tree
    fn prune_removed_nodes(&mut self) {
        let removed: Vec<NodeId> = self
            .computed_opacity
            .keys()
            .copied()
            .filter(|&node| self.tree.parent(node).is_none())
            .collect();
        for node in removed {
            self.timeline.cancel_all(node);
            self.computed_opacity.remove(&node);
            tracing::trace!(?node, "pruned removed node");
        }
    }

    /// Start a transition for each `opacity` change on an element whose
    /// `transition` style covers it; other changes apply immediately
    fn apply_style_changes(&mut self) {
        for event in self.tree.take_mutations() {
            if event.event_type != DomEventType::StyleModified
                || event.name.as_deref() != Some("opacity")
            {
                continue;
            }
            let Some(to) = event.new_value.as_deref().and_then(|v| v.parse::<f64>().ok()) else {
                continue;
            };
            let node = event.target;
            let from = self.computed_opacity.get(&node).copied().unwrap_or(1.0);

            let spec = self
                .tree
                .style(node)
                .and_then(|s| s.get("transition"))
                .map(parse_transition)
                .unwrap_or_default()
                .into_iter()
                .find(|spec| spec.applies_to("opacity") && spec.duration_ms > 0.0);

            match spec {
                Some(spec) if from != to => {
                    self.timeline.start(node, "opacity", from, to, spec, self.now);
                }
                _ => {
                    self.timeline.cancel(node, "opacity");
                    self.computed_opacity.insert(node, to);
                }
            }
        }
    }
}
