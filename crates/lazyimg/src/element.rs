//! Lazy Image Element
//!
//! `<lazy-image base=".." imageid=".." alt="..">`
//!
//! Shadow tree:
//! ```text
//! #shadow-root (open)            scoped style sheet
//!   div.frame                    style="aspect-ratio: .."
//!     img.placeholder            blurred preview, fades out then removed
//!     img.full                   high-res, requested once visible
//! ```
//!
//! The element never talks to the network or the observer directly; it
//! queues `Command`s that the host executes and feeds results back through
//! the `on_*` handlers.

use lazyimg_dom::{DomEvent, DomEventType, DomTree, NodeId, ShadowRootMode};

use crate::config::{ConfigChange, ConfigField, ImageConfig};
use crate::metadata::AspectRatio;
use crate::observer::IntersectionObserverEntry;
use crate::params;
use crate::WidgetOptions;

/// Tag name the element is registered under
pub const TAG_NAME: &str = "lazy-image";

const STYLE_SHEET: &str = "\
:host { display: block; }
.frame { position: relative; width: 100%; overflow: hidden; }
.frame img { position: absolute; inset: 0; width: 100%; height: 100%; object-fit: cover; }
.placeholder { filter: blur(12px); transform: scale(1.05); }
";

/// High-res loading progress; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LoadState {
    /// Not yet watching for visibility
    #[default]
    NotVisible,
    /// Watching, waiting for the first intersection
    VisibilityPending,
    /// High-res request issued
    HighResLoading,
    /// High-res image loaded, placeholder on its way out
    HighResLoaded,
}

/// Work the host performs on the element's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start watching the host element for visibility
    Observe { target: NodeId },
    /// Stop watching
    Unobserve { target: NodeId },
    /// Fetch image dimensions
    FetchMetadata { url: String },
    /// Load the `src` of an `<img>`
    LoadImage { target: NodeId, url: String },
}

/// Lazy-loading image element
#[derive(Debug)]
pub struct LazyImage {
    host: NodeId,
    container: NodeId,
    placeholder: Option<NodeId>,
    image: NodeId,
    options: WidgetOptions,
    config: ImageConfig,
    state: LoadState,
    connected: bool,
    watching: bool,
    placeholder_loaded: bool,
    aspect_ratio: AspectRatio,
    /// Metadata URL last requested, so reconnecting doesn't refetch
    requested_metadata: Option<String>,
    /// Device width the high-res image was (or is to be) requested at
    high_res_width: Option<u32>,
    commands: Vec<Command>,
}

/// Log and swallow a tree error; the element's own nodes are always elements
fn log_dom_error<T>(result: Result<T, lazyimg_dom::DomError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "lazy image tree update failed");
    }
}

impl LazyImage {
    /// Build the shadow tree under `host`
    pub fn build(
        tree: &mut DomTree,
        host: NodeId,
        options: WidgetOptions,
    ) -> Result<Self, lazyimg_dom::DomError> {
        let root = tree.attach_shadow(host, ShadowRootMode::Open)?;
        if let Some(shadow) = tree.shadow_root_mut(host) {
            shadow.set_style_sheet(STYLE_SHEET);
        }

        let container = tree.create_element("div");
        tree.set_attribute(container, "class", "frame")?;
        tree.set_style(container, "aspect-ratio", AspectRatio::square().as_str())?;

        let placeholder = tree.create_element("img");
        tree.set_attribute(placeholder, "class", "placeholder")?;
        tree.set_attribute(placeholder, "alt", "")?;
        tree.set_style(placeholder, "transition", &options.fade_transition())?;
        tree.set_style(placeholder, "opacity", "1")?;

        let image = tree.create_element("img");
        tree.set_attribute(image, "class", "full")?;
        tree.set_attribute(image, "alt", "")?;

        tree.append_child(root, container)?;
        tree.append_child(container, placeholder)?;
        tree.append_child(container, image)?;

        Ok(Self {
            host,
            container,
            placeholder: Some(placeholder),
            image,
            options,
            config: ImageConfig::default(),
            state: LoadState::NotVisible,
            connected: false,
            watching: false,
            placeholder_loaded: false,
            aspect_ratio: AspectRatio::square(),
            requested_metadata: None,
            high_res_width: None,
            commands: Vec::new(),
        })
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Placeholder `<img>`, until it has faded out
    pub fn placeholder(&self) -> Option<NodeId> {
        self.placeholder
    }

    /// High-res `<img>`
    pub fn image(&self) -> NodeId {
        self.image
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    pub fn placeholder_loaded(&self) -> bool {
        self.placeholder_loaded
    }

    pub fn aspect_ratio(&self) -> &AspectRatio {
        &self.aspect_ratio
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn options(&self) -> &WidgetOptions {
        &self.options
    }

    /// Drain queued commands
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    pub fn base(&self) -> &str {
        &self.config.base
    }

    pub fn image_id(&self) -> &str {
        &self.config.image_id
    }

    pub fn alt(&self) -> &str {
        &self.config.alt
    }

    pub fn set_base(&mut self, tree: &mut DomTree, value: &str) {
        self.set_property(tree, ConfigField::Base, value);
    }

    pub fn set_image_id(&mut self, tree: &mut DomTree, value: &str) {
        self.set_property(tree, ConfigField::ImageId, value);
    }

    pub fn set_alt(&mut self, tree: &mut DomTree, value: &str) {
        self.set_property(tree, ConfigField::Alt, value);
    }

    /// Reflect a property write into the attribute, then react as for any attribute change
    fn set_property(&mut self, tree: &mut DomTree, field: ConfigField, value: &str) {
        let name = field.attribute_name();
        match tree.set_attribute(self.host, name, value) {
            Ok(old) => self.attribute_changed(tree, name, old.as_deref(), Some(value)),
            Err(e) => tracing::warn!(error = %e, attribute = name, "property reflection failed"),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle callbacks
    // ------------------------------------------------------------------

    /// `attributeChangedCallback`
    pub fn attribute_changed(
        &mut self,
        tree: &mut DomTree,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) {
        let Some(field) = ConfigField::from_attribute(name) else {
            return;
        };
        if old == new {
            return;
        }
        let Some(change) = self.config.apply(field, new.unwrap_or_default()) else {
            return;
        };
        tracing::debug!(attribute = name, ?old, ?new, "lazy image configuration changed");

        match change {
            ConfigChange::AltText => self.update_alt(tree),
            ConfigChange::Source if !self.connected => {
                // Connecting issues the first fetch
                tracing::trace!(attribute = name, initial = old.is_none(), "source change deferred until connected");
            }
            ConfigChange::Source => self.refresh_source(tree),
        }
    }

    /// `connectedCallback`
    pub fn connected(&mut self, tree: &mut DomTree) {
        if self.connected {
            return;
        }
        self.connected = true;
        tracing::debug!(host = ?self.host, state = ?self.state, "lazy image connected");

        if self.config.has_source()
            && self.requested_metadata.as_deref() != Some(params::metadata_url(&self.config).as_str())
        {
            self.refresh_source(tree);
        }

        if self.high_res_width.is_none() && !self.watching {
            self.watching = true;
            self.state = LoadState::VisibilityPending;
            self.commands.push(Command::Observe { target: self.host });
        }
    }

    /// `disconnectedCallback`: stops watching; in-flight requests carry on
    pub fn disconnected(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        tracing::debug!(host = ?self.host, state = ?self.state, "lazy image disconnected");

        if self.watching {
            self.watching = false;
            self.commands.push(Command::Unobserve { target: self.host });
        }
    }

    // ------------------------------------------------------------------
    // Host events
    // ------------------------------------------------------------------

    /// Visibility callback for the host element
    pub fn on_intersection(
        &mut self,
        tree: &mut DomTree,
        entry: &IntersectionObserverEntry,
        device_pixel_ratio: f64,
    ) {
        if entry.target != self.host || !self.watching || !entry.is_intersecting {
            return;
        }
        if self.state != LoadState::VisibilityPending {
            return;
        }

        // One-shot
        self.watching = false;
        self.commands.push(Command::Unobserve { target: self.host });

        let width = params::target_width(
            entry.bounding_client_rect.width,
            device_pixel_ratio,
            self.options.width_bucket,
        );
        self.high_res_width = Some(width);
        tracing::debug!(host = ?self.host, width, device_pixel_ratio, "lazy image became visible");

        if self.config.has_source() {
            self.request_high_res(tree);
        } else {
            tracing::debug!(host = ?self.host, "visible without a source; waiting for configuration");
        }
    }

    /// Metadata resolved (the fallback included)
    pub fn on_metadata(&mut self, tree: &mut DomTree, ratio: AspectRatio) {
        log_dom_error(tree.set_style(self.container, "aspect-ratio", ratio.as_str()));
        tracing::debug!(host = ?self.host, ratio = %ratio, "aspect ratio reserved");
        self.aspect_ratio = ratio;
    }

    /// `load` / `error` on one of the element's images
    pub fn on_image_event(&mut self, tree: &mut DomTree, event: &DomEvent) {
        match event.event_type {
            DomEventType::Load if Some(event.target) == self.placeholder => {
                self.placeholder_loaded = true;
                tracing::debug!(host = ?self.host, "placeholder loaded");
            }
            DomEventType::Load if event.target == self.image => self.on_high_res_loaded(tree),
            DomEventType::Error if event.target == self.image => {
                // No retry; the placeholder stays up
                tracing::debug!(host = ?self.host, "high-res image failed to load");
            }
            _ => {}
        }
    }

    fn on_high_res_loaded(&mut self, tree: &mut DomTree) {
        if self.state != LoadState::HighResLoading {
            return;
        }
        self.state = LoadState::HighResLoaded;
        tracing::debug!(host = ?self.host, "high-res image loaded");

        let Some(placeholder) = self.placeholder else {
            return;
        };
        if self.options.fade_duration_ms > 0.0 {
            log_dom_error(tree.set_style(placeholder, "opacity", "0"));
        } else {
            // No transition will run, so no transitionend either
            self.remove_placeholder(tree);
        }
    }

    /// `transitionend` inside the shadow tree
    pub fn on_transition_end(&mut self, tree: &mut DomTree, event: &DomEvent) {
        if event.event_type != DomEventType::TransitionEnd
            || Some(event.target) != self.placeholder
            || event.name.as_deref() != Some("opacity")
        {
            return;
        }
        if self.state == LoadState::HighResLoaded {
            self.remove_placeholder(tree);
        }
    }

    fn remove_placeholder(&mut self, tree: &mut DomTree) {
        if let Some(placeholder) = self.placeholder.take() {
            tree.remove(placeholder);
            tracing::debug!(host = ?self.host, "placeholder removed");
        }
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    fn update_alt(&mut self, tree: &mut DomTree) {
        let alt = self.config.alt.clone();
        log_dom_error(tree.set_attribute(self.image, "alt", &alt));
        if let Some(placeholder) = self.placeholder {
            log_dom_error(tree.set_attribute(placeholder, "alt", &alt));
        }
    }

    /// Source changed: new metadata, new placeholder, and a new high-res image
    /// if one was already due
    fn refresh_source(&mut self, tree: &mut DomTree) {
        if !self.config.has_source() {
            tracing::debug!(host = ?self.host, "source incomplete; nothing to fetch");
            return;
        }

        let metadata_url = params::metadata_url(&self.config);
        self.requested_metadata = Some(metadata_url.clone());
        self.commands.push(Command::FetchMetadata { url: metadata_url });

        if let Some(placeholder) = self.placeholder {
            let url = params::placeholder_url(&self.config, &self.options);
            log_dom_error(tree.set_attribute(placeholder, "src", &url));
            self.placeholder_loaded = false;
            self.commands.push(Command::LoadImage { target: placeholder, url });
        }

        // Already seen on screen: keep the high-res image in step with the source
        if self.high_res_width.is_some() {
            self.request_high_res(tree);
        }
    }

    fn request_high_res(&mut self, tree: &mut DomTree) {
        let Some(width) = self.high_res_width else {
            return;
        };
        let url = params::high_res_url(&self.config, width, &self.options);
        log_dom_error(tree.set_attribute(self.image, "src", &url));
        if self.state < LoadState::HighResLoading {
            self.state = LoadState::HighResLoading;
        }
        tracing::info!(host = ?self.host, url = %url, "requesting high-res image");
        self.commands.push(Command::LoadImage { target: self.image, url });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyimg_dom::DOMRect;

    const BASE: &str = "https://img.example.com/";

    fn setup() -> (DomTree, LazyImage) {
        let mut tree = DomTree::new();
        let host = tree.create_element(TAG_NAME);
        tree.append_child(NodeId::ROOT, host).unwrap();
        let widget = LazyImage::build(&mut tree, host, WidgetOptions::default()).unwrap();
        (tree, widget)
    }

    fn entry(target: NodeId, width: f64, is_intersecting: bool) -> IntersectionObserverEntry {
        let rect = DOMRect::new(0.0, 0.0, width, 200.0);
        IntersectionObserverEntry {
            target,
            bounding_client_rect: rect,
            intersection_rect: if is_intersecting { rect } else { DOMRect::default() },
            root_bounds: DOMRect::new(0.0, 0.0, 800.0, 600.0),
            intersection_ratio: if is_intersecting { 1.0 } else { 0.0 },
            is_intersecting,
            time: 0.0,
        }
    }

    fn metadata_fetches(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|c| matches!(c, Command::FetchMetadata { .. }))
            .count()
    }

    #[test]
    fn test_build_shadow_tree() {
        let (tree, widget) = setup();
        let shadow = tree.shadow_root(widget.host()).unwrap();
        assert!(shadow.style_sheet().contains(".frame"));

        assert_eq!(tree.style(widget.container()).unwrap().get("aspect-ratio"), Some("1"));
        assert_eq!(tree.elements_by_tag_name(widget.host(), "img").len(), 2);
        assert_eq!(widget.state(), LoadState::NotVisible);
    }

    #[test]
    fn test_initial_attributes_deferred_until_connected() {
        let (mut tree, mut widget) = setup();
        widget.attribute_changed(&mut tree, "base", None, Some(BASE));
        widget.attribute_changed(&mut tree, "imageid", None, Some("cat"));
        assert!(widget.take_commands().is_empty());

        widget.connected(&mut tree);
        let commands = widget.take_commands();
        assert_eq!(
            commands,
            vec![
                Command::FetchMetadata { url: format!("{BASE}fl_getinfo/cat") },
                Command::LoadImage {
                    target: widget.placeholder().unwrap(),
                    url: format!("{BASE}w_40,e_blur:200,q_auto:low,f_auto/cat"),
                },
                Command::Observe { target: widget.host() },
            ]
        );
        assert_eq!(widget.state(), LoadState::VisibilityPending);
    }

    #[test]
    fn test_same_image_id_twice_fetches_once() {
        let (mut tree, mut widget) = setup();
        widget.connected(&mut tree);
        widget.set_base(&mut tree, BASE);
        widget.set_image_id(&mut tree, "cat");
        widget.set_image_id(&mut tree, "cat");

        assert_eq!(metadata_fetches(&widget.take_commands()), 1);
        assert_eq!(tree.get_attribute(widget.host(), "imageid"), Some("cat"));
    }

    #[test]
    fn test_source_change_refetches() {
        let (mut tree, mut widget) = setup();
        widget.set_base(&mut tree, BASE);
        widget.set_image_id(&mut tree, "cat");
        widget.connected(&mut tree);
        widget.take_commands();

        widget.attribute_changed(&mut tree, "imageid", Some("cat"), Some("dog"));
        let commands = widget.take_commands();
        assert_eq!(metadata_fetches(&commands), 1);
        assert_eq!(widget.image_id(), "dog");
        assert_eq!(
            tree.get_attribute(widget.placeholder().unwrap(), "src"),
            Some(format!("{BASE}w_40,e_blur:200,q_auto:low,f_auto/dog").as_str())
        );
    }

    #[test]
    fn test_alt_change_does_not_refetch() {
        let (mut tree, mut widget) = setup();
        widget.set_base(&mut tree, BASE);
        widget.set_image_id(&mut tree, "cat");
        widget.connected(&mut tree);
        widget.take_commands();

        widget.set_alt(&mut tree, "A sleeping cat");
        assert!(widget.take_commands().is_empty());
        assert_eq!(widget.alt(), "A sleeping cat");
        assert_eq!(tree.get_attribute(widget.image(), "alt"), Some("A sleeping cat"));
        assert_eq!(
            tree.get_attribute(widget.placeholder().unwrap(), "alt"),
            Some("A sleeping cat")
        );
    }

    #[test]
    fn test_unobserved_attribute_ignored() {
        let (mut tree, mut widget) = setup();
        widget.connected(&mut tree);
        widget.take_commands();
        widget.attribute_changed(&mut tree, "class", None, Some("hero"));
        assert!(widget.take_commands().is_empty());
    }

    #[test]
    fn test_intersection_requests_bucketed_width() {
        let (mut tree, mut widget) = setup();
        widget.set_base(&mut tree, BASE);
        widget.set_image_id(&mut tree, "cat");
        widget.connected(&mut tree);
        widget.take_commands();

        widget.on_intersection(&mut tree, &entry(widget.host(), 0.0, false), 2.0);
        assert!(widget.take_commands().is_empty());
        assert_eq!(widget.state(), LoadState::VisibilityPending);

        widget.on_intersection(&mut tree, &entry(widget.host(), 375.0, true), 2.0);
        let url = format!("{BASE}w_800,q_auto,f_auto/cat");
        assert_eq!(
            widget.take_commands(),
            vec![
                Command::Unobserve { target: widget.host() },
                Command::LoadImage { target: widget.image(), url: url.clone() },
            ]
        );
        assert_eq!(widget.state(), LoadState::HighResLoading);
        assert_eq!(tree.get_attribute(widget.image(), "src"), Some(url.as_str()));

        // One-shot
        widget.on_intersection(&mut tree, &entry(widget.host(), 375.0, true), 2.0);
        assert!(widget.take_commands().is_empty());
    }

    #[test]
    fn test_visible_before_configured_loads_once_source_arrives() {
        let (mut tree, mut widget) = setup();
        widget.connected(&mut tree);
        widget.on_intersection(&mut tree, &entry(widget.host(), 300.0, true), 1.0);
        widget.take_commands();
        assert_eq!(widget.state(), LoadState::VisibilityPending);

        widget.set_base(&mut tree, BASE);
        widget.set_image_id(&mut tree, "cat");
        let commands = widget.take_commands();
        assert!(commands.contains(&Command::LoadImage {
            target: widget.image(),
            url: format!("{BASE}w_300,q_auto,f_auto/cat"),
        }));
        assert_eq!(widget.state(), LoadState::HighResLoading);
    }

    #[test]
    fn test_load_fades_then_removes_placeholder() {
        let (mut tree, mut widget) = setup();
        widget.set_base(&mut tree, BASE);
        widget.set_image_id(&mut tree, "cat");
        widget.connected(&mut tree);
        widget.on_intersection(&mut tree, &entry(widget.host(), 300.0, true), 1.0);

        let placeholder = widget.placeholder().unwrap();
        widget.on_image_event(&mut tree, &DomEvent::load(widget.image(), 10.0));
        assert_eq!(widget.state(), LoadState::HighResLoaded);
        assert_eq!(tree.style(placeholder).unwrap().get("opacity"), Some("0"));
        assert!(tree.is_connected(placeholder));

        // Transition on another property does nothing
        widget.on_transition_end(&mut tree, &DomEvent::transition_end(placeholder, "filter", 20.0));
        assert!(tree.is_connected(placeholder));

        widget.on_transition_end(&mut tree, &DomEvent::transition_end(placeholder, "opacity", 410.0));
        assert!(!tree.is_connected(placeholder));
        assert_eq!(widget.placeholder(), None);
    }

    #[test]
    fn test_image_error_keeps_placeholder() {
        let (mut tree, mut widget) = setup();
        widget.set_base(&mut tree, BASE);
        widget.set_image_id(&mut tree, "cat");
        widget.connected(&mut tree);
        widget.on_intersection(&mut tree, &entry(widget.host(), 300.0, true), 1.0);

        widget.on_image_event(&mut tree, &DomEvent::error(widget.image(), 10.0));
        assert_eq!(widget.state(), LoadState::HighResLoading);
        assert!(widget.placeholder().is_some());
    }

    #[test]
    fn test_disconnect_unobserves() {
        let (mut tree, mut widget) = setup();
        widget.connected(&mut tree);
        widget.take_commands();

        widget.disconnected();
        assert_eq!(widget.take_commands(), vec![Command::Unobserve { target: widget.host() }]);
        assert!(!widget.is_watching());

        // A late callback is ignored
        widget.on_intersection(&mut tree, &entry(widget.host(), 300.0, true), 1.0);
        assert!(widget.take_commands().is_empty());

        // Reconnecting resumes watching
        widget.connected(&mut tree);
        assert_eq!(widget.take_commands(), vec![Command::Observe { target: widget.host() }]);
    }

    #[test]
    fn test_metadata_sets_container_style() {
        let (mut tree, mut widget) = setup();
        widget.on_metadata(&mut tree, crate::metadata::aspect_ratio(1600.0, 900.0));
        assert_eq!(tree.style(widget.container()).unwrap().get("aspect-ratio"), Some("1.778"));
        assert_eq!(widget.aspect_ratio().as_str(), "1.778");
    }
}
