//! Intersection Observer
//!
//! Reports when observed elements enter or leave the viewport. Entries are
//! queued when a target crosses a threshold and on the first check after
//! `observe`, matching the browser's initial callback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use lazyimg_dom::{DOMRect, NodeId};

/// Intersection observer options
#[derive(Debug, Clone)]
pub struct IntersectionObserverOptions {
    /// Grows the root rect on every side (px)
    pub root_margin: f64,
    /// Ratios at which to notify
    pub threshold: Vec<f64>,
}

impl Default for IntersectionObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: 0.0,
            threshold: vec![0.0],
        }
    }
}

/// Intersection observer entry
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionObserverEntry {
    pub target: NodeId,
    pub bounding_client_rect: DOMRect,
    pub intersection_rect: DOMRect,
    pub root_bounds: DOMRect,
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
    pub time: f64,
}

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

/// Intersection observer
#[derive(Debug)]
pub struct IntersectionObserver {
    id: u64,
    options: IntersectionObserverOptions,
    /// Target -> last reported (ratio, intersecting)
    observed: HashMap<NodeId, Option<(f64, bool)>>,
    pending_entries: Vec<IntersectionObserverEntry>,
}

impl IntersectionObserver {
    pub fn new(options: IntersectionObserverOptions) -> Self {
        Self {
            id: NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed),
            options,
            observed: HashMap::new(),
            pending_entries: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Observe an element
    pub fn observe(&mut self, target: NodeId) {
        self.observed.entry(target).or_insert(None);
    }

    /// Stop observing, dropping any queued entries for the target
    pub fn unobserve(&mut self, target: NodeId) {
        self.observed.remove(&target);
        self.pending_entries.retain(|e| e.target != target);
    }

    pub fn is_observing(&self, target: NodeId) -> bool {
        self.observed.contains_key(&target)
    }

    fn root_bounds(&self, viewport: DOMRect) -> DOMRect {
        let m = self.options.root_margin;
        DOMRect::new(
            viewport.x - m,
            viewport.y - m,
            (viewport.width + 2.0 * m).max(0.0),
            (viewport.height + 2.0 * m).max(0.0),
        )
    }

    /// Check intersections against `viewport`; rects are in the same space
    pub fn check_intersections(
        &mut self,
        viewport: DOMRect,
        element_rects: &HashMap<NodeId, DOMRect>,
        time: f64,
    ) {
        let root = self.root_bounds(viewport);

        for (node, last_state) in &mut self.observed {
            let Some(rect) = element_rects.get(node) else {
                continue;
            };

            // Edge-adjacent and zero-area targets still intersect
            let intersection = rect.intersection_inclusive(&root);
            let is_intersecting = intersection.is_some();
            let ratio = match intersection {
                Some(_) if rect.area() <= 0.0 => 1.0,
                Some(i) => i.area() / rect.area(),
                None => 0.0,
            };

            let should_notify = match *last_state {
                Some((lr, was_intersecting)) => {
                    was_intersecting != is_intersecting
                        || self.options.threshold.iter().any(|&t| {
                            (lr <= t && ratio > t) || (lr > t && ratio <= t)
                        })
                }
                None => true,
            };

            if should_notify {
                *last_state = Some((ratio, is_intersecting));
                self.pending_entries.push(IntersectionObserverEntry {
                    target: *node,
                    bounding_client_rect: rect.translate(-viewport.x, -viewport.y),
                    intersection_rect: intersection
                        .map(|i| i.translate(-viewport.x, -viewport.y))
                        .unwrap_or_default(),
                    root_bounds: root.translate(-viewport.x, -viewport.y),
                    intersection_ratio: ratio,
                    is_intersecting,
                    time,
                });
            }
        }
    }

    /// Take pending entries
    pub fn take_entries(&mut self) -> Vec<IntersectionObserverEntry> {
        std::mem::take(&mut self.pending_entries)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_entries.is_empty()
    }
}

/// Intersection observer manager
#[derive(Debug, Default)]
pub struct IntersectionObserverManager {
    observers: Vec<IntersectionObserver>,
}

impl IntersectionObserverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create observer
    pub fn create(&mut self, options: IntersectionObserverOptions) -> u64 {
        let observer = IntersectionObserver::new(options);
        let id = observer.id();
        self.observers.push(observer);
        id
    }

    pub fn get(&mut self, id: u64) -> Option<&mut IntersectionObserver> {
        self.observers.iter_mut().find(|o| o.id() == id)
    }

    /// Disconnect and drop an observer
    pub fn remove(&mut self, id: u64) {
        self.observers.retain(|o| o.id() != id);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Process all observers
    pub fn process(
        &mut self,
        viewport: DOMRect,
        element_rects: &HashMap<NodeId, DOMRect>,
        time: f64,
    ) -> Vec<(u64, Vec<IntersectionObserverEntry>)> {
        let mut results = Vec::new();
        for observer in &mut self.observers {
            observer.check_intersections(viewport, element_rects, time);
            if observer.has_pending() {
                results.push((observer.id(), observer.take_entries()));
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects(node: NodeId, rect: DOMRect) -> HashMap<NodeId, DOMRect> {
        HashMap::from([(node, rect)])
    }

    #[test]
    fn test_initial_callback_reports_state() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        let node = NodeId::from_raw(1);
        observer.observe(node);

        let viewport = DOMRect::new(0.0, 0.0, 800.0, 600.0);
        observer.check_intersections(viewport, &rects(node, DOMRect::new(0.0, 1000.0, 200.0, 200.0)), 0.0);

        let entries = observer.take_entries();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].is_intersecting);
    }

    #[test]
    fn test_scrolling_into_view_notifies_once() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        let node = NodeId::from_raw(1);
        observer.observe(node);
        let layout = rects(node, DOMRect::new(0.0, 1000.0, 200.0, 200.0));

        observer.check_intersections(DOMRect::new(0.0, 0.0, 800.0, 600.0), &layout, 0.0);
        observer.take_entries();

        observer.check_intersections(DOMRect::new(0.0, 500.0, 800.0, 600.0), &layout, 1.0);
        let entries = observer.take_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_intersecting);
        assert_eq!(entries[0].intersection_ratio, 0.5);
        // Client rect is relative to the scrolled viewport
        assert_eq!(entries[0].bounding_client_rect.y, 500.0);

        // Still intersecting, no new crossing
        observer.check_intersections(DOMRect::new(0.0, 550.0, 800.0, 600.0), &layout, 2.0);
        assert!(!observer.has_pending());
    }

    #[test]
    fn test_touching_edges_intersect() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        let node = NodeId::from_raw(1);
        observer.observe(node);

        observer.check_intersections(
            DOMRect::new(0.0, 0.0, 800.0, 600.0),
            &rects(node, DOMRect::new(0.0, 600.0, 200.0, 200.0)),
            0.0,
        );
        let entries = observer.take_entries();
        assert!(entries[0].is_intersecting);
        assert_eq!(entries[0].intersection_ratio, 0.0);
    }

    #[test]
    fn test_zero_height_target_in_view() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        let node = NodeId::from_raw(1);
        observer.observe(node);
        let layout = rects(node, DOMRect::new(0.0, 1000.0, 400.0, 0.0));

        observer.check_intersections(DOMRect::new(0.0, 0.0, 800.0, 600.0), &layout, 0.0);
        assert!(!observer.take_entries()[0].is_intersecting);

        observer.check_intersections(DOMRect::new(0.0, 500.0, 800.0, 600.0), &layout, 1.0);
        let entries = observer.take_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_intersecting);
        assert_eq!(entries[0].intersection_ratio, 1.0);
    }

    #[test]
    fn test_root_margin_extends_viewport() {
        let options = IntersectionObserverOptions { root_margin: 500.0, ..Default::default() };
        let mut observer = IntersectionObserver::new(options);
        let node = NodeId::from_raw(1);
        observer.observe(node);

        observer.check_intersections(
            DOMRect::new(0.0, 0.0, 800.0, 600.0),
            &rects(node, DOMRect::new(0.0, 900.0, 200.0, 200.0)),
            0.0,
        );
        assert!(observer.take_entries()[0].is_intersecting);
    }

    #[test]
    fn test_unobserve_drops_pending() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        let node = NodeId::from_raw(1);
        observer.observe(node);
        observer.check_intersections(
            DOMRect::new(0.0, 0.0, 800.0, 600.0),
            &rects(node, DOMRect::new(0.0, 0.0, 10.0, 10.0)),
            0.0,
        );

        observer.unobserve(node);
        assert!(!observer.has_pending());
        assert!(!observer.is_observing(node));
    }

    #[test]
    fn test_manager_process() {
        let mut manager = IntersectionObserverManager::new();
        let id = manager.create(IntersectionObserverOptions::default());
        let node = NodeId::from_raw(7);
        manager.get(id).unwrap().observe(node);

        let results = manager.process(
            DOMRect::new(0.0, 0.0, 800.0, 600.0),
            &rects(node, DOMRect::new(10.0, 10.0, 100.0, 100.0)),
            0.0,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, id);

        manager.remove(id);
        assert!(manager.is_empty());
    }
}
