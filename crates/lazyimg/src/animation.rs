//! CSS Transitions
//!
//! Parses the `transition` shorthand and runs property transitions on a
//! timeline. A finished transition yields a final frame, from which the
//! host raises `transitionend`.

use lazyimg_dom::NodeId;

/// Easing function
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Easing {
    Linear,
    #[default]
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// Parse a CSS easing keyword
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "linear" => Some(Self::Linear),
            "ease" => Some(Self::Ease),
            "ease-in" => Some(Self::EaseIn),
            "ease-out" => Some(Self::EaseOut),
            "ease-in-out" => Some(Self::EaseInOut),
            _ => None,
        }
    }

    /// Map linear progress in [0, 1] to eased progress
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::Ease | Easing::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// One entry of a `transition` shorthand
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionSpec {
    pub property: String,
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub easing: Easing,
}

impl TransitionSpec {
    /// Whether this entry animates `property`
    pub fn applies_to(&self, property: &str) -> bool {
        self.property == "all" || self.property == property
    }
}

fn parse_time(token: &str) -> Option<f64> {
    if let Some(ms) = token.strip_suffix("ms") {
        ms.parse().ok()
    } else if let Some(s) = token.strip_suffix('s') {
        s.parse::<f64>().ok().map(|s| s * 1000.0)
    } else {
        None
    }
}

/// Parse a `transition` value such as `opacity 400ms ease-out, transform 1s`
pub fn parse_transition(value: &str) -> Vec<TransitionSpec> {
    value
        .split(',')
        .filter_map(|item| {
            let mut spec = TransitionSpec {
                property: "all".to_string(),
                duration_ms: 0.0,
                delay_ms: 0.0,
                easing: Easing::default(),
            };
            let mut times = 0;
            let mut any = false;

            for token in item.split_whitespace() {
                any = true;
                if let Some(ms) = parse_time(token) {
                    // First time is the duration, second the delay
                    match times {
                        0 => spec.duration_ms = ms,
                        _ => spec.delay_ms = ms,
                    }
                    times += 1;
                } else if let Some(easing) = Easing::parse(token) {
                    spec.easing = easing;
                } else {
                    spec.property = token.to_ascii_lowercase();
                }
            }
            any.then_some(spec)
        })
        .collect()
}

/// Running transition
#[derive(Debug, Clone)]
pub struct Transition {
    pub id: u64,
    pub target: NodeId,
    pub property: String,
    pub from: f64,
    pub to: f64,
    pub spec: TransitionSpec,
    pub start_time: f64,
}

impl Transition {
    /// Property value at `now`
    pub fn value_at(&self, now: f64) -> f64 {
        let progress = self.progress_at(now);
        self.from + (self.to - self.from) * self.spec.easing.apply(progress)
    }

    fn progress_at(&self, now: f64) -> f64 {
        let elapsed = now - self.start_time - self.spec.delay_ms;
        if elapsed <= 0.0 {
            0.0
        } else if self.spec.duration_ms <= 0.0 {
            1.0
        } else {
            (elapsed / self.spec.duration_ms).min(1.0)
        }
    }

    pub fn is_finished_at(&self, now: f64) -> bool {
        now - self.start_time >= self.spec.delay_ms + self.spec.duration_ms
    }
}

/// Sampled transition value
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionFrame {
    pub target: NodeId,
    pub property: String,
    pub value: f64,
    pub finished: bool,
}

/// Transitions in flight
#[derive(Debug, Default)]
pub struct Timeline {
    transitions: Vec<Transition>,
    next_id: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transition, replacing any running one on the same property
    pub fn start(
        &mut self,
        target: NodeId,
        property: &str,
        from: f64,
        to: f64,
        spec: TransitionSpec,
        now: f64,
    ) -> u64 {
        self.cancel(target, property);
        self.next_id += 1;
        tracing::debug!(node = ?target, property, from, to, duration_ms = spec.duration_ms, "transition started");
        self.transitions.push(Transition {
            id: self.next_id,
            target,
            property: property.to_string(),
            from,
            to,
            spec,
            start_time: now,
        });
        self.next_id
    }

    /// Drop a running transition without finishing it
    pub fn cancel(&mut self, target: NodeId, property: &str) {
        self.transitions
            .retain(|t| !(t.target == target && t.property == property));
    }

    /// Drop every transition on `target`
    pub fn cancel_all(&mut self, target: NodeId) {
        self.transitions.retain(|t| t.target != target);
    }

    pub fn is_running(&self, target: NodeId, property: &str) -> bool {
        self.transitions
            .iter()
            .any(|t| t.target == target && t.property == property)
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Sample every transition at `now`; finished ones are removed
    pub fn tick(&mut self, now: f64) -> Vec<TransitionFrame> {
        let frames = self
            .transitions
            .iter()
            .map(|t| TransitionFrame {
                target: t.target,
                property: t.property.clone(),
                value: t.value_at(now),
                finished: t.is_finished_at(now),
            })
            .collect();
        self.transitions.retain(|t| !t.is_finished_at(now));
        frames
    }
}
