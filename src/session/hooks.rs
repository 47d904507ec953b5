//! Caller-supplied callbacks.

use serde_json::Value;
use std::fmt;

/// Called once, on the first non-empty content fragment.
pub type FirstContentHook = Box<dyn FnOnce() + Send>;

/// Called with the whole payload of each `analysis` event.
pub type AnalysisHook = Box<dyn FnMut(&Value) + Send>;

/// Called with the kind and payload of each unrecognized event.
pub type UnknownHook = Box<dyn FnMut(&str, &Value) + Send>;

/// Optional callbacks for a render session.
///
/// ```
/// use inkstream::RenderHooks;
///
/// let hooks = RenderHooks::new()
///     .with_first_content(|| println!("switch to the result view"))
///     .with_analysis(|payload| println!("analysis: {payload}"));
/// ```
#[derive(Default)]
pub struct RenderHooks {
    pub(crate) on_first_content: Option<FirstContentHook>,
    pub(crate) on_analysis: Option<AnalysisHook>,
    pub(crate) on_unknown: Option<UnknownHook>,
}

impl RenderHooks {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first-content callback.
    #[must_use]
    pub fn with_first_content(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_first_content = Some(Box::new(hook));
        self
    }

    /// Set the analysis callback.
    #[must_use]
    pub fn with_analysis(mut self, hook: impl FnMut(&Value) + Send + 'static) -> Self {
        self.on_analysis = Some(Box::new(hook));
        self
    }

    /// Set the callback for event kinds this crate does not know.
    #[must_use]
    pub fn with_unknown(mut self, hook: impl FnMut(&str, &Value) + Send + 'static) -> Self {
        self.on_unknown = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for RenderHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHooks")
            .field("on_first_content", &self.on_first_content.is_some())
            .field("on_analysis", &self.on_analysis.is_some())
            .field("on_unknown", &self.on_unknown.is_some())
            .finish()
    }
}
