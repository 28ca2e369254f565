//! Widget identity and the widget behavior contract.

use std::any::Any;

use graft_geometry::{Rect, Size};

use crate::draw::Painter;
use crate::toolkit::Toolkit;
use crate::Event;

/// Identity of a widget in a [`Toolkit`]. Ids are never reused; a stored
/// id is a weak handle that resolves to nothing after destruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub(crate) u64);

impl WidgetId {
    /// Raw value, for use as an opaque cross-toolkit token.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Reconstructs an id from a token produced by [`WidgetId::raw`]. A
    /// token that never came from `raw` simply resolves to no widget.
    pub fn from_raw(raw: u64) -> WidgetId {
        WidgetId(raw)
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// The closed set of virtual methods a widget can override.
///
/// The toolkit updates its own bookkeeping before dispatching, so
/// behaviors can call back into the [`Toolkit`] freely.
pub trait WidgetBehavior {
    /// Downcast hook for container-type checks.
    fn as_any(&self) -> &dyn Any;

    /// Natural size the widget asks its parent for.
    fn size_request(&mut self, _tk: &Toolkit, _id: WidgetId) -> Size {
        Size::ZERO
    }

    /// Called after the toolkit stored `allocation`; containers allocate
    /// their children here, window-owning widgets resize their window.
    fn size_allocate(&mut self, _tk: &Toolkit, _id: WidgetId, _allocation: Rect) {}

    /// Create native resources. Returning `false` refuses realization.
    fn realize(&mut self, _tk: &Toolkit, _id: WidgetId) -> bool {
        true
    }

    fn unrealize(&mut self, _tk: &Toolkit, _id: WidgetId) {}
    fn map(&mut self, _tk: &Toolkit, _id: WidgetId) {}
    fn unmap(&mut self, _tk: &Toolkit, _id: WidgetId) {}

    /// Paint the widget's own content; children are painted by the
    /// toolkit afterwards.
    fn draw(&mut self, _tk: &Toolkit, _id: WidgetId, _painter: &mut Painter<'_>) {}

    /// Native event dispatched to this widget; `true` stops propagation.
    fn event(&mut self, _tk: &Toolkit, _id: WidgetId, _event: &Event) -> bool {
        false
    }

    fn child_added(&mut self, _tk: &Toolkit, _id: WidgetId, _child: WidgetId) {}
    fn child_removed(&mut self, _tk: &Toolkit, _id: WidgetId, _child: WidgetId) {}
    fn parent_changed(&mut self, _tk: &Toolkit, _id: WidgetId, _old_parent: Option<WidgetId>) {}

    /// Invoked on window-owning ancestors when a descendant queued a
    /// resize.
    fn check_resize(&mut self, _tk: &Toolkit, _id: WidgetId) {}

    fn style_changed(&mut self, _tk: &Toolkit, _id: WidgetId) {}

    /// Teardown hook, invoked before children are destroyed.
    fn destroy(&mut self, _tk: &Toolkit, _id: WidgetId) {}
}
