//! The widget tree and window system.
//!
//! All state lives behind one `RefCell`; every public method releases the
//! borrow before dispatching into a [`WidgetBehavior`], so behaviors can
//! call back into the toolkit. Behaviors are stored as
//! `Rc<RefCell<dyn WidgetBehavior>>` and dispatched through
//! `try_borrow_mut`: a dispatch that would re-enter the behavior currently
//! running is skipped instead of deadlocking the tree.

use std::cell::RefCell;
use std::rc::Rc;

use graft_geometry::{DeviceRect, Point, Rect, Size};
use log::{trace, warn};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::draw::Painter;
use crate::theme::Theme;
use crate::widget::{WidgetBehavior, WidgetId};
use crate::window::{EmbeddedChildPicker, PixelBuffer, TransformHook, Window, WindowKind};
use crate::{Event, EventMask, WindowId};

struct WidgetEntry {
    behavior: Rc<RefCell<dyn WidgetBehavior>>,
    parent: Option<WidgetId>,
    children: SmallVec<[WidgetId; 4]>,
    visible: bool,
    realized: bool,
    mapped: bool,
    allocation: Option<Rect>,
    requisition: Option<Size>,
    window: Option<WindowId>,
}

impl WidgetEntry {
    fn new(behavior: Rc<RefCell<dyn WidgetBehavior>>) -> Self {
        Self {
            behavior,
            parent: None,
            children: SmallVec::new(),
            visible: false,
            realized: false,
            mapped: false,
            allocation: None,
            requisition: None,
            window: None,
        }
    }
}

struct ToolkitState {
    widgets: FxHashMap<WidgetId, WidgetEntry>,
    windows: FxHashMap<WindowId, Window>,
    theme: Theme,
    /// Events posted for asynchronous delivery (synthetic configures and
    /// the like), drained by `process_all_updates`.
    posted_events: Vec<(WidgetId, Event)>,
    next_widget: u64,
    next_window: u64,
    next_buffer: u64,
}

/// A single-threaded widget tree plus its window system and theme.
pub struct Toolkit {
    state: RefCell<ToolkitState>,
}

impl Default for Toolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolkit {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(ToolkitState {
                widgets: FxHashMap::default(),
                windows: FxHashMap::default(),
                theme: Theme::default(),
                posted_events: Vec::new(),
                next_widget: 1,
                next_window: 1,
                next_buffer: 1,
            }),
        }
    }

    /// Dispatches into a widget's behavior, skipping (with `default`)
    /// when the behavior is already running further up the stack.
    fn dispatch<R>(
        &self,
        id: WidgetId,
        default: R,
        f: impl FnOnce(&mut dyn WidgetBehavior) -> R,
    ) -> R {
        let Some(behavior) = self.behavior(id) else {
            return default;
        };
        let result = match behavior.try_borrow_mut() {
            Ok(mut behavior) => f(&mut *behavior),
            Err(_) => {
                trace!("{id}: re-entrant dispatch skipped");
                default
            }
        };
        result
    }

    // ------------------------------------------------------------------
    // Widget construction / destruction
    // ------------------------------------------------------------------

    pub fn create(&self, behavior: Rc<RefCell<dyn WidgetBehavior>>) -> WidgetId {
        let mut state = self.state.borrow_mut();
        let id = WidgetId(state.next_widget);
        state.next_widget += 1;
        state.widgets.insert(id, WidgetEntry::new(behavior));
        id
    }

    pub fn alive(&self, id: WidgetId) -> bool {
        self.state.borrow().widgets.contains_key(&id)
    }

    /// Destroys `id` and its subtree, children before parent: the subtree
    /// goes down first, then the widget is unrealized (destroying its
    /// native window), then its teardown hook runs, then the entry is
    /// released.
    pub fn destroy(&self, id: WidgetId) {
        if !self.alive(id) {
            return;
        }

        for child in self.children(id) {
            self.destroy(child);
        }

        if self.is_realized(id) {
            self.unrealize(id);
        }
        self.dispatch(id, (), |b| b.destroy(self, id));

        if let Some(parent) = self.parent(id) {
            self.detach(parent, id);
            self.dispatch(parent, (), |b| b.child_removed(self, parent, id));
        }

        let mut state = self.state.borrow_mut();
        state.widgets.remove(&id);
        state.posted_events.retain(|(widget, _)| *widget != id);
    }

    // ------------------------------------------------------------------
    // Containers
    // ------------------------------------------------------------------

    /// Adds `child` under `parent`, reparenting from any previous parent.
    /// Re-adding to the current parent is a no-op.
    pub fn add(&self, parent: WidgetId, child: WidgetId) {
        if !self.alive(parent) || !self.alive(child) {
            warn!("add on a dead widget ({parent} <- {child})");
            return;
        }
        if parent == child || self.is_ancestor(child, parent) {
            warn!("add would create a cycle ({parent} <- {child})");
            return;
        }
        let old_parent = self.parent(child);
        if old_parent == Some(parent) {
            return;
        }
        if let Some(old) = old_parent {
            if self.is_mapped(child) {
                self.unmap(child);
            }
            self.detach(old, child);
            self.dispatch(old, (), |b| b.child_removed(self, old, child));
        }
        {
            let mut state = self.state.borrow_mut();
            if let Some(entry) = state.widgets.get_mut(&child) {
                entry.parent = Some(parent);
            }
            if let Some(entry) = state.widgets.get_mut(&parent) {
                entry.children.push(child);
            }
        }
        self.dispatch(parent, (), |b| b.child_added(self, parent, child));
        self.dispatch(child, (), |b| b.parent_changed(self, child, old_parent));
        if self.is_mapped(parent) && self.is_visible(child) {
            self.map(child);
        }
        self.queue_resize(parent);
    }

    /// Removes `child` from `parent`; the child survives unparented.
    pub fn remove(&self, parent: WidgetId, child: WidgetId) {
        if self.parent(child) != Some(parent) {
            warn!("remove: {child} is not a child of {parent}");
            return;
        }
        if self.is_mapped(child) {
            self.unmap(child);
        }
        self.detach(parent, child);
        self.dispatch(parent, (), |b| b.child_removed(self, parent, child));
        self.dispatch(child, (), |b| b.parent_changed(self, child, Some(parent)));
        self.queue_resize(parent);
    }

    fn detach(&self, parent: WidgetId, child: WidgetId) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.widgets.get_mut(&parent) {
            entry.children.retain(|c| *c != child);
        }
        if let Some(entry) = state.widgets.get_mut(&child) {
            entry.parent = None;
        }
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.state.borrow().widgets.get(&id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: WidgetId) -> Vec<WidgetId> {
        self.state
            .borrow()
            .widgets
            .get(&id)
            .map(|e| e.children.to_vec())
            .unwrap_or_default()
    }

    pub fn is_ancestor(&self, ancestor: WidgetId, of: WidgetId) -> bool {
        let mut cur = self.parent(of);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    /// Nearest ancestor (or `id` itself) whose behavior is of type `T`.
    pub fn ancestor_of_type<T: 'static>(&self, id: WidgetId) -> Option<WidgetId> {
        let mut cur = Some(id);
        while let Some(widget) = cur {
            if self.with_behavior::<T, _>(widget, |_| ()).is_some() {
                return Some(widget);
            }
            cur = self.parent(widget);
        }
        None
    }

    // ------------------------------------------------------------------
    // Flags & lifecycle
    // ------------------------------------------------------------------

    fn flag(&self, id: WidgetId, f: impl Fn(&WidgetEntry) -> bool) -> bool {
        self.state.borrow().widgets.get(&id).map(f).unwrap_or(false)
    }

    pub fn is_visible(&self, id: WidgetId) -> bool {
        self.flag(id, |e| e.visible)
    }

    pub fn is_realized(&self, id: WidgetId) -> bool {
        self.flag(id, |e| e.realized)
    }

    pub fn is_mapped(&self, id: WidgetId) -> bool {
        self.flag(id, |e| e.mapped)
    }

    pub fn show(&self, id: WidgetId) {
        if self.is_visible(id) || !self.alive(id) {
            return;
        }
        if let Some(entry) = self.state.borrow_mut().widgets.get_mut(&id) {
            entry.visible = true;
        }
        if let Some(parent) = self.parent(id) {
            self.queue_resize(parent);
            if self.is_mapped(parent) {
                self.map(id);
            }
        }
    }

    pub fn hide(&self, id: WidgetId) {
        if !self.is_visible(id) {
            return;
        }
        if self.is_mapped(id) {
            self.unmap(id);
        }
        if let Some(entry) = self.state.borrow_mut().widgets.get_mut(&id) {
            entry.visible = false;
        }
        if let Some(parent) = self.parent(id) {
            self.queue_resize(parent);
        }
    }

    /// Realizes `id` (creates native resources). The behavior may refuse,
    /// leaving the widget unrealized.
    pub fn realize(&self, id: WidgetId) {
        if self.is_realized(id) || !self.alive(id) {
            return;
        }
        let ok = self.dispatch(id, false, |b| b.realize(self, id));
        if ok {
            if let Some(entry) = self.state.borrow_mut().widgets.get_mut(&id) {
                entry.realized = true;
            }
        }
    }

    /// Unrealizes the subtree, destroying any native windows.
    pub fn unrealize(&self, id: WidgetId) {
        if !self.is_realized(id) {
            return;
        }
        if self.is_mapped(id) {
            self.unmap(id);
        }
        for child in self.children(id) {
            self.unrealize(child);
        }
        if let Some(entry) = self.state.borrow_mut().widgets.get_mut(&id) {
            entry.realized = false;
        }
        self.dispatch(id, (), |b| b.unrealize(self, id));
        if let Some(window) = self.widget_window(id) {
            self.destroy_window(window);
        }
    }

    pub fn map(&self, id: WidgetId) {
        if self.is_mapped(id) || !self.is_visible(id) {
            return;
        }
        if !self.is_realized(id) {
            self.realize(id);
            if !self.is_realized(id) {
                warn!("cannot map {id}: realization was refused");
                return;
            }
        }
        if let Some(entry) = self.state.borrow_mut().widgets.get_mut(&id) {
            entry.mapped = true;
        }
        self.dispatch(id, (), |b| b.map(self, id));
        for child in self.children(id) {
            if self.is_visible(child) {
                self.map(child);
            }
        }
    }

    pub fn unmap(&self, id: WidgetId) {
        if !self.is_mapped(id) {
            return;
        }
        for child in self.children(id) {
            self.unmap(child);
        }
        if let Some(entry) = self.state.borrow_mut().widgets.get_mut(&id) {
            entry.mapped = false;
        }
        self.dispatch(id, (), |b| b.unmap(self, id));
    }

    // ------------------------------------------------------------------
    // Size negotiation
    // ------------------------------------------------------------------

    /// Natural size the widget asks for; cached until a queued resize.
    pub fn size_request(&self, id: WidgetId) -> Size {
        if let Some(cached) = self.cached_size_request(id) {
            return cached;
        }
        let Some(behavior) = self.behavior(id) else {
            return Size::ZERO;
        };
        let size = match behavior.try_borrow_mut() {
            Ok(mut behavior) => behavior.size_request(self, id),
            // Re-entrant request; answer without poisoning the cache.
            Err(_) => return Size::ZERO,
        };
        if let Some(entry) = self.state.borrow_mut().widgets.get_mut(&id) {
            entry.requisition = Some(size);
        }
        size
    }

    /// Last cached requisition without recomputing.
    pub fn cached_size_request(&self, id: WidgetId) -> Option<Size> {
        self.state
            .borrow()
            .widgets
            .get(&id)
            .and_then(|e| e.requisition)
    }

    /// Stores the allocation, then lets the behavior place its content.
    pub fn size_allocate(&self, id: WidgetId, allocation: Rect) {
        if !self.alive(id) {
            return;
        }
        if let Some(entry) = self.state.borrow_mut().widgets.get_mut(&id) {
            entry.allocation = Some(allocation);
        }
        self.dispatch(id, (), |b| b.size_allocate(self, id, allocation));
    }

    pub fn allocation(&self, id: WidgetId) -> Option<Rect> {
        self.state
            .borrow()
            .widgets
            .get(&id)
            .and_then(|e| e.allocation)
    }

    /// Invalidates cached requisitions up the ancestry and pings
    /// `check_resize` on window-owning ancestors.
    pub fn queue_resize(&self, id: WidgetId) {
        let mut resize_roots: SmallVec<[WidgetId; 2]> = SmallVec::new();
        let mut cur = Some(id);
        while let Some(widget) = cur {
            if let Some(entry) = self.state.borrow_mut().widgets.get_mut(&widget) {
                entry.requisition = None;
            }
            if self.widget_window(widget).is_some() {
                resize_roots.push(widget);
            }
            cur = self.parent(widget);
        }
        for widget in resize_roots {
            self.dispatch(widget, (), |b| b.check_resize(self, widget));
        }
    }

    /// Marks the widget's area of its window as needing a repaint.
    pub fn queue_draw(&self, id: WidgetId) {
        let Some((window, offset)) = self.nearest_window(id) else {
            return;
        };
        let Some(allocation) = self.allocation(id) else {
            return;
        };
        let area = DeviceRect::from_rect(Rect::from_origin_size(offset, allocation.size()));
        self.invalidate_window(window, area);
    }

    // ------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------

    pub fn theme(&self) -> Theme {
        self.state.borrow().theme.clone()
    }

    /// Installs a new theme and notifies every widget.
    pub fn set_theme(&self, theme: Theme) {
        self.state.borrow_mut().theme = theme;
        let ids: Vec<WidgetId> = self.state.borrow().widgets.keys().copied().collect();
        for id in ids {
            self.dispatch(id, (), |b| b.style_changed(self, id));
        }
    }

    // ------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------

    /// Creates a native window owned by `widget` and records it as the
    /// widget's window. Offscreen windows get a fresh pixel buffer sized
    /// to the geometry.
    pub fn create_window(
        &self,
        widget: WidgetId,
        kind: WindowKind,
        geometry: DeviceRect,
        event_mask: EventMask,
    ) -> WindowId {
        let mut state = self.state.borrow_mut();
        let id = WindowId(state.next_window);
        state.next_window += 1;
        let buffer = match kind {
            WindowKind::Offscreen => {
                let buffer_id = state.next_buffer;
                state.next_buffer += 1;
                Some(Rc::new(PixelBuffer::new(
                    buffer_id,
                    geometry.width.max(1) as u32,
                    geometry.height.max(1) as u32,
                )))
            }
            WindowKind::Child => None,
        };
        state
            .windows
            .insert(id, Window::new(kind, widget, geometry, event_mask, buffer));
        if let Some(entry) = state.widgets.get_mut(&widget) {
            entry.window = Some(id);
        }
        id
    }

    pub fn destroy_window(&self, id: WindowId) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.windows.remove(&id) {
            if let Some(entry) = state.widgets.get_mut(&window.widget) {
                if entry.window == Some(id) {
                    entry.window = None;
                }
            }
        }
    }

    /// The window owned by `id` itself, if any.
    pub fn widget_window(&self, id: WidgetId) -> Option<WindowId> {
        self.state.borrow().widgets.get(&id).and_then(|e| e.window)
    }

    /// The window `id` draws into, plus the offset of `id`'s local space
    /// within that window.
    pub fn nearest_window(&self, id: WidgetId) -> Option<(WindowId, Point)> {
        let mut offset = Point::ZERO;
        let mut cur = id;
        loop {
            if let Some(window) = self.widget_window(cur) {
                return Some((window, offset));
            }
            let parent = self.parent(cur)?;
            if let Some(alloc) = self.allocation(cur) {
                offset = Point::new(offset.x + alloc.x, offset.y + alloc.y);
            }
            cur = parent;
        }
    }

    pub fn window_kind(&self, id: WindowId) -> Option<WindowKind> {
        self.state.borrow().windows.get(&id).map(|w| w.kind)
    }

    pub fn window_widget(&self, id: WindowId) -> Option<WidgetId> {
        self.state.borrow().windows.get(&id).map(|w| w.widget)
    }

    pub fn window_geometry(&self, id: WindowId) -> Option<DeviceRect> {
        self.state.borrow().windows.get(&id).map(|w| w.geometry)
    }

    /// Buffer backing an offscreen window. The handle goes stale after a
    /// resize (a fresh buffer is allocated); re-fetch to detect that.
    pub fn window_buffer(&self, id: WindowId) -> Option<Rc<PixelBuffer>> {
        self.state
            .borrow()
            .windows
            .get(&id)
            .and_then(|w| w.buffer.clone())
    }

    /// Moves/resizes a window. Resizing an offscreen window reallocates
    /// its buffer and marks the whole window damaged.
    pub fn move_resize_window(&self, id: WindowId, geometry: DeviceRect) {
        let mut state = self.state.borrow_mut();
        let (kind, old) = match state.windows.get(&id) {
            Some(w) => (w.kind, w.geometry),
            None => {
                warn!("move_resize on unknown {id}");
                return;
            }
        };
        let resized = old.width != geometry.width || old.height != geometry.height;
        let new_buffer = if resized && kind == WindowKind::Offscreen {
            let buffer_id = state.next_buffer;
            state.next_buffer += 1;
            Some(Rc::new(PixelBuffer::new(
                buffer_id,
                geometry.width.max(1) as u32,
                geometry.height.max(1) as u32,
            )))
        } else {
            None
        };
        if let Some(window) = state.windows.get_mut(&id) {
            window.geometry = geometry;
            if let Some(buffer) = new_buffer {
                window.buffer = Some(buffer);
                window.damage = DeviceRect::new(0, 0, geometry.width, geometry.height);
            }
        }
    }

    /// Attaches (or detaches) the embedder window of an offscreen window.
    pub fn set_window_embedder(&self, id: WindowId, embedder: Option<WindowId>) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.windows.get_mut(&id) {
            if window.kind != WindowKind::Offscreen {
                warn!("{id} is not an offscreen window");
                return;
            }
            window.embedder = embedder;
        }
    }

    pub fn window_embedder(&self, id: WindowId) -> Option<WindowId> {
        self.state.borrow().windows.get(&id).and_then(|w| w.embedder)
    }

    /// Installs the coordinate hooks mapping between an offscreen window
    /// and its embedder.
    pub fn set_window_transform_hooks(
        &self,
        id: WindowId,
        to_embedder: Option<TransformHook>,
        from_embedder: Option<TransformHook>,
    ) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.windows.get_mut(&id) {
            window.to_embedder = to_embedder;
            window.from_embedder = from_embedder;
        }
    }

    pub fn window_to_embedder_point(&self, id: WindowId, point: Point) -> Point {
        let hook = self
            .state
            .borrow()
            .windows
            .get(&id)
            .and_then(|w| w.to_embedder.clone());
        match hook {
            Some(hook) => hook(point),
            None => point,
        }
    }

    pub fn window_from_embedder_point(&self, id: WindowId, point: Point) -> Point {
        let hook = self
            .state
            .borrow()
            .windows
            .get(&id)
            .and_then(|w| w.from_embedder.clone());
        match hook {
            Some(hook) => hook(point),
            None => point,
        }
    }

    /// Installs the embedded-child picker on an embedder window.
    pub fn set_embedded_child_picker(&self, id: WindowId, picker: Option<EmbeddedChildPicker>) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.windows.get_mut(&id) {
            window.picker = picker;
        }
    }

    // ------------------------------------------------------------------
    // Damage & update flushing
    // ------------------------------------------------------------------

    pub fn invalidate_window(&self, id: WindowId, area: DeviceRect) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.windows.get_mut(&id) {
            let bounds = DeviceRect::new(0, 0, window.geometry.width, window.geometry.height);
            window.damage = window.damage.union(&area.intersect(&bounds));
        }
    }

    pub fn window_has_pending_damage(&self, id: WindowId) -> bool {
        self.state
            .borrow()
            .windows
            .get(&id)
            .map(|w| !w.damage.is_empty())
            .unwrap_or(false)
    }

    /// Synchronously flushes pending damage on one window: repaints the
    /// damaged region into the buffer and delivers a `Damage` event to
    /// the window's widget. Returns whether anything was flushed.
    pub fn process_updates(&self, id: WindowId) -> bool {
        let (widget, buffer, damage) = {
            let mut state = self.state.borrow_mut();
            let Some(window) = state.windows.get_mut(&id) else {
                return false;
            };
            if window.damage.is_empty() {
                return false;
            }
            let damage = window.damage;
            window.damage = DeviceRect::default();
            (window.widget, window.buffer.clone(), damage)
        };
        if let Some(buffer) = buffer {
            let mut painter = Painter::new(&buffer, damage, Point::ZERO);
            self.paint_widget(widget, &mut painter);
            buffer.bump_generation();
        }
        self.dispatch(widget, false, |b| {
            b.event(self, widget, &Event::Damage { area: damage })
        });
        true
    }

    /// Posts an event for asynchronous delivery on the next update flush,
    /// the way the platform delivers configure notifications.
    pub fn post_event(&self, widget: WidgetId, event: Event) {
        self.state.borrow_mut().posted_events.push((widget, event));
    }

    /// Flushes every window with pending damage and delivers posted
    /// events. Returns whether anything happened.
    pub fn process_all_updates(&self) -> bool {
        let dirty: Vec<WindowId> = {
            let state = self.state.borrow();
            state
                .windows
                .iter()
                .filter(|(_, w)| !w.damage.is_empty())
                .map(|(id, _)| *id)
                .collect()
        };
        let mut any = false;
        for id in dirty {
            any |= self.process_updates(id);
        }
        let posted: Vec<(WidgetId, Event)> =
            std::mem::take(&mut self.state.borrow_mut().posted_events);
        for (widget, event) in posted {
            any = true;
            self.send_event(widget, &event);
        }
        any
    }

    fn paint_widget(&self, id: WidgetId, painter: &mut Painter<'_>) {
        if !self.is_visible(id) {
            return;
        }
        self.dispatch(id, (), |b| b.draw(self, id, painter));
        for child in self.children(id) {
            // Children with their own window paint into that window, not
            // this one.
            if self.widget_window(child).is_some() {
                continue;
            }
            if let Some(alloc) = self.allocation(child) {
                let mut child_painter = painter.for_child(alloc.origin());
                self.paint_widget(child, &mut child_painter);
            }
        }
    }

    // ------------------------------------------------------------------
    // Input dispatch
    // ------------------------------------------------------------------

    /// Delivers a native event arriving on `window`. Positioned events
    /// are first offered to the window's embedded-child picker (which
    /// retargets them into an offscreen child window with its coordinate
    /// hook applied), then hit-tested down the widget subtree and bubbled
    /// up until handled.
    pub fn dispatch_native_event(&self, window: WindowId, event: &Event) -> bool {
        let (widget, mask, picker) = {
            let state = self.state.borrow();
            let Some(win) = state.windows.get(&window) else {
                warn!("event for unknown {window}");
                return false;
            };
            (win.widget, win.event_mask, win.picker.clone())
        };
        if !Self::event_matches_mask(event, mask) {
            return false;
        }
        if let (Some(position), Some(picker)) = (event.position(), picker) {
            if let Some(child_window) = picker(position) {
                let local = self.window_from_embedder_point(child_window, position);
                return self.dispatch_native_event(child_window, &event.with_position(local));
            }
        }
        let (target, event) = match event.position() {
            Some(position) => {
                let (target, local) = self.widget_at(widget, position);
                (target, event.with_position(local))
            }
            None => (widget, event.clone()),
        };
        let mut cur = Some(target);
        while let Some(id) = cur {
            if self.dispatch(id, false, |b| b.event(self, id, &event)) {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    fn event_matches_mask(event: &Event, mask: EventMask) -> bool {
        let needed = match event {
            Event::ButtonPress { .. } => EventMask::BUTTON_PRESS,
            Event::ButtonRelease { .. } => EventMask::BUTTON_RELEASE,
            Event::Motion { .. } => EventMask::POINTER_MOTION,
            Event::Scroll { .. } => EventMask::SCROLL,
            Event::KeyPress { .. } => EventMask::KEY_PRESS,
            Event::KeyRelease { .. } => EventMask::KEY_RELEASE,
            Event::Enter { .. } => EventMask::ENTER_NOTIFY,
            Event::Leave { .. } => EventMask::LEAVE_NOTIFY,
            Event::FocusIn | Event::FocusOut => EventMask::FOCUS_CHANGE,
            // Structural events are always delivered.
            Event::Configure { .. } | Event::Damage { .. } => return true,
        };
        mask.contains(needed)
    }

    /// Deepest visible descendant of `id` (within `id`'s window) at
    /// `point`, plus the point translated into its local space.
    pub fn widget_at(&self, id: WidgetId, point: Point) -> (WidgetId, Point) {
        let children = self.children(id);
        for child in children.iter().rev() {
            if !self.is_visible(*child) || self.widget_window(*child).is_some() {
                continue;
            }
            if let Some(alloc) = self.allocation(*child) {
                if alloc.contains(point.x, point.y) {
                    return self.widget_at(*child, Point::new(point.x - alloc.x, point.y - alloc.y));
                }
            }
        }
        (id, point)
    }

    /// Sends `event` straight to one widget's behavior.
    pub fn send_event(&self, id: WidgetId, event: &Event) -> bool {
        self.dispatch(id, false, |b| b.event(self, id, event))
    }

    // ------------------------------------------------------------------
    // Behavior access
    // ------------------------------------------------------------------

    pub fn behavior(&self, id: WidgetId) -> Option<Rc<RefCell<dyn WidgetBehavior>>> {
        self.state
            .borrow()
            .widgets
            .get(&id)
            .map(|e| e.behavior.clone())
    }

    /// Runs `f` against the concrete behavior type of `id`, if it is of
    /// type `T` and not currently running.
    pub fn with_behavior<T: 'static, R>(&self, id: WidgetId, f: impl FnOnce(&T) -> R) -> Option<R> {
        let behavior = self.behavior(id)?;
        let borrow = behavior.try_borrow().ok()?;
        borrow.as_any().downcast_ref::<T>().map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    struct Fixed(Size);

    impl WidgetBehavior for Fixed {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn size_request(&mut self, _tk: &Toolkit, _id: WidgetId) -> Size {
            self.0
        }
    }

    fn fixed(tk: &Toolkit, w: f32, h: f32) -> WidgetId {
        tk.create(Rc::new(RefCell::new(Fixed(Size::new(w, h)))))
    }

    #[test]
    fn requisition_is_cached_until_queue_resize() {
        let tk = Toolkit::new();
        let w = fixed(&tk, 30.0, 20.0);
        assert_eq!(tk.size_request(w), Size::new(30.0, 20.0));
        assert_eq!(tk.cached_size_request(w), Some(Size::new(30.0, 20.0)));
        tk.queue_resize(w);
        assert_eq!(tk.cached_size_request(w), None);
    }

    #[test]
    fn reparenting_keeps_single_parent() {
        let tk = Toolkit::new();
        let a = fixed(&tk, 10.0, 10.0);
        let b = fixed(&tk, 10.0, 10.0);
        let child = fixed(&tk, 5.0, 5.0);
        tk.add(a, child);
        tk.add(b, child);
        assert_eq!(tk.parent(child), Some(b));
        assert!(tk.children(a).is_empty());
    }

    #[test]
    fn offscreen_resize_reallocates_buffer() {
        let tk = Toolkit::new();
        let w = fixed(&tk, 10.0, 10.0);
        let win = tk.create_window(
            w,
            WindowKind::Offscreen,
            DeviceRect::new(0, 0, 10, 10),
            EventMask::default(),
        );
        let before = tk.window_buffer(win).unwrap();
        tk.move_resize_window(win, DeviceRect::new(0, 0, 20, 15));
        let after = tk.window_buffer(win).unwrap();
        assert_ne!(before.buffer_id(), after.buffer_id());
        assert_eq!(after.size(), (20, 15));
        // A move without a resize keeps the buffer.
        tk.move_resize_window(win, DeviceRect::new(5, 5, 20, 15));
        assert_eq!(
            tk.window_buffer(win).unwrap().buffer_id(),
            after.buffer_id()
        );
    }

    #[test]
    fn process_updates_clears_damage_and_bumps_generation() {
        let tk = Toolkit::new();
        let w = fixed(&tk, 10.0, 10.0);
        tk.show(w);
        let win = tk.create_window(
            w,
            WindowKind::Offscreen,
            DeviceRect::new(0, 0, 10, 10),
            EventMask::default(),
        );
        let buffer = tk.window_buffer(win).unwrap();
        assert!(tk.window_has_pending_damage(win));
        assert!(tk.process_updates(win));
        assert!(!tk.window_has_pending_damage(win));
        assert_eq!(buffer.generation(), 1);
        assert!(!tk.process_updates(win));
    }

    #[test]
    fn posted_events_are_delivered_on_flush() {
        let tk = Toolkit::new();
        let w = fixed(&tk, 10.0, 10.0);
        tk.post_event(
            w,
            Event::Configure {
                area: DeviceRect::new(0, 0, 10, 10),
            },
        );
        assert!(tk.process_all_updates());
        assert!(!tk.process_all_updates());
    }
}
