//! Embeds a scene-graph stage in a widget tree, and widgets in the scene
//! graph.
//!
//! Two independently-owned retained trees — a windowed widget tree and a
//! scene-graph actor tree — are kept synchronized in geometry, visibility,
//! damage, style, and input routing. Each crossing point is one explicit
//! adapter:
//!
//! - [`Embed`]: the widget that owns a stage and is the single point where
//!   native window handles, input events, and theme values cross into the
//!   scene graph.
//! - [`WidgetActor`]: a scene actor hosting a windowed widget subtree,
//!   mirrored into the scene through an offscreen pixel buffer.
//! - [`OffscreenBin`]: the offscreen-windowed container backing a
//!   [`WidgetActor`]; owns the active flag and the coordinate hooks.
//! - [`Standin`] / [`StandinBin`]: a placeholder widget that lets a scene
//!   actor participate in widget-toolkit layout while living on the stage.
//!
//! Layout authority is one-directional at each boundary: the widget tree
//! is authoritative inside a [`WidgetActor`], the scene everywhere else,
//! and a [`Standin`]'s target takes geometry only from the widget side.

mod embed;
mod offscreen;
mod standin;
mod standin_bin;
pub mod util;
mod widget_actor;

pub use embed::Embed;
pub use offscreen::OffscreenBin;
pub use standin::{Standin, StandinCore};
pub use standin_bin::StandinBin;
pub use widget_actor::{WidgetActor, WidgetActorCore};

use std::rc::Rc;

use graft_scene::{settings, Scene};
use graft_widgets::Toolkit;

/// Shared context: one widget toolkit and one scene, living on the same
/// thread and event loop.
pub struct Bridge {
    toolkit: Rc<Toolkit>,
    scene: Rc<Scene>,
}

impl Bridge {
    /// Creates a fresh toolkit/scene pair and initializes the scene
    /// settings.
    pub fn new() -> Rc<Bridge> {
        settings::init();
        Rc::new(Bridge {
            toolkit: Rc::new(Toolkit::new()),
            scene: Rc::new(Scene::new()),
        })
    }

    pub fn toolkit(&self) -> &Rc<Toolkit> {
        &self.toolkit
    }

    pub fn scene(&self) -> &Rc<Scene> {
        &self.scene
    }
}
