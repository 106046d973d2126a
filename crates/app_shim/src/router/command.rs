//! Typed commands posted to the event router

use crossbeam_channel::Sender;

use crate::error::FrameworkResult;
use crate::window::{WindowDesc, WindowId};

/// Reply channel for a command
pub(crate) type Reply<T> = Sender<FrameworkResult<T>>;

/// Work the router performs on behalf of caller threads
pub(crate) enum RouterCommand {
    /// Create a native window and register it
    CreateWindow {
        desc: WindowDesc,
        reply: Reply<WindowId>,
    },
    /// Destroy a window and its dependents
    DestroyWindow {
        id: WindowId,
        reply: Reply<()>,
    },
    /// Run the close-attempt path; replies whether the window was destroyed
    RequestClose {
        id: WindowId,
        reply: Reply<bool>,
    },
    /// Make `child` a dependent of `parent`
    AddDependent {
        parent: WindowId,
        child: WindowId,
        reply: Reply<()>,
    },
    /// Destroy every window
    DestroyAll {
        reply: Reply<usize>,
    },
    /// Destroy every window and stop the router
    Shutdown,
}

impl RouterCommand {
    /// Short name for logs
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::CreateWindow { .. } => "CreateWindow",
            Self::DestroyWindow { .. } => "DestroyWindow",
            Self::RequestClose { .. } => "RequestClose",
            Self::AddDependent { .. } => "AddDependent",
            Self::DestroyAll { .. } => "DestroyAll",
            Self::Shutdown => "Shutdown",
        }
    }
}
