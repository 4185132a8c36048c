use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

/// Window-management collaborator. The controller issues hide requests
/// through it and has no further responsibility; what "hidden" means is the
/// host's business.
pub trait WindowControl: Send + Sync {
    /// Fire-and-forget: ask the hosting window to hide itself.
    fn request_hide(&self);
}

/// Window control backed by the UI event channel. The terminal host has no
/// tray or summon shortcut, so it treats a hidden chat window as a dismissed
/// session.
pub struct EventWindow {
    tx: UnboundedSender<AppEvent>,
}

impl EventWindow {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl WindowControl for EventWindow {
    fn request_hide(&self) {
        let _ = self.tx.send(AppEvent::Hide);
    }
}
