//! Server state management.

use std::sync::Arc;

use raven_core::outreach::Outreach;
use raven_core::Conversation;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<Conversation>,
    /// Present when an outreach destination is configured.
    pub outreach: Option<Outreach>,
}

impl AppState {
    pub fn new(conversation: Arc<Conversation>) -> Self {
        Self {
            conversation,
            outreach: None,
        }
    }

    pub fn with_outreach(mut self, outreach: Outreach) -> Self {
        self.outreach = Some(outreach);
        self
    }
}
