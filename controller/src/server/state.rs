//! Server state

use std::sync::Arc;

use crate::deploy::Dispatcher;
use crate::intake::UploadIntake;

/// Server state shared across handlers
pub struct ServerState {
    pub dispatcher: Arc<Dispatcher>,
    pub intake: Arc<UploadIntake>,
}

impl ServerState {
    pub fn new(dispatcher: Arc<Dispatcher>, intake: Arc<UploadIntake>) -> Self {
        Self { dispatcher, intake }
    }
}
