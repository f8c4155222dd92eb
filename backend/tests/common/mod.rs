// Common test utilities that are shared across integration tests
use async_trait::async_trait;
use automate_backend::services::{MailError, MailSender, OutgoingEmail};
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

#[derive(Default)]
pub struct Outbox {
    messages: Mutex<Vec<OutgoingEmail>>,
}

impl Outbox {
    pub fn messages(&self) -> Vec<OutgoingEmail> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for Outbox {
    async fn send(&self, message: &OutgoingEmail) -> Result<(), MailError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
