use std::sync::Arc;

use messenger_db::Database;

use crate::sms::SmsGateway;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sms: Arc<dyn SmsGateway>,
}

impl AppStateInner {
    pub fn new(db: Database, sms: Arc<dyn SmsGateway>) -> AppState {
        Arc::new(Self { db, sms })
    }
}
