use std::sync::Arc;

use mongodb::Database;
use salesvoice_config::Settings;
use salesvoice_services::auth::AuthService;
use salesvoice_services::dao::session::SessionDao;
use salesvoice_services::dao::summary::SummaryDao;
use salesvoice_services::dao::user::UserDao;
use salesvoice_services::dao::utterance::UtteranceDao;
use salesvoice_services::rtc::RtcTokenService;
use salesvoice_services::sentiment::SentimentClient;
use salesvoice_services::session::{SessionFinalizer, UtteranceBuffer, VerdictCache};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub buffer: Arc<UtteranceBuffer>,
    pub verdicts: Arc<VerdictCache>,
    pub utterances: Arc<UtteranceDao>,
    pub sessions: Arc<SessionDao>,
    pub summaries: Arc<SummaryDao>,
    pub users: Arc<UserDao>,
    pub sentiment: Arc<SentimentClient>,
    pub finalizer: Arc<SessionFinalizer>,
    pub auth: Arc<AuthService>,
    pub rtc: Arc<RtcTokenService>,
}

impl AppState {
    pub fn new(settings: &Settings, db: Database) -> Self {
        let buffer = Arc::new(UtteranceBuffer::new());
        let verdicts = Arc::new(VerdictCache::new());
        let utterances = Arc::new(UtteranceDao::new(&db));
        let sessions = Arc::new(SessionDao::new(&db));
        let summaries = Arc::new(SummaryDao::new(&db));
        let users = Arc::new(UserDao::new(&db));
        let sentiment = Arc::new(SentimentClient::new(settings.gemini.clone()));
        let finalizer = Arc::new(SessionFinalizer::new(
            Arc::clone(&buffer),
            Arc::clone(&verdicts),
            Arc::clone(&utterances),
            Arc::clone(&summaries),
            Arc::clone(&users),
            Arc::clone(&sentiment),
        ));

        Self {
            db,
            buffer,
            verdicts,
            utterances,
            sessions,
            summaries,
            users,
            sentiment,
            finalizer,
            auth: Arc::new(AuthService::new(settings.auth.clone())),
            rtc: Arc::new(RtcTokenService::new(settings.rtc.clone())),
        }
    }
}
