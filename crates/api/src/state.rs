use knowa_config::Settings;
use knowa_services::{
    AccountService, AuthService, ChatService, ChatbotService, EventService, MailService,
    MembershipService, Notifier,
    dao::{
        badge::BadgeDao, chat::ChatDao, donation::DonationDao, event::EventDao, faq::FaqDao,
        feedback::FeedbackDao, interview::InterviewDao, notification::NotificationDao,
        user::UserDao,
    },
};
use mongodb::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub interviews: Arc<InterviewDao>,
    pub events: Arc<EventDao>,
    pub chat_rooms: Arc<ChatDao>,
    pub donations: Arc<DonationDao>,
    pub notifications: Arc<NotificationDao>,
    pub badges: Arc<BadgeDao>,
    pub faqs: Arc<FaqDao>,
    pub feedback: Arc<FeedbackDao>,
    pub notifier: Notifier,
    pub accounts: AccountService,
    pub membership: MembershipService,
    pub chat: ChatService,
    pub event_service: EventService,
    pub chatbot: ChatbotService,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone(), settings.tac.clone()));
        let users = Arc::new(UserDao::new(&db));
        let interviews = Arc::new(InterviewDao::new(&db));
        let events = Arc::new(EventDao::new(&db));
        let chat_rooms = Arc::new(ChatDao::new(&db));
        let donations = Arc::new(DonationDao::new(&db));
        let notifications = Arc::new(NotificationDao::new(&db));
        let badges = Arc::new(BadgeDao::new(&db));
        let faqs = Arc::new(FaqDao::new(&db));
        let feedback = Arc::new(FeedbackDao::new(&db));

        let mail = MailService::with_log_transport(settings.mail.clone());
        let notifier = Notifier::new(notifications.clone(), users.clone(), mail.clone());
        let accounts = AccountService::new(
            users.clone(),
            interviews.clone(),
            events.clone(),
            donations.clone(),
            badges.clone(),
            auth.clone(),
            mail,
        );
        let membership = MembershipService::new(
            users.clone(),
            interviews.clone(),
            chat_rooms.clone(),
            notifier.clone(),
        );
        let chat = ChatService::new(chat_rooms.clone(), events.clone(), users.clone());
        let event_service = EventService::new(events.clone(), chat_rooms.clone());
        let chatbot = ChatbotService::new(settings.ai.clone());

        Self {
            db,
            settings,
            auth,
            users,
            interviews,
            events,
            chat_rooms,
            donations,
            notifications,
            badges,
            faqs,
            feedback,
            notifier,
            accounts,
            membership,
            chat,
            event_service,
            chatbot,
        }
    }
}
