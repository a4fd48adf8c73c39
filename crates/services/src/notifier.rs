use std::sync::Arc;

use bson::oid::ObjectId;
use knowa_db::models::{Notification, NotificationType};
use tracing::{debug, warn};

use crate::dao::base::DaoResult;
use crate::dao::notification::NotificationDao;
use crate::dao::user::UserDao;
use crate::mail::MailService;

/// In-app notifications with a best-effort email copy.
#[derive(Clone)]
pub struct Notifier {
    notifications: Arc<NotificationDao>,
    users: Arc<UserDao>,
    mail: MailService,
}

impl Notifier {
    pub fn new(notifications: Arc<NotificationDao>, users: Arc<UserDao>, mail: MailService) -> Self {
        Self {
            notifications,
            users,
            mail,
        }
    }

    pub async fn send(
        &self,
        recipient_id: ObjectId,
        title: &str,
        message: &str,
        notification_type: NotificationType,
    ) -> DaoResult<Notification> {
        let notification = self
            .notifications
            .create(recipient_id, title, message, notification_type)
            .await?;
        debug!(%recipient_id, title, "Notification stored");

        match self.users.base.find_by_id(recipient_id).await {
            Ok(user) => {
                let body = format!(
                    "Hi {},\n\n{}\n\nView it at {}",
                    user.display_name(),
                    message,
                    self.mail.site_url()
                );
                self.mail.send(&user.email, &format!("KNOWA: {}", title), body);
            }
            Err(e) => warn!(%recipient_id, error = %e, "Notification recipient lookup failed"),
        }

        Ok(notification)
    }

    /// Fans out to every staff account. Individual failures are logged and skipped.
    pub async fn notify_all_admins(
        &self,
        title: &str,
        message: &str,
        notification_type: NotificationType,
    ) -> DaoResult<usize> {
        let admins = self.users.staff_ids().await?;
        let mut sent = 0;
        for admin_id in admins {
            match self.send(admin_id, title, message, notification_type).await {
                Ok(_) => sent += 1,
                Err(e) => warn!(%admin_id, error = %e, "Admin notification failed"),
            }
        }
        Ok(sent)
    }

    /// Like `send`, but skips recipients that already hold a notification
    /// with the same title. Returns whether one was created.
    pub async fn send_once(
        &self,
        recipient_id: ObjectId,
        title: &str,
        message: &str,
        notification_type: NotificationType,
    ) -> DaoResult<bool> {
        if self.notifications.exists_with_title(recipient_id, title).await? {
            return Ok(false);
        }
        self.send(recipient_id, title, message, notification_type).await?;
        Ok(true)
    }
}
