//! Console-based passcode sender for development

use super::NotificationSender;

/// Sender that logs passcodes to the console (for development)
pub struct ConsoleNotificationSender;

impl ConsoleNotificationSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSender for ConsoleNotificationSender {
    fn send_otp(&self, phone: &str, code: &str) -> Result<(), String> {
        println!();
        println!("========================================");
        println!("  LOGIN PASSCODE FOR: {}", phone);
        println!("  CODE: {}", code);
        println!("========================================");
        println!();

        tracing::info!(phone = %phone, code = %code, "Login passcode sent");

        Ok(())
    }
}
