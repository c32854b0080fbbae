//! Passcode delivery abstractions
//!
//! Real SMS delivery belongs to an external provider; the engine only ever
//! talks to this capability.

pub mod console;

pub use console::ConsoleNotificationSender;

/// Capability for delivering one-time passcodes to a phone
pub trait NotificationSender: Send + Sync {
    /// Deliver a login passcode to a phone number
    fn send_otp(&self, phone: &str, code: &str) -> Result<(), String>;
}

/// Allow using Box<dyn NotificationSender> as a NotificationSender
impl NotificationSender for Box<dyn NotificationSender> {
    fn send_otp(&self, phone: &str, code: &str) -> Result<(), String> {
        (**self).send_otp(phone, code)
    }
}
