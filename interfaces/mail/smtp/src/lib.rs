//! Outbound mail delivery
//!
//! - `index`: `MailTransport` seam, `OutgoingMail` and the SMTP implementation

pub mod index;

pub use lettre::address::AddressError;
pub use lettre::message::Mailbox;
