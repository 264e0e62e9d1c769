use interfaces_mail_smtp::index::OutgoingMail;

use super::index::ContactSubmission;
use crate::state::ContactAddresses;

pub fn render_contact_mail(
    submission: &ContactSubmission,
    addresses: &ContactAddresses,
) -> OutgoingMail {
    let ContactSubmission {
        name,
        email,
        message,
    } = submission;

    let text = format!("Name: {name}\nEmail: {email}\nMessage: {message}");

    let html = format!(
        "<h2>New contact form submission</h2>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Message:</strong></p>\
         <p style=\"white-space: pre-wrap\">{}</p>",
        escape_html(name),
        escape_html(email),
        escape_html(message),
    );

    OutgoingMail {
        from: addresses.from.clone(),
        to: addresses.to.clone(),
        subject: format!("New contact form submission from {name}"),
        text,
        html,
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
