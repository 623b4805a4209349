//! Email bodies for contact form traffic.
//!
//! Every user-supplied value is HTML-escaped before it lands in markup
//! and stripped of CR/LF before it lands in a header.

use crate::config::MailConfig;
use crate::mail::transport::OutboundEmail;
use crate::security::sanitize::{escape_html, strip_header_injection, text_to_html};
use crate::store::ContactMessage;

const SUBJECT_PREVIEW_CHARS: usize = 120;

fn header_safe(value: &str) -> String {
    strip_header_injection(value)
        .chars()
        .take(SUBJECT_PREVIEW_CHARS)
        .collect()
}

/// Alert for the team inbox. Reply-To points at the submitter.
pub fn notification(config: &MailConfig, msg: &ContactMessage) -> OutboundEmail {
    let name = header_safe(&msg.name);
    let subject = format!("New contact message: {}", header_safe(&msg.subject));

    let mut rows = vec![
        ("Name", msg.name.as_str()),
        ("Email", msg.email.as_str()),
        ("Subject", msg.subject.as_str()),
    ];
    if let Some(phone) = &msg.phone {
        rows.push(("Phone", phone.as_str()));
    }
    if let Some(company) = &msg.company {
        rows.push(("Company", company.as_str()));
    }

    let html_rows: String = rows
        .iter()
        .map(|(label, value)| format!("<tr><th align=\"left\">{}</th><td>{}</td></tr>", label, escape_html(value)))
        .collect();
    let html = format!(
        "<h2>New message from {}</h2><table>{}</table><p>{}</p><p><small>Message ID {}</small></p>",
        escape_html(&msg.name),
        html_rows,
        text_to_html(&msg.message),
        msg.id,
    );

    let text_rows: String = rows
        .iter()
        .map(|(label, value)| format!("{}: {}\n", label, value))
        .collect();
    let text = format!("{}\n{}\n\nMessage ID {}", text_rows, msg.message, msg.id);

    OutboundEmail {
        from: config.from.clone(),
        to: vec![config.notify_to.clone()],
        subject,
        html,
        text,
        reply_to: Some(format!("{} <{}>", name, header_safe(&msg.email))),
    }
}

/// Acknowledgement sent back to the submitter. The subject keeps the
/// original so replies thread back to the message.
pub fn confirmation(config: &MailConfig, msg: &ContactMessage) -> OutboundEmail {
    let subject = format!("Re: {}", header_safe(&msg.subject));
    let company = escape_html(&config.company_name);

    let html = format!(
        "<p>Hi {},</p><p>Thanks for reaching out. {} has received your message and will get back to you shortly.</p>\
         <blockquote>{}</blockquote><p>You can reply to this email to add details.</p>",
        escape_html(&msg.name),
        company,
        text_to_html(&msg.message),
    );
    let text = format!(
        "Hi {},\n\nThanks for reaching out. {} has received your message and will get back to you shortly.\n\n> {}\n",
        msg.name,
        config.company_name,
        msg.message.replace('\n', "\n> "),
    );

    OutboundEmail {
        from: config.from.clone(),
        to: vec![header_safe(&msg.email)],
        subject,
        html,
        text,
        reply_to: None,
    }
}
