use super::OutgoingEmail;
use crate::reminder::Reminder;

pub fn reminder_email(reminder: &Reminder, from: &str) -> OutgoingEmail {
    let text = html_escape(&reminder.text);
    let scheduled = reminder.scheduled_time.format("%Y-%m-%d %H:%M UTC");

    let html = format!(
        r##"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="color: #667eea;">Reminder Notification</h2>
  <p style="font-size: 16px; line-height: 1.5;">This is your scheduled reminder:</p>
  <div style="background-color: #f8f9fa; border-left: 4px solid #667eea; padding: 15px; margin: 20px 0;">
    <p style="font-size: 18px; font-weight: bold; margin: 0;">{text}</p>
  </div>
  <p style="color: #666; font-size: 14px;">Scheduled for: {scheduled}</p>
  <hr style="border: none; border-top: 1px solid #e0e0e0; margin: 20px 0;">
  <p style="color: #999; font-size: 12px;">This email was sent by your Email Reminder App</p>
</div>"##
    );

    OutgoingEmail {
        from: from.to_string(),
        to: reminder.email.clone(),
        subject: format!("Reminder: {}", single_line(&reminder.text)),
        html,
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// Header values cannot carry line breaks.
fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
