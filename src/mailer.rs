use crate::error::Result;
use futures::future::BoxFuture;

/// The verification message handed to the mail collaborator.
#[derive(Clone, Debug)]
pub struct VerificationMail {
    /// The recipient address.
    pub to: String,
    /// The recipient's first name, used in the greeting.
    pub firstname: String,
    /// The six-digit one-time code.
    pub code: String,
    /// The clickable fallback link carrying email + code.
    pub verify_link: String,
}

/// Delivery seam for the verification email.
///
/// Registration treats delivery as at-most-once: if `send_verification`
/// fails, the caller rolls the pending row back.
pub trait Mailer: Send + Sync {
    /// Delivers a verification mail, resolving once the transport has
    /// accepted (or rejected) the message.
    fn send_verification(&self, mail: VerificationMail) -> BoxFuture<'static, Result<()>>;
}

/// Builds the verify link for a registration.
pub fn verify_link(base_url: &str, email: &str, code: &str) -> String {
    format!(
        "{}/verify_email?email={}&token={}",
        base_url.trim_end_matches('/'),
        urlencode(email),
        code
    )
}

/// Renders the plain-text body of the verification mail.
pub fn render_verification_body(mail: &VerificationMail) -> String {
    format!(
        "Welcome, {}!\n\n\
         Thank you for registering with Talmideo.\n\
         Please verify your email within 10 minutes to activate your account.\n\n\
         Your email verification code is: {}\n\n\
         Or open this link to verify your account:\n{}\n\n\
         If you didn't request this, you can safely ignore this email.\n",
        mail.firstname, mail.code, mail.verify_link
    )
}

/// Minimal percent-encoding for the email query parameter.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Development transport: logs the rendered mail instead of sending it.
///
/// The real SMTP transport lives outside this service; swapping it in means
/// implementing [`Mailer`] against it and handing that to `AppState`.
#[derive(Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_verification(&self, mail: VerificationMail) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            let body = render_verification_body(&mail);
            tracing::info!(to = %mail.to, "📧 Verification mail (log transport):\n{}", body);
            Ok(())
        })
    }
}
