//! crates/notes_core/src/templates.rs
//!
//! HTML bodies for the transactional emails sent by the auth flow.

/// The email asking a new user to verify their address with a one-time code.
pub fn verification_mail(otp: &str) -> String {
    format!(
        "<div style=\"font-family: sans-serif;\">\
         <h2>Verify your email</h2>\
         <p>Use the following code to verify your account. It expires in 5 minutes.</p>\
         <p style=\"font-size: 24px; letter-spacing: 4px;\"><strong>{}</strong></p>\
         <p>If you did not sign up, you can ignore this email.</p>\
         </div>",
        otp
    )
}

/// Sent once the account is verified.
pub fn welcome_mail() -> String {
    "<div style=\"font-family: sans-serif;\">\
     <h2>Welcome aboard!</h2>\
     <p>Your account has been successfully created and verified.</p>\
     </div>"
        .to_string()
}

/// The password-reset link email. The link expires in 10 minutes.
pub fn reset_request_mail(reset_link: &str) -> String {
    format!(
        "<div style=\"font-family: sans-serif;\">\
         <h2>Reset your password</h2>\
         <p>Click the link below to choose a new password. It expires in 10 minutes.</p>\
         <p><a href=\"{}\">Reset password</a></p>\
         <p>If you did not request this, you can ignore this email.</p>\
         </div>",
        reset_link
    )
}

/// Confirmation sent after a successful password reset.
pub fn reset_success_mail() -> String {
    "<div style=\"font-family: sans-serif;\">\
     <h2>Password changed</h2>\
     <p>Your password was reset successfully. You can now sign in with the new one.</p>\
     </div>"
        .to_string()
}
