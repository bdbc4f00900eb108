/// Creates a single chat [`Message`](crate::Message) from a role shorthand.
///
/// ```rust
/// use tandem::{Role, tandem_msg};
///
/// let message = tandem_msg!(assistant => "Done.");
/// assert_eq!(message.role, Role::Assistant);
/// assert_eq!(message.content, "Done.");
/// ```
#[macro_export]
macro_rules! tandem_msg {
    (user => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::User, $content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::Assistant, $content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use user or assistant");
    };
}

/// Creates a `Vec<Message>` from role/content pairs.
///
/// ```rust
/// use tandem::{Role, tandem_messages};
///
/// let messages = tandem_messages![
///     user => "What changed in Rust 1.93?",
///     assistant => "Several library stabilizations.",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role, Role::User);
/// assert_eq!(messages[1].role, Role::Assistant);
/// ```
#[macro_export]
macro_rules! tandem_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::tandem_msg!($role => $content)),+]
    };
}
