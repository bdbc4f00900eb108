//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use tcommon::SessionId;
//!
//! let session = SessionId::from("session-1");
//!
//! assert_eq!(session.as_str(), "session-1");
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use tcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use tcommon::SessionId;
    //!
    //! let session = SessionId::generate();
    //! assert!(session.as_str().starts_with("session_"));
    //! ```

    use std::fmt::{Display, Formatter};

    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct SessionId(String);

    impl SessionId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        /// Creates an id of the form `session_<uuid-v4 without hyphens>`.
        pub fn generate() -> Self {
            Self(format!("session_{}", Uuid::new_v4().simple()))
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for SessionId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for SessionId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for SessionId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub use context::SessionId;
pub use future::BoxFuture;
