use parse_display::Display;

/// Usage faults the registry can detect.
///
/// Most misuse (two unrelated call sites sharing a key of the same type, subscribing to a
/// [`Derived`](crate::Derived) before reading it) is silent by design and is not reported here.
#[non_exhaustive]
#[derive(Display, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A key (or memo signature) is already bound to a value of another type.
    #[display("`{key}` holds a value of type `{found}`, not `{expected}`")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// `SIGSYNC_REGISTRY_MODE` is not `process` or `request`.
    #[display("invalid registry mode `{0}`")]
    InvalidMode(String),
}

impl std::error::Error for StoreError {}
