use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// The 80 random bits of the ULID make ids unguessable; the timestamp part
/// keeps them roughly sortable in logs.
///
/// # Examples
/// ```
/// let id = live_common::id::prefixed_ulid("ws");
/// assert!(id.starts_with("ws_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const CONNECTION: &str = "ws";
}
