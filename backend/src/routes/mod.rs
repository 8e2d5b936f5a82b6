/// Router Module Index
///
/// Splits the dashboard API by the screen it serves. Every module returns a
/// `Router<AppState>` that `create_router` merges before applying the state.

/// Reference lists, tariff lookup, unique-code generation and first-run notices.
pub mod catalog;

/// User management table, user detail and the user's own authorizations.
pub mod users;

/// Authorization management table, lifecycle operations and file downloads.
pub mod authorizations;
