/// Router Module Index
///
/// Splits the routing table by access level. Authentication is applied as a route
/// layer on the protected router, so no protected endpoint can be mounted without it.

/// Routes accessible without a session (health checks).
pub mod public;

/// The `/api/users` resource. Every route requires an authenticated principal.
pub mod users;
