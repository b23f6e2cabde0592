use axum::Router;

/// A mountable application module.
///
/// Each domain crate exposes one implementation; the server binary
/// collects them and merges their routers.
pub trait Module {
    /// Short module name, used in logs.
    fn name(&self) -> &str;

    /// The module's HTTP routes, already bound to its own state.
    fn routes(&self) -> Router;
}
