use axum::Router;

/// A service module that contributes HTTP routes.
///
/// The binary entry point collects all modules and nests their routes
/// under the API root.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes, relative to the API root.
    fn routes(&self) -> Router;
}
