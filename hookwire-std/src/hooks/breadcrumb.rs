//! Breadcrumb handler.

use hookwire_core::{Breadcrumb, BreadcrumbLevel, Handler, Hook, keys};
use std::{fmt, sync::Arc};

type BuildFn = Arc<dyn Fn(&Hook) -> Option<Breadcrumb> + Send + Sync>;

/// Post-handler that appends a breadcrumb to the context's trail.
///
/// Does nothing when the context carries no breadcrumb buffer or the build
/// function returns `None`.
#[derive(Clone)]
pub struct BreadcrumbHandler {
    build: BuildFn,
}

impl BreadcrumbHandler {
    /// Append what `build` derives from each hook.
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&Hook) -> Option<Breadcrumb> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(build),
        }
    }
}

impl Default for BreadcrumbHandler {
    fn default() -> Self {
        Self::new(default_breadcrumb)
    }
}

impl Handler for BreadcrumbHandler {
    fn handle(&self, hook: &mut Hook) {
        let Some(buffer) = hook.context().breadcrumbs() else {
            return;
        };
        if let Some(crumb) = (self.build)(hook) {
            buffer.push(crumb);
        }
    }
}

impl fmt::Debug for BreadcrumbHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreadcrumbHandler").finish_non_exhaustive()
    }
}

/// A `query` breadcrumb naming the operation, at `error` level when it failed.
pub fn default_breadcrumb(hook: &Hook) -> Option<Breadcrumb> {
    let args = hook.args();
    let name = [keys::FUNC_NAME, keys::COMMAND_NAME, keys::METHOD_NAME]
        .into_iter()
        .map(|key| args.str(key))
        .find(|name| !name.is_empty())?;

    let mut crumb = Breadcrumb::new("query").with_message(name);
    let duration = args.duration(keys::DURATION);
    if !duration.is_zero() {
        crumb = crumb.with_data(keys::DURATION, format!("{duration:?}"));
    }
    match args.error(keys::ERROR) {
        Some(err) => Some(
            crumb
                .with_level(BreadcrumbLevel::Error)
                .with_data(keys::ERROR, err),
        ),
        None => Some(crumb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_core::{Breadcrumbs, Context};
    use std::time::Duration;

    #[test]
    fn appends_to_context_buffer() {
        let trail = Breadcrumbs::new(8);
        let mut hook = Hook::new(Context::background().with_breadcrumbs(trail.clone()));
        hook.add_arg(keys::FUNC_NAME, "insert_one")
            .add_arg(keys::DURATION, Duration::from_millis(3))
            .add_arg(keys::ERROR, "duplicate key");

        BreadcrumbHandler::default().handle(&mut hook);

        let crumbs = trail.snapshot();
        assert_eq!(crumbs.len(), 1);
        assert_eq!(crumbs[0].message.as_deref(), Some("insert_one"));
        assert_eq!(crumbs[0].level, BreadcrumbLevel::Error);
        assert_eq!(crumbs[0].data["error"], "duplicate key");
        assert_eq!(crumbs[0].data["duration"], "3ms");
    }

    #[test]
    fn no_buffer_or_no_name_is_a_no_op() {
        let mut hook = Hook::new(Context::background());
        hook.add_arg(keys::FUNC_NAME, "x");
        BreadcrumbHandler::default().handle(&mut hook);

        let trail = Breadcrumbs::new(8);
        let mut unnamed = Hook::new(Context::background().with_breadcrumbs(trail.clone()));
        BreadcrumbHandler::default().handle(&mut unnamed);
        assert!(trail.is_empty());
    }
}
