//! Sentry scope helpers.
//!
//! These are no-ops unless the entry point initialized a Sentry client, so
//! stores call them unconditionally.

use shopfront_core::User;

/// Associate subsequent error reports with `user`.
///
/// Call this after a successful login, registration, or profile refresh.
pub fn set_user(user: &User) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.id.to_string()),
            email: Some(user.email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a state-changing store operation.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// breadcrumb("cart", "Added item", &[("product_id", "p1")]);
/// ```
pub fn breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
