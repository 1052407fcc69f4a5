//! Presenting failures to the end user.

use std::io::Write;

use tracing::error;

use crate::error::ApiError;

/// A blocking, user-facing notification sink.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Writes notifications to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        let mut stderr = std::io::stderr().lock();
        // Nothing sensible is left to do if stderr is gone.
        let _ = writeln!(stderr, "{message}");
    }
}

/// The text shown to the user for `error`.
pub fn error_notice(error: &ApiError) -> String {
    let headline = match error.as_http() {
        Some(http) => format!("Error {} {}", http.status_code, http.status_text),
        None => "Error".to_string(),
    };
    format!(
        "Sorry, an unexpected error occurred.\n{headline}\n{error}\nPlease try again or contact our customer service."
    )
}

/// Log `error`, then notify the user. Terminal: nothing is returned or
/// rethrown.
pub fn present_error(error: &ApiError, notifier: &dyn Notifier) {
    error!(%error, "unexpected error");
    notifier.notify(&error_notice(error));
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::HttpError;
    use crate::http::HttpResponse;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl Notifier for Recorder {
        fn notify(&self, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn http_errors_get_status_headline() {
        let error: ApiError = HttpError::from_response(HttpResponse {
            status: 403,
            status_text: "Forbidden".to_string(),
            headers: vec![("x-viur-error".to_string(), "invalid skey".to_string())],
            body: Vec::new(),
        })
        .into();
        let recorder = Recorder::default();
        present_error(&error, &recorder);

        let messages = recorder.0.borrow();
        assert_eq!(messages.len(), 1);
        let lines: Vec<&str> = messages[0].lines().collect();
        assert_eq!(lines[0], "Sorry, an unexpected error occurred.");
        assert_eq!(lines[1], "Error 403 Forbidden");
        assert_eq!(lines[2], "403 Forbidden: invalid skey");
    }

    #[test]
    fn other_errors_get_generic_headline() {
        let notice = error_notice(&ApiError::NotImplemented("article_remove"));
        let lines: Vec<&str> = notice.lines().collect();
        assert_eq!(lines[1], "Error");
        assert_eq!(lines[2], "article_remove is not implemented");
        assert!(lines[3].starts_with("Please try again"));
    }
}
