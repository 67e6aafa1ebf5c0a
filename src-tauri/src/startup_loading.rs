use url::Url;

use crate::MAIN_WINDOW_LABEL;

fn same_origin(page_url: &Url, backend_url: &str) -> bool {
    Url::parse(backend_url)
        .map(|backend| backend.origin() == page_url.origin())
        .unwrap_or(false)
}

/// True for loads of the bundled loading screen in the main window.
pub(crate) fn is_placeholder_page(window_label: &str, page_url: &Url, backend_url: &str) -> bool {
    window_label == MAIN_WINDOW_LABEL
        && page_url.scheme() != "about"
        && !same_origin(page_url, backend_url)
}

pub(crate) fn startup_error_script(message: &str) -> String {
    let encoded = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".to_string());
    format!("window.showStartupError && window.showStartupError({encoded});")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKEND_URL: &str = "http://127.0.0.1:5000/";

    #[test]
    fn is_placeholder_page_matches_bundled_loading_screen() {
        let tauri_page = Url::parse("tauri://localhost/index.html").expect("url");
        let windows_page = Url::parse("http://tauri.localhost/").expect("url");

        assert!(is_placeholder_page("main", &tauri_page, BACKEND_URL));
        assert!(is_placeholder_page("main", &windows_page, BACKEND_URL));
    }

    #[test]
    fn is_placeholder_page_ignores_backend_pages_and_other_windows() {
        let backend_page = Url::parse("http://127.0.0.1:5000/samples").expect("url");
        let blank = Url::parse("about:blank").expect("url");
        let tauri_page = Url::parse("tauri://localhost/").expect("url");

        assert!(!is_placeholder_page("main", &backend_page, BACKEND_URL));
        assert!(!is_placeholder_page("main", &blank, BACKEND_URL));
        assert!(!is_placeholder_page("settings", &tauri_page, BACKEND_URL));
    }

    #[test]
    fn startup_error_script_escapes_message() {
        let script = startup_error_script("did not \"respond\"\nretry");
        assert_eq!(
            script,
            r#"window.showStartupError && window.showStartupError("did not \"respond\"\nretry");"#
        );
    }
}
