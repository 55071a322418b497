//! Login and restricted-page detection
//!
//! Links harvested from an authentication wall depend on session state and are
//! not representative of the public site graph, so such pages are completed
//! without harvesting.

use crate::crawler::FetchResult;
use scraper::{Html, Selector};

/// Word prefixes in a form's action, id or name that mark it as an auth form
const AUTH_PREFIXES: &[&str] = &["login", "logon", "signin"];

/// Whole words in a form's action, id or name that mark it as an auth form
const AUTH_WORDS: &[&str] = &[
    "auth",
    "oauth",
    "authn",
    "authenticate",
    "authentication",
    "authorize",
];

/// Phrases that mark a title, heading or body preview as an access wall
const RESTRICTED_PHRASES: &[&str] = &[
    "access denied",
    "permission denied",
    "authentication required",
    "login required",
    "log in required",
    "please log in",
    "please login",
    "please sign in",
    "log in to continue",
    "sign in to continue",
    "you must be logged in",
    "you must log in",
    "you are not authorized",
    "restricted access",
    "401 unauthorized",
    "403 forbidden",
];

/// Characters of body text inspected for restricted phrases
const BODY_PREVIEW_CHARS: usize = 1000;

/// Returns true when the response is a login wall or otherwise access-restricted
///
/// Detection fires on a 401/403 status, a password input, an auth-looking form,
/// or a restricted phrase in the title, headings or body preview. Inspection
/// failures count as "not restricted".
pub fn is_restricted_page(document: &Html, result: &FetchResult) -> bool {
    if matches!(result.status, 401 | 403) {
        return true;
    }

    has_password_input(document) || has_auth_form(document) || has_restricted_phrase(document)
}

fn has_password_input(document: &Html) -> bool {
    match Selector::parse("input[type=password], input[type=PASSWORD]") {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    }
}

fn has_auth_form(document: &Html) -> bool {
    let Ok(selector) = Selector::parse("form") else {
        return false;
    };

    document.select(&selector).any(|form| {
        ["action", "id", "name"].iter().any(|attr| {
            form.value()
                .attr(attr)
                .is_some_and(|value| has_auth_word(&value.to_lowercase()))
        })
    })
}

/// Splits on non-alphanumerics so `author-search` is not read as `auth`
fn has_auth_word(value: &str) -> bool {
    value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| {
            AUTH_WORDS.contains(&word)
                || AUTH_PREFIXES.iter().any(|prefix| word.starts_with(prefix))
        })
}

fn has_restricted_phrase(document: &Html) -> bool {
    let mut inspected = String::new();

    if let Ok(selector) = Selector::parse("title, h1, h2, h3") {
        for element in document.select(&selector) {
            inspected.extend(element.text());
            inspected.push(' ');
        }
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            let preview: String = body.text().collect::<String>();
            inspected.extend(preview.chars().take(BODY_PREVIEW_CHARS));
        }
    }

    let inspected = collapse_whitespace(&inspected.to_lowercase());
    RESTRICTED_PHRASES
        .iter()
        .any(|phrase| inspected.contains(phrase))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
