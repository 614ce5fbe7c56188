use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

/// Same reserved set as JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Serialize)]
pub struct ShareLinks {
    pub url: String,
    pub twitter: String,
    pub linkedin: String,
}

pub fn share_links(url: &str, title: &str) -> ShareLinks {
    let encoded_url = utf8_percent_encode(url, COMPONENT).to_string();
    let encoded_title = utf8_percent_encode(title, COMPONENT).to_string();

    ShareLinks {
        url: url.to_string(),
        twitter: format!("https://twitter.com/intent/tweet?url={}&text={}", encoded_url, encoded_title),
        linkedin: format!("https://www.linkedin.com/sharing/share-offsite/?url={}", encoded_url),
    }
}
