use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

/// Path marker identifying the unrepresented / senior excluded page family.
pub const UNREPRESENTED_MARKER: &str = "rates-pay-unrepresented-senior-excluded-employees";

/// Suffix given to unrepresented-source codes that collide with an existing entry.
pub const EXCLUDED_SUFFIX: &str = "-EXCLUDED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageKind {
    CollectiveAgreement,
    Unrepresented,
}

impl PageKind {
    pub fn key(&self) -> &'static str {
        match self {
            PageKind::CollectiveAgreement => "collective_agreement",
            PageKind::Unrepresented => "unrepresented",
        }
    }

    pub fn from_url(url: &str) -> Self {
        let path = match Url::parse(url) {
            Ok(parsed) => percent_decode_str(parsed.path())
                .decode_utf8_lossy()
                .into_owned(),
            Err(_) => url.to_string(),
        };

        if path.contains(UNREPRESENTED_MARKER) {
            PageKind::Unrepresented
        } else {
            PageKind::CollectiveAgreement
        }
    }
}
