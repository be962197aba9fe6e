use scraper::Html;

use crate::models::{PageKind, PageRates};

mod appendix;
mod pipeline;
mod unrepresented;

pub use appendix::AppendixParser;
pub use pipeline::{process_page, run_scrape, ScrapeReport};
pub use unrepresented::UnrepresentedParser;

/// Turns one parsed page into `classification -> records`.
pub trait RatesParser: Send + Sync {
    fn kind(&self) -> PageKind;
    fn parse(&self, document: &Html, source_url: &str) -> PageRates;
}

pub fn parser_for(kind: PageKind) -> Box<dyn RatesParser> {
    match kind {
        PageKind::CollectiveAgreement => Box::new(AppendixParser),
        PageKind::Unrepresented => Box::new(UnrepresentedParser),
    }
}

/// DOM parse of a raw page, dispatched on the URL's page family.
pub fn parse_page(html: &str, source_url: &str) -> PageRates {
    let document = Html::parse_document(html);
    parser_for(PageKind::from_url(source_url)).parse(&document, source_url)
}
