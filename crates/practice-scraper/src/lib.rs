pub mod detail;
pub mod errors;
pub mod list;
pub mod selectors;

pub use detail::{scrape_secondary_code, DetailScrapeConfig};
pub use errors::ScrapeError;
pub use list::scrape_practice_list;
