pub mod fetcher;
pub mod store;
pub mod table;

pub use fetcher::ReqwestFetcher;
pub use store::JsonFileStore;
pub use table::ScraperTableReader;
