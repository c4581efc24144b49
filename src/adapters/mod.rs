// Adapters layer: concrete implementations for external systems (http, scrapers, storage, supabase)

pub mod booking;
pub mod google;
pub mod http;
pub mod instagram;
pub mod storage;
pub mod structured_data;
pub mod supabase;
pub mod tripadvisor;
pub mod whatsapp;

pub use http::HttpFetcher;
pub use storage::LocalStorage;
pub use supabase::SupabaseClient;
