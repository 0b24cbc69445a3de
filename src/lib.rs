pub mod autocomplete;
pub mod booking;
pub mod client;
pub mod config;
pub mod contact;
pub mod error;
pub mod filter;
pub mod mcp;
pub mod model;
pub mod pagination;
pub mod query;
pub mod session;
pub mod table;

use client::ApiClient;
use error::Result;
use filter::ResultView;
use query::FlightSearchRequest;

/// Runs a flight search and wraps the offers in a fresh [`ResultView`].
pub async fn search(client: &ApiClient, request: &FlightSearchRequest) -> Result<ResultView> {
    let offers = client.search_flights(request).await?;
    Ok(ResultView::new(offers))
}
