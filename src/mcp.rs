use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::autocomplete::AutocompleteController;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::filter::{ResultView, SortKey, StopClass};
use crate::pagination;
use crate::query::{FlightSearchRequest, TravelClass};
use crate::session::EnvSession;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SearchArgs {
    #[schemars(
        description = "Origin airport or city IATA code, exactly 3 uppercase letters. Example: FCO, MXP, LHR"
    )]
    from: String,
    #[schemars(description = "Destination airport or city IATA code. Example: JFK")]
    to: String,
    #[schemars(description = "Departure date in YYYY-MM-DD format. Example: 2026-03-01")]
    date: String,
    #[schemars(
        description = "Return date in YYYY-MM-DD for round-trip. Must not be before the departure date"
    )]
    return_date: Option<String>,
    #[schemars(description = "Adult passengers (12+), 1 to 9. Default: 1")]
    adults: Option<u32>,
    #[schemars(description = "Child passengers (2-11), up to 9. Default: 0")]
    children: Option<u32>,
    #[schemars(description = "Infants (under 2), no more than adults. Default: 0")]
    infants: Option<u32>,
    #[schemars(
        description = "One of: economy, premium-economy, business, first. Default: economy"
    )]
    travel_class: Option<String>,
    #[schemars(description = "Hide offers priced above this amount in EUR")]
    max_price: Option<f64>,
    #[schemars(
        description = "Allowed stop classes, comma-separated. Any of: direct, one, two-plus. Default: all"
    )]
    stops: Option<String>,
    #[schemars(description = "One of: none, price, duration, departure. Default: none")]
    sort: Option<String>,
    #[schemars(description = "Hide offers whose outbound segments take longer than this many hours")]
    max_duration_hours: Option<u32>,
    #[schemars(description = "Hide offers with a layover longer than this many hours")]
    max_layover_hours: Option<u32>,
    #[schemars(description = "Result page, 10 offers per page. Default: 1")]
    page: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AirportsArgs {
    #[schemars(description = "City or airport name, at least 3 characters. Example: lond, milano")]
    text: String,
}

fn tool_error(msg: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.into())]))
}

fn tool_json(value: &impl Serialize) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
        Err(e) => tool_error(format!("failed to encode result: {e}")),
    }
}

fn build_request(args: &SearchArgs) -> Result<FlightSearchRequest, Error> {
    let travel_class = args
        .travel_class
        .as_deref()
        .map(TravelClass::from_str_loose)
        .transpose()?
        .unwrap_or_default();

    let request = FlightSearchRequest {
        return_date: args.return_date.clone().filter(|d| !d.is_empty()),
        adults: args.adults.unwrap_or(1),
        children: args.children.unwrap_or(0),
        infants: args.infants.unwrap_or(0),
        travel_class,
        ..FlightSearchRequest::one_way(&args.from, &args.to, &args.date)
    };
    request.validate()?;
    if let Some(page) = args.page {
        pagination::check_page(page)?;
    }
    Ok(request)
}

fn apply_filters(view: &mut ResultView, args: &SearchArgs) -> Result<(), Error> {
    if let Some(ref stops) = args.stops {
        let classes = stops
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(StopClass::from_str_loose)
            .collect::<Result<Vec<_>, _>>()?;
        view.set_stops(classes);
    }
    if let Some(price) = args.max_price {
        view.set_max_price(price);
    }
    if let Some(ref sort) = args.sort {
        view.set_sort(SortKey::from_str_loose(sort)?);
    }
    view.set_max_duration_hours(args.max_duration_hours);
    view.set_max_layover_hours(args.max_layover_hours);
    view.set_page(pagination::check_page(args.page.unwrap_or(1))?);
    Ok(())
}

#[derive(Clone)]
struct ViaggiMcp {
    client: Arc<ApiClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ViaggiMcp {
    fn new(client: ApiClient) -> Self {
        Self {
            client: Arc::new(client),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Search for flights and return one filtered, sorted page of offers as JSON. Each offer carries price (EUR), departureItinerary and returnItinerary with segments (from, to, departureTime, arrivalTime, layoverDuration, airLine, flightNumber) and totalDuration. The response also reports total matches, totalPages and the highest price seen. Pass an offer back unchanged when booking."
    )]
    async fn viaggi_search(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        let request = match build_request(&args) {
            Ok(r) => r,
            Err(e) => return tool_error(e.to_string()),
        };

        let mut view = match crate::search(&self.client, &request).await {
            Ok(v) => v,
            Err(e) => return tool_error(e.to_string()),
        };
        if let Err(e) = apply_filters(&mut view, &args) {
            return tool_error(e.to_string());
        }

        let max_observed = view.max_observed_price();
        let derived = view.view();
        tool_json(&json!({
            "total": derived.total(),
            "page": derived.page,
            "pageSize": pagination::PAGE_SIZE,
            "totalPages": derived.total_pages(),
            "maxObservedPrice": max_observed,
            "offers": derived.page_offers(),
        }))
    }

    #[tool(
        description = "Look up airports and cities by name. Returns a JSON list of {label, value} where value is the IATA code to use as from/to in viaggi_search. Needs at least 3 characters."
    )]
    async fn viaggi_airports(
        &self,
        Parameters(args): Parameters<AirportsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let config = self.client.config().autocomplete.clone();
        if args.text.trim().chars().count() < config.min_query_len {
            return tool_error(format!(
                "type at least {} characters to search",
                config.min_query_len
            ));
        }

        let mut controller = AutocompleteController::new(self.client.clone(), config);
        controller.input(args.text.trim());
        let state = controller.settled().await;

        match state.error {
            Some(err) => tool_error(err),
            None => tool_json(&state.options),
        }
    }
}

#[tool_handler]
impl ServerHandler for ViaggiMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "viaggi".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Flight search for the Indus Viaggi travel agency. Workflow: (1) viaggi_airports to turn a city name into an IATA code. (2) viaggi_search with those codes; use stops, max_price, sort and page to narrow the results.".into(),
            ),
        }
    }
}

pub async fn run() {
    let config = ClientConfig::from_env();
    info!(base_url = %config.base_url, "starting MCP server");
    let client = match ApiClient::new(config, Arc::new(EnvSession)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(3);
        }
    };

    let service = ViaggiMcp::new(client)
        .serve(rmcp::transport::stdio())
        .await
        .expect("failed to start MCP server");
    service.waiting().await.expect("MCP server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FlightOffer;

    fn args(value: serde_json::Value) -> SearchArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn request_defaults() {
        let req = build_request(&args(json!({
            "from": "FCO", "to": "LHR", "date": "2026-03-01"
        })))
        .unwrap();
        assert_eq!(req.adults, 1);
        assert_eq!(req.children, 0);
        assert_eq!(req.travel_class, TravelClass::Economy);
        assert!(req.return_date.is_none());
    }

    #[test]
    fn empty_return_date_is_one_way() {
        let req = build_request(&args(json!({
            "from": "FCO", "to": "LHR", "date": "2026-03-01", "return_date": ""
        })))
        .unwrap();
        assert!(req.return_date.is_none());
    }

    #[test]
    fn request_rejects_bad_class() {
        let err = build_request(&args(json!({
            "from": "FCO", "to": "LHR", "date": "2026-03-01", "travel_class": "steerage"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("steerage"));
    }

    #[test]
    fn page_zero_is_rejected_before_searching() {
        let err = build_request(&args(json!({
            "from": "FCO", "to": "LHR", "date": "2026-03-01", "page": 0
        })))
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let mut view = ResultView::new(Vec::new());
        let result = apply_filters(
            &mut view,
            &args(json!({"from": "FCO", "to": "LHR", "date": "2026-03-01", "page": 0})),
        );
        assert!(result.is_err());
    }

    #[test]
    fn filters_reach_the_view() {
        let offers = [100.0, 300.0, 200.0]
            .into_iter()
            .map(|p| FlightOffer {
                price: Some(p),
                ..Default::default()
            })
            .collect();
        let mut view = ResultView::new(offers);
        apply_filters(
            &mut view,
            &args(json!({
                "from": "FCO", "to": "LHR", "date": "2026-03-01",
                "max_price": 250.0, "sort": "price"
            })),
        )
        .unwrap();

        let prices: Vec<_> = view.view().filtered.iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![Some(100.0), Some(200.0)]);
    }

    #[test]
    fn unknown_stop_class_is_rejected() {
        let mut view = ResultView::new(Vec::new());
        let result = apply_filters(
            &mut view,
            &args(json!({
                "from": "FCO", "to": "LHR", "date": "2026-03-01", "stops": "direct,lots"
            })),
        );
        assert!(result.is_err());
    }
}
