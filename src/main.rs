use std::process;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use viaggi::autocomplete::AutocompleteController;
use viaggi::booking::{BookingInfo, BookingRequest, BookingStatus, Passenger};
use viaggi::client::ApiClient;
use viaggi::config::ClientConfig;
use viaggi::contact::ContactMessage;
use viaggi::error::Error;
use viaggi::filter::{ResultView, SortKey, StopClass};
use viaggi::model::FlightOffer;
use viaggi::pagination;
use viaggi::query::{FlightSearchRequest, TravelClass};
use viaggi::session::{EnvSession, SessionStore, StaticSession};
use viaggi::table;

#[derive(Parser)]
#[command(
    name = "viaggi",
    about = "Search, filter and book flights through the Indus Viaggi API",
    version,
    after_help = "\
Examples:
  viaggi search -f FCO -t LHR -d 2026-04-01
  viaggi search -f MXP -t JFK -d 2026-05-01 --return-date 2026-05-15 --sort price
  viaggi search -f FCO -t BKK -d 2026-03-01 --stops direct,one --max-price 900 --page 2
  viaggi airports lond
  viaggi book --offer offer.json --name Anna --surname Rossi --email anna@example.it --phone \"+39 333 1234567\""
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, value_name = "URL", help = "API base URL [env: VIAGGI_API_BASE_URL]")]
    base_url: Option<String>,

    #[arg(long, global = true, value_name = "TOKEN", help = "Bearer token [env: VIAGGI_TOKEN]")]
    token: Option<String>,

    #[arg(long, global = true, value_name = "SECS", help = "Request timeout [env: VIAGGI_TIMEOUT]")]
    timeout: Option<u64>,

    #[arg(long, global = true, value_name = "URL", help = "HTTP or SOCKS5 proxy [env: VIAGGI_PROXY]")]
    proxy: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(
        about = "Search for flights and show one filtered page of results",
        after_help = "\
Examples:
  One-way:      viaggi search -f FCO -t LHR -d 2026-04-01
  Round-trip:   viaggi search -f MXP -t JFK -d 2026-05-01 --return-date 2026-05-15
  Direct only:  viaggi search -f FCO -t CDG -d 2026-03-01 --stops direct
  Cheapest:     viaggi search -f FCO -t CDG -d 2026-03-01 --sort price --max-price 200
  JSON output:  viaggi search -f FCO -t CDG -d 2026-03-01 --json --pretty"
    )]
    Search(SearchArgs),
    #[command(about = "Look up airports by city or airport name (at least 3 characters)")]
    Airports(AirportsArgs),
    #[command(about = "Book a flight offer saved from `search --json`")]
    Book(BookArgs),
    #[command(about = "Send a message to the agency")]
    Contact(ContactArgs),
    #[command(about = "Start MCP server for AI agents (stdio transport)")]
    Mcp,
}

#[derive(clap::Args)]
struct SearchArgs {
    #[arg(short, long, value_name = "IATA", help = "Origin airport or city code")]
    from: String,

    #[arg(short, long, value_name = "IATA", help = "Destination airport or city code")]
    to: String,

    #[arg(short, long, value_name = "YYYY-MM-DD", help = "Departure date")]
    date: String,

    #[arg(long, value_name = "YYYY-MM-DD", help = "Return date (makes the search round-trip)")]
    return_date: Option<String>,

    #[arg(long, default_value = "1", value_name = "N", help = "Adult passengers (12+)")]
    adults: u32,

    #[arg(long, default_value = "0", value_name = "N", help = "Child passengers (2-11)")]
    children: u32,

    #[arg(long, default_value = "0", value_name = "N", help = "Infants (under 2)")]
    infants: u32,

    #[arg(
        long = "class",
        default_value = "economy",
        value_name = "CLASS",
        help = "Travel class [economy, premium-economy, business, first]"
    )]
    travel_class: String,

    #[arg(long, value_name = "EUR", help = "Hide offers above this price")]
    max_price: Option<f64>,

    #[arg(
        long,
        value_name = "CLASSES",
        help = "Allowed stop classes, comma-separated [direct, one, two-plus]"
    )]
    stops: Option<String>,

    #[arg(
        long,
        default_value = "none",
        value_name = "KEY",
        help = "Sort by [none, price, duration, departure]"
    )]
    sort: String,

    #[arg(long, value_name = "HOURS", help = "Hide offers whose outbound takes longer")]
    max_duration: Option<u32>,

    #[arg(long, value_name = "HOURS", help = "Hide offers with a longer layover")]
    max_layover: Option<u32>,

    #[arg(long, default_value = "1", value_name = "N", help = "Result page (10 offers per page)")]
    page: usize,

    #[arg(long, help = "One-line-per-offer output")]
    compact: bool,

    #[arg(long, help = "Output as JSON")]
    json: bool,

    #[arg(long, help = "Output as pretty-printed JSON")]
    pretty: bool,
}

#[derive(clap::Args)]
struct AirportsArgs {
    #[arg(value_name = "TEXT", help = "City or airport name")]
    text: String,

    #[arg(long, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Args)]
struct BookArgs {
    #[arg(long, value_name = "FILE", help = "JSON file holding one flight offer")]
    offer: String,

    #[arg(long, help = "Passenger first name")]
    name: String,

    #[arg(long, help = "Passenger last name")]
    surname: String,

    #[arg(long, help = "Passenger email")]
    email: String,

    #[arg(long, help = "Passenger phone, e.g. +39 333 1234567")]
    phone: String,

    #[arg(long, default_value = "pending", value_name = "STATUS", help = "Booking status [pending, confirmed, cancelled]")]
    status: String,

    #[arg(long, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Args)]
struct ContactArgs {
    #[arg(long, help = "Your email address")]
    email: String,

    #[arg(long, help = "Your name")]
    name: String,

    #[arg(long, default_value = "", help = "Subject")]
    subject: String,

    #[arg(long, help = "Message text")]
    message: String,
}

fn error_code(err: &Error) -> i32 {
    match err {
        Error::InvalidAirport(_)
        | Error::InvalidDate(_)
        | Error::InvalidEmail(_)
        | Error::InvalidPhone(_)
        | Error::Validation(_) => 2,
        Error::Timeout
        | Error::ConnectionFailed(_)
        | Error::DnsResolution(_)
        | Error::TlsError(_)
        | Error::ProxyError(_) => 3,
        Error::Unauthorized(_) => 4,
        Error::HttpStatus(_) => 5,
        Error::Api(_) | Error::Rejected | Error::Decode(_) => 6,
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::InvalidAirport(_) => "invalid_airport",
        Error::InvalidDate(_) => "invalid_date",
        Error::InvalidEmail(_) => "invalid_email",
        Error::InvalidPhone(_) => "invalid_phone",
        Error::Validation(_) => "validation_error",
        Error::Timeout => "timeout",
        Error::ConnectionFailed(_) => "connection_failed",
        Error::DnsResolution(_) => "dns_error",
        Error::TlsError(_) => "tls_error",
        Error::ProxyError(_) => "proxy_error",
        Error::Unauthorized(_) => "unauthorized",
        Error::HttpStatus(_) => "http_error",
        Error::Api(_) | Error::Rejected => "api_error",
        Error::Decode(_) => "decode_error",
    }
}

fn die(err: &Error, json_mode: bool) -> ! {
    if json_mode {
        let json = json!({
            "error": {
                "kind": error_kind(err),
                "message": err.to_string(),
            }
        });
        println!("{json}");
    } else {
        eprintln!("error: {err}");
    }
    process::exit(error_code(err));
}

fn build_client(cli: &Cli, json_mode: bool) -> ApiClient {
    let config = ClientConfig::from_env()
        .with_base_url(cli.base_url.clone())
        .with_timeout(cli.timeout)
        .with_proxy(cli.proxy.clone());
    let session: Arc<dyn SessionStore> = match cli.token {
        Some(ref token) => Arc::new(StaticSession::new(token.clone())),
        None => Arc::new(EnvSession),
    };
    match ApiClient::new(config, session) {
        Ok(client) => client,
        Err(e) => die(&e, json_mode),
    }
}

fn build_request(args: &SearchArgs) -> Result<FlightSearchRequest, Error> {
    let request = FlightSearchRequest {
        return_date: args.return_date.clone(),
        adults: args.adults,
        children: args.children,
        infants: args.infants,
        travel_class: TravelClass::from_str_loose(&args.travel_class)?,
        ..FlightSearchRequest::one_way(&args.from, &args.to, &args.date)
    };
    request.validate()?;
    Ok(request)
}

fn parse_stops(raw: &str) -> Result<Vec<StopClass>, Error> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(StopClass::from_str_loose)
        .collect()
}

struct Filters {
    stops: Option<Vec<StopClass>>,
    sort: SortKey,
    page: usize,
}

impl Filters {
    fn parse(args: &SearchArgs) -> Result<Self, Error> {
        Ok(Self {
            stops: args.stops.as_deref().map(parse_stops).transpose()?,
            sort: SortKey::from_str_loose(&args.sort)?,
            page: pagination::check_page(args.page)?,
        })
    }

    fn apply(self, view: &mut ResultView, args: &SearchArgs) {
        if let Some(stops) = self.stops {
            view.set_stops(stops);
        }
        if let Some(price) = args.max_price {
            view.set_max_price(price);
        }
        view.set_sort(self.sort);
        view.set_max_duration_hours(args.max_duration);
        view.set_max_layover_hours(args.max_layover);
        view.set_page(self.page);
    }
}

fn print_page(view: &mut ResultView, args: &SearchArgs) {
    let json_mode = args.json || args.pretty;
    if !json_mode {
        view.on_count_change(|n| {
            println!("{n} {}", if n == 1 { "result" } else { "results" });
        });
    }

    let max_price = view.state().max_price_selected;
    let derived = view.view();
    let page = derived.page;
    let total_pages = derived.total_pages();

    if json_mode {
        let output = json!({
            "total": derived.total(),
            "page": page,
            "pageSize": pagination::PAGE_SIZE,
            "totalPages": total_pages,
            "maxPriceSelected": max_price,
            "pages": pagination::page_links(page, total_pages),
            "offers": derived.page_offers(),
        });
        let text = if args.pretty {
            serde_json::to_string_pretty(&output)
        } else {
            serde_json::to_string(&output)
        };
        println!("{}", text.unwrap_or_default());
        return;
    }

    let offers = derived.page_offers();
    if offers.is_empty() {
        println!("No flights found.");
    } else if args.compact {
        for offer in offers {
            println!("{}", table::compact_line(offer));
        }
    } else {
        println!("{}", table::render(offers));
    }

    if total_pages > 1 {
        let links = pagination::page_links(page, total_pages);
        println!("Page {}", pagination::render_links(&links, page));
    }
}

async fn run_search(cli: &Cli, args: &SearchArgs) {
    let json_mode = args.json || args.pretty;
    let request = match build_request(args) {
        Ok(r) => r,
        Err(e) => die(&e, json_mode),
    };
    let filters = match Filters::parse(args) {
        Ok(f) => f,
        Err(e) => die(&e, json_mode),
    };

    let client = build_client(cli, json_mode);
    let mut view = match viaggi::search(&client, &request).await {
        Ok(v) => v,
        Err(e) => die(&e, json_mode),
    };

    filters.apply(&mut view, args);
    print_page(&mut view, args);
}

async fn run_airports(cli: &Cli, args: &AirportsArgs) {
    let client = Arc::new(build_client(cli, args.json));
    let config = client.config().autocomplete.clone();
    let min_len = config.min_query_len;

    let mut controller = AutocompleteController::new(client, config);
    controller.input(args.text.clone());
    let state = controller.settled().await;

    if args.json {
        let output = json!({
            "query": state.query_text,
            "options": state.options,
            "empty": state.empty,
            "error": state.error,
        });
        println!("{output}");
        return;
    }

    if args.text.chars().count() < min_len {
        println!("Type at least {min_len} characters to search.");
    } else if let Some(err) = state.error {
        eprintln!("error: {err}");
        process::exit(3);
    } else if state.empty {
        println!("No airports found.");
    } else {
        for option in &state.options {
            println!("{}\t{}", option.value, option.label);
        }
    }
}

fn load_offer(path: &str) -> Result<FlightOffer, Error> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Validation(format!("cannot read offer file {path}: {e}")))?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::Validation(format!("offer file {path} is not a flight offer: {e}")))
}

async fn run_book(cli: &Cli, args: &BookArgs) {
    let flight = match load_offer(&args.offer) {
        Ok(f) => f,
        Err(e) => die(&e, args.json),
    };
    let status = match BookingStatus::from_str_loose(&args.status) {
        Ok(s) => s,
        Err(e) => die(&e, args.json),
    };

    let booking = BookingRequest {
        booking: BookingInfo { status },
        ..BookingRequest::new(
            flight,
            Passenger {
                name: args.name.trim().to_string(),
                surname: args.surname.trim().to_string(),
                phone: args.phone.trim().to_string(),
                email: args.email.trim().to_string(),
            },
        )
    };
    if let Err(e) = booking.validate() {
        die(&e, args.json);
    }

    let client = build_client(cli, args.json);
    match client.submit_booking(&booking).await {
        Ok(record) => {
            if args.json {
                println!("{}", json!({ "booking": record }));
            } else {
                println!("Booking submitted.");
                if !record.is_null() {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&record).unwrap_or_default()
                    );
                }
            }
        }
        Err(e) => die(&e, args.json),
    }
}

async fn run_contact(cli: &Cli, args: &ContactArgs) {
    let message = ContactMessage::query(&args.email, &args.name, &args.subject, &args.message);
    if let Err(e) = message.validate() {
        die(&e, false);
    }
    let client = build_client(cli, false);
    match client.send_mail(&message).await {
        Ok(()) => println!("Message sent."),
        Err(e) => die(&e, false),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mcp => viaggi::mcp::run().await,
        Commands::Search(ref args) => run_search(&cli, args).await,
        Commands::Airports(ref args) => run_airports(&cli, args).await,
        Commands::Book(ref args) => run_book(&cli, args).await,
        Commands::Contact(ref args) => run_contact(&cli, args).await,
    }
}
