mod config;
mod error;
mod geocode;
mod risk;
mod routing;
mod severity;
mod weather;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::geocode::NominatimClient;
use crate::risk::RankedRoute;
use crate::routing::{polyline_length_km, OsrmClient, Route};
use crate::severity::{BaselineModel, SeverityLabel, SeverityPredictor};
use crate::weather::{WeatherCategory, WeatherObservation};

#[derive(Parser, Debug)]
#[command(name = "roadrisk")]
#[command(about = "Road-safety route advisory API")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "ROADRISK_PORT")]
    port: Option<u16>,

    /// Path to a TOML config file
    #[arg(short, long, env = "ROADRISK_CONFIG")]
    config: Option<PathBuf>,
}

// Shared State for concurrency
struct AppState {
    config: Config,
    predictor: SeverityPredictor,
    osrm: OsrmClient,
    geocoder: NominatimClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadrisk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let osrm = OsrmClient::new(
        &config.osrm_url,
        Duration::from_secs(config.routing_timeout_secs),
    )
    .context("building OSRM client")?;
    let geocoder = NominatimClient::new(
        &config.nominatim_url,
        &config.country_codes,
        Duration::from_secs(config.geocode_timeout_secs),
    )
    .context("building geocoding client")?;
    let predictor = SeverityPredictor::new(Box::new(BaselineModel));

    let addr = format!("{}:{}", config.host, config.port);
    let shared_state = Arc::new(AppState {
        config,
        predictor,
        osrm,
        geocoder,
    });

    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_origin(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze_conditions))
        .route("/route", post(find_routes))
        .layer(cors)
        .with_state(shared_state);

    info!(%addr, "API server running");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- API DTOs ---

#[derive(Deserialize)]
struct AnalyzeRequest {
    /// Weather class ordinal from the upstream image classifier
    weather_class: u32,
    /// Classifier confidence, percent
    confidence: f64,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    weather: &'static str,
    confidence: f64,
    severity: &'static str,
    advice: &'static str,
    /// Populated when the severity model had to be skipped
    note: Option<String>,
}

#[derive(Deserialize)]
struct WeatherInput {
    category: String,
    confidence: f64,
}

#[derive(Deserialize)]
struct RouteRequest {
    /// [lat, lon]; defaults to the configured origin
    origin: Option<[f64; 2]>,
    /// [lat, lon] destination, if already resolved
    destination: Option<[f64; 2]>,
    /// Free-text destination, resolved through the geocoder
    destination_name: Option<String>,
    weather: Option<WeatherInput>,
    severity: Option<String>,
    /// Request alternative routes (default true)
    alternatives: Option<bool>,
}

#[derive(Serialize)]
struct GeoJsonLineString {
    r#type: String,
    coordinates: Vec<[f64; 2]>, // [lon, lat] standard for GeoJSON
}

impl GeoJsonLineString {
    fn from_lat_lon(points: &[[f64; 2]]) -> Self {
        Self {
            r#type: "LineString".to_string(),
            coordinates: points.iter().map(|p| [p[1], p[0]]).collect(),
        }
    }
}

#[derive(Serialize)]
struct RouteDto {
    geometry: GeoJsonLineString,
    distance_km: f64,
    duration_min: f64,
    color: String,
    weight: u32,
}

impl RouteDto {
    fn from_route(route: &Route) -> Self {
        Self {
            geometry: GeoJsonLineString::from_lat_lon(&route.geometry),
            distance_km: route.distance_km,
            duration_min: route.duration_min,
            color: route.color.clone(),
            weight: route.weight,
        }
    }
}

#[derive(Serialize)]
struct ResolvedPlace {
    latitude: f64,
    longitude: f64,
    display_name: Option<String>,
}

/// Straight origin→destination segment shown when no route was found.
#[derive(Serialize)]
struct DirectLine {
    geometry: GeoJsonLineString,
    distance_km: f64,
}

#[derive(Serialize)]
struct RouteResponse {
    destination: ResolvedPlace,
    routes: Vec<RouteDto>,
    /// Index into `routes` of the recommended candidate
    selected: Option<usize>,
    ranking: Vec<RankedRoute>,
    severity: Option<&'static str>,
    note: Option<String>,
    direct_line: Option<DirectLine>,
}

// --- Handlers ---

async fn analyze_conditions(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Json<AnalyzeResponse> {
    let category = WeatherCategory::from_ordinal(payload.weather_class);
    let observation = WeatherObservation::new(category, payload.confidence);

    let [default_lat, default_lon] = state.config.default_origin;
    let latitude = payload.latitude.unwrap_or(default_lat);
    let longitude = payload.longitude.unwrap_or(default_lon);

    let assessment = state.predictor.predict(category, latitude, longitude);

    Json(AnalyzeResponse {
        weather: observation.category.as_str(),
        confidence: observation.confidence,
        severity: assessment.label.as_str(),
        advice: assessment.label.advice(),
        note: assessment.note,
    })
}

async fn find_routes(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RouteRequest>,
) -> Result<Json<RouteResponse>> {
    let origin = payload.origin.unwrap_or(state.config.default_origin);

    let destination = match (payload.destination, payload.destination_name.as_deref()) {
        (Some([lat, lon]), _) => ResolvedPlace {
            latitude: lat,
            longitude: lon,
            display_name: None,
        },
        (None, Some(name)) => {
            let place = state.geocoder.search(name).await?;
            ResolvedPlace {
                latitude: place.latitude,
                longitude: place.longitude,
                display_name: Some(place.display_name),
            }
        }
        (None, None) => {
            return Err(Error::InvalidInput(
                "either destination coordinates or destination_name is required".to_string(),
            ))
        }
    };
    let dest_coords = [destination.latitude, destination.longitude];

    let routes = state
        .osrm
        .routes(origin, dest_coords, payload.alternatives.unwrap_or(true))
        .await?;

    if routes.is_empty() {
        let line = [origin, dest_coords];
        return Ok(Json(RouteResponse {
            destination,
            routes: Vec::new(),
            selected: None,
            ranking: Vec::new(),
            severity: None,
            note: Some("no routes found; showing the direct line".to_string()),
            direct_line: Some(DirectLine {
                geometry: GeoJsonLineString::from_lat_lon(&line),
                distance_km: polyline_length_km(&line),
            }),
        }));
    }

    let observation = payload
        .weather
        .map(|w| WeatherObservation::new(WeatherCategory::parse(&w.category), w.confidence));

    // Severity comes from the request when supplied; otherwise, with a
    // weather signal in hand, it is predicted fresh at the origin.
    let mut note = None;
    let severity: Option<SeverityLabel> = match (payload.severity.as_deref(), &observation) {
        (Some(label), _) => Some(SeverityLabel::parse(label)),
        (None, Some(obs)) => {
            let assessment = state.predictor.predict(obs.category, origin[0], origin[1]);
            note = assessment.note;
            Some(assessment.label)
        }
        (None, None) => None,
    };

    let selection = risk::evaluate(&routes, observation.as_ref(), severity)?;

    Ok(Json(RouteResponse {
        destination,
        routes: routes.iter().map(RouteDto::from_route).collect(),
        selected: Some(selection.selected),
        ranking: selection.ranking,
        severity: severity.map(SeverityLabel::as_str),
        note,
        direct_line: None,
    }))
}
