use anyhow::Context;
use pinmap::prelude::*;
use std::sync::Mutex;

/// Headless demo: lays out markers on the fallback canvas, then drives the
/// embedded path against the in-memory SDK
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let markers = match std::env::args().nth(1) {
        Some(path) => load_markers(&path)?,
        None => sample_markers(),
    };
    let user_location = LatLng::new(37.5665, 126.978);

    println!("Stores nearest to ({}, {}):", user_location.lat, user_location.lng);
    let set = MarkerSet::new(markers.clone());
    for (marker, km) in set.nearest_to(&user_location) {
        println!("  {:<12} {:>7.2} km", marker.name, km);
    }

    run_fallback(markers.clone());
    run_embedded(markers, user_location).await
}

fn load_markers(path: &str) -> anyhow::Result<Vec<Marker>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let markers: Vec<Marker> =
        serde_json::from_str(&raw).with_context(|| format!("parsing markers from {path}"))?;
    MarkerSet::try_new(markers.clone()).with_context(|| format!("checking markers in {path}"))?;
    Ok(markers)
}

fn sample_markers() -> Vec<Marker> {
    vec![
        Marker::new("gangnam", "Gangnam", 37.4979, 127.0276),
        Marker::new("hongdae", "Hongdae", 37.5563, 126.9220),
        Marker::new("jongno", "Jongno", 37.5704, 126.9920),
        Marker::new("jamsil", "Jamsil", 37.5133, 127.1001),
    ]
}

fn run_fallback(markers: Vec<Marker>) {
    let first = markers.first().map(|m| m.id.clone());
    let mut controller = MapSurfaceController::new(
        MapOptions::new(markers).zoom_controls(true),
        SurfaceConfig::default(),
        LocalSurfaceFactory::headless(HeadlessLoader::hanging()),
    );
    controller.handle_input(InputEvent::Resize {
        width: 360.0,
        height: 640.0,
    });
    controller.set_selected_id(first);
    controller.handle_input(InputEvent::ZoomIn);

    println!("\nFallback layout (360x640):");
    match controller.view() {
        SurfaceView::Fallback(frame) => {
            println!("  zoom factor {:.2}", frame.zoom_factor);
            for marker in frame.markers() {
                let flag = if marker.selected { " *" } else { "" };
                println!(
                    "  {:<12} ({:>6.1}, {:>6.1}){flag}",
                    marker.name, marker.position.x, marker.position.y
                );
            }
        }
        SurfaceView::Empty => println!("  no stores to show"),
        other => println!("  unexpected view {other:?}"),
    }
}

async fn run_embedded(markers: Vec<Marker>, user_location: LatLng) -> anyhow::Result<()> {
    let sdk = HeadlessSdk::new();
    let selected = Arc::new(Mutex::new(None::<String>));
    let sink = selected.clone();
    let callbacks = MapCallbacks::new()
        .on_select(move |id| {
            if let Ok(mut selected) = sink.lock() {
                *selected = Some(id.to_string());
            }
        })
        .on_error(|message| log::error!("map error: {message}"));

    let first = markers.first().map(|m| m.id.clone()).context("no markers to select")?;
    let options = MapOptions::new(markers)
        .mode(RenderMode::Embedded)
        .credentials(SdkCredentials::new("demo-key-0000", "http://localhost"))
        .user_location(Some(user_location))
        .callbacks(callbacks);
    let mut controller = MapSurfaceController::new(
        options,
        SurfaceConfig::default(),
        LocalSurfaceFactory::headless(HeadlessLoader::ready(sdk.clone())),
    );

    println!("\nEmbedded path:");
    step(&mut controller).await;
    println!("  view {:?}", controller.view());
    println!("  camera {:?}", sdk.center());

    let surface = controller
        .factory()
        .latest()
        .context("embedded surface was not created")?;
    surface.click_marker(&first);
    step(&mut controller).await;

    let tapped = selected.lock().ok().and_then(|s| s.clone());
    controller.set_selected_id(tapped.clone());
    step(&mut controller).await;
    println!("  tapped {tapped:?}, camera {:?}", sdk.center());

    controller.set_selected_id(None);
    step(&mut controller).await;
    println!("  deselected, camera {:?}", sdk.center());
    Ok(())
}

async fn step(controller: &mut MapSurfaceController<LocalSurfaceFactory>) {
    tokio::time::sleep(Duration::from_millis(20)).await;
    controller.pump();
}
