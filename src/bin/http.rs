#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use study_planner::{PlannerConfig, Schedule, ScheduleStore, http_api};
    use tracing::info;
    use tracing_subscriber::{EnvFilter, fmt};

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = PlannerConfig::from_env()?;
    let store = config.open_store()?;
    let today = chrono::Local::now().date_naive();
    let schedule = match store.load_schedule()? {
        Some(schedule) => schedule,
        None => Schedule::empty(today),
    };
    info!(
        store = %config.backend,
        path = %config.data_path.display(),
        items = schedule.len(),
        "loaded study plan"
    );

    let state = http_api::AppState::new(schedule).with_store(Arc::from(store));
    http_api::serve(config.http_addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
