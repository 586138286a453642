use safar_booking::FlightEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FlightEngine>,
}

impl AppState {
    pub fn new(engine: FlightEngine) -> Self {
        Self { engine: Arc::new(engine) }
    }
}
