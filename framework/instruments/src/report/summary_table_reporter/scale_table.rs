use tabled::Tabled;

#[derive(Tabled)]
pub struct ScaleRow {
    pub benchmark: String,
    pub scale: String,
    pub iterations: usize,
    #[tabled(display = "optional_ms")]
    pub avg_time_ms: Option<f64>,
    #[tabled(display = "optional_ms")]
    pub min_time_ms: Option<f64>,
    #[tabled(display = "optional_ms")]
    pub max_time_ms: Option<f64>,
    pub failed: usize,
    pub outcome: String,
}

fn optional_ms(n: &Option<f64>) -> String {
    match n {
        Some(n) => format!("{:.2}", n),
        None => "-".to_string(),
    }
}
